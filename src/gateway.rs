//! The remote game service: authoritative owner of all player and circuit
//! state. The client only sends intents and merges back the partial
//! `playerdata` patches the server returns.

use serde::Deserialize;
use serde::de::Deserializer;
use serde_json::{Value, json};
use thiserror::Error;

use crate::gate::{PlacedGate, TrayGate};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected request: {code} {msg}")]
    Rejected { code: i64, msg: String },
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Authoritative snapshot, merged together from server patches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerState {
    pub id: String,
    pub state: String,
    pub circuit: Vec<PlacedGate>,
    pub cur_gate: Vec<TrayGate>,
    pub nxt_gate: Option<TrayGate>,
    pub score: i64,
    pub token: i64,
    pub bingo: i64,
    pub n_qubit: usize,
    pub n_depth: usize,
    pub ts_start: i64,
    pub ts_end: i64,
}

/// Partial-state patch: every mutating call returns a subset of the
/// player data keys, merged field-wise into the local snapshot.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PlayerPatch {
    pub id: Option<String>,
    pub state: Option<String>,
    pub circuit: Option<Vec<PlacedGate>>,
    pub cur_gate: Option<Vec<TrayGate>>,
    pub nxt_gate: Option<TrayGate>,
    pub score: Option<i64>,
    pub token: Option<i64>,
    pub bingo: Option<i64>,
    pub n_qubit: Option<usize>,
    pub n_depth: Option<usize>,
    pub ts_start: Option<i64>,
    pub ts_end: Option<i64>,
}

impl PlayerState {
    /// Shallow merge: present patch fields overwrite, absent ones are
    /// left untouched.
    pub fn apply(&mut self, patch: PlayerPatch) {
        if let Some(v) = patch.id {
            self.id = v;
        }
        if let Some(v) = patch.state {
            self.state = v;
        }
        if let Some(v) = patch.circuit {
            self.circuit = v;
        }
        if let Some(v) = patch.cur_gate {
            self.cur_gate = v;
        }
        if let Some(v) = patch.nxt_gate {
            self.nxt_gate = Some(v);
        }
        if let Some(v) = patch.score {
            self.score = v;
        }
        if let Some(v) = patch.token {
            self.token = v;
        }
        if let Some(v) = patch.bingo {
            self.bingo = v;
        }
        if let Some(v) = patch.n_qubit {
            self.n_qubit = v;
        }
        if let Some(v) = patch.n_depth {
            self.n_depth = v;
        }
        if let Some(v) = patch.ts_start {
            self.ts_start = v;
        }
        if let Some(v) = patch.ts_end {
            self.ts_end = v;
        }
    }
}

/// Leaderboard row. Wire format: `[name, score, bingo, ts_end]`,
/// server-ordered; the client never re-sorts.
#[derive(Clone, Debug, PartialEq)]
pub struct RankRecord {
    pub name: String,
    pub score: i64,
    pub bingo: i64,
    pub ts_end: i64,
}

impl<'de> Deserialize<'de> for RankRecord {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let (name, score, bingo, ts_end) = <(String, i64, i64, i64)>::deserialize(d)?;
        Ok(RankRecord {
            name,
            score,
            bingo,
            ts_end,
        })
    }
}

/// One suggestion from `/game/hint`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HintCase {
    pub idx: usize,
    pub target_qubit: usize,
    #[serde(default)]
    pub control_qubit: Option<usize>,
    pub settle_type: String,
    pub score: i64,
}

/// Decoded success response: extra payload plus an optional player patch.
#[derive(Clone, Debug, Default)]
pub struct Reply {
    pub data: Value,
    pub patch: Option<PlayerPatch>,
}

#[derive(Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    playerdata: Option<PlayerPatch>,
}

fn decode(body: Value) -> Result<Reply, GatewayError> {
    let envelope: Envelope = serde_json::from_value(body)?;
    if envelope.code != 200 {
        return Err(GatewayError::Rejected {
            code: envelope.code,
            msg: envelope.msg,
        });
    }
    Ok(Reply {
        data: envelope.data.unwrap_or(Value::Null),
        patch: envelope.playerdata,
    })
}

pub trait Gateway {
    fn create_game(&self) -> Result<Reply, GatewayError>;
    fn put_gate(
        &self,
        id: &str,
        idx: usize,
        target: usize,
        control: Option<usize>,
    ) -> Result<Reply, GatewayError>;
    fn del_gate(&self, id: &str, idx: usize) -> Result<Reply, GatewayError>;
    fn hint(&self, id: &str) -> Result<Reply, GatewayError>;
    fn settle_game(&self, id: &str, name: &str) -> Result<Reply, GatewayError>;
    fn rank(&self, limit: usize) -> Result<Vec<RankRecord>, GatewayError>;
}

pub struct HttpGateway {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpGateway {
    pub fn new(host: &str, port: u16) -> Self {
        HttpGateway {
            base: format!("http://{host}:{port}"),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn post(&self, ep: &str, body: Value) -> Result<Reply, GatewayError> {
        log::debug!("[POST {ep}] req: {body}");
        let resp: Value = self
            .client
            .post(format!("{}{ep}", self.base))
            .json(&body)
            .send()?
            .json()?;
        log::debug!("[POST {ep}] resp: {resp}");
        decode(resp)
    }

    fn get(&self, ep: &str, query: &[(&str, String)]) -> Result<Reply, GatewayError> {
        log::debug!("[GET {ep}] query: {query:?}");
        let resp: Value = self
            .client
            .get(format!("{}{ep}", self.base))
            .query(query)
            .send()?
            .json()?;
        log::debug!("[GET {ep}] resp: {resp}");
        decode(resp)
    }
}

impl Gateway for HttpGateway {
    fn create_game(&self) -> Result<Reply, GatewayError> {
        self.post("/game/create", json!({}))
    }

    fn put_gate(
        &self,
        id: &str,
        idx: usize,
        target: usize,
        control: Option<usize>,
    ) -> Result<Reply, GatewayError> {
        self.post(
            "/game/put",
            json!({
                "id": id,
                "idx": idx,
                "target_qubit": target,
                "control_qubit": control,
            }),
        )
    }

    fn del_gate(&self, id: &str, idx: usize) -> Result<Reply, GatewayError> {
        self.post("/game/del", json!({ "id": id, "idx": idx }))
    }

    fn hint(&self, id: &str) -> Result<Reply, GatewayError> {
        self.post("/game/hint", json!({ "id": id }))
    }

    fn settle_game(&self, id: &str, name: &str) -> Result<Reply, GatewayError> {
        self.post("/game/settle", json!({ "id": id, "name": name }))
    }

    fn rank(&self, limit: usize) -> Result<Vec<RankRecord>, GatewayError> {
        let reply = self.get("/hist/rank", &[("limit", limit.to_string())])?;
        let rows = serde_json::from_value(reply.data["rank"].clone())?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_success_envelope() {
        let body = serde_json::json!({
            "code": 200,
            "msg": "OK",
            "playerdata": {
                "score": 120,
                "circuit": [["H", null, 0, null], ["CNOT", null, 0, 2]],
            },
            "data": { "settle_type": "Append" },
        });
        let reply = decode(body).unwrap();
        let patch = reply.patch.unwrap();
        assert_eq!(patch.score, Some(120));
        assert_eq!(patch.circuit.as_ref().unwrap().len(), 2);
        assert_eq!(patch.circuit.unwrap()[1].control, Some(2));
        assert_eq!(reply.data["settle_type"], "Append");
    }

    #[test]
    fn decode_rejection() {
        let body = serde_json::json!({ "code": 400, "msg": "invalid param" });
        match decode(body) {
            Err(GatewayError::Rejected { code, msg }) => {
                assert_eq!(code, 400);
                assert_eq!(msg, "invalid param");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn patch_overwrites_present_fields_only() {
        let mut player = PlayerState {
            score: 50,
            token: 2,
            n_qubit: 5,
            ..PlayerState::default()
        };
        player.apply(PlayerPatch {
            score: Some(75),
            ..PlayerPatch::default()
        });
        assert_eq!(player.score, 75);
        assert_eq!(player.token, 2);
        assert_eq!(player.n_qubit, 5);
    }

    #[test]
    fn patch_replaces_circuit_wholesale() {
        let mut player = PlayerState::default();
        player.apply(PlayerPatch {
            circuit: Some(vec![PlacedGate::single("X", 1)]),
            cur_gate: Some(vec![]),
            ..PlayerPatch::default()
        });
        assert_eq!(player.circuit.len(), 1);
        assert!(player.cur_gate.is_empty());
    }

    #[test]
    fn decode_rank_rows() {
        let rows: Vec<RankRecord> =
            serde_json::from_str(r#"[["ALICE", 900, 3, 1720500000], ["BOB", 120, 0, 1720400000]]"#)
                .unwrap();
        assert_eq!(rows[0].name, "ALICE");
        assert_eq!(rows[1].score, 120);
    }

    #[test]
    fn decode_hint_case() {
        let case: HintCase = serde_json::from_str(
            r#"{"idx": 1, "target_qubit": 2, "control_qubit": 0, "settle_type": "Eliminate", "score": 60, "effected_gates": [3, 4]}"#,
        )
        .unwrap();
        assert_eq!(case.idx, 1);
        assert_eq!(case.control_qubit, Some(0));
        let case: HintCase = serde_json::from_str(
            r#"{"idx": 0, "target_qubit": 1, "settle_type": "Fuse", "score": 25}"#,
        )
        .unwrap();
        assert_eq!(case.control_qubit, None);
    }
}
