use ratatui::layout::Rect;

use crate::controller::{self, Gesture, Phase, Placement};
use crate::gateway::{Gateway, GatewayError, HintCase, PlayerState, RankRecord, Reply};
use crate::layout::{Grid, LayoutError};

pub struct App {
    gateway: Box<dyn Gateway>,
    pub player_name: String,

    // Authoritative state, merged from server patches; the grid is
    // re-derived from the circuit after every merge.
    pub player: Option<PlayerState>,
    pub grid: Option<Grid>,

    // Placement protocol state
    pub phase: Phase,
    pub hover_wire: Option<usize>,

    // UI chrome
    pub status_msg: String,
    pub notice: Option<String>,
    pub hints: Option<Vec<HintCase>>,
    pub ranklist: Vec<RankRecord>,
    pub width: u16,
    pub height: u16,

    // Hit-test geometry, published by the last render pass.
    pub tray_hits: Vec<(usize, Rect)>,
    pub wire_hits: Vec<(usize, Rect)>,
}

/// Anonymous display name in the style the original client generates.
pub fn random_name() -> String {
    use rand::Rng;
    const POOL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|_| POOL[rng.gen_range(0..POOL.len())] as char)
        .collect()
}

impl App {
    pub fn new(gateway: Box<dyn Gateway>, player_name: String) -> Self {
        App {
            gateway,
            player_name,
            player: None,
            grid: None,
            phase: Phase::Idle,
            hover_wire: None,
            status_msg: String::new(),
            notice: None,
            hints: None,
            ranklist: vec![],
            width: 80,
            height: 24,
            tray_hits: vec![],
            wire_hits: vec![],
        }
    }

    pub fn in_game(&self) -> bool {
        self.player.is_some()
    }

    /// Re-derives the grid from the merged circuit. A layout failure here
    /// means the server handed us a circuit that breaks the wire-index
    /// invariant; that propagates up and ends the session.
    fn rebuild_grid(&mut self) -> Result<(), LayoutError> {
        self.grid = match &self.player {
            Some(p) => Some(Grid::build(&p.circuit, p.n_qubit, p.n_depth)?),
            None => None,
        };
        Ok(())
    }

    fn apply_reply(&mut self, reply: &Reply) -> Result<(), LayoutError> {
        if let Some(patch) = &reply.patch {
            self.player
                .get_or_insert_with(PlayerState::default)
                .apply(patch.clone());
            self.rebuild_grid()?;
        }
        Ok(())
    }

    /// Shared outcome handling for every gateway call: merge on success,
    /// blocking notification on rejection, log-and-abandon on transport
    /// failure. Local state is never mutated on a failed call.
    fn settle_outcome(
        &mut self,
        what: &str,
        result: Result<Reply, GatewayError>,
    ) -> Result<Option<Reply>, LayoutError> {
        match result {
            Ok(reply) => {
                self.apply_reply(&reply)?;
                Ok(Some(reply))
            }
            Err(GatewayError::Rejected { code, msg }) => {
                self.notice = Some(format!("[{what}] rejected: {code} {msg}"));
                Ok(None)
            }
            Err(e) => {
                log::warn!("[{what}] {e}");
                Ok(None)
            }
        }
    }

    pub fn start_game(&mut self) -> Result<(), LayoutError> {
        if self.in_game() {
            return Ok(());
        }
        let result = self.gateway.create_game();
        if self.settle_outcome("game/create", result)?.is_some() {
            self.status_msg = "Game on. Drag gates from the tray onto a wire.".to_string();
        }
        Ok(())
    }

    pub fn settle_game(&mut self) -> Result<(), LayoutError> {
        let Some(player) = &self.player else {
            return Ok(());
        };
        let id = player.id.clone();
        let name = self.player_name.clone();
        let result = self.gateway.settle_game(&id, &name);
        if self.settle_outcome("game/settle", result)?.is_some() {
            self.player = None;
            self.grid = None;
            self.phase = Phase::Idle;
            self.status_msg = "Game settled.".to_string();
            self.refresh_rank();
        }
        Ok(())
    }

    pub fn place(&mut self, placement: Placement) -> Result<(), LayoutError> {
        let Some(player) = &self.player else {
            return Ok(());
        };
        let id = player.id.clone();
        let result = self
            .gateway
            .put_gate(&id, placement.idx, placement.target, placement.control);
        if let Some(reply) = self.settle_outcome("game/put", result)? {
            if let Some(settle_type) = reply.data["settle_type"].as_str() {
                self.status_msg = format!("Placed: {settle_type}");
            }
            // the server ends the game itself once nothing can fit anymore
            if let Some(p) = &self.player {
                if p.state == "END" {
                    self.notice = Some(format!("Circuit full — game over. Final score: {}", p.score));
                }
            }
        }
        Ok(())
    }

    pub fn remove_gate(&mut self, idx: usize) -> Result<(), LayoutError> {
        let Some(player) = &self.player else {
            return Ok(());
        };
        let id = player.id.clone();
        let result = self.gateway.del_gate(&id, idx);
        if self.settle_outcome("game/del", result)?.is_some() {
            self.status_msg = format!("Removed gate #{idx}");
        }
        Ok(())
    }

    pub fn request_hint(&mut self) -> Result<(), LayoutError> {
        let Some(player) = &self.player else {
            return Ok(());
        };
        if player.token < 1 {
            self.status_msg = "No hint tokens left.".to_string();
            return Ok(());
        }
        let id = player.id.clone();
        let result = self.gateway.hint(&id);
        if let Some(reply) = self.settle_outcome("game/hint", result)? {
            match serde_json::from_value::<Vec<HintCase>>(reply.data["hint_cases"].clone()) {
                Ok(cases) => self.hints = Some(cases),
                Err(e) => log::warn!("[game/hint] bad hint payload: {e}"),
            }
        }
        Ok(())
    }

    pub fn refresh_rank(&mut self) {
        match self.gateway.rank(15) {
            Ok(rows) => self.ranklist = rows,
            Err(GatewayError::Rejected { code, msg }) => {
                self.notice = Some(format!("[hist/rank] rejected: {code} {msg}"));
            }
            Err(e) => log::warn!("[hist/rank] {e}"),
        }
    }

    /// Feeds one gesture through the placement state machine, issuing the
    /// resulting placement request if the transition commits one.
    pub fn gesture(&mut self, gesture: Gesture) -> Result<(), LayoutError> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let (next, request) = match &self.player {
            Some(player) => controller::step(
                phase,
                gesture,
                &player.cur_gate,
                &player.circuit,
                player.n_qubit,
            )?,
            None => (phase, None),
        };
        self.phase = next;
        if !matches!(self.phase, Phase::Dragging { .. }) {
            self.hover_wire = None;
        }
        if let Some(placement) = request {
            self.place(placement)?;
        }
        Ok(())
    }

    pub fn tray_slot_at(&self, x: u16, y: u16) -> Option<usize> {
        hit(&self.tray_hits, x, y)
    }

    pub fn wire_at(&self, x: u16, y: u16) -> Option<usize> {
        hit(&self.wire_hits, x, y)
    }

    /// Circuit index of the gate rendered at terminal position (x, y),
    /// for removal by pointing.
    pub fn placed_gate_at(&self, x: u16, y: u16) -> Option<usize> {
        let wire = self.wire_at(x, y)?;
        let grid = self.grid.as_ref()?;
        let (_, area) = self.wire_hits.iter().find(|(w, _)| *w == wire)?;
        let col = (x.saturating_sub(area.x) as usize) / crate::render::CELL_W;
        if col >= grid.depth_limit {
            return None;
        }
        grid.cell(wire, col).gate
    }
}

fn hit(zones: &[(usize, Rect)], x: u16, y: u16) -> Option<usize> {
    zones
        .iter()
        .find(|(_, r)| x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height)
        .map(|(i, _)| *i)
}
