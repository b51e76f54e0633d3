use std::f64::consts::PI;

use serde::de::{Deserialize, Deserializer};

/// Gate kinds that span a target and a control wire. Anything else acts on
/// a single wire. The set mirrors the server's `D_GATE` pool.
pub const TWO_QUBIT_GATES: &[&str] = &["CZ", "CNOT", "SWAP", "iSWAP"];

pub fn is_two_qubit(name: &str) -> bool {
    TWO_QUBIT_GATES.contains(&name)
}

/// A gate offered in the tray, not yet placed. Wire format: `[name, param]`.
#[derive(Clone, Debug, PartialEq)]
pub struct TrayGate {
    pub name: String,
    pub param: Option<f64>,
}

impl<'de> Deserialize<'de> for TrayGate {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let (name, param) = <(String, Option<f64>)>::deserialize(d)?;
        Ok(TrayGate { name, param })
    }
}

/// A gate already placed in the circuit. Wire format:
/// `[name, param, target_qubit, control_qubit]`.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedGate {
    pub name: String,
    pub param: Option<f64>,
    pub target: usize,
    pub control: Option<usize>,
}

impl PlacedGate {
    pub fn single(name: &str, target: usize) -> Self {
        PlacedGate {
            name: name.to_string(),
            param: None,
            target,
            control: None,
        }
    }

    pub fn two(name: &str, target: usize, control: usize) -> Self {
        PlacedGate {
            name: name.to_string(),
            param: None,
            target,
            control: Some(control),
        }
    }
}

impl<'de> Deserialize<'de> for PlacedGate {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let (name, param, target, control) =
            <(String, Option<f64>, usize, Option<usize>)>::deserialize(d)?;
        Ok(PlacedGate {
            name,
            param,
            target,
            control,
        })
    }
}

/// Placeholder shown for an empty tray slot.
pub const EMPTY_SLOT: &str = "·";

/// Display label for a gate: the name, plus a rotation bracket when the
/// parameter is within 1e-5 (after dividing by pi) of a quarter-turn form.
/// Cosmetic only; placement logic never reads this.
pub fn display_label(name: &str, param: Option<f64>) -> String {
    let mut s = name.to_string();
    if let Some(p) = param {
        let coeff = p / PI;
        if (coeff - 1.0).abs() < 1e-5 {
            s.push_str("(π)");
        } else if (coeff - 0.5).abs() < 1e-5 {
            s.push_str("(π/2)");
        } else if (coeff + 0.5).abs() < 1e-5 {
            s.push_str("(-π/2)");
        } else if (coeff + 1.0).abs() < 1e-5 {
            s.push_str("(-π)");
        }
    }
    s
}

pub fn tray_label(gate: Option<&TrayGate>) -> String {
    match gate {
        Some(g) => display_label(&g.name, g.param),
        None => EMPTY_SLOT.to_string(),
    }
}
