//! The placement protocol, reified as an explicit state machine: every
//! user gesture is an event, every handler a pure `(phase, event) ->
//! (phase, request?)` transition. Nothing here touches the screen or the
//! network, so the whole protocol is unit-testable.

use crate::gate::{TrayGate, is_two_qubit};
use crate::layout::{LayoutError, compute_depths};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A tray gate is mid-drag.
    Dragging { slot: usize },
    /// A two-qubit gate was dropped on `target`; waiting for the player to
    /// pick the control wire from `candidates`.
    AwaitingControl {
        slot: usize,
        target: usize,
        candidates: Vec<usize>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    /// Press began on tray slot `i`.
    DragStart(usize),
    /// Release over a wire of the circuit grid.
    Drop(usize),
    /// Release anywhere else.
    DragEnd,
    /// Primary-button click on a wire.
    PrimaryClick(usize),
    /// Secondary-button click.
    SecondaryClick,
}

/// Placement intent for the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub idx: usize,
    pub target: usize,
    pub control: Option<usize>,
}

/// Wires eligible to take the control end of a gate targeting `target`:
/// every other wire not already ahead of the target's column.
pub fn candidate_controls(depths: &[usize], target: usize) -> Vec<usize> {
    let ref_depth = depths[target];
    (0..depths.len())
        .filter(|&r| r != target && depths[r] <= ref_depth)
        .collect()
}

/// Advances the placement state machine by one gesture. Illegal gestures
/// (empty tray slot, click outside the candidate set, drag start while a
/// control selection is pending) leave the phase unchanged and emit no
/// request; the gateway stays the authority on final legality.
pub fn step(
    phase: Phase,
    gesture: Gesture,
    tray: &[TrayGate],
    circuit: &[crate::gate::PlacedGate],
    wire_count: usize,
) -> Result<(Phase, Option<Placement>), LayoutError> {
    match (phase, gesture) {
        (Phase::Idle, Gesture::DragStart(slot)) if slot < tray.len() => {
            Ok((Phase::Dragging { slot }, None))
        }

        (Phase::Dragging { slot }, Gesture::Drop(wire)) if wire < wire_count => {
            let Some(gate) = tray.get(slot) else {
                return Ok((Phase::Idle, None));
            };
            if is_two_qubit(&gate.name) {
                let depths = compute_depths(circuit, wire_count)?;
                let candidates = candidate_controls(&depths, wire);
                Ok((
                    Phase::AwaitingControl {
                        slot,
                        target: wire,
                        candidates,
                    },
                    None,
                ))
            } else {
                // single-qubit: commit immediately, back to idle regardless
                // of what the gateway says about it later
                Ok((
                    Phase::Idle,
                    Some(Placement {
                        idx: slot,
                        target: wire,
                        control: None,
                    }),
                ))
            }
        }

        (Phase::Dragging { .. }, Gesture::Drop(_) | Gesture::DragEnd) => Ok((Phase::Idle, None)),

        (
            Phase::AwaitingControl {
                slot,
                target,
                candidates,
            },
            Gesture::PrimaryClick(wire),
        ) => {
            if candidates.contains(&wire) {
                Ok((
                    Phase::Idle,
                    Some(Placement {
                        idx: slot,
                        target,
                        control: Some(wire),
                    }),
                ))
            } else {
                // usability guard: clicks off the candidate set are a no-op
                Ok((
                    Phase::AwaitingControl {
                        slot,
                        target,
                        candidates,
                    },
                    None,
                ))
            }
        }

        (Phase::AwaitingControl { .. }, Gesture::SecondaryClick) => Ok((Phase::Idle, None)),

        // A new drag while a control selection is pending is ignored: the
        // pending selection must be confirmed or cancelled first.
        (phase, _) => Ok((phase, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{PlacedGate, TrayGate};

    fn tray(names: &[&str]) -> Vec<TrayGate> {
        names
            .iter()
            .map(|n| TrayGate {
                name: n.to_string(),
                param: None,
            })
            .collect()
    }

    #[test]
    fn single_qubit_commit_path() {
        let tray = tray(&["H", "CNOT"]);
        let (phase, req) = step(Phase::Idle, Gesture::DragStart(0), &tray, &[], 5).unwrap();
        assert_eq!(phase, Phase::Dragging { slot: 0 });

        let (phase, req2) = step(phase, Gesture::Drop(3), &tray, &[], 5).unwrap();
        assert_eq!(phase, Phase::Idle);
        assert_eq!(req, None);
        assert_eq!(
            req2,
            Some(Placement {
                idx: 0,
                target: 3,
                control: None
            })
        );
    }

    #[test]
    fn two_qubit_drop_enters_control_selection() {
        let tray = tray(&["CNOT"]);
        let (phase, req) =
            step(Phase::Dragging { slot: 0 }, Gesture::Drop(1), &tray, &[], 4).unwrap();
        assert_eq!(req, None);
        assert_eq!(
            phase,
            Phase::AwaitingControl {
                slot: 0,
                target: 1,
                candidates: vec![0, 2, 3],
            }
        );
    }

    #[test]
    fn candidate_boundary_at_ref_depth() {
        // depths [2, 1, 2, 3]: target wire 1 has refDepth 1.
        // equal-depth wires are excluded only when strictly ahead.
        let depths = [2, 1, 2, 3];
        assert_eq!(candidate_controls(&depths, 1), Vec::<usize>::new());
        // depths [1, 1, 1, 2]: target 0 -> wires at == refDepth included,
        // wire at refDepth + 1 excluded
        let depths = [1, 1, 1, 2];
        assert_eq!(candidate_controls(&depths, 0), vec![1, 2]);
    }

    #[test]
    fn candidate_set_respects_circuit_depths() {
        // wire 2 is one column ahead of wire 0, so it cannot take the
        // control end of a gate dropped on wire 0
        let circuit = [PlacedGate::single("H", 2)];
        let tray = tray(&["CZ"]);
        let (phase, _) =
            step(Phase::Dragging { slot: 0 }, Gesture::Drop(0), &tray, &circuit, 3).unwrap();
        assert_eq!(
            phase,
            Phase::AwaitingControl {
                slot: 0,
                target: 0,
                candidates: vec![1],
            }
        );
    }

    #[test]
    fn confirm_on_candidate_emits_request() {
        let phase = Phase::AwaitingControl {
            slot: 1,
            target: 0,
            candidates: vec![2, 3],
        };
        let (phase, req) = step(phase, Gesture::PrimaryClick(2), &tray(&["H", "CNOT"]), &[], 5)
            .unwrap();
        assert_eq!(phase, Phase::Idle);
        assert_eq!(
            req,
            Some(Placement {
                idx: 1,
                target: 0,
                control: Some(2)
            })
        );
    }

    #[test]
    fn click_off_candidate_set_is_a_no_op() {
        let phase = Phase::AwaitingControl {
            slot: 0,
            target: 0,
            candidates: vec![2],
        };
        let (next, req) = step(
            phase.clone(),
            Gesture::PrimaryClick(1),
            &tray(&["CNOT"]),
            &[],
            5,
        )
        .unwrap();
        assert_eq!(next, phase);
        assert_eq!(req, None);
    }

    #[test]
    fn secondary_click_cancels_selection() {
        let phase = Phase::AwaitingControl {
            slot: 0,
            target: 0,
            candidates: vec![1],
        };
        let (next, req) = step(phase, Gesture::SecondaryClick, &tray(&["CNOT"]), &[], 5).unwrap();
        assert_eq!(next, Phase::Idle);
        assert_eq!(req, None);
    }

    #[test]
    fn drag_end_without_drop_reverts() {
        let (next, req) = step(
            Phase::Dragging { slot: 0 },
            Gesture::DragEnd,
            &tray(&["H"]),
            &[],
            5,
        )
        .unwrap();
        assert_eq!(next, Phase::Idle);
        assert_eq!(req, None);
    }

    #[test]
    fn drag_start_on_empty_slot_ignored() {
        let (next, req) = step(Phase::Idle, Gesture::DragStart(2), &tray(&["H"]), &[], 5).unwrap();
        assert_eq!(next, Phase::Idle);
        assert_eq!(req, None);
    }

    #[test]
    fn drag_start_while_awaiting_control_ignored() {
        let phase = Phase::AwaitingControl {
            slot: 0,
            target: 0,
            candidates: vec![1],
        };
        let (next, req) = step(
            phase.clone(),
            Gesture::DragStart(1),
            &tray(&["CNOT", "H"]),
            &[],
            5,
        )
        .unwrap();
        assert_eq!(next, phase);
        assert_eq!(req, None);
    }
}
