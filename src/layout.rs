use thiserror::Error;

use crate::gate::{PlacedGate, display_label};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("wire index {wire} out of range for {wire_count} wires")]
    WireOutOfRange { wire: usize, wire_count: usize },
    #[error("gate targets and controls the same wire {0}")]
    DegenerateGate(usize),
}

fn check_wire(wire: usize, wire_count: usize) -> Result<(), LayoutError> {
    if wire >= wire_count {
        return Err(LayoutError::WireOutOfRange { wire, wire_count });
    }
    Ok(())
}

/// Folds one gate into the running depth vector and returns the column it
/// occupies. A two-qubit gate pulls both wires up to the same column; any
/// later gate on either wire lands strictly after it.
fn fold_gate(depths: &mut [usize], gate: &PlacedGate) -> Result<usize, LayoutError> {
    let wire_count = depths.len();
    check_wire(gate.target, wire_count)?;
    match gate.control {
        None => {
            let col = depths[gate.target];
            depths[gate.target] += 1;
            Ok(col)
        }
        Some(control) => {
            check_wire(control, wire_count)?;
            if control == gate.target {
                return Err(LayoutError::DegenerateGate(gate.target));
            }
            let col = depths[gate.target].max(depths[control]);
            depths[gate.target] = col + 1;
            depths[control] = col + 1;
            Ok(col)
        }
    }
}

/// Next free column per wire, derived by replaying the circuit in placement
/// order. An empty circuit yields all zeros.
pub fn compute_depths(
    circuit: &[PlacedGate],
    wire_count: usize,
) -> Result<Vec<usize>, LayoutError> {
    let mut depths = vec![0usize; wire_count];
    for gate in circuit {
        fold_gate(&mut depths, gate)?;
    }
    Ok(depths)
}

/// One slot of the rendered grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub label: String,
    /// Index into the circuit of the gate occupying this slot.
    pub gate: Option<usize>,
    /// This slot is the control end of a two-qubit gate.
    pub is_control: bool,
    /// This slot is the target end of a two-qubit gate.
    pub is_target: bool,
}

impl Cell {
    pub fn occupied(&self) -> bool {
        self.gate.is_some()
    }
}

/// A freshly-built `wire_count x depth_limit` matrix of slots. Built from
/// scratch on every layout pass, never mutated incrementally.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub wire_count: usize,
    pub depth_limit: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn build(
        circuit: &[PlacedGate],
        wire_count: usize,
        depth_limit: usize,
    ) -> Result<Grid, LayoutError> {
        let mut grid = Grid {
            wire_count,
            depth_limit,
            cells: vec![Cell::default(); wire_count * depth_limit],
        };
        let mut depths = vec![0usize; wire_count];
        for (idx, gate) in circuit.iter().enumerate() {
            let col = fold_gate(&mut depths, gate)?;
            assert!(
                col < depth_limit,
                "circuit deeper than the grid: gate {idx} lands at column {col}, limit {depth_limit}"
            );
            let label = display_label(&gate.name, gate.param);
            let two = gate.control.is_some();
            let cell = grid.cell_mut(gate.target, col);
            cell.label = label.clone();
            cell.gate = Some(idx);
            cell.is_target = two;
            if let Some(control) = gate.control {
                let cell = grid.cell_mut(control, col);
                cell.label = label;
                cell.gate = Some(idx);
                cell.is_control = true;
            }
        }
        Ok(grid)
    }

    pub fn cell(&self, wire: usize, col: usize) -> &Cell {
        &self.cells[wire * self.depth_limit + col]
    }

    fn cell_mut(&mut self, wire: usize, col: usize) -> &mut Cell {
        &mut self.cells[wire * self.depth_limit + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::PlacedGate;

    #[test]
    fn empty_circuit_all_zero() {
        assert_eq!(compute_depths(&[], 5).unwrap(), vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn single_gate_advances_one_wire() {
        let circuit = [PlacedGate::single("X", 0)];
        assert_eq!(compute_depths(&circuit, 5).unwrap(), vec![1, 0, 0, 0, 0]);
    }

    #[test]
    fn two_qubit_gate_aligns_both_wires() {
        let circuit = [PlacedGate::two("CNOT", 0, 2)];
        assert_eq!(compute_depths(&circuit, 5).unwrap(), vec![1, 0, 1, 0, 0]);
    }

    #[test]
    fn two_qubit_gate_takes_max_plus_one() {
        // two singles on wire 0, then CNOT(0,1): both wires jump to 3
        let circuit = [
            PlacedGate::single("H", 0),
            PlacedGate::single("H", 0),
            PlacedGate::two("CNOT", 0, 1),
        ];
        assert_eq!(compute_depths(&circuit, 4).unwrap(), vec![3, 3, 0, 0]);
    }

    #[test]
    fn deterministic() {
        let circuit = [
            PlacedGate::single("H", 1),
            PlacedGate::two("CZ", 1, 3),
            PlacedGate::single("T", 3),
        ];
        let a = compute_depths(&circuit, 5).unwrap();
        let b = compute_depths(&circuit, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_range_wire_is_an_error() {
        let circuit = [PlacedGate::single("X", 5)];
        assert_eq!(
            compute_depths(&circuit, 5),
            Err(LayoutError::WireOutOfRange {
                wire: 5,
                wire_count: 5
            })
        );
        let circuit = [PlacedGate::two("CNOT", 0, 7)];
        assert!(matches!(
            compute_depths(&circuit, 5),
            Err(LayoutError::WireOutOfRange { wire: 7, .. })
        ));
    }

    #[test]
    fn degenerate_pair_is_an_error() {
        let circuit = [PlacedGate::two("CZ", 2, 2)];
        assert_eq!(
            compute_depths(&circuit, 5),
            Err(LayoutError::DegenerateGate(2))
        );
    }

    #[test]
    fn grid_places_two_qubit_gate_in_one_column() {
        let circuit = [PlacedGate::two("CNOT", 0, 2)];
        let grid = Grid::build(&circuit, 5, 10).unwrap();
        assert_eq!(grid.cell(0, 0).label, "CNOT");
        assert_eq!(grid.cell(2, 0).label, "CNOT");
        assert!(grid.cell(0, 0).is_target);
        assert!(grid.cell(2, 0).is_control);
        assert!(!grid.cell(1, 0).occupied());
    }

    #[test]
    fn grid_leaves_skipped_columns_empty() {
        // wire 1 jumps from column 0 straight to column 2
        let circuit = [
            PlacedGate::single("H", 0),
            PlacedGate::single("H", 0),
            PlacedGate::two("CNOT", 0, 1),
        ];
        let grid = Grid::build(&circuit, 4, 10).unwrap();
        assert_eq!(grid.cell(0, 2).gate, Some(2));
        assert_eq!(grid.cell(1, 2).gate, Some(2));
        assert!(!grid.cell(1, 0).occupied());
        assert!(!grid.cell(1, 1).occupied());
    }

    #[test]
    fn grid_build_is_idempotent() {
        let circuit = [
            PlacedGate::single("H", 0),
            PlacedGate::two("SWAP", 1, 3),
            PlacedGate::single("T", 0),
        ];
        let a = Grid::build(&circuit, 5, 10).unwrap();
        let b = Grid::build(&circuit, 5, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "deeper than the grid")]
    fn grid_overflow_is_fatal() {
        let circuit = [
            PlacedGate::single("H", 0),
            PlacedGate::single("H", 0),
            PlacedGate::single("H", 0),
        ];
        let _ = Grid::build(&circuit, 2, 2);
    }
}
