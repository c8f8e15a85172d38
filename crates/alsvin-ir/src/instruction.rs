//! Circuit instructions combining operations with operands.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::qubit::{ClbitId, QubitId};

/// The kind of instruction in a circuit.
///
/// This is a closed set: the mapping pipeline dispatches on it directly
/// rather than through per-operation behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(Gate),
    /// Measurement into classical bits.
    ///
    /// The register name correlates results back to the source program.
    /// Measurements reaching the routing pass must carry one.
    Measure {
        /// Name of the classical result register, if known.
        register: Option<String>,
    },
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (scheduling fence, no physical interaction).
    Barrier,
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
    /// Classical bits this instruction operates on (for measure).
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(gate: impl Into<Gate>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate.into()),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::gate(gate, [qubit])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: StandardGate, q1: QubitId, q2: QubitId) -> Self {
        Self::gate(gate, [q1, q2])
    }

    /// Create an unnamed measurement instruction.
    ///
    /// The routing pass rejects unnamed measurements; prefer
    /// [`Instruction::measure_named`] or the [`Circuit`](crate::Circuit)
    /// builder, which stamps the destination register automatically.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure { register: None },
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Create a measurement instruction with a named result register.
    pub fn measure_named(register: impl Into<String>, qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure {
                register: Some(register.into()),
            },
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Create a multi-qubit measurement into a named register.
    ///
    /// Returns an error if the number of qubits and classical bits differ.
    pub fn measure_many(
        register: impl Into<String>,
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<Self> {
        let qubits: Vec<_> = qubits.into_iter().collect();
        let clbits: Vec<_> = clbits.into_iter().collect();
        if qubits.len() != clbits.len() {
            return Err(IrError::MeasureWidthMismatch {
                qubits: qubits.len(),
                clbits: clbits.len(),
            });
        }
        Ok(Self {
            kind: InstructionKind::Measure {
                register: Some(register.into()),
            },
            qubits,
            clbits,
        })
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            qubits: vec![qubit],
            clbits: vec![],
        }
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure { .. })
    }

    /// Check if this is a reset.
    pub fn is_reset(&self) -> bool {
        matches!(self.kind, InstructionKind::Reset)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    /// Get the measurement register name, if this is a named measurement.
    pub fn measure_register(&self) -> Option<&str> {
        match &self.kind {
            InstructionKind::Measure { register } => register.as_deref(),
            _ => None,
        }
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Whether this instruction constrains placement: a true two-qubit
    /// interaction that requires its operands to be physically adjacent.
    /// Measurements, barriers and resets never do.
    pub fn needs_adjacency(&self) -> bool {
        self.is_gate() && self.qubits.len() == 2
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure { .. } => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::single_qubit_gate(StandardGate::H, QubitId(0));
        assert!(inst.is_gate());
        assert!(!inst.needs_adjacency());
        assert_eq!(inst.name(), "h");
    }

    #[test]
    fn test_two_qubit_gate_needs_adjacency() {
        let inst = Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1));
        assert!(inst.needs_adjacency());
    }

    #[test]
    fn test_measure_register() {
        let unnamed = Instruction::measure(QubitId(0), ClbitId(0));
        assert!(unnamed.is_measure());
        assert_eq!(unnamed.measure_register(), None);

        let named = Instruction::measure_named("result", QubitId(0), ClbitId(0));
        assert_eq!(named.measure_register(), Some("result"));
        assert!(!named.needs_adjacency());
    }

    #[test]
    fn test_measure_many_width_mismatch() {
        let err = Instruction::measure_many(
            "m",
            [QubitId(0), QubitId(1)],
            [ClbitId(0)],
        );
        assert!(matches!(
            err,
            Err(IrError::MeasureWidthMismatch { qubits: 2, clbits: 1 })
        ));
    }

    #[test]
    fn test_barrier_instruction() {
        let inst = Instruction::barrier([QubitId(0), QubitId(1), QubitId(2)]);
        assert!(inst.is_barrier());
        assert!(!inst.needs_adjacency());
        assert_eq!(inst.qubits.len(), 3);
    }
}
