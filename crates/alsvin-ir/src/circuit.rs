//! Circuit builder facade over the DAG representation.

use serde::{Deserialize, Serialize};

use crate::dag::CircuitDag;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::instruction::Instruction;
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId};

/// A quantum circuit under construction.
///
/// Wraps a [`CircuitDag`] with register bookkeeping and gate helpers.
/// Classical registers carry names; measurements built through this facade
/// are stamped with the destination register name, which the routing pass
/// requires for result correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    name: String,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    #[serde(skip, default)]
    dag: CircuitDag,
    /// Instructions in application order, kept for serialization.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            dag: CircuitDag::new(),
            instructions: vec![],
        }
    }

    /// Create a circuit with default registers `q[num_qubits]` and
    /// `c[num_clbits]`.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        if num_qubits > 0 {
            circuit.add_qreg("q", num_qubits);
        }
        if num_clbits > 0 {
            circuit.add_creg("c", num_clbits);
        }
        circuit
    }

    /// Add a single anonymous qubit.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = QubitId::from(self.qubits.len());
        self.qubits.push(Qubit::new(id));
        self.dag.add_qubit(id);
        id
    }

    /// Add a named quantum register of the given size.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> Vec<QubitId> {
        let name = name.into();
        let mut ids = Vec::with_capacity(size as usize);
        for i in 0..size {
            let id = QubitId::from(self.qubits.len());
            self.qubits.push(Qubit::with_register(id, name.clone(), i));
            self.dag.add_qubit(id);
            ids.push(id);
        }
        ids
    }

    /// Add a single anonymous classical bit.
    ///
    /// Measurements into anonymous bits cannot be routed; prefer
    /// [`add_creg`](Self::add_creg).
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId::from(self.clbits.len());
        self.clbits.push(Clbit::new(id));
        self.dag.add_clbit(id);
        id
    }

    /// Add a named classical register of the given size.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> Vec<ClbitId> {
        let name = name.into();
        let mut ids = Vec::with_capacity(size as usize);
        for i in 0..size {
            let id = ClbitId::from(self.clbits.len());
            self.clbits.push(Clbit::with_register(id, name.clone(), i));
            self.dag.add_clbit(id);
            ids.push(id);
        }
        ids
    }

    /// Append an arbitrary instruction.
    pub fn append(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.dag.apply(instruction.clone())?;
        self.instructions.push(instruction);
        Ok(self)
    }

    // --- single-qubit gates ---

    /// Apply a Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply a Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply a Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply a Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply an S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply a T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(StandardGate::T, qubit))
    }

    /// Apply a sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(StandardGate::SX, qubit))
    }

    /// Apply an X rotation.
    pub fn rx(&mut self, angle: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(
            StandardGate::Rx(angle),
            qubit,
        ))
    }

    /// Apply a Y rotation.
    pub fn ry(&mut self, angle: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(
            StandardGate::Ry(angle),
            qubit,
        ))
    }

    /// Apply a Z rotation.
    pub fn rz(&mut self, angle: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(
            StandardGate::Rz(angle),
            qubit,
        ))
    }

    // --- two-qubit gates ---

    /// Apply a controlled-X gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply a controlled-Y gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(StandardGate::CY, control, target))
    }

    /// Apply a controlled-Z gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(StandardGate::CZ, control, target))
    }

    /// Apply a SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))
    }

    /// Apply a controlled-Z rotation.
    pub fn crz(&mut self, angle: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(
            StandardGate::CRz(angle),
            control,
            target,
        ))
    }

    /// Apply a controlled phase gate.
    pub fn cp(&mut self, angle: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(
            StandardGate::CP(angle),
            control,
            target,
        ))
    }

    /// Apply a ZZ rotation.
    pub fn rzz(&mut self, angle: f64, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(StandardGate::RZZ(angle), q1, q2))
    }

    // --- three-qubit gates ---

    /// Apply a Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    /// Apply an arbitrary gate to the given qubits.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.append(Instruction::gate(gate.into(), qubits))
    }

    // --- non-unitary operations ---

    /// Measure a qubit into a classical bit.
    ///
    /// The destination register name is read off the classical bit's
    /// metadata; measuring into an anonymous bit produces an unnamed
    /// measurement, which the routing pass rejects.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        let register = self
            .clbits
            .get(clbit.index())
            .ok_or(IrError::ClbitNotFound {
                clbit,
                op_name: Some("measure".into()),
            })?
            .register
            .clone();
        let instruction = match register {
            Some(name) => Instruction::measure_named(name, qubit, clbit),
            None => Instruction::measure(qubit, clbit),
        };
        self.append(instruction)
    }

    /// Measure every qubit into the classical bit of the same index.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        if self.qubits.len() > self.clbits.len() {
            return Err(IrError::MeasureWidthMismatch {
                qubits: self.qubits.len(),
                clbits: self.clbits.len(),
            });
        }
        for i in 0..self.qubits.len() {
            self.measure(QubitId::from(i), ClbitId::from(i))?;
        }
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::reset(qubit))
    }

    /// Insert a barrier across the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.append(Instruction::barrier(qubits))
    }

    // --- accessors ---

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the circuit depth.
    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// Borrow the underlying DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Consume the circuit, returning its DAG.
    pub fn into_dag(self) -> CircuitDag {
        self.dag
    }

    /// Get the qubit metadata.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Get the classical bit metadata.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// Rebuild the DAG from the stored instruction list.
    ///
    /// The DAG is skipped during serialization; call this after
    /// deserializing to restore it.
    pub fn rebuild_dag(&mut self) -> IrResult<()> {
        let mut dag = CircuitDag::new();
        for qubit in &self.qubits {
            dag.add_qubit(qubit.id);
        }
        for clbit in &self.clbits {
            dag.add_clbit(clbit.id);
        }
        for instruction in &self.instructions {
            dag.apply(instruction.clone())?;
        }
        self.dag = dag;
        Ok(())
    }

    // --- sample circuits ---

    /// A two-qubit Bell pair with measurements.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit.h(QubitId(0))?;
        circuit.cx(QubitId(0), QubitId(1))?;
        circuit.measure_all()?;
        Ok(circuit)
    }

    /// An n-qubit GHZ state with measurements.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        circuit.h(QubitId(0))?;
        for i in 1..n {
            circuit.cx(QubitId(i - 1), QubitId(i))?;
        }
        circuit.measure_all()?;
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_registers() {
        let circuit = Circuit::with_size("t", 3, 2);
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.qubits()[1].register.as_deref(), Some("q"));
        assert_eq!(circuit.clbits()[0].register.as_deref(), Some("c"));
    }

    #[test]
    fn test_measure_stamps_register_name() {
        let mut circuit = Circuit::with_size("t", 1, 1);
        circuit.h(QubitId(0)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();

        let dag = circuit.into_dag();
        let measure = dag
            .topological_ops()
            .map(|(_, inst)| inst)
            .find(|inst| inst.is_measure())
            .unwrap();
        assert_eq!(measure.measure_register(), Some("c"));
    }

    #[test]
    fn test_measure_into_anonymous_clbit_is_unnamed() {
        let mut circuit = Circuit::new("t");
        let q = circuit.add_qubit();
        let c = circuit.add_clbit();
        circuit.measure(q, c).unwrap();

        let dag = circuit.into_dag();
        let measure = dag
            .topological_ops()
            .map(|(_, inst)| inst)
            .find(|inst| inst.is_measure())
            .unwrap();
        assert_eq!(measure.measure_register(), None);
    }

    #[test]
    fn test_bell() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.dag().num_ops(), 4);
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_ghz_chain() {
        let circuit = Circuit::ghz(4).unwrap();
        let two_qubit_gates = circuit
            .dag()
            .topological_ops()
            .filter(|(_, inst)| inst.needs_adjacency())
            .count();
        assert_eq!(two_qubit_gates, 3);
    }

    #[test]
    fn test_serde_round_trip_keeps_instructions() {
        let circuit = Circuit::bell().unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let mut restored: Circuit = serde_json::from_str(&json).unwrap();
        restored.rebuild_dag().unwrap();
        assert_eq!(restored.name(), "bell");
        assert_eq!(restored.dag().num_ops(), 4);
        assert_eq!(restored.num_qubits(), 2);
    }
}
