//! DAG-based circuit representation.
//!
//! The circuit is a directed acyclic graph in which every qubit and
//! classical bit is one *wire*: an `In` node, the chain of operation nodes
//! consuming and re-producing the wire's value, and an `Out` node. An edge
//! is one value of the wire between two operations, so the graph is the
//! program's dataflow in value form: an operation is ready to schedule
//! exactly when every edge entering it originates from an already
//! scheduled node.

use petgraph::Direction;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
///
/// Indices are stable across node removals, so handles held by a pass
/// survive ancilla pruning.
pub type NodeIndex = petgraph::stable_graph::NodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge in the circuit DAG: one value of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// The abstraction level of a circuit in the compilation pipeline.
///
/// Circuits start at the `Logical` level (virtual qubits); the routing
/// pass lowers them to the `Physical` level, where qubit identifiers are
/// device positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CircuitLevel {
    /// Logical level: qubits are abstract, no physical mapping applied.
    #[default]
    Logical,
    /// Physical level: qubit identifiers are device positions.
    Physical,
}

/// DAG-based circuit representation.
///
/// ## Performance
///
/// The DAG maintains a `wire_front` index mapping each wire to the last
/// node before its output node, so `apply()` threads a new operation onto
/// its wires in O(1) per operand instead of scanning the output node's
/// incoming edges.
#[derive(Debug, Clone)]
pub struct CircuitDag {
    /// The underlying graph.
    graph: StableDiGraph<DagNode, DagEdge, u32>,
    /// Map from qubit to its (input, output) node pair.
    qubit_io: FxHashMap<QubitId, (NodeIndex, NodeIndex)>,
    /// Map from classical bit to its (input, output) node pair.
    clbit_io: FxHashMap<ClbitId, (NodeIndex, NodeIndex)>,
    /// Wire front: maps each wire to the node just before the output node.
    wire_front: FxHashMap<WireId, NodeIndex>,
    /// Abstraction level of the circuit.
    level: CircuitLevel,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::default(),
            qubit_io: FxHashMap::default(),
            clbit_io: FxHashMap::default(),
            wire_front: FxHashMap::default(),
            level: CircuitLevel::Logical,
        }
    }

    /// Add a qubit wire to the circuit.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        if self.qubit_io.contains_key(&qubit) {
            return;
        }
        let wire = WireId::Qubit(qubit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.qubit_io.insert(qubit, (in_node, out_node));
        self.wire_front.insert(wire, in_node);
    }

    /// Add a classical wire to the circuit.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        if self.clbit_io.contains_key(&clbit) {
            return;
        }
        let wire = WireId::Clbit(clbit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.clbit_io.insert(clbit, (in_node, out_node));
        self.wire_front.insert(wire, in_node);
    }

    /// Append an instruction, threading it onto its operand wires.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        let op_name = Some(instruction.name().to_string());

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = u32::try_from(instruction.qubits.len()).unwrap_or(u32::MAX);
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }
        if instruction.is_measure() && instruction.qubits.len() != instruction.clbits.len() {
            return Err(IrError::MeasureWidthMismatch {
                qubits: instruction.qubits.len(),
                clbits: instruction.clbits.len(),
            });
        }
        if instruction.qubits.is_empty() {
            return Err(IrError::InvalidDag(
                "Instruction consumes no qubit wires".into(),
            ));
        }

        for &qubit in &instruction.qubits {
            if !self.qubit_io.contains_key(&qubit) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    op_name: op_name.clone(),
                });
            }
        }
        for &clbit in &instruction.clbits {
            if !self.clbit_io.contains_key(&clbit) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    op_name: op_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    op_name: op_name.clone(),
                });
            }
        }

        let wires: Vec<WireId> = instruction
            .qubits
            .iter()
            .map(|&q| WireId::Qubit(q))
            .chain(instruction.clbits.iter().map(|&c| WireId::Clbit(c)))
            .collect();

        let op_node = self.graph.add_node(DagNode::Op(instruction));

        for wire in wires {
            let out_node = self.wire_output(wire);
            let prev_node = self.wire_front[&wire];

            // Re-route the wire's final edge through the new operation.
            let edge_id = self
                .graph
                .edges_directed(prev_node, Direction::Outgoing)
                .find(|e| e.weight().wire == wire && e.target() == out_node)
                .map(|e| e.id())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!("Broken wire front for {wire:?}"))
                })?;
            self.graph.remove_edge(edge_id);
            self.graph.add_edge(prev_node, op_node, DagEdge { wire });
            self.graph.add_edge(op_node, out_node, DagEdge { wire });
            self.wire_front.insert(wire, op_node);
        }

        Ok(op_node)
    }

    fn wire_output(&self, wire: WireId) -> NodeIndex {
        match wire {
            WireId::Qubit(q) => self.qubit_io[&q].1,
            WireId::Clbit(c) => self.clbit_io[&c].1,
        }
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(DagNode::instruction)
    }

    /// Get the DAG node by index.
    #[inline]
    pub fn node(&self, node: NodeIndex) -> Option<&DagNode> {
        self.graph.node_weight(node)
    }

    /// Iterate over operation nodes in ascending index order.
    ///
    /// Ascending index order is insertion order, which downstream passes
    /// rely on for deterministic tie-breaking.
    pub fn op_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].is_op())
    }

    /// Number of edges entering a node.
    #[inline]
    pub fn in_degree(&self, node: NodeIndex) -> usize {
        self.graph.edges_directed(node, Direction::Incoming).count()
    }

    /// Targets of all edges leaving a node, one entry per edge.
    ///
    /// An operation consuming two wires produced by the same predecessor
    /// appears twice, matching its in-degree count.
    pub fn out_edge_targets(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| e.target())
    }

    /// The input node of a qubit wire.
    pub fn qubit_input(&self, qubit: QubitId) -> Option<NodeIndex> {
        self.qubit_io.get(&qubit).map(|&(i, _)| i)
    }

    /// The input node of a classical wire.
    pub fn clbit_input(&self, clbit: ClbitId) -> Option<NodeIndex> {
        self.clbit_io.get(&clbit).map(|&(i, _)| i)
    }

    /// Whether a qubit wire carries no operations (input feeds output
    /// directly).
    pub fn qubit_is_idle(&self, qubit: QubitId) -> bool {
        match self.qubit_io.get(&qubit) {
            Some(&(in_node, out_node)) => self
                .graph
                .edges_directed(in_node, Direction::Outgoing)
                .all(|e| e.target() == out_node),
            None => false,
        }
    }

    /// Remove an idle qubit wire from the circuit.
    ///
    /// Fails with [`IrError::QubitInUse`] if any operation touches the
    /// wire; remove operations before removing their qubits.
    pub fn remove_qubit(&mut self, qubit: QubitId) -> IrResult<()> {
        let &(in_node, out_node) = self.qubit_io.get(&qubit).ok_or(IrError::QubitNotFound {
            qubit,
            op_name: None,
        })?;
        if !self.qubit_is_idle(qubit) {
            return Err(IrError::QubitInUse(qubit));
        }
        self.graph.remove_node(in_node);
        self.graph.remove_node(out_node);
        self.qubit_io.remove(&qubit);
        self.wire_front.remove(&WireId::Qubit(qubit));
        Ok(())
    }

    /// Iterate over operations in a deterministic topological order.
    ///
    /// Among unconstrained operations the lowest node index (insertion
    /// order) comes first, so a circuit built in program order reads
    /// back in program order.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        use std::cmp::Reverse;
        use std::collections::BinaryHeap;

        let mut indegree: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut ready = BinaryHeap::new();
        for node in self.graph.node_indices() {
            let d = self.in_degree(node);
            indegree.insert(node, d);
            if d == 0 {
                ready.push(Reverse(node));
            }
        }

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let target = edge.target();
                let d = indegree.get_mut(&target).expect("all nodes are tracked");
                *d -= 1;
                if *d == 0 {
                    ready.push(Reverse(target));
                }
            }
        }
        assert_eq!(
            order.len(),
            self.graph.node_count(),
            "circuit DAG contains a cycle"
        );

        order
            .into_iter()
            .filter_map(|idx| self.graph[idx].instruction().map(|inst| (idx, inst)))
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubit_io.len()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbit_io.len()
    }

    /// Get the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        let io_nodes = 2 * (self.qubit_io.len() + self.clbit_io.len());
        self.graph.node_count().saturating_sub(io_nodes)
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> usize {
        let mut depths: FxHashMap<NodeIndex, usize> = FxHashMap::with_capacity_and_hasher(
            self.graph.node_count(),
            Default::default(),
        );
        let mut max_depth = 0usize;

        for node in petgraph::algo::toposort(&self.graph, None)
            .expect("circuit DAG contains a cycle")
        {
            let max_pred = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            let d = if self.graph[node].is_op() {
                max_pred + 1
            } else {
                max_pred
            };
            max_depth = max_depth.max(d);
            depths.insert(node, d);
        }

        max_depth
    }

    /// Iterate over qubits in ascending identifier order.
    pub fn qubits(&self) -> Vec<QubitId> {
        let mut qs: Vec<_> = self.qubit_io.keys().copied().collect();
        qs.sort_unstable();
        qs
    }

    /// Iterate over classical bits in ascending identifier order.
    pub fn clbits(&self) -> Vec<ClbitId> {
        let mut cs: Vec<_> = self.clbit_io.keys().copied().collect();
        cs.sort_unstable();
        cs
    }

    /// Get the abstraction level of this circuit.
    pub fn level(&self) -> CircuitLevel {
        self.level
    }

    /// Set the abstraction level of this circuit.
    pub fn set_level(&mut self, level: CircuitLevel) {
        self.level = level;
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &StableDiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that the graph is acyclic and that every wire forms an
    /// unbroken path from its input node to its output node. A circuit
    /// failing this check is not in value form and cannot be scheduled.
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        let wires: Vec<(WireId, NodeIndex, NodeIndex)> = self
            .qubit_io
            .iter()
            .map(|(&q, &(i, o))| (WireId::Qubit(q), i, o))
            .chain(
                self.clbit_io
                    .iter()
                    .map(|(&c, &(i, o))| (WireId::Clbit(c), i, o)),
            )
            .collect();

        for (wire, in_node, out_node) in wires {
            let mut current = in_node;
            let mut steps = 0;
            while current != out_node {
                let next = self
                    .graph
                    .edges_directed(current, Direction::Outgoing)
                    .find(|e| e.weight().wire == wire)
                    .map(|e| e.target());
                match next {
                    Some(n) => current = n,
                    None => {
                        return Err(IrError::InvalidDag(format!(
                            "Wire {wire:?} is broken: no outgoing edge from {current:?}"
                        )));
                    }
                }
                steps += 1;
                if steps > self.graph.node_count() {
                    return Err(IrError::InvalidDag(format!(
                        "Wire {wire:?} does not terminate at its output node"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for CircuitDag {
    fn default() -> Self {
        Self::new()
    }
}
