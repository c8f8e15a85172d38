//! Alsvin Circuit Intermediate Representation
//!
//! This crate provides the circuit IR consumed by the Alsvin mapping
//! pipeline. A circuit is a dataflow graph: every qubit and classical bit
//! is a wire threaded from an input node through the operations that
//! consume it to an output node. The graph form makes data dependencies
//! explicit, which is what the routing passes in `alsvin-compile` schedule
//! against.
//!
//! # Overview
//!
//! - [`Circuit`]: builder facade with named registers and gate helpers
//! - [`CircuitDag`]: the wire-threaded dependency graph
//! - [`Instruction`] / [`InstructionKind`]: closed set of operations
//! - [`StandardGate`] / [`Gate`]: the gate vocabulary
//! - [`QubitId`] / [`ClbitId`]: opaque wire identifiers
//!
//! # Example
//!
//! ```
//! use alsvin_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! let dag = circuit.into_dag();
//! assert_eq!(dag.num_ops(), 4);
//! ```

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{CircuitDag, CircuitLevel, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{ClassicalCondition, CustomGate, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId};
