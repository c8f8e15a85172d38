//! Error types for the mapping pipeline.
//!
//! Errors fall into four classes: configuration errors (bad device
//! specifications, missing files, empty devices), capacity errors (the
//! program needs more qubits than the device has), structural errors
//! (circuits a routing pass cannot accept, usually the sign of a bug in
//! an earlier compilation stage), and routing divergence (the defensive
//! iteration cap). All of them abort the enclosing pass pipeline; there
//! is no partial output.

use alsvin_ir::IrError;
use thiserror::Error;

use crate::device::PhysQubit;

/// Errors that can occur during compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Unknown topology name in a device specification.
    #[error("Unknown device topology in '{spec}'")]
    UnknownTopology {
        /// The full specification string as given.
        spec: String,
    },

    /// A device specification that does not match the grammar.
    #[error("Malformed device specification '{spec}': {reason}")]
    MalformedDeviceSpec {
        /// The full specification string as given.
        spec: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The device file named by a `file(...)` specification is missing.
    #[error("Device file '{path}' does not exist")]
    DeviceFileNotFound {
        /// The path as given in the specification.
        path: String,
    },

    /// The device file exists but could not be parsed.
    #[error("Malformed device file '{path}' at line {line}: {reason}")]
    MalformedDeviceFile {
        /// The path of the file.
        path: String,
        /// 1-based line of the offending entry.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A device with zero qubits cannot be targeted.
    #[error("Trying to target an empty device")]
    EmptyDevice,

    /// An edge references a qubit outside the device.
    #[error("Device edge ({q1}, {q2}) is out of range for {num_qubits} qubits")]
    EdgeOutOfRange {
        /// First endpoint.
        q1: u32,
        /// Second endpoint.
        q2: u32,
        /// Number of qubits on the device.
        num_qubits: u32,
    },

    /// The program uses more qubits than the device provides.
    #[error(
        "Device has fewer qubits [{physical}] than the program is attempting to use [{requested}]"
    )]
    DeviceTooSmall {
        /// Physical qubits available.
        physical: u32,
        /// Virtual qubits requested by the program.
        requested: u32,
    },

    /// Two program qubits sit in disconnected components of the device.
    #[error("Physical qubits {q1} and {q2} are not reachable from each other")]
    DisconnectedQubits {
        /// First physical qubit.
        q1: PhysQubit,
        /// Second physical qubit.
        q2: PhysQubit,
    },

    /// A classically conditioned gate implies control flow, which the
    /// router cannot schedule.
    #[error("Cannot route a circuit with classically conditioned operations (gate '{gate}')")]
    ConditionedGate {
        /// Name of the offending gate.
        gate: String,
    },

    /// A measurement without a result register name cannot be correlated
    /// back to the source program.
    #[error("Measurements must carry a result register name in the routing pass")]
    UnnamedMeasurement,

    /// A gate with more than two qubit operands cannot be routed.
    #[error("Cannot route gate '{gate}' with {qubits} qubit operands")]
    UnsupportedGateArity {
        /// Name of the offending gate.
        gate: String,
        /// Its qubit operand count.
        qubits: usize,
    },

    /// The circuit DAG is not in value form; an earlier stage is broken.
    #[error("Circuit is not in value form: {0}")]
    NotValueForm(String),

    /// The swap-search iteration cap was exceeded.
    #[error("Routing did not converge after {searches} swap searches")]
    RoutingDiverged {
        /// Number of searches performed before giving up.
        searches: usize,
    },

    /// An underlying IR operation failed.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
