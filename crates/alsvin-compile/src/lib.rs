//! Alsvin Qubit Mapping Pipeline
//!
//! This crate lowers logical circuits onto a physical device: it assigns
//! every virtual qubit a device position and inserts SWAP gates so that
//! every two-qubit gate acts on physically adjacent qubits. The core is
//! a SABRE-style router: frontier scheduling over the circuit's dataflow
//! graph, a cost-based swap heuristic with bounded lookahead, and decay
//! tie-breaking to avoid swap thrashing.
//!
//! # Architecture
//!
//! ```text
//! Logical CircuitDag
//!       │
//!       ▼
//! ┌─────────────┐
//! │ PassManager │ ◄── PropertySet (device, placement, final mapping)
//! └─────────────┘
//!       │
//!       └── SabreRouting (validate → place → route → prune → publish)
//!       │
//!       ▼
//! Physical CircuitDag + FinalMapping
//! ```
//!
//! # Example
//!
//! ```rust
//! use alsvin_compile::{DeviceSpec, FinalMapping, PassManagerBuilder};
//! use alsvin_ir::Circuit;
//!
//! let circuit = Circuit::ghz(4).unwrap();
//!
//! let spec: DeviceSpec = "grid(2,2)".parse().unwrap();
//! let (pm, mut props) = PassManagerBuilder::new(spec).build();
//!
//! let mut dag = circuit.into_dag();
//! pm.run(&mut dag, &mut props).unwrap();
//!
//! // Every two-qubit gate now acts on adjacent device qubits, and the
//! // published mapping recovers program qubit order from device data.
//! let mapping = props.get::<FinalMapping>().unwrap();
//! assert_eq!(mapping.len(), 4);
//! ```
//!
//! # Devices
//!
//! Targets are described by a specification string,
//! `name[(dim1[,dim2])]` with `name ∈ {path, ring, star, grid, file}`:
//! `path(5)`, `ring(4)`, `star(5,0)`, `grid(3,3)`,
//! `file(/path/to/edges.txt)`. Dimensions may be omitted and are then
//! inferred from the program's qubit count.
//!
//! # Diagnostics
//!
//! The router narrates layer contents and swap choices at `debug`/`trace`
//! level through [`tracing`]; enable it with `RUST_LOG` and a
//! `tracing-subscriber` env filter. Logging has no behavioral effect.

pub mod device;
pub mod error;
pub mod manager;
pub mod pass;
pub mod placement;
pub mod property;

// Built-in passes
pub mod passes;

pub use device::{Device, DeviceSpec, PhysQubit};
pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use passes::{SabreConfig, SabreRouting};
pub use placement::Placement;
pub use property::{FinalMapping, PropertySet};
