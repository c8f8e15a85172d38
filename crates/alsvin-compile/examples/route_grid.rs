//! Route a GHZ circuit onto a 3×3 grid and print the result.
//!
//! Run with step-by-step router tracing:
//!
//! ```sh
//! RUST_LOG=alsvin_compile=trace cargo run -p alsvin-compile --example route_grid
//! ```

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use alsvin_compile::{DeviceSpec, FinalMapping, PassManagerBuilder};
use alsvin_ir::Circuit;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let circuit = Circuit::ghz(9)?;
    println!(
        "input:  {} qubits, {} ops, depth {}",
        circuit.num_qubits(),
        circuit.dag().num_ops(),
        circuit.depth()
    );

    let spec: DeviceSpec = "grid(3,3)".parse()?;
    let (pm, mut props) = PassManagerBuilder::new(spec).build();

    let mut dag = circuit.into_dag();
    pm.run(&mut dag, &mut props)?;

    println!(
        "routed: {} qubits, {} ops, depth {}",
        dag.num_qubits(),
        dag.num_ops(),
        dag.depth()
    );

    println!("\nphysical instruction stream:");
    for (_, inst) in dag.topological_ops() {
        let qubits: Vec<String> = inst.qubits.iter().map(ToString::to_string).collect();
        println!("  {:8} {}", inst.name(), qubits.join(", "));
    }

    let mapping = props
        .get::<FinalMapping>()
        .expect("routing publishes the final mapping");
    println!("\nfinal virtual -> physical mapping:");
    for (v, p) in mapping.as_slice().iter().enumerate() {
        println!("  q{v} -> {p}");
    }

    Ok(())
}
