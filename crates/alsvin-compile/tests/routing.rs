//! Integration tests for the mapping pipeline.
//!
//! These tests exercise the full pass pipeline the way a toolchain
//! would: build a logical circuit, route it against a device, and check
//! the routed stream and the published mapping.

use proptest::prelude::*;

use alsvin_compile::{
    CompileError, Device, DeviceSpec, FinalMapping, PassManagerBuilder, PhysQubit, PropertySet,
    SabreRouting,
};
use alsvin_compile::Pass;
use alsvin_ir::{Circuit, CircuitDag, CircuitLevel, QubitId};

/// Route a circuit against a device specification string.
fn route(circuit: Circuit, spec: &str) -> Result<(CircuitDag, PropertySet), CompileError> {
    let spec: DeviceSpec = spec.parse()?;
    let (pm, mut props) = PassManagerBuilder::new(spec).build();
    let mut dag = circuit.into_dag();
    pm.run(&mut dag, &mut props)?;
    Ok((dag, props))
}

/// Check that every two-qubit gate sits on a device edge.
fn assert_adjacent(dag: &CircuitDag, device: &Device) {
    for (_, inst) in dag.topological_ops() {
        if inst.needs_adjacency() {
            let p0 = PhysQubit(inst.qubits[0].0);
            let p1 = PhysQubit(inst.qubits[1].0);
            assert!(
                device.are_connected(p0, p1),
                "{} acts on non-adjacent qubits {p0}, {p1}",
                inst.name()
            );
        }
    }
}

/// Count operations of a given name in a DAG.
fn count_ops(dag: &CircuitDag, name: &str) -> usize {
    dag.topological_ops()
        .filter(|(_, inst)| inst.name() == name)
        .count()
}

// ============================================================================
// End-to-end routing
// ============================================================================

#[test]
fn test_ghz_on_grid() {
    let circuit = Circuit::ghz(9).unwrap();
    let ops_before = circuit.dag().num_ops();

    let (dag, props) = route(circuit, "grid(3,3)").unwrap();
    let device = props.device.as_ref().unwrap();

    assert_eq!(dag.level(), CircuitLevel::Physical);
    assert_adjacent(&dag, device);

    // Every original operation survives; only swaps are added.
    let swaps = count_ops(&dag, "swap");
    assert_eq!(dag.num_ops(), ops_before + swaps);
    assert_eq!(count_ops(&dag, "measure"), 9);
}

#[test]
fn test_all_to_all_program_on_path() {
    // Pairwise interactions between all five qubits: the worst case for
    // a path, forcing plenty of swaps.
    let mut circuit = Circuit::with_size("dense", 5, 5);
    for i in 0..5u32 {
        for j in (i + 1)..5u32 {
            circuit.cz(QubitId(i), QubitId(j)).unwrap();
        }
    }
    circuit.measure_all().unwrap();

    let (dag, props) = route(circuit, "path(5)").unwrap();
    assert_adjacent(&dag, props.device.as_ref().unwrap());
    assert!(count_ops(&dag, "swap") > 0);
    assert_eq!(count_ops(&dag, "cz"), 10);
}

#[test]
fn test_final_mapping_reorders_device_data() {
    let mut circuit = Circuit::with_size("t", 3, 3);
    circuit.x(QubitId(2)).unwrap();
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    circuit.measure_all().unwrap();

    let (dag, props) = route(circuit, "path(3)").unwrap();
    let mapping = props.get::<FinalMapping>().unwrap();

    // Mapping is a total injection over program qubits.
    let mut positions: Vec<PhysQubit> = mapping.as_slice().to_vec();
    positions.sort_unstable();
    positions.dedup();
    assert_eq!(positions.len(), 3);

    // Data indexed by device position permutes back into program order.
    let per_device: Vec<usize> = (0..dag.num_qubits()).collect();
    let per_program = mapping.reorder(&per_device);
    for (v, &p) in per_program.iter().enumerate() {
        assert_eq!(PhysQubit(p as u32), mapping.phys(QubitId(v as u32)));
    }
}

#[test]
fn test_terminal_measurements_come_after_swaps() {
    let mut circuit = Circuit::with_size("t", 4, 4);
    circuit.cx(QubitId(0), QubitId(3)).unwrap();
    circuit.cx(QubitId(1), QubitId(2)).unwrap();
    circuit.measure_all().unwrap();

    let (dag, _) = route(circuit, "path(4)").unwrap();
    let names: Vec<&str> = dag.topological_ops().map(|(_, inst)| inst.name()).collect();

    let last_swap = names.iter().rposition(|&n| n == "swap").unwrap();
    let first_measure = names.iter().position(|&n| n == "measure").unwrap();
    assert!(last_swap < first_measure, "stream was {names:?}");
}

// ============================================================================
// Device files
// ============================================================================

#[test]
fn test_route_against_device_file() {
    // A 4-qubit ring, written the way a hardware description would be.
    let path = std::env::temp_dir().join("alsvin-test-ring4.txt");
    std::fs::write(
        &path,
        "# four qubit ring\n4\n0 1\n1 2\n2 3\n3 0\n",
    )
    .unwrap();

    let mut circuit = Circuit::with_size("t", 4, 4);
    circuit.cx(QubitId(0), QubitId(3)).unwrap();
    circuit.measure_all().unwrap();

    let spec = format!("file({})", path.display());
    let (dag, props) = route(circuit, &spec).unwrap();
    assert_eq!(count_ops(&dag, "swap"), 0);
    assert_adjacent(&dag, props.device.as_ref().unwrap());

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_missing_device_file_is_fatal() {
    let circuit = Circuit::bell().unwrap();
    let err = route(circuit, "file(/no/such/alsvin/device.txt)").unwrap_err();
    assert!(matches!(err, CompileError::DeviceFileNotFound { .. }));
}

// ============================================================================
// Disconnected devices
// ============================================================================

#[test]
fn test_disconnected_program_qubits_rejected() {
    let device = Device::from_edges(4, [(0, 1), (2, 3)]).unwrap();
    let mut circuit = Circuit::with_size("t", 4, 0);
    circuit.cx(QubitId(0), QubitId(3)).unwrap();

    let mut dag = circuit.into_dag();
    let mut props = PropertySet::new().with_device(device);
    let pass = SabreRouting::new("path".parse().unwrap());
    let err = pass.run(&mut dag, &mut props).unwrap_err();
    assert!(matches!(err, CompileError::DisconnectedQubits { .. }));
}

// ============================================================================
// Property: routed circuits respect connectivity
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn routed_two_qubit_gates_are_adjacent(
        n in 2u32..7,
        ops in proptest::collection::vec((0u32..7, 0u32..7), 1..24),
        use_grid in proptest::bool::ANY,
    ) {
        let mut circuit = Circuit::with_size("prop", n, n);
        let mut applied = 0usize;
        for (a, b) in ops {
            let (a, b) = (a % n, b % n);
            if a == b {
                circuit.h(QubitId(a)).unwrap();
            } else {
                circuit.cx(QubitId(a), QubitId(b)).unwrap();
            }
            applied += 1;
        }
        circuit.measure_all().unwrap();

        let spec = if use_grid { "grid" } else { "path" };
        let (dag, props) = route(circuit, spec).unwrap();
        let device = props.device.as_ref().unwrap();

        for (_, inst) in dag.topological_ops() {
            if inst.needs_adjacency() {
                let p0 = PhysQubit(inst.qubits[0].0);
                let p1 = PhysQubit(inst.qubits[1].0);
                prop_assert!(device.are_connected(p0, p1));
            }
        }

        // Nothing is lost: original ops survive, swaps are the only additions.
        let swaps = count_ops(&dag, "swap");
        prop_assert_eq!(dag.num_ops(), applied + n as usize + swaps);

        // The published mapping stays a total injection.
        let mapping = props.get::<FinalMapping>().unwrap();
        let mut positions: Vec<PhysQubit> = mapping.as_slice().to_vec();
        positions.sort_unstable();
        positions.dedup();
        prop_assert_eq!(positions.len(), n as usize);
    }
}
