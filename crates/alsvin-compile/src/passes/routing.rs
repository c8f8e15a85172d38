//! SABRE-style routing: scheduling with SWAP insertion.
//!
//! The router walks the circuit's dataflow graph with three layers of
//! pending operations. The *front layer* holds operations whose
//! predecessors have all been scheduled; anything mappable in it is
//! emitted immediately. When nothing in the front layer is mappable, the
//! router scores every SWAP on a device edge touching a stuck operation
//! and applies the cheapest one, biased by a bounded lookahead (the
//! *extended layer*) and a per-qubit decay penalty that spreads SWAPs
//! instead of thrashing the same edge. Ready measurements are parked in
//! a third layer and released only once nothing else can be scheduled
//! without a SWAP, so final measurements land at the end of the program
//! free of topology constraints.
//!
//! The emitted stream is rebuilt into a fresh physical-level circuit in
//! schedule order, which is a valid topological order by construction.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::{debug, info, trace};

use alsvin_ir::{
    CircuitDag, CircuitLevel, Instruction, InstructionKind, NodeIndex, QubitId, StandardGate,
};

use crate::device::{Device, DeviceSpec, PhysQubit};
use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::placement::Placement;
use crate::property::{FinalMapping, PropertySet};

/// Heuristic parameters for the SABRE router.
///
/// The defaults follow the published algorithm; they are exposed so the
/// router has no hidden tuning state.
#[derive(Debug, Clone, PartialEq)]
pub struct SabreConfig {
    /// Maximum size of the lookahead (extended) layer.
    pub extended_layer_size: usize,
    /// Weight of the extended layer in the swap score.
    pub extended_layer_weight: f64,
    /// Decay increment for each qubit of a chosen swap.
    pub decay_delta: f64,
    /// Number of swap searches between decay resets.
    pub decay_reset_interval: usize,
    /// Hard cap on swap searches; exceeding it aborts routing.
    pub max_swap_searches: usize,
}

impl Default for SabreConfig {
    fn default() -> Self {
        Self {
            extended_layer_size: 20,
            extended_layer_weight: 0.5,
            decay_delta: 0.5,
            decay_reset_interval: 5,
            max_swap_searches: 10_000,
        }
    }
}

/// The SABRE routing pass.
///
/// Validates the circuit, builds the device from its specification
/// (unless one is already present in the `PropertySet`), routes, prunes
/// unused trailing ancillas, and publishes the final placement and the
/// [`FinalMapping`] artifact.
pub struct SabreRouting {
    spec: DeviceSpec,
    config: SabreConfig,
}

impl SabreRouting {
    /// Create the pass with default heuristic parameters.
    pub fn new(spec: DeviceSpec) -> Self {
        Self {
            spec,
            config: SabreConfig::default(),
        }
    }

    /// Create the pass with explicit heuristic parameters.
    pub fn with_config(spec: DeviceSpec, config: SabreConfig) -> Self {
        Self { spec, config }
    }

    /// Reject circuits the router cannot schedule.
    ///
    /// Conditioned gates imply control flow, unnamed measurements cannot
    /// be correlated with program results, and gates on more than two
    /// qubits must be decomposed before routing. A broken wire structure
    /// means an earlier stage did not produce value form.
    fn preflight(dag: &CircuitDag) -> CompileResult<()> {
        for node in dag.op_nodes() {
            let inst = dag.instruction(node).expect("op node holds instruction");
            match &inst.kind {
                InstructionKind::Gate(gate) => {
                    if gate.is_conditioned() {
                        return Err(CompileError::ConditionedGate {
                            gate: gate.name().to_string(),
                        });
                    }
                    if inst.qubits.len() > 2 {
                        return Err(CompileError::UnsupportedGateArity {
                            gate: gate.name().to_string(),
                            qubits: inst.qubits.len(),
                        });
                    }
                }
                InstructionKind::Measure { register } => {
                    if register.is_none() {
                        return Err(CompileError::UnnamedMeasurement);
                    }
                }
                InstructionKind::Reset | InstructionKind::Barrier => {}
            }
        }
        dag.verify_integrity()
            .map_err(|e| CompileError::NotValueForm(e.to_string()))
    }
}

impl Pass for SabreRouting {
    fn name(&self) -> &str {
        "sabre_routing"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        Self::preflight(dag)?;

        let program_qubits =
            u32::try_from(dag.num_qubits()).expect("qubit count exceeds u32::MAX");

        let device = match properties.device.take() {
            Some(device) => device,
            None => self.spec.build(program_qubits)?,
        };

        if program_qubits > device.num_qubits() {
            return Err(CompileError::DeviceTooSmall {
                physical: device.num_qubits(),
                requested: program_qubits,
            });
        }

        // Identity placement puts program qubit v on physical v; every
        // pair of program qubits must be mutually reachable.
        for v in 1..program_qubits {
            if device.distance(PhysQubit(0), PhysQubit(v)).is_none() {
                return Err(CompileError::DisconnectedQubits {
                    q1: PhysQubit(0),
                    q2: PhysQubit(v),
                });
            }
        }

        let mut router = SabreRouter::new(&device, &self.config);
        let mut routed = router.route(dag)?;

        // Prune trailing ancilla wires no operation ever consumed,
        // highest index first, stopping at the first used one. Removing
        // from the middle would renumber positions and invalidate the
        // published mapping.
        for v in (program_qubits..device.num_qubits()).rev() {
            let qubit = QubitId(v);
            if routed.qubit_is_idle(qubit) {
                routed.remove_qubit(qubit)?;
            } else {
                break;
            }
        }

        info!(
            swaps = router.swaps_inserted,
            searches = router.swap_searches,
            qubits = routed.num_qubits(),
            "sabre routing complete"
        );

        let final_mapping = FinalMapping::new(
            (0..program_qubits)
                .map(|v| router.placement.phys(QubitId(v)))
                .collect(),
        );
        properties.insert(final_mapping);
        properties.placement = Some(router.placement);
        properties.device = Some(device);

        routed.set_level(CircuitLevel::Physical);
        *dag = routed;
        Ok(())
    }
}

/// One routing run over a single circuit.
///
/// Owns the mutable scheduling state: the live placement, the decay
/// counters, the three layers and the per-operation readiness counts.
struct SabreRouter<'a> {
    device: &'a Device,
    config: &'a SabreConfig,
    placement: Placement,

    /// Per-physical-qubit decay counters.
    decay: Vec<f64>,
    /// Ready, not yet emitted operations.
    front_layer: Vec<NodeIndex>,
    /// Lookahead window used only to bias swap scores.
    extended_layer: Vec<NodeIndex>,
    /// Ready measurements held back until deferral flips.
    measure_layer: Vec<NodeIndex>,
    /// Physical qubits of currently stuck operations, sorted for
    /// deterministic candidate enumeration.
    involved: BTreeSet<PhysQubit>,

    /// Total in-edges per operation node.
    in_degree: FxHashMap<NodeIndex, usize>,
    /// In-edges whose producer has been scheduled, per operation node.
    resolved: FxHashMap<NodeIndex, usize>,

    /// Whether measurements may enter the front layer.
    allow_measurements: bool,

    /// The physical-level output circuit under construction.
    out: CircuitDag,

    swap_searches: usize,
    swaps_inserted: usize,
}

impl<'a> SabreRouter<'a> {
    fn new(device: &'a Device, config: &'a SabreConfig) -> Self {
        Self {
            device,
            config,
            placement: Placement::identity(device.num_qubits()),
            decay: vec![1.0; device.num_qubits() as usize],
            front_layer: vec![],
            extended_layer: vec![],
            measure_layer: vec![],
            involved: BTreeSet::new(),
            in_degree: FxHashMap::default(),
            resolved: FxHashMap::default(),
            allow_measurements: false,
            out: CircuitDag::new(),
            swap_searches: 0,
            swaps_inserted: 0,
        }
    }

    /// Route the circuit, producing the physical-level output stream.
    fn route(&mut self, dag: &CircuitDag) -> CompileResult<CircuitDag> {
        // The output carries one wire per device position (positions the
        // program never reaches are pruned by the driver afterwards) and
        // the input's classical wires unchanged.
        for p in 0..self.device.num_qubits() {
            self.out.add_qubit(QubitId(p));
        }
        for clbit in dag.clbits() {
            self.out.add_clbit(clbit);
        }

        // Readiness counters. An operation is ready when every edge into
        // it comes from a scheduled node; input nodes count as scheduled
        // from the start.
        for op in dag.op_nodes() {
            self.in_degree.insert(op, dag.in_degree(op));
            self.resolved.insert(op, 0);
        }
        let inputs: Vec<NodeIndex> = dag
            .qubits()
            .into_iter()
            .filter_map(|q| dag.qubit_input(q))
            .chain(dag.clbits().into_iter().filter_map(|c| dag.clbit_input(c)))
            .collect();
        for input in inputs {
            for target in dag.out_edge_targets(input) {
                if let Some(r) = self.resolved.get_mut(&target) {
                    *r += 1;
                }
            }
        }
        // Collect the initial front in program order.
        for op in dag.op_nodes() {
            if self.resolved[&op] == self.in_degree[&op] {
                self.dispatch_ready(dag, op);
            }
        }

        loop {
            // Once the front layer drains, release the held measurements
            // and go one more round; the second drain ends routing.
            if self.front_layer.is_empty() {
                if self.allow_measurements {
                    break;
                }
                self.allow_measurements = true;
                self.front_layer = std::mem::take(&mut self.measure_layer);
                debug!(
                    released = self.front_layer.len(),
                    "releasing deferred measurements"
                );
                continue;
            }

            if self.map_front_layer(dag)? {
                continue;
            }

            // No progress: a swap is required.
            self.swap_searches += 1;
            if self.swap_searches > self.config.max_swap_searches {
                return Err(CompileError::RoutingDiverged {
                    searches: self.swap_searches,
                });
            }

            let (p0, p1) = self.choose_swap(dag)?;
            self.apply_swap(p0, p1)?;
            self.involved.clear();

            if self.swap_searches % self.config.decay_reset_interval == 0 {
                self.decay.fill(1.0);
            } else {
                self.decay[p0.index()] += self.config.decay_delta;
                self.decay[p1.index()] += self.config.decay_delta;
            }
        }

        Ok(std::mem::take(&mut self.out))
    }

    /// Route a newly ready operation into the front or measurement layer.
    fn dispatch_ready(&mut self, dag: &CircuitDag, op: NodeIndex) {
        let inst = dag.instruction(op).expect("ready node is an operation");
        if inst.is_measure() && !self.allow_measurements {
            self.measure_layer.push(op);
        } else {
            self.front_layer.push(op);
        }
    }

    /// Emit every currently mappable front-layer operation.
    ///
    /// Returns whether at least one operation was emitted. Operations
    /// that stay stuck record their physical qubits for the swap search.
    fn map_front_layer(&mut self, dag: &CircuitDag) -> CompileResult<bool> {
        let layer = std::mem::take(&mut self.front_layer);
        let mut next_layer = Vec::with_capacity(layer.len());
        let mut mapped_any = false;

        trace!(size = layer.len(), "mapping front layer");
        for op in layer {
            let inst = dag.instruction(op).expect("front layer holds operations");
            if inst.needs_adjacency() {
                let p0 = self.placement.phys(inst.qubits[0]);
                let p1 = self.placement.phys(inst.qubits[1]);
                if !self.device.are_connected(p0, p1) {
                    trace!(op = inst.name(), %p0, %p1, "stuck: operands not adjacent");
                    next_layer.push(op);
                    self.involved.insert(p0);
                    self.involved.insert(p1);
                    continue;
                }
            }

            self.emit(inst)?;
            mapped_any = true;
            self.schedule_successors(dag, op, &mut next_layer);
        }

        self.front_layer = next_layer;
        Ok(mapped_any)
    }

    /// Rewire an operation onto its current physical qubits and append
    /// it to the output stream.
    fn emit(&mut self, inst: &Instruction) -> CompileResult<()> {
        let physical = Instruction {
            kind: inst.kind.clone(),
            qubits: inst
                .qubits
                .iter()
                .map(|&v| QubitId(self.placement.phys(v).0))
                .collect(),
            clbits: inst.clbits.clone(),
        };
        trace!(op = inst.name(), qubits = ?physical.qubits, "emit");
        self.out.apply(physical)?;
        Ok(())
    }

    /// Credit the scheduled operation to its successors; newly ready ones
    /// join the given layer (or the measurement layer while deferral is
    /// active).
    fn schedule_successors(
        &mut self,
        dag: &CircuitDag,
        op: NodeIndex,
        layer: &mut Vec<NodeIndex>,
    ) {
        for target in dag.out_edge_targets(op) {
            let Some(r) = self.resolved.get_mut(&target) else {
                continue; // wire output node
            };
            *r += 1;
            if *r == self.in_degree[&target] {
                let inst = dag.instruction(target).expect("ready node is an operation");
                if inst.is_measure() && !self.allow_measurements {
                    self.measure_layer.push(target);
                } else {
                    layer.push(target);
                }
            }
        }
    }

    /// Build the lookahead window: operations reachable from the front
    /// layer by successive levels of readiness, restricted to two-qubit
    /// gates, until the size bound is met.
    ///
    /// Readiness is simulated on a scratch copy of the counters, so
    /// nothing needs to be rolled back afterwards.
    fn select_extended_layer(&mut self, dag: &CircuitDag) {
        self.extended_layer.clear();
        let mut scratch = self.resolved.clone();
        let mut layer = self.front_layer.clone();

        while !layer.is_empty() && self.extended_layer.len() < self.config.extended_layer_size {
            let mut next = vec![];
            for &op in &layer {
                for target in dag.out_edge_targets(op) {
                    let Some(r) = scratch.get_mut(&target) else {
                        continue;
                    };
                    *r += 1;
                    if *r == self.in_degree[&target] {
                        next.push(target);
                    }
                }
            }
            for &op in &next {
                let inst = dag.instruction(op).expect("ready node is an operation");
                if inst.needs_adjacency() {
                    self.extended_layer.push(op);
                }
            }
            layer = next;
        }
    }

    /// Mean over a layer's two-qubit gates of `distance - 1` under the
    /// current placement.
    fn layer_cost(&self, dag: &CircuitDag, layer: &[NodeIndex]) -> CompileResult<f64> {
        let mut total = 0.0;
        let mut count = 0usize;
        for &op in layer {
            let inst = dag.instruction(op).expect("layer holds operations");
            if inst.qubits.len() != 2 {
                continue;
            }
            let p0 = self.placement.phys(inst.qubits[0]);
            let p1 = self.placement.phys(inst.qubits[1]);
            let d = self
                .device
                .distance(p0, p1)
                .ok_or(CompileError::DisconnectedQubits { q1: p0, q2: p1 })?;
            total += d as f64 - 1.0;
            count += 1;
        }
        Ok(if count == 0 { 0.0 } else { total / count as f64 })
    }

    /// Score every swap on a device edge touching a stuck operation and
    /// return the cheapest.
    ///
    /// The score of a candidate is
    /// `max_decay(p0, p1) × (front_mean + weight × extended_mean)` where
    /// each mean is the layer cost above, computed once per layer. Ties
    /// break to the first candidate in enumeration order, which is fixed
    /// by the sorted involved set and sorted adjacency.
    fn choose_swap(&mut self, dag: &CircuitDag) -> CompileResult<(PhysQubit, PhysQubit)> {
        let mut candidates: Vec<(PhysQubit, PhysQubit)> = vec![];
        for &p0 in &self.involved {
            for &p1 in self.device.neighbors(p0) {
                candidates.push((p0, p1));
            }
        }
        if candidates.is_empty() {
            // Stuck operations always involve at least one qubit with a
            // neighbor on a connected device.
            return Err(CompileError::RoutingDiverged {
                searches: self.swap_searches,
            });
        }

        if self.config.extended_layer_size > 0 {
            self.select_extended_layer(dag);
        } else {
            self.extended_layer.clear();
        }

        let mut best = 0usize;
        let mut best_cost = f64::INFINITY;
        for (i, &(p0, p1)) in candidates.iter().enumerate() {
            self.placement.swap(p0, p1);
            let mut cost = self.layer_cost(dag, &self.front_layer)?;
            if !self.extended_layer.is_empty() {
                cost += self.config.extended_layer_weight
                    * self.layer_cost(dag, &self.extended_layer)?;
            }
            let score = self.decay[p0.index()].max(self.decay[p1.index()]) * cost;
            self.placement.swap(p0, p1);

            trace!(%p0, %p1, score, "swap candidate");
            if score < best_cost {
                best_cost = score;
                best = i;
            }
        }

        let (p0, p1) = candidates[best];
        debug!(%p0, %p1, score = best_cost, "selected swap");
        Ok((p0, p1))
    }

    /// Apply a swap to the placement and the output stream.
    fn apply_swap(&mut self, p0: PhysQubit, p1: PhysQubit) -> CompileResult<()> {
        self.placement.swap(p0, p1);
        self.swaps_inserted += 1;
        self.out.apply(Instruction::two_qubit_gate(
            StandardGate::Swap,
            QubitId(p0.0),
            QubitId(p1.0),
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_ir::{Circuit, ClbitId};

    fn route(circuit: Circuit, spec: &str) -> CompileResult<(CircuitDag, PropertySet)> {
        let mut dag = circuit.into_dag();
        let mut props = PropertySet::new();
        let pass = SabreRouting::new(spec.parse()?);
        pass.run(&mut dag, &mut props)?;
        Ok((dag, props))
    }

    /// Every two-qubit gate in the routed stream must sit on a device edge.
    fn assert_adjacent(dag: &CircuitDag, device: &Device) {
        for (_, inst) in dag.topological_ops() {
            if inst.needs_adjacency() {
                let p0 = PhysQubit(inst.qubits[0].0);
                let p1 = PhysQubit(inst.qubits[1].0);
                assert!(
                    device.are_connected(p0, p1),
                    "{} on non-adjacent qubits {p0}, {p1}",
                    inst.name()
                );
            }
        }
    }

    #[test]
    fn test_adjacent_gate_needs_no_swap() {
        let mut circuit = Circuit::with_size("t", 2, 2);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.measure_all().unwrap();

        let (dag, _) = route(circuit, "path(2)").unwrap();
        let swaps = dag
            .topological_ops()
            .filter(|(_, inst)| inst.name() == "swap")
            .count();
        assert_eq!(swaps, 0);
        assert_eq!(dag.level(), CircuitLevel::Physical);
    }

    #[test]
    fn test_distant_gate_inserts_swap() {
        let mut circuit = Circuit::with_size("t", 3, 3);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit.measure(QubitId(2), ClbitId(2)).unwrap();

        let (dag, props) = route(circuit, "path(3)").unwrap();
        let device = props.device.as_ref().unwrap();

        let swaps = dag
            .topological_ops()
            .filter(|(_, inst)| inst.name() == "swap")
            .count();
        assert!(swaps >= 1, "expected at least one swap on path(3)");
        assert_adjacent(&dag, device);
    }

    #[test]
    fn test_ring_chain_needs_no_swaps() {
        let mut circuit = Circuit::with_size("t", 4, 4);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        circuit.cx(QubitId(2), QubitId(3)).unwrap();
        circuit.cx(QubitId(3), QubitId(0)).unwrap();
        circuit.measure_all().unwrap();

        let (dag, _) = route(circuit, "ring(4)").unwrap();
        let swaps = dag
            .topological_ops()
            .filter(|(_, inst)| inst.name() == "swap")
            .count();
        assert_eq!(swaps, 0, "ring(4) provides exactly this adjacency");
    }

    #[test]
    fn test_full_device_never_swaps() {
        let mut circuit = Circuit::with_size("t", 4, 4);
        circuit.cx(QubitId(0), QubitId(3)).unwrap();
        circuit.cx(QubitId(1), QubitId(3)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();

        let mut dag = circuit.into_dag();
        let mut props = PropertySet::new().with_device(Device::full(4).unwrap());
        let pass = SabreRouting::new("path".parse().unwrap());
        pass.run(&mut dag, &mut props).unwrap();

        let swaps = dag
            .topological_ops()
            .filter(|(_, inst)| inst.name() == "swap")
            .count();
        assert_eq!(swaps, 0);
    }

    #[test]
    fn test_capacity_error_before_routing() {
        let circuit = Circuit::with_size("t", 5, 5);
        let err = route(circuit, "grid(2,2)").unwrap_err();
        assert!(matches!(
            err,
            CompileError::DeviceTooSmall {
                physical: 4,
                requested: 5
            }
        ));
    }

    #[test]
    fn test_unnamed_measurement_rejected() {
        let mut circuit = Circuit::new("t");
        let q = circuit.add_qubit();
        let c = circuit.add_clbit();
        circuit.h(q).unwrap();
        circuit.measure(q, c).unwrap();

        let err = route(circuit, "path(2)").unwrap_err();
        assert!(matches!(err, CompileError::UnnamedMeasurement));
    }

    #[test]
    fn test_three_qubit_gate_rejected() {
        let mut circuit = Circuit::with_size("t", 3, 0);
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();

        let err = route(circuit, "path(3)").unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedGateArity { qubits: 3, .. }
        ));
    }

    #[test]
    fn test_conditioned_gate_rejected() {
        use alsvin_ir::{ClassicalCondition, Gate};

        let mut circuit = Circuit::with_size("t", 1, 1);
        circuit
            .gate(
                Gate::standard(StandardGate::X)
                    .with_condition(ClassicalCondition::new("c", 1)),
                [QubitId(0)],
            )
            .unwrap();

        let err = route(circuit, "path(1)").unwrap_err();
        assert!(matches!(err, CompileError::ConditionedGate { .. }));
    }

    #[test]
    fn test_measurements_deferred_to_end() {
        // Mid-circuit measurement on q1 is ready long before the distant
        // cx, but must still be emitted after the routing swaps.
        let mut circuit = Circuit::with_size("t", 3, 3);
        circuit.measure(QubitId(1), ClbitId(1)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();

        let (dag, _) = route(circuit, "path(3)").unwrap();
        let names: Vec<&str> = dag.topological_ops().map(|(_, inst)| inst.name()).collect();
        let first_measure = names.iter().position(|&n| n == "measure").unwrap();
        let last_swap = names.iter().rposition(|&n| n == "swap").unwrap();
        assert!(
            last_swap < first_measure,
            "measurements must come after all swaps: {names:?}"
        );
    }

    #[test]
    fn test_trailing_ancillas_pruned() {
        let mut circuit = Circuit::with_size("t", 3, 3);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.measure_all().unwrap();

        // Device has 6 positions; the three trailing ones stay idle.
        let (dag, props) = route(circuit, "path(6)").unwrap();
        assert_eq!(dag.num_qubits(), 3);

        let mapping = props.get::<FinalMapping>().unwrap();
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_interior_ancilla_kept_when_higher_one_is_used() {
        let mut circuit = Circuit::with_size("t", 2, 2);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.measure_all().unwrap();

        // star(4,3): both program qubits are leaves, so the router swaps
        // through the center at position 3. Position 2 stays idle but
        // survives pruning because the used position above it stops the
        // trailing scan.
        let (dag, _) = route(circuit, "star(4,3)").unwrap();
        assert_eq!(dag.num_qubits(), 4);
    }

    #[test]
    fn test_final_mapping_is_injective() {
        let circuit = Circuit::ghz(4).unwrap();
        let (_, props) = route(circuit, "path(4)").unwrap();

        let mapping = props.get::<FinalMapping>().unwrap();
        let mut seen: Vec<PhysQubit> = mapping.as_slice().to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 4, "mapping must be injective");
    }

    #[test]
    fn test_routing_is_deterministic() {
        let build = || {
            let mut circuit = Circuit::with_size("t", 5, 5);
            circuit.h(QubitId(0)).unwrap();
            circuit.cx(QubitId(0), QubitId(4)).unwrap();
            circuit.cx(QubitId(1), QubitId(3)).unwrap();
            circuit.cx(QubitId(0), QubitId(2)).unwrap();
            circuit.cx(QubitId(2), QubitId(4)).unwrap();
            circuit.measure_all().unwrap();
            circuit
        };

        let stream = |dag: &CircuitDag| -> Vec<(String, Vec<QubitId>)> {
            dag.topological_ops()
                .map(|(_, inst)| (inst.name().to_string(), inst.qubits.clone()))
                .collect()
        };

        let (first, _) = route(build(), "path(5)").unwrap();
        let (second, _) = route(build(), "path(5)").unwrap();
        assert_eq!(stream(&first), stream(&second));
    }

    #[test]
    fn test_decay_spreads_swaps_on_star() {
        // On a star every route goes through the center; decay must not
        // prevent convergence.
        let mut circuit = Circuit::with_size("t", 5, 5);
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        circuit.cx(QubitId(3), QubitId(4)).unwrap();
        circuit.cx(QubitId(1), QubitId(4)).unwrap();
        circuit.measure_all().unwrap();

        let (dag, props) = route(circuit, "star(5,0)").unwrap();
        assert_adjacent(&dag, props.device.as_ref().unwrap());
    }

    #[test]
    fn test_empty_circuit_routes_to_empty() {
        let circuit = Circuit::with_size("t", 2, 0);
        let (dag, props) = route(circuit, "path(2)").unwrap();
        assert_eq!(dag.num_ops(), 0);
        assert_eq!(props.get::<FinalMapping>().unwrap().len(), 2);
    }
}
