//! Pass manager for orchestrating the mapping pipeline.

use tracing::{debug, info, instrument};

use alsvin_ir::CircuitDag;

use crate::device::DeviceSpec;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{SabreConfig, SabreRouting};
use crate::property::PropertySet;

/// Manages and executes a sequence of compilation passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given DAG.
    #[instrument(skip(self, dag, properties))]
    pub fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits",
            self.passes.len(),
            dag.num_qubits()
        );

        for pass in &self.passes {
            if pass.should_run(dag, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(dag, properties)?;
                debug!("Pass {} completed, ops: {}", pass.name(), dag.num_ops());
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, final depth: {}, ops: {}",
            dag.depth(),
            dag.num_ops()
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder assembling the standard mapping pipeline.
pub struct PassManagerBuilder {
    device_spec: DeviceSpec,
    config: SabreConfig,
    properties: PropertySet,
}

impl PassManagerBuilder {
    /// Create a builder targeting the given device specification.
    pub fn new(device_spec: DeviceSpec) -> Self {
        Self {
            device_spec,
            config: SabreConfig::default(),
            properties: PropertySet::new(),
        }
    }

    /// Override the routing heuristic configuration.
    #[must_use]
    pub fn with_config(mut self, config: SabreConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the initial properties.
    #[must_use]
    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Build the pass manager and its initial property set.
    pub fn build(self) -> (PassManager, PropertySet) {
        let mut pm = PassManager::new();
        pm.add_pass(SabreRouting::with_config(self.device_spec, self.config));
        (pm, self.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_ir::Circuit;

    #[test]
    fn test_builder_assembles_routing() {
        let spec: DeviceSpec = "path(4)".parse().unwrap();
        let (pm, _props) = PassManagerBuilder::new(spec).build();
        assert_eq!(pm.len(), 1);
        assert!(!pm.is_empty());
    }

    #[test]
    fn test_pipeline_runs_end_to_end() {
        let spec: DeviceSpec = "path(3)".parse().unwrap();
        let (pm, mut props) = PassManagerBuilder::new(spec).build();

        let mut dag = Circuit::ghz(3).unwrap().into_dag();
        pm.run(&mut dag, &mut props).unwrap();

        assert!(props.placement.is_some());
        assert!(props.device.is_some());
    }
}
