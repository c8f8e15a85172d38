//! `PropertySet` and published pass artifacts.
//!
//! Passes communicate through a [`PropertySet`]: the device model and the
//! qubit placement have dedicated fields, anything else goes through the
//! type-keyed custom storage. The routing pass publishes its
//! [`FinalMapping`] there.

use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};

use alsvin_ir::QubitId;

use crate::device::{Device, PhysQubit};
use crate::placement::Placement;

/// The final virtual → physical qubit table published by routing.
///
/// Indexed by the original program's `QubitId`s (ancillas excluded).
/// A downstream consumer permutes per-qubit measurement data back into
/// program order with [`reorder`](Self::reorder):
/// `original[v] = routed[final_mapping[v]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalMapping(Vec<PhysQubit>);

impl FinalMapping {
    /// Create a mapping from a per-virtual-qubit table.
    pub fn new(table: Vec<PhysQubit>) -> Self {
        Self(table)
    }

    /// Final physical position of a program qubit.
    pub fn phys(&self, v: QubitId) -> PhysQubit {
        self.0[v.index()]
    }

    /// Number of program qubits covered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping covers no qubits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw table, indexed by original `QubitId`.
    pub fn as_slice(&self) -> &[PhysQubit] {
        &self.0
    }

    /// Permute per-physical-qubit data back into program qubit order.
    ///
    /// `routed` is indexed by physical qubit; the result is indexed by
    /// the original virtual qubit.
    pub fn reorder<T: Clone>(&self, routed: &[T]) -> Vec<T> {
        self.0.iter().map(|p| routed[p.index()].clone()).collect()
    }
}

/// Properties shared between compilation passes.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Target device model.
    ///
    /// Set before routing, or published by the routing pass when it
    /// builds the device from its own specification.
    pub device: Option<Device>,

    /// Current qubit placement.
    ///
    /// Published by the routing pass: the frozen final placement over all
    /// device qubits, surviving ancillas included.
    pub placement: Option<Placement>,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target device.
    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_mapping_reorder() {
        // Virtual 0 ended on physical 2, virtual 1 on physical 0.
        let mapping = FinalMapping::new(vec![PhysQubit(2), PhysQubit(0)]);
        let routed_counts = ["p0-data", "p1-data", "p2-data"];
        let original = mapping.reorder(&routed_counts);
        assert_eq!(original, vec!["p2-data", "p0-data"]);
    }

    #[test]
    fn test_property_set_custom() {
        let mut props = PropertySet::new();

        #[derive(Debug, PartialEq)]
        struct SwapCount(usize);

        props.insert(SwapCount(3));
        assert_eq!(props.get::<SwapCount>(), Some(&SwapCount(3)));

        let removed = props.remove::<SwapCount>();
        assert_eq!(removed, Some(SwapCount(3)));
        assert!(props.get::<SwapCount>().is_none());
    }

    #[test]
    fn test_with_device() {
        let props = PropertySet::new().with_device(Device::path(3).unwrap());
        assert!(props.device.is_some());
        assert!(props.placement.is_none());
    }
}
