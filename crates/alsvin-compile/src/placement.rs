//! The live virtual ↔ physical qubit assignment.

use serde::{Deserialize, Serialize};

use alsvin_ir::QubitId;

use crate::device::PhysQubit;

/// A total bijection between virtual qubits and physical qubits.
///
/// Constructed once (identity) with one virtual qubit per device slot,
/// ancillas included, and then mutated only through [`swap`](Self::swap).
/// Both directions are plain index vectors, so every query and the swap
/// itself are O(1) and infallible for in-range qubits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Physical position of each virtual qubit, indexed by `QubitId`.
    v2p: Vec<PhysQubit>,
    /// Virtual occupant of each physical slot, indexed by `PhysQubit`.
    p2v: Vec<QubitId>,
}

impl Placement {
    /// Create the identity placement over `n` qubits: virtual `i` sits on
    /// physical `i`.
    pub fn identity(n: u32) -> Self {
        Self {
            v2p: (0..n).map(PhysQubit).collect(),
            p2v: (0..n).map(QubitId).collect(),
        }
    }

    /// Number of mapped qubits.
    pub fn len(&self) -> usize {
        self.v2p.len()
    }

    /// Whether the placement maps no qubits.
    pub fn is_empty(&self) -> bool {
        self.v2p.is_empty()
    }

    /// Physical position of a virtual qubit.
    ///
    /// # Panics
    ///
    /// Panics if the virtual qubit is outside the placement, which is a
    /// caller bug: the placement covers every program and ancilla qubit.
    #[inline]
    pub fn phys(&self, v: QubitId) -> PhysQubit {
        self.v2p[v.index()]
    }

    /// Virtual occupant of a physical slot.
    ///
    /// # Panics
    ///
    /// Panics if the physical qubit is outside the placement.
    #[inline]
    pub fn virt(&self, p: PhysQubit) -> QubitId {
        self.p2v[p.index()]
    }

    /// Exchange the virtual occupants of two physical slots.
    ///
    /// Self-inverse: applying the same swap twice restores the placement.
    pub fn swap(&mut self, p1: PhysQubit, p2: PhysQubit) {
        let v1 = self.p2v[p1.index()];
        let v2 = self.p2v[p2.index()];
        self.p2v[p1.index()] = v2;
        self.p2v[p2.index()] = v1;
        self.v2p[v1.index()] = p2;
        self.v2p[v2.index()] = p1;
    }

    /// Iterate over `(virtual, physical)` pairs in virtual qubit order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, PhysQubit)> + '_ {
        self.v2p
            .iter()
            .enumerate()
            .map(|(v, &p)| (QubitId::from(v), p))
    }
}
