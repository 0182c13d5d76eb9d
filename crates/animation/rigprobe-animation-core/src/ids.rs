//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Dense index of a joint inside its skeleton (parents precede children).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoneId(pub u32);

impl BoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PlayableId(pub u32);

/// Process-unique graph identity; stream handles carry it so a handle bound on
/// one graph is rejected by another.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub u64);

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph#{}", self.0)
    }
}

static NEXT_GRAPH: AtomicU64 = AtomicU64::new(1);

impl GraphId {
    pub fn next() -> Self {
        GraphId(NEXT_GRAPH.fetch_add(1, Ordering::Relaxed))
    }
}

/// Monotonic allocator for PlayableId within one graph.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_playable: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_playable(&mut self) -> PlayableId {
        let id = PlayableId(self.next_playable);
        self.next_playable = self.next_playable.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_playable(), PlayableId(0));
        assert_eq!(alloc.alloc_playable(), PlayableId(1));
        alloc.reset();
        assert_eq!(alloc.alloc_playable(), PlayableId(0));
    }

    #[test]
    fn graph_ids_are_unique() {
        let a = GraphId::next();
        let b = GraphId::next();
        assert_ne!(a, b);
    }
}
