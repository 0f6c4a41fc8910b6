//! Process-unique object identifiers.

use std::sync::atomic::{AtomicU32, Ordering};

/// A process-unique, stable-for-lifetime handle to a processor or track.
pub type ObjectId = u32;

/// Monotonic generator for [`ObjectId`]s. Never reuses an id within a process.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(0),
        }
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> ObjectId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let gen = IdGenerator::new();
        let a = gen.next_id();
        let b = gen.next_id();
        let c = gen.next_id();
        assert!(a < b);
        assert!(b < c);
    }
}
