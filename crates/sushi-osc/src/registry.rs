//! OSC method registry (spec.md §4.I): maps textual addresses to typed
//! handlers tied to graph entities, independent of any particular
//! sub-controller.
//!
//! `method_kind` and `connection` from spec.md's `add_method` signature are
//! folded into one [`MethodBinding`] enum here — the kind and the entity
//! ids it carries are never meaningful apart from each other, so a single
//! tagged value reads better than two parallel arguments that must agree.

use std::collections::HashMap;

/// What a registered address does when it fires, and which graph entity it
/// targets. Built from spec.md §4.I's address table.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodBinding {
    Parameter { processor: u32, parameter: u32 },
    Property { processor: u32, property: u32 },
    KeyboardEvent { track: u32 },
    Program { processor: u32 },
    Bypass { processor: u32 },
    EngineSetTempo,
    EngineSetTimeSignature,
    EngineSetPlayingMode,
    EngineSetSyncMode,
    EngineSetTimingStatisticsEnabled,
    EngineResetTimingStatistics,
}

/// The sentinel handle returned when registration fails (spec.md §4.I).
pub const INVALID_HANDLE: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AddressKey {
    address: String,
    type_tag: String,
}

struct Row {
    key: AddressKey,
    binding: MethodBinding,
}

/// Dynamic address → handler table. Handles are opaque, monotonically
/// increasing, non-zero integers; `-1` is reserved as the failure sentinel.
#[derive(Default)]
pub struct MethodRegistry {
    next_handle: i64,
    by_handle: HashMap<i64, Row>,
    by_address: HashMap<AddressKey, i64>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self { next_handle: 1, by_handle: HashMap::new(), by_address: HashMap::new() }
    }

    /// Register `address`/`type_tag` against `binding`. Returns
    /// [`INVALID_HANDLE`] without side effects if the pair is already
    /// registered (spec.md §4.I).
    pub fn add_method(&mut self, address: &str, type_tag: &str, binding: MethodBinding) -> i64 {
        let key = AddressKey { address: address.to_string(), type_tag: type_tag.to_string() };
        if self.by_address.contains_key(&key) {
            return INVALID_HANDLE;
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.by_address.insert(key.clone(), handle);
        self.by_handle.insert(handle, Row { key, binding });
        handle
    }

    /// Remove the row for `handle`. Unknown handles are a no-op (spec.md
    /// §4.I); returns whether a row was actually removed.
    pub fn delete_method(&mut self, handle: i64) -> bool {
        match self.by_handle.remove(&handle) {
            Some(row) => {
                self.by_address.remove(&row.key);
                true
            }
            None => false,
        }
    }

    /// Look up the binding for an exact `(address, type_tag)` pair, as an
    /// incoming OSC message is dispatched.
    pub fn lookup(&self, address: &str, type_tag: &str) -> Option<&MethodBinding> {
        let key = AddressKey { address: address.to_string(), type_tag: type_tag.to_string() };
        self.by_address.get(&key).and_then(|handle| self.by_handle.get(handle)).map(|row| &row.binding)
    }

    /// Purge every row whose binding targets `processor` (spec.md §4.I:
    /// "when a... processor/track is added/removed, matching rows are
    /// added or purged atomically").
    pub fn purge_processor(&mut self, processor: u32) {
        self.retain(|binding| {
            let target = match binding {
                MethodBinding::Parameter { processor: p, .. }
                | MethodBinding::Property { processor: p, .. }
                | MethodBinding::Program { processor: p, .. }
                | MethodBinding::Bypass { processor: p, .. } => Some(*p),
                _ => None,
            };
            target == Some(processor)
        });
    }

    /// Purge every row whose binding targets `track`.
    pub fn purge_track(&mut self, track: u32) {
        self.retain(|binding| !matches!(binding, MethodBinding::KeyboardEvent { track: t } if *t == track));
    }

    fn retain(&mut self, mut drop_if: impl FnMut(&MethodBinding) -> bool) {
        let doomed: Vec<i64> =
            self.by_handle.iter().filter(|(_, row)| drop_if(&row.binding)).map(|(handle, _)| *handle).collect();
        for handle in doomed {
            self.delete_method(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_looks_up() {
        let mut registry = MethodRegistry::new();
        let handle = registry.add_method("/parameter/synth/cutoff", "f", MethodBinding::Parameter { processor: 1, parameter: 2 });
        assert!(handle > 0);
        assert_eq!(registry.lookup("/parameter/synth/cutoff", "f"), Some(&MethodBinding::Parameter { processor: 1, parameter: 2 }));
    }

    #[test]
    fn reregistering_same_address_and_tag_fails_without_side_effects() {
        let mut registry = MethodRegistry::new();
        registry.add_method("/bypass/synth", "i", MethodBinding::Bypass { processor: 1 });
        let handle = registry.add_method("/bypass/synth", "i", MethodBinding::Bypass { processor: 99 });
        assert_eq!(handle, INVALID_HANDLE);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("/bypass/synth", "i"), Some(&MethodBinding::Bypass { processor: 1 }));
    }

    #[test]
    fn same_address_different_type_tag_is_independent() {
        let mut registry = MethodRegistry::new();
        registry.add_method("/program/synth", "i", MethodBinding::Program { processor: 1 });
        let handle = registry.add_method("/program/synth", "s", MethodBinding::Program { processor: 1 });
        assert!(handle > 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn delete_unknown_handle_is_a_no_op() {
        let mut registry = MethodRegistry::new();
        assert!(!registry.delete_method(9999));
    }

    #[test]
    fn delete_removes_both_indexes() {
        let mut registry = MethodRegistry::new();
        let handle = registry.add_method("/parameter/synth/cutoff", "f", MethodBinding::Parameter { processor: 1, parameter: 2 });
        assert!(registry.delete_method(handle));
        assert!(registry.lookup("/parameter/synth/cutoff", "f").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn purge_processor_removes_only_matching_rows() {
        let mut registry = MethodRegistry::new();
        registry.add_method("/parameter/synth/cutoff", "f", MethodBinding::Parameter { processor: 1, parameter: 2 });
        registry.add_method("/bypass/synth", "i", MethodBinding::Bypass { processor: 1 });
        registry.add_method("/parameter/delay/mix", "f", MethodBinding::Parameter { processor: 2, parameter: 1 });

        registry.purge_processor(1);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("/parameter/delay/mix", "f"), Some(&MethodBinding::Parameter { processor: 2, parameter: 1 }));
    }

    #[test]
    fn purge_track_leaves_processor_rows_untouched() {
        let mut registry = MethodRegistry::new();
        registry.add_method("/keyboard_event/main", "siif", MethodBinding::KeyboardEvent { track: 1 });
        registry.add_method("/parameter/synth/cutoff", "f", MethodBinding::Parameter { processor: 1, parameter: 2 });

        registry.purge_track(1);

        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("/keyboard_event/main", "siif").is_none());
    }

    #[test]
    fn next_handle_is_monotonic_across_deletes() {
        let mut registry = MethodRegistry::new();
        let first = registry.add_method("/bypass/a", "i", MethodBinding::Bypass { processor: 1 });
        registry.delete_method(first);
        let second = registry.add_method("/bypass/a", "i", MethodBinding::Bypass { processor: 1 });
        assert!(second > first);
    }
}
