//! Ref Registry: the session-unique `@e`-ref to node-identity map.
//!
//! Refs are assigned from a monotonic counter that is never decremented
//! and never reused within a session, even across full registry clears.

use std::collections::HashMap;

/// The browser's opaque integer id for a DOM node.
pub type BackendNodeId = i64;

/// The accessibility tree's opaque node id.
pub type AxNodeId = String;

/// `(axNodeId, backendNodeId, domPath)` plus a staleness flag.
///
/// Invariant: at least one of `backend_node_id` or `dom_path` is non-empty.
#[derive(Debug, Clone, Default)]
pub struct NodeIdentity {
    /// Accessibility-tree node id, when known.
    pub ax_node_id: Option<AxNodeId>,
    /// Browser backend node id, when known.
    pub backend_node_id: Option<BackendNodeId>,
    /// CSS selector path rooted at `body`, used when `backend_node_id`
    /// has expired.
    pub dom_path: Option<String>,
    /// Set by `markAllStale`; cleared when the resolver successfully
    /// re-resolves via `domPath`.
    pub stale: bool,
}

impl NodeIdentity {
    /// Construct a fresh, non-stale identity.
    ///
    /// # Panics
    ///
    /// Panics if both `backend_node_id` and `dom_path` are absent, which
    /// would violate the registry's core invariant.
    #[must_use]
    pub fn new(
        ax_node_id: Option<AxNodeId>,
        backend_node_id: Option<BackendNodeId>,
        dom_path: Option<String>,
    ) -> Self {
        assert!(
            backend_node_id.is_some() || dom_path.is_some(),
            "NodeIdentity requires a backendNodeId or a domPath"
        );
        Self {
            ax_node_id,
            backend_node_id,
            dom_path,
            stale: false,
        }
    }
}

/// A session-stable `@eN` handle, where `N` is assigned monotonically.
pub type Ref = String;

fn format_ref(counter: u64) -> Ref {
    format!("@e{counter}")
}

/// Maps refs to `NodeIdentity`, backed by a never-decremented counter.
#[derive(Debug, Default)]
pub struct RefRegistry {
    entries: HashMap<Ref, NodeIdentity>,
    counter: u64,
}

impl RefRegistry {
    /// Create an empty registry with the counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a ref to `identity`, incrementing the counter.
    ///
    /// The returned ref is guaranteed never to have been issued before by
    /// this registry, even if `clear` has been called any number of times.
    pub fn assign(&mut self, identity: NodeIdentity) -> Ref {
        self.counter += 1;
        let r = format_ref(self.counter);
        self.entries.insert(r.clone(), identity);
        r
    }

    /// Look up a ref's identity.
    #[must_use]
    pub fn get(&self, r: &str) -> Option<&NodeIdentity> {
        self.entries.get(r)
    }

    /// Look up a ref's identity mutably, for the resolver to write back a
    /// refreshed `backendNodeId`/`axNodeId`/`stale` on domPath fallback.
    pub fn get_mut(&mut self, r: &str) -> Option<&mut NodeIdentity> {
        self.entries.get_mut(r)
    }

    /// Mark every currently-registered identity stale, without discarding
    /// the counter or the entries themselves. Called on successful
    /// navigation.
    pub fn mark_all_stale(&mut self) {
        for identity in self.entries.values_mut() {
            identity.stale = true;
        }
    }

    /// Empty the map. The counter is preserved, so refs assigned before and
    /// after a `clear` never collide.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove a single ref from the map.
    pub fn free(&mut self, r: &str) {
        self.entries.remove(r);
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry currently holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Test-only hook to reset the counter back to zero. Production code
    /// never calls this; it exists so unit tests can assert on exact ref
    /// values without depending on call order across tests.
    #[cfg(test)]
    pub fn reset_counter(&mut self) {
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_with_path(path: &str) -> NodeIdentity {
        NodeIdentity::new(None, None, Some(path.to_string()))
    }

    #[test]
    fn assign_increments_and_never_reuses() {
        let mut registry = RefRegistry::new();
        let r1 = registry.assign(identity_with_path("body"));
        let r2 = registry.assign(identity_with_path("body"));
        assert_eq!(r1, "@e1");
        assert_eq!(r2, "@e2");
    }

    #[test]
    fn clear_preserves_counter() {
        let mut registry = RefRegistry::new();
        registry.assign(identity_with_path("a"));
        registry.assign(identity_with_path("b"));
        registry.clear();
        assert!(registry.is_empty());
        let r3 = registry.assign(identity_with_path("c"));
        assert_eq!(r3, "@e3");
    }

    #[test]
    fn refs_never_collide_across_clears() {
        let mut registry = RefRegistry::new();
        let mut seen = std::collections::HashSet::new();
        for round in 0..5 {
            for _ in 0..3 {
                let r = registry.assign(identity_with_path("x"));
                assert!(seen.insert(r), "ref collided in round {round}");
            }
            registry.clear();
        }
    }

    #[test]
    fn mark_all_stale_does_not_drop_entries() {
        let mut registry = RefRegistry::new();
        let r = registry.assign(identity_with_path("a"));
        registry.mark_all_stale();
        assert!(registry.get(&r).unwrap().stale);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn free_removes_single_entry() {
        let mut registry = RefRegistry::new();
        let r1 = registry.assign(identity_with_path("a"));
        let r2 = registry.assign(identity_with_path("b"));
        registry.free(&r1);
        assert!(registry.get(&r1).is_none());
        assert!(registry.get(&r2).is_some());
    }

    #[test]
    fn reset_counter_is_test_only_and_restarts_numbering() {
        let mut registry = RefRegistry::new();
        registry.assign(identity_with_path("a"));
        registry.reset_counter();
        let r = registry.assign(identity_with_path("b"));
        assert_eq!(r, "@e1");
    }
}
