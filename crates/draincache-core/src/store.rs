//! Shared snapshot store.

use draincache_types::{Binding, BindingsMap};
use parking_lot::RwLock;

use crate::metrics::update_cached_bindings;

#[derive(Default)]
struct StoreInner {
    bindings: Vec<Binding>,
    non_mtls: BindingsMap,
    mtls: BindingsMap,
}

/// Thread-safe holder of the two provider input maps and the merged,
/// published snapshot.
///
/// Readers share a read lock; the setters and [`Store::merge`] serialize on
/// the write lock, so a reader observes either the pre-merge or the
/// post-merge snapshot, never a torn state. The input maps are treated as
/// immutable once handed in.
#[derive(Default)]
pub struct Store {
    inner: RwLock<StoreInner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently published snapshot. Empty before the first merge,
    /// never absent.
    pub fn get(&self) -> Vec<Binding> {
        self.inner.read().bindings.clone()
    }

    /// Replace the non-mTLS input map. `None` leaves an empty map in place,
    /// never an unset one.
    pub fn set_non_mtls(&self, bindings: Option<BindingsMap>) {
        self.inner.write().non_mtls = bindings.unwrap_or_default();
    }

    /// Replace the mTLS input map. Symmetric with [`Store::set_non_mtls`].
    pub fn set_mtls(&self, bindings: Option<BindingsMap>) {
        self.inner.write().mtls = bindings.unwrap_or_default();
    }

    /// Atomically recompute and publish the snapshot from the current input
    /// maps. The write lock is held across `f` so the inputs cannot change
    /// mid-merge.
    pub fn merge<F>(&self, f: F)
    where
        F: Fn(&BindingsMap, &BindingsMap) -> Vec<Binding>,
    {
        let mut inner = self.inner.write();
        inner.bindings = f(&inner.non_mtls, &inner.mtls);
        update_cached_bindings(inner.bindings.len());
    }
}

/// Platform-wide drains with no application scope, served verbatim on the
/// aggregate endpoint.
#[derive(Debug, Clone, Default)]
pub struct AggregateStore {
    drain_urls: Vec<String>,
}

impl AggregateStore {
    pub fn new(drain_urls: Vec<String>) -> Self {
        Self { drain_urls }
    }

    pub fn get(&self) -> Vec<String> {
        self.drain_urls.clone()
    }
}
