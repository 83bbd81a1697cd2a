use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, RwLock};

/// # Background
/// In modern low-level APIs we are responsible for managing resource
/// lifetimes, not the driver. While a resource is referenced by an
/// in-flight command buffer it cannot be destroyed; destruction has to wait
/// until the frame's fence signals.
///
/// # The goal
/// The tracker keeps a destructor and an atomic reference count per
/// resource id and runs the destructor exactly once, when the count drops
/// to zero.
///
/// # Thread safety
/// `ResourceTracker` is thread safe. [`ReferenceSet`] is **not** and is
/// used per recording thread.
pub struct ResourceTracker {
    inner: RwLock<HashMap<u64, TrackedResource>>,
}

struct TrackedResource {
    destructor: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    // Relaxed ordering is enough: the command-buffer lifecycle (fence wait
    // before `remove_references`) provides the happens-before edge.
    ref_count: AtomicI32,
}

impl Default for ResourceTracker {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource with an initial reference count of 1. That
    /// reference belongs to the creator and is removed by `destroy_*`.
    pub fn add_resource(&self, resource: u64, destructor: impl FnOnce() + Send + 'static) {
        let mut inner = self.inner.write().unwrap();
        inner.insert(
            resource,
            TrackedResource {
                destructor: Mutex::new(Some(Box::new(destructor))),
                ref_count: AtomicI32::new(1),
            },
        );
    }

    pub fn add_reference(&self, resource: u64) {
        let inner = self.inner.read().unwrap();
        match inner.get(&resource) {
            Some(tracked) => {
                tracked.ref_count.fetch_add(1, Ordering::Relaxed);
            }
            None => panic!("Resource `{resource}` does not exist."),
        }
    }

    pub fn remove_reference(&self, resource: u64) {
        let value = {
            let inner = self.inner.read().unwrap();
            match inner.get(&resource) {
                Some(tracked) => tracked.ref_count.fetch_sub(1, Ordering::Relaxed),
                None => panic!("Resource `{resource}` does not exist."),
            }
        };

        if (value - 1) <= 0 {
            let destructor = {
                let mut inner = self.inner.write().unwrap();
                let tracked = inner
                    .remove(&resource)
                    .unwrap_or_else(|| panic!("Resource `{resource}` does not exist."));
                let destructor = tracked.destructor.lock().unwrap().take();
                destructor
            };
            // Run outside the lock; destructors touch handle tables and the
            // bindless manager.
            if let Some(destructor) = destructor {
                destructor();
            }
        }
    }

    pub fn remove_references(&self, references: &mut ReferenceSet) {
        for resource in references.resources.drain() {
            self.remove_reference(resource);
        }
    }
}

/// Per-recording set of referenced resource ids. Guarantees at most one
/// tracker reference per resource per recording; the pool manager removes
/// them once the frame's fence has signaled.
#[derive(Default)]
pub struct ReferenceSet {
    resources: HashSet<u64>,
}

impl ReferenceSet {
    pub fn add_reference(&mut self, tracker: &ResourceTracker, resource: u64) {
        if self.resources.insert(resource) {
            tracker.add_reference(resource);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_destructor_runs_once_at_zero() {
        let tracker = ResourceTracker::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        tracker.add_resource(7, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tracker.add_reference(7);
        tracker.remove_reference(7);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tracker.remove_reference(7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic]
    fn test_reference_after_destruction_panics() {
        let tracker = ResourceTracker::new();
        tracker.add_resource(1, || {});
        tracker.remove_reference(1);
        tracker.add_reference(1);
    }

    #[test]
    fn test_reference_set_is_idempotent() {
        let tracker = ResourceTracker::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        tracker.add_resource(3, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut set = ReferenceSet::default();
        for _ in 0..10 {
            set.add_reference(&tracker, 3);
        }
        assert_eq!(set.len(), 1);

        // One reference from the set, one from creation.
        tracker.remove_references(&mut set);
        assert!(set.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tracker.remove_reference(3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_references_decrements_per_unique_id() {
        let tracker = ResourceTracker::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for id in 0..4u64 {
            let counter = calls.clone();
            tracker.add_resource(id, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        let mut set = ReferenceSet::default();
        for id in 0..4u64 {
            set.add_reference(&tracker, id);
            set.add_reference(&tracker, id);
        }
        tracker.remove_references(&mut set);

        for id in 0..4u64 {
            tracker.remove_reference(id);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
