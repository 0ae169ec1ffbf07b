//! Listener registries and de-registration handles.
//!
//! The registered listeners are kept in a copy-on-write list behind an
//! `ArcSwap`: notification iterates a snapshot, so listeners may register
//! or unregister other listeners (or themselves) while being notified.
//! An entry removed during an in-flight notification is skipped if it has
//! not been reached yet; an entry added during one is not called by it.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::Listener;

/// Something a [`ListenerRef`] can unregister.
pub trait Unregister: Send + Sync {
    /// Remove the listener. Repeated calls are no-ops.
    fn unregister(&self);

    /// Whether the listener is still registered.
    fn is_registered(&self) -> bool;
}

/// Handle returned by `add_change_listener`.
///
/// Dropping the handle does not remove the listener; call [`ListenerRef::unregister`].
#[derive(Clone, Default)]
pub struct ListenerRef {
    handle: Option<Arc<dyn Unregister>>,
}

impl ListenerRef {
    /// A handle that was never registered. Does not allocate.
    pub const fn unregistered() -> Self {
        Self { handle: None }
    }

    /// Wrap an unregistration handle.
    pub fn new(handle: Arc<dyn Unregister>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// A handle that runs `unregister` once.
    pub fn from_fn(unregister: impl Fn() + Send + Sync + 'static) -> Self {
        Self::new(Arc::new(FnHandle {
            registered: AtomicBool::new(true),
            unregister: Box::new(unregister),
        }))
    }

    /// A handle that unregisters all of `refs` together.
    pub fn combine(refs: Vec<ListenerRef>) -> Self {
        let refs: Vec<ListenerRef> = refs.into_iter().filter(|r| r.handle.is_some()).collect();
        match refs.len() {
            0 => Self::unregistered(),
            1 => refs.into_iter().next().unwrap_or_default(),
            _ => Self::new(Arc::new(CombinedHandle { refs })),
        }
    }

    /// Remove the listener. Safe to call repeatedly and during notification.
    pub fn unregister(&self) {
        if let Some(handle) = &self.handle {
            handle.unregister();
        }
    }

    /// Whether the listener is still registered.
    pub fn is_registered(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| h.is_registered())
    }
}

impl std::fmt::Debug for ListenerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRef")
            .field("registered", &self.is_registered())
            .finish()
    }
}

struct FnHandle {
    registered: AtomicBool,
    unregister: Box<dyn Fn() + Send + Sync>,
}

impl Unregister for FnHandle {
    fn unregister(&self) {
        if self.registered.swap(false, Ordering::AcqRel) {
            (self.unregister)();
        }
    }

    fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }
}

struct CombinedHandle {
    refs: Vec<ListenerRef>,
}

impl Unregister for CombinedHandle {
    fn unregister(&self) {
        for r in &self.refs {
            r.unregister();
        }
    }

    fn is_registered(&self) -> bool {
        self.refs.iter().any(ListenerRef::is_registered)
    }
}

struct Entry<M> {
    id: u64,
    active: AtomicBool,
    meta: M,
    listener: Listener,
}

struct RegistryInner<M> {
    next_id: AtomicU64,
    entries: ArcSwap<Vec<Arc<Entry<M>>>>,
}

impl<M> RegistryInner<M> {
    fn remove(&self, id: u64) {
        self.entries.rcu(|current| {
            current
                .iter()
                .filter(|e| e.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
    }
}

/// A set of change listeners, each tagged with metadata `M`.
pub struct ListenerRegistry<M = ()> {
    inner: Arc<RegistryInner<M>>,
}

impl<M: Send + Sync + 'static> ListenerRegistry<M> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                next_id: AtomicU64::new(1),
                entries: ArcSwap::from_pointee(Vec::new()),
            }),
        }
    }

    /// Register `listener` with `meta`.
    pub fn register_with(&self, meta: M, listener: Listener) -> ListenerRef {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(Entry {
            id,
            active: AtomicBool::new(true),
            meta,
            listener,
        });
        self.inner.entries.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(entry.clone());
            next
        });
        ListenerRef::new(Arc::new(RegistryHandle {
            registry: Arc::downgrade(&self.inner),
            entry: Arc::downgrade(&entry),
            id,
        }))
    }

    /// Call every active listener.
    pub fn fire(&self) {
        self.fire_filtered(|_| true);
    }

    /// Call every active listener whose metadata matches `filter`.
    pub fn fire_filtered(&self, filter: impl Fn(&M) -> bool) {
        let snapshot = self.inner.entries.load_full();
        for entry in snapshot.iter() {
            if entry.active.load(Ordering::Acquire) && filter(&entry.meta) {
                (entry.listener)();
            }
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.entries.load().len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.load().is_empty()
    }
}

impl ListenerRegistry<()> {
    /// Register a listener with no metadata.
    pub fn register(&self, listener: Listener) -> ListenerRef {
        self.register_with((), listener)
    }
}

impl<M: Send + Sync + 'static> Default for ListenerRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

struct RegistryHandle<M> {
    registry: Weak<RegistryInner<M>>,
    entry: Weak<Entry<M>>,
    id: u64,
}

impl<M: Send + Sync> Unregister for RegistryHandle<M> {
    fn unregister(&self) {
        let Some(entry) = self.entry.upgrade() else {
            return;
        };
        if entry.active.swap(false, Ordering::AcqRel) {
            if let Some(registry) = self.registry.upgrade() {
                registry.remove(self.id);
            }
        }
    }

    fn is_registered(&self) -> bool {
        self.entry
            .upgrade()
            .is_some_and(|e| e.active.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            count,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    // ==================== ListenerRef Tests ====================

    #[test]
    fn test_unregistered_ref_is_inert() {
        let r = ListenerRef::unregistered();
        assert!(!r.is_registered());
        r.unregister();
        assert!(!r.is_registered());
    }

    #[test]
    fn test_from_fn_runs_once() {
        let (count, listener) = counter();
        let r = ListenerRef::from_fn(move || listener());
        assert!(r.is_registered());
        r.unregister();
        r.unregister();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!r.is_registered());
    }

    #[test]
    fn test_combine_unregisters_all() {
        let registry = ListenerRegistry::new();
        let (count, listener) = counter();
        let a = registry.register(listener.clone());
        let b = registry.register(listener);
        let both = ListenerRef::combine(vec![a.clone(), b.clone(), ListenerRef::unregistered()]);
        registry.fire();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        both.unregister();
        assert!(!a.is_registered());
        assert!(!b.is_registered());
        registry.fire();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    // ==================== Registry Tests ====================

    #[test]
    fn test_fire_calls_listeners() {
        let registry = ListenerRegistry::new();
        let (count, listener) = counter();
        let r = registry.register(listener);
        registry.fire();
        registry.fire();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 1);

        r.unregister();
        registry.fire();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_fire_filtered_uses_metadata() {
        let registry: ListenerRegistry<&'static str> = ListenerRegistry::new();
        let (a_count, a) = counter();
        let (b_count, b) = counter();
        registry.register_with("a", a);
        registry.register_with("b", b);

        registry.fire_filtered(|meta| *meta == "b");
        assert_eq!(a_count.load(Ordering::SeqCst), 0);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_during_notification() {
        let registry = Arc::new(ListenerRegistry::new());
        let (count, counting) = counter();
        let slot: Arc<parking_lot::Mutex<ListenerRef>> = Arc::default();

        let s = slot.clone();
        registry.register(Arc::new(move || s.lock().unregister()));
        *slot.lock() = registry.register(counting);

        // The second listener is removed by the first before it is reached.
        registry.fire();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_during_notification() {
        let registry = Arc::new(ListenerRegistry::new());
        let (count, counting) = counter();

        let reg = Arc::downgrade(&registry);
        registry.register(Arc::new(move || {
            if let Some(reg) = reg.upgrade() {
                reg.register(counting.clone());
            }
        }));

        registry.fire();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 2);

        registry.fire();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
