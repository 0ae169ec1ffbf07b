//! Sources computed from other sources.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{Listener, ListenerRef, PropertySource, SharedSource};
use crate::settings::{LazyValueReference, ValueMerger};

/// `f` applied to the value of another source.
pub struct MappedProperty<A, B> {
    source: SharedSource<A>,
    f: Box<dyn Fn(A) -> B + Send + Sync>,
}

impl<A, B> MappedProperty<A, B> {
    pub fn new(source: SharedSource<A>, f: impl Fn(A) -> B + Send + Sync + 'static) -> Self {
        Self {
            source,
            f: Box::new(f),
        }
    }
}

impl<A, B> PropertySource<B> for MappedProperty<A, B> {
    fn value(&self) -> B {
        (self.f)(self.source.value())
    }

    fn is_default(&self) -> bool {
        self.source.is_default()
    }

    fn add_change_listener(&self, listener: Listener) -> ListenerRef {
        self.source.add_change_listener(listener)
    }
}

/// Suppresses notifications that leave the value unchanged.
///
/// Each listener remembers the value it last saw, starting with the value
/// at registration time.
pub struct DistinctProperty<T> {
    source: SharedSource<T>,
}

impl<T> DistinctProperty<T> {
    pub fn new(source: SharedSource<T>) -> Self {
        Self { source }
    }
}

impl<T> PropertySource<T> for DistinctProperty<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    fn value(&self) -> T {
        self.source.value()
    }

    fn is_default(&self) -> bool {
        self.source.is_default()
    }

    fn add_change_listener(&self, listener: Listener) -> ListenerRef {
        let last = Mutex::new(self.source.value());
        let source = self.source.clone();
        self.source.add_change_listener(Arc::new(move || {
            let current = source.value();
            let changed = {
                let mut last = last.lock();
                if *last == current {
                    false
                } else {
                    *last = current;
                    true
                }
            };
            if changed {
                listener();
            }
        }))
    }
}

type SourceFactory<A, B> = dyn Fn(A) -> SharedSource<B> + Send + Sync;

/// Follows whichever source the current value of `outer` selects.
///
/// When `outer` changes, every subscription moves from the previously
/// selected source to the new one and the listener is notified.
pub struct FlatMapProperty<A, B> {
    outer: SharedSource<A>,
    select: Arc<SourceFactory<A, B>>,
}

struct Subscription<B> {
    active: AtomicBool,
    current: Mutex<(SharedSource<B>, ListenerRef)>,
}

impl<B> Subscription<B> {
    fn switch_to(&self, source: SharedSource<B>, listener: &Listener) {
        let registration = source.add_change_listener(listener.clone());
        let (_, previous) = std::mem::replace(&mut *self.current.lock(), (source, registration));
        previous.unregister();
    }

    fn close(&self) {
        self.active.store(false, Ordering::Release);
        self.current.lock().1.unregister();
    }
}

impl<A, B> FlatMapProperty<A, B>
where
    A: 'static,
    B: 'static,
{
    pub fn new(
        outer: SharedSource<A>,
        select: impl Fn(A) -> SharedSource<B> + Send + Sync + 'static,
    ) -> SharedSource<B> {
        Arc::new(Self {
            outer,
            select: Arc::new(select),
        })
    }

    fn selected(&self) -> SharedSource<B> {
        (self.select)(self.outer.value())
    }
}

impl<A, B> PropertySource<B> for FlatMapProperty<A, B>
where
    A: 'static,
    B: 'static,
{
    fn value(&self) -> B {
        self.selected().value()
    }

    fn is_default(&self) -> bool {
        self.selected().is_default()
    }

    fn add_change_listener(&self, listener: Listener) -> ListenerRef {
        let inner = self.selected();
        let registration = inner.add_change_listener(listener.clone());
        let subscription = Arc::new(Subscription {
            active: AtomicBool::new(true),
            current: Mutex::new((inner, registration)),
        });

        let outer = self.outer.clone();
        let select = self.select.clone();
        let sub = subscription.clone();
        let outer_registration = self.outer.add_change_listener(Arc::new(move || {
            if !sub.active.load(Ordering::Acquire) {
                return;
            }
            sub.switch_to(select(outer.value()), &listener);
            listener();
        }));

        ListenerRef::combine(vec![
            outer_registration,
            ListenerRef::from_fn(move || subscription.close()),
        ])
    }
}

/// A profile value merged with the value one level up.
///
/// The parent is only read if the merger asks for it.
pub struct MergedProperty<T> {
    child: SharedSource<Option<T>>,
    parent: Option<SharedSource<Option<T>>>,
    merger: Arc<dyn ValueMerger<T>>,
}

impl<T> MergedProperty<T> {
    pub fn new(
        child: SharedSource<Option<T>>,
        parent: Option<SharedSource<Option<T>>>,
        merger: Arc<dyn ValueMerger<T>>,
    ) -> Self {
        Self {
            child,
            parent,
            merger,
        }
    }
}

impl<T> PropertySource<Option<T>> for MergedProperty<T>
where
    T: Clone + 'static,
{
    fn value(&self) -> Option<T> {
        let parent = LazyValueReference::new(|| self.parent.as_ref().and_then(|p| p.value()));
        self.merger.merge_values(self.child.value(), &parent)
    }

    fn is_default(&self) -> bool {
        self.child.is_default() && self.parent.as_ref().is_none_or(|p| p.is_default())
    }

    fn add_change_listener(&self, listener: Listener) -> ListenerRef {
        let mut refs = vec![self.child.add_change_listener(listener.clone())];
        if let Some(parent) = &self.parent {
            refs.push(parent.add_change_listener(listener));
        }
        ListenerRef::combine(refs)
    }
}
