//! Observable value cells.
//!
//! A [`PropertySource`] is a readable, subscribable value. Reads are safe
//! from any thread and never block on writers: every implementation keeps
//! its state as an immutable snapshot that writers replace wholesale.
//!
//! A [`MutableProperty`] can additionally be written, but only while
//! holding an [`EditContext`], the token that serializes all mutation.
//! The one exception is [`MutableCell::init_value`], which any thread may
//! call as long as nobody is listening yet.
//!
//! Change listeners run synchronously on the thread that performed the
//! mutation. No marshalling to another thread happens at this layer.

mod cell;
mod context;
mod derived;
mod listeners;

pub use cell::{ConstProperty, MutableCell};
pub use context::EditContext;
pub use derived::{DistinctProperty, FlatMapProperty, MappedProperty, MergedProperty};
pub use listeners::{ListenerRef, ListenerRegistry, Unregister};

use std::sync::Arc;

use crate::settings::ValueMerger;

/// A change callback. Listeners read the new value from the source itself.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// A readable, observable value.
pub trait PropertySource<T>: Send + Sync {
    /// The current value, or the default when nothing was set.
    fn value(&self) -> T;

    /// Whether the value is the default (no explicit override).
    fn is_default(&self) -> bool;

    /// Register a callback for changes of the resolved value.
    fn add_change_listener(&self, listener: Listener) -> ListenerRef;
}

/// A property that can be written within an [`EditContext`].
pub trait MutableProperty<T>: PropertySource<T> {
    /// Replace the value and notify listeners if it changed.
    fn set_value(&self, ctx: &EditContext, value: T);

    /// Copy the current value of `source` into this property.
    fn set_value_from_source(&self, ctx: &EditContext, source: &dyn PropertySource<T>) {
        self.set_value(ctx, source.value());
    }
}

/// Shared handle to any property source.
pub type SharedSource<T> = Arc<dyn PropertySource<T>>;

/// Map a source through `f`.
pub fn map<A, B, F>(source: SharedSource<A>, f: F) -> SharedSource<B>
where
    A: 'static,
    B: 'static,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    Arc::new(MappedProperty::new(source, f))
}

/// Only notify listeners when the value of `source` actually changed.
pub fn distinct<T>(source: SharedSource<T>) -> SharedSource<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    Arc::new(DistinctProperty::new(source))
}

/// Follow the source selected by the current value of `outer`.
pub fn flat_map<A, B, F>(outer: SharedSource<A>, f: F) -> SharedSource<B>
where
    A: 'static,
    B: 'static,
    F: Fn(A) -> SharedSource<B> + Send + Sync + 'static,
{
    FlatMapProperty::new(outer, f)
}

/// Merge a profile value with an optional lazily-read parent value.
pub fn merged<T>(
    child: SharedSource<Option<T>>,
    parent: Option<SharedSource<Option<T>>>,
    merger: Arc<dyn ValueMerger<T>>,
) -> SharedSource<Option<T>>
where
    T: Clone + 'static,
{
    Arc::new(MergedProperty::new(child, parent, merger))
}
