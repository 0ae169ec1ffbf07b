//! Concrete value cells.

use arc_swap::ArcSwap;
use std::sync::Arc;

use super::{EditContext, Listener, ListenerRef, ListenerRegistry, MutableProperty, PropertySource};
use crate::{Error, Result};

struct CellState<T> {
    value: T,
    explicit: bool,
}

/// A mutable, observable value holder.
///
/// Starts out holding its default value with `is_default() == true`;
/// any `set_value` makes it explicit until [`MutableCell::reset`].
pub struct MutableCell<T> {
    default: T,
    state: ArcSwap<CellState<T>>,
    listeners: ListenerRegistry,
}

impl<T> MutableCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a cell holding `default`.
    pub fn new(default: T) -> Self {
        Self {
            state: ArcSwap::from_pointee(CellState {
                value: default.clone(),
                explicit: false,
            }),
            default,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Set the value from any thread, before anyone listens.
    ///
    /// Fails with [`Error::ListenersAttached`] once a listener exists.
    pub fn init_value(&self, value: T) -> Result<()> {
        if !self.listeners.is_empty() {
            return Err(Error::ListenersAttached);
        }
        self.state.store(Arc::new(CellState {
            value,
            explicit: true,
        }));
        Ok(())
    }

    /// Go back to the default value.
    pub fn reset(&self, ctx: &EditContext) {
        self.replace(ctx, self.default.clone(), false);
    }

    fn replace(&self, _ctx: &EditContext, value: T, explicit: bool) {
        let changed = self.state.load().value != value;
        self.state.store(Arc::new(CellState { value, explicit }));
        if changed {
            self.listeners.fire();
        }
    }
}

impl<T> PropertySource<T> for MutableCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn value(&self) -> T {
        self.state.load().value.clone()
    }

    fn is_default(&self) -> bool {
        !self.state.load().explicit
    }

    fn add_change_listener(&self, listener: Listener) -> ListenerRef {
        self.listeners.register(listener)
    }
}

impl<T> MutableProperty<T> for MutableCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn set_value(&self, ctx: &EditContext, value: T) {
        self.replace(ctx, value, true);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for MutableCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.load();
        f.debug_struct("MutableCell")
            .field("value", &state.value)
            .field("explicit", &state.explicit)
            .finish()
    }
}

/// A value that never changes and never notifies.
#[derive(Debug, Clone)]
pub struct ConstProperty<T> {
    value: T,
    is_default: bool,
}

impl<T> ConstProperty<T> {
    /// An explicit constant.
    pub fn of(value: T) -> Self {
        Self {
            value,
            is_default: false,
        }
    }

    /// A constant standing for a default value.
    pub fn default_of(value: T) -> Self {
        Self {
            value,
            is_default: true,
        }
    }
}

impl<T: Clone + Send + Sync> PropertySource<T> for ConstProperty<T> {
    fn value(&self) -> T {
        self.value.clone()
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn add_change_listener(&self, _listener: Listener) -> ListenerRef {
        ListenerRef::unregistered()
    }
}
