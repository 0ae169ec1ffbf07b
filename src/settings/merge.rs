//! Lazy parent references and merge policies.
//!
//! A merger combines the value a profile sets itself (`child`) with the
//! value one level up. The parent value is behind a [`ValueReference`]:
//! reading it may load and decode another profile, so a merger that does
//! not need it must not touch it.

use std::cell::OnceCell;

/// Deferred access to the value of the next less specific level.
pub trait ValueReference<T> {
    /// Force the parent value. Repeated calls return the same value.
    fn value(&self) -> Option<T>;
}

/// Computes the parent value on first use and caches it.
pub struct LazyValueReference<T, F> {
    compute: F,
    cached: OnceCell<Option<T>>,
}

impl<T, F> LazyValueReference<T, F>
where
    F: Fn() -> Option<T>,
{
    pub fn new(compute: F) -> Self {
        Self {
            compute,
            cached: OnceCell::new(),
        }
    }

    /// Whether the parent value has been computed.
    pub fn is_forced(&self) -> bool {
        self.cached.get().is_some()
    }
}

impl<T: Clone, F: Fn() -> Option<T>> ValueReference<T> for LazyValueReference<T, F> {
    fn value(&self) -> Option<T> {
        self.cached.get_or_init(|| (self.compute)()).clone()
    }
}

/// A reference to "no parent".
pub struct NoParent;

impl<T> ValueReference<T> for NoParent {
    fn value(&self) -> Option<T> {
        None
    }
}

/// Combines a profile value with its fallback.
pub trait ValueMerger<T>: Send + Sync {
    fn merge_values(&self, child: Option<T>, parent: &dyn ValueReference<T>) -> Option<T>;
}

impl<T, F> ValueMerger<T> for F
where
    F: Fn(Option<T>, &dyn ValueReference<T>) -> Option<T> + Send + Sync,
{
    fn merge_values(&self, child: Option<T>, parent: &dyn ValueReference<T>) -> Option<T> {
        self(child, parent)
    }
}

/// The profile value wins when present; the parent is only read otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildOverrides;

impl<T> ValueMerger<T> for ChildOverrides {
    fn merge_values(&self, child: Option<T>, parent: &dyn ValueReference<T>) -> Option<T> {
        match child {
            Some(value) => Some(value),
            None => parent.value(),
        }
    }
}

/// Parent items first, then child items not already present.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionMerger;

impl<T: PartialEq> ValueMerger<Vec<T>> for UnionMerger {
    fn merge_values(
        &self,
        child: Option<Vec<T>>,
        parent: &dyn ValueReference<Vec<T>>,
    ) -> Option<Vec<T>> {
        match (parent.value(), child) {
            (None, None) => None,
            (Some(parent), None) => Some(parent),
            (None, Some(child)) => Some(child),
            (Some(mut merged), Some(child)) => {
                for item in child {
                    if !merged.contains(&item) {
                        merged.push(item);
                    }
                }
                Some(merged)
            }
        }
    }
}

/// The first level whose value differs from `T::default()` wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstNonDefault;

impl<T: Default + PartialEq> ValueMerger<T> for FirstNonDefault {
    fn merge_values(&self, child: Option<T>, parent: &dyn ValueReference<T>) -> Option<T> {
        let is_set = |v: &Option<T>| v.as_ref().is_some_and(|v| *v != T::default());
        if is_set(&child) {
            return child;
        }
        let parent = parent.value();
        if is_set(&parent) { parent } else { child.or(parent) }
    }
}
