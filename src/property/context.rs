//! The edit token.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::sync::LazyLock;

static EDIT_LOCK: LazyLock<ReentrantMutex<()>> = LazyLock::new(|| ReentrantMutex::new(()));

/// Proof that the current thread is the single writer.
///
/// All `set_value` calls require one. Holding it excludes every other
/// thread from mutating properties; the holder may re-enter (listeners
/// that write other properties simply call [`EditContext::enter`] again).
/// The token cannot leave the thread that created it.
///
/// Do not call `save_and_wait` while holding a context if the persister
/// itself needs one: the wait would never finish.
pub struct EditContext {
    _guard: ReentrantMutexGuard<'static, ()>,
}

impl EditContext {
    /// Become the writer, blocking until no other thread is.
    pub fn enter() -> Self {
        Self {
            _guard: EDIT_LOCK.lock(),
        }
    }

    /// Become the writer if no other thread currently is.
    pub fn try_enter() -> Option<Self> {
        EDIT_LOCK.try_lock().map(|guard| Self { _guard: guard })
    }
}

impl std::fmt::Debug for EditContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EditContext")
    }
}
