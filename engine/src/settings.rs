//! Runtime settings that change how constraints are built.

use std::sync::atomic::{AtomicBool, Ordering};

/// Settings shared by everything that builds equality constraints.
///
/// The flag is read with an atomic load on every call, so a change made with
/// [`QuerySettings::set_use_equal_operator`] is visible to the very next
/// constraint built from any thread. Share it with `Arc<QuerySettings>`.
#[derive(Debug, Default)]
pub struct QuerySettings {
    use_equal_operator: AtomicBool,
}

impl QuerySettings {
    /// Create settings with an explicit equality mode.
    pub fn new(use_equal_operator: bool) -> Self {
        Self {
            use_equal_operator: AtomicBool::new(use_equal_operator),
        }
    }

    /// Whether `equal_to` emits `$eq` instead of the bare shorthand.
    ///
    /// The `$eq` form is not understood by the live query evaluator of older
    /// servers.
    pub fn use_equal_operator(&self) -> bool {
        self.use_equal_operator.load(Ordering::Acquire)
    }

    /// Switch the equality mode for all subsequent calls.
    pub fn set_use_equal_operator(&self, enabled: bool) {
        self.use_equal_operator.store(enabled, Ordering::Release);
    }
}

impl Clone for QuerySettings {
    fn clone(&self) -> Self {
        Self::new(self.use_equal_operator())
    }
}
