#![forbid(unsafe_code)]

//! Tracking configuration: which modules to track, which operations trigger
//! a snapshot, which state keys participate in restore.

use rewind_store::ModuleState;
use serde_json::Value;

/// A module-local view of a committed operation: the namespace prefix is
/// stripped so predicates reason about the module's own mutation names.
#[derive(Debug, Clone, Copy)]
pub struct OperationView<'a> {
    /// Unqualified operation name, e.g. `"set_value"`.
    pub ty: &'a str,
    /// The committed payload.
    pub payload: &'a Value,
}

/// Decides whether an accepted operation captures a snapshot. Receives the
/// module's post-mutation state and the de-namespaced operation.
pub type ShouldSnapshotFn = Box<dyn Fn(&ModuleState, &OperationView<'_>) -> bool>;

/// Decides whether a state key is written during restore. Receives the live
/// state and the key name.
pub type IncludeStateFn = Box<dyn Fn(&ModuleState, &str) -> bool>;

/// Per-module tracking options. Both predicates default to "accept
/// everything" when absent.
#[derive(Default)]
pub struct ModuleOptions {
    pub(crate) should_snapshot: Option<ShouldSnapshotFn>,
    pub(crate) include_state: Option<IncludeStateFn>,
}

impl ModuleOptions {
    /// Track every operation and restore every key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only operations accepted by `predicate` capture snapshots.
    #[must_use]
    pub fn should_snapshot(
        mut self,
        predicate: impl Fn(&ModuleState, &OperationView<'_>) -> bool + 'static,
    ) -> Self {
        self.should_snapshot = Some(Box::new(predicate));
        self
    }

    /// Only keys accepted by `predicate` are written during restore.
    #[must_use]
    pub fn include_state(
        mut self,
        predicate: impl Fn(&ModuleState, &str) -> bool + 'static,
    ) -> Self {
        self.include_state = Some(Box::new(predicate));
        self
    }
}

impl std::fmt::Debug for ModuleOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleOptions")
            .field("should_snapshot", &self.should_snapshot.is_some())
            .field("include_state", &self.include_state.is_some())
            .finish()
    }
}

/// The full tracking map handed to [`History::install`](crate::History::install):
/// namespace → options, in insertion order.
#[derive(Debug, Default)]
pub struct HistoryOptions {
    modules: Vec<(String, ModuleOptions)>,
}

impl HistoryOptions {
    /// Create an empty tracking map. At least one [`track`](Self::track)
    /// call is required before install.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the module at `namespace` with the given options.
    #[must_use]
    pub fn track(mut self, namespace: impl Into<String>, options: ModuleOptions) -> Self {
        self.modules.push((namespace.into(), options));
        self
    }

    /// Whether any module is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub(crate) fn into_modules(self) -> Vec<(String, ModuleOptions)> {
        self.modules
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of snapshots retained on each done stack. The oldest
    /// snapshot is evicted when the bound is exceeded.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl HistoryConfig {
    /// Create a configuration with the given depth bound.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Create an unbounded configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
        }
    }
}
