#![forbid(unsafe_code)]

//! The snapshot/undo-redo engine.
//!
//! [`History::install`] validates the tracking map against the live store
//! tree, seeds every tracked module's pending snapshot with its current
//! state, and subscribes an interceptor to the store's commit notifications.
//! From then on:
//!
//! - every external commit whose namespace matches a tracked module runs that
//!   module's `should_snapshot` predicate and, on acceptance, performs a
//!   capture: the previously pending snapshot moves onto the done stack, the
//!   post-mutation state becomes the new pending snapshot, and the redo
//!   history is dropped;
//! - [`History::undo`]/[`History::redo`] move the current live state onto the
//!   inverse stack, pop the requested stack, and write the popped snapshot
//!   back into live state through the key-filtered restore.
//!
//! Restores are announced through the store with
//! [`OperationKind::Internal`]; the interceptor checks the kind before
//! touching any engine state, so the engine's own writes can never re-enter
//! it.
//!
//! # Panics
//!
//! A tracked namespace is validated at install time. If the module later
//! disappears from the tree (which the store's API does not allow), the
//! engine panics rather than silently skipping the operation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::json;
use tracing::{debug, info, trace};

use rewind_store::{ModuleState, OperationKind, OperationRecord, Store, Subscription};

use crate::error::InstallError;
use crate::locate;
use crate::options::{HistoryConfig, HistoryOptions, ModuleOptions, OperationView};
use crate::stacks::{SnapshotStacks, restore};

/// Namespace under which the engine publishes its own restore operations.
const ENGINE_NAMESPACE: &str = "history";

/// Handle for a tracked module, validated at install time.
///
/// Obtained from [`History::module_id`]; only meaningful for the `History`
/// that issued it. The per-module accessors panic on a foreign handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub(crate) usize);

#[derive(Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

struct TrackedModule {
    namespace: String,
    segments: Vec<String>,
    options: ModuleOptions,
    stacks: SnapshotStacks,
}

impl TrackedModule {
    /// Deep-copy `live` into the pending slot; the previous pending snapshot
    /// becomes the newest done entry. Any redo history is invalidated.
    fn capture(&mut self, live: &ModuleState) {
        let fresh = live.clone();
        if let Some(previous) = self.stacks.replace_pending(fresh) {
            self.stacks.push_done(previous);
        }
        self.stacks.clear_undone();
        debug!(
            namespace = %self.namespace,
            undo_depth = self.stacks.done_len(),
            "snapshot captured"
        );
    }
}

struct Inner {
    modules: Vec<TrackedModule>,
    by_namespace: HashMap<String, ModuleId>,
}

impl Inner {
    /// The mutation interceptor: runs synchronously after every external
    /// commit, filtering to tracked namespaces.
    fn intercept(&mut self, store: &Store, record: &OperationRecord) {
        let Some((namespace, name)) = record.ty.rsplit_once('/') else {
            // Root-level operation; the root is never a tracked namespace.
            return;
        };
        let Some(&id) = self.by_namespace.get(namespace) else {
            return;
        };
        let module = &mut self.modules[id.0];
        let Some(node) = locate::find(store.root(), &module.segments) else {
            panic!("tracked module '{namespace}' is missing from the store tree");
        };
        let view = OperationView {
            ty: name,
            payload: &record.payload,
        };
        let accepted = match &module.options.should_snapshot {
            Some(predicate) => predicate(node.state(), &view),
            None => true,
        };
        if !accepted {
            trace!(namespace, ty = name, "snapshot declined by predicate");
            return;
        }
        module.capture(node.state());
    }
}

/// The installed time-travel plugin.
///
/// Holds the per-module snapshot stacks and the live subscription on the
/// store. Dropping the `History` unsubscribes the interceptor.
pub struct History {
    inner: Rc<RefCell<Inner>>,
    _subscription: Subscription,
}

impl History {
    /// Install the plugin on `store`.
    ///
    /// Every configured namespace is resolved immediately; a namespace that
    /// does not name a live module is a fatal configuration error. Each
    /// tracked module's current state is captured as its initial pending
    /// snapshot, so its very first accepted mutation is undoable.
    pub fn install(
        store: &mut Store,
        options: HistoryOptions,
        config: HistoryConfig,
    ) -> Result<History, InstallError> {
        let tracked = options.into_modules();
        if tracked.is_empty() {
            return Err(InstallError::NoModules);
        }

        let mut modules = Vec::with_capacity(tracked.len());
        let mut by_namespace = HashMap::new();
        for (namespace, module_options) in tracked {
            if by_namespace.contains_key(&namespace) {
                return Err(InstallError::DuplicateNamespace(namespace));
            }
            let segments = locate::segments(&namespace);
            let Some(node) = locate::find(store.root(), &segments) else {
                return Err(InstallError::ModuleNotFound(namespace));
            };
            let mut stacks = SnapshotStacks::new(config.max_depth);
            stacks.set_pending(node.state().clone());
            by_namespace.insert(namespace.clone(), ModuleId(modules.len()));
            modules.push(TrackedModule {
                namespace,
                segments,
                options: module_options,
                stacks,
            });
        }

        let inner = Rc::new(RefCell::new(Inner {
            modules,
            by_namespace,
        }));
        let observer = Rc::clone(&inner);
        let subscription = store.subscribe(move |store, record| {
            // Kind is checked before any engine borrow: a restore published
            // mid-undo must not re-enter the engine.
            if record.kind == OperationKind::Internal {
                return;
            }
            observer.borrow_mut().intercept(store, record);
        });
        info!(modules = inner.borrow().modules.len(), "history installed");
        Ok(History {
            inner,
            _subscription: subscription,
        })
    }

    /// Handle for a tracked namespace.
    #[must_use]
    pub fn module_id(&self, namespace: &str) -> Option<ModuleId> {
        self.inner.borrow().by_namespace.get(namespace).copied()
    }

    /// Tracked namespaces, in configuration order.
    #[must_use]
    pub fn namespaces(&self) -> Vec<String> {
        self.inner
            .borrow()
            .modules
            .iter()
            .map(|m| m.namespace.clone())
            .collect()
    }

    /// Restore the module's most recent past state. Returns `false` (and
    /// changes nothing) when there is nothing to undo.
    pub fn undo(&self, store: &mut Store, id: ModuleId) -> bool {
        self.shift(store, id, Direction::Undo)
    }

    /// Restore the module's most recently undone state. Returns `false` (and
    /// changes nothing) when there is nothing to redo.
    pub fn redo(&self, store: &mut Store, id: ModuleId) -> bool {
        self.shift(store, id, Direction::Redo)
    }

    /// Whether the module has a past state to restore.
    #[must_use]
    pub fn undoable(&self, id: ModuleId) -> bool {
        self.undo_count(id) > 0
    }

    /// Whether the module has an undone state to replay.
    #[must_use]
    pub fn redoable(&self, id: ModuleId) -> bool {
        self.redo_count(id) > 0
    }

    /// Depth of the module's done stack.
    #[must_use]
    pub fn undo_count(&self, id: ModuleId) -> usize {
        self.inner.borrow().modules[id.0].stacks.done_len()
    }

    /// Depth of the module's undone stack.
    #[must_use]
    pub fn redo_count(&self, id: ModuleId) -> usize {
        self.inner.borrow().modules[id.0].stacks.undone_len()
    }

    /// Whether the module's pending slot holds a snapshot.
    #[must_use]
    pub fn has_pending_snapshot(&self, id: ModuleId) -> bool {
        self.inner.borrow().modules[id.0].stacks.has_pending()
    }

    fn shift(&self, store: &mut Store, id: ModuleId, direction: Direction) -> bool {
        let (ty, payload) = {
            let mut inner = self.inner.borrow_mut();
            let module = &mut inner.modules[id.0];
            let available = match direction {
                Direction::Undo => module.stacks.done_len(),
                Direction::Redo => module.stacks.undone_len(),
            };
            if available == 0 {
                return false;
            }
            let Some(node) = locate::find_mut(store.root_mut(), &module.segments) else {
                panic!(
                    "tracked module '{}' is missing from the store tree",
                    module.namespace
                );
            };
            let snapshot = match direction {
                Direction::Undo => module.stacks.pop_done(),
                Direction::Redo => module.stacks.pop_undone(),
            };
            let Some(snapshot) = snapshot else {
                return false;
            };
            // The current live state becomes the newest entry of the inverse
            // stack before it is overwritten.
            let current = node.state().clone();
            match direction {
                Direction::Undo => module.stacks.push_undone(current),
                Direction::Redo => module.stacks.push_done(current),
            }
            restore(
                &snapshot,
                node.state_mut(),
                module.options.include_state.as_ref(),
            );
            module.stacks.set_pending(node.state().clone());
            debug!(
                namespace = %module.namespace,
                op = direction.label(),
                undo_depth = module.stacks.done_len(),
                redo_depth = module.stacks.undone_len(),
                "state restored"
            );
            (
                format!("{ENGINE_NAMESPACE}/{}", direction.label()),
                json!({ "module": module.namespace.clone() }),
            )
        };
        // The engine borrow is released before publishing; the interceptor
        // additionally skips internal records by kind.
        store.publish_internal(ty, payload);
        true
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("History")
            .field("modules", &inner.modules.len())
            .finish_non_exhaustive()
    }
}
