#![forbid(unsafe_code)]

//! The store: commit dispatch and change notification.
//!
//! # Design
//!
//! Handlers are indexed once, at build/registration time, into a flat map
//! from fully-qualified operation type to the modules that registered it. A
//! transparent module's mutations register under its parent's namespace, so
//! one qualified type can fan out to several modules (each handler still only
//! sees its own module's state).
//!
//! Subscribers are stored as `Weak` references; the strong reference lives in
//! the [`Subscription`] guard returned by [`Store::subscribe`]. Dead entries
//! are pruned lazily during notification, and the notify pass iterates a
//! collected list of live callbacks so a subscriber may inspect the store
//! while the notification is in flight.
//!
//! # Invariants
//!
//! 1. Subscribers are notified exactly once per commit, after every handler
//!    for that commit has run.
//! 2. Notification order is subscription order.
//! 3. [`OperationKind::Internal`] records never dispatch handlers; they only
//!    notify.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::trace;

use crate::error::StoreError;
use crate::module::{ModuleDef, ModuleNode};

/// Who originated a state-changing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// An ordinary application commit.
    External,
    /// An overwrite performed by an installed plugin (e.g. a history
    /// restore). Subscribers that write state themselves check this to avoid
    /// reacting to their own operations.
    Internal,
}

/// Notification describing one completed state-changing operation.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    /// Fully-qualified operation type, e.g. `"a/b/set_value"`.
    pub ty: String,
    /// The payload the operation was committed with.
    pub payload: Value,
    /// Origin marker.
    pub kind: OperationKind,
}

type SubscriberFn = dyn Fn(&Store, &OperationRecord);

/// Where a registered mutation lives: the child-index path of its module and
/// the unqualified handler name within that module.
#[derive(Clone)]
struct HandlerEntry {
    path: Vec<usize>,
    mutation: String,
}

/// Builder for a [`Store`].
///
/// The builder itself describes the root container (transparent, name `""`);
/// nested modules are attached with [`StoreBuilder::module`].
#[derive(Default)]
pub struct StoreBuilder {
    root: ModuleDef,
}

impl StoreBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one root-level state key.
    #[must_use]
    pub fn state(mut self, key: impl Into<String>, value: Value) -> Self {
        self.root = self.root.state(key, value);
        self
    }

    /// Register a root-level mutation handler.
    #[must_use]
    pub fn mutation(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut crate::module::ModuleState, &Value) + 'static,
    ) -> Self {
        self.root = self.root.mutation(name, handler);
        self
    }

    /// Attach a top-level module.
    #[must_use]
    pub fn module(mut self, name: impl Into<String>, def: ModuleDef) -> Self {
        self.root = self.root.module(name, def);
        self
    }

    /// Build the store, indexing every mutation in the tree.
    ///
    /// Fails on duplicate sibling module names or duplicate mutation names
    /// within one module.
    pub fn build(self) -> Result<Store, StoreError> {
        let root = self.root.into_node(String::new());
        let mut entries = Vec::new();
        collect_handlers(&root, &mut Vec::new(), "", &mut entries)?;

        let mut handlers: HashMap<String, Vec<HandlerEntry>> = HashMap::new();
        for (ty, entry) in entries {
            handlers.entry(ty).or_default().push(entry);
        }
        Ok(Store {
            root,
            handlers,
            subscribers: Vec::new(),
        })
    }
}

/// Centralized state container.
pub struct Store {
    root: ModuleNode,
    handlers: HashMap<String, Vec<HandlerEntry>>,
    subscribers: Vec<Weak<SubscriberFn>>,
}

impl Store {
    /// The root container node.
    #[must_use]
    pub fn root(&self) -> &ModuleNode {
        &self.root
    }

    /// Mutable access to the root container node.
    pub fn root_mut(&mut self) -> &mut ModuleNode {
        &mut self.root
    }

    /// Register a new top-level module after construction.
    ///
    /// The module's mutations are indexed exactly as at build time. Nothing
    /// is registered if validation fails.
    pub fn register_module(
        &mut self,
        name: impl Into<String>,
        def: ModuleDef,
    ) -> Result<(), StoreError> {
        let name = name.into();
        if self.root.children().iter().any(|c| c.name() == name) {
            return Err(StoreError::DuplicateModule(name));
        }
        let node = def.into_node(name);
        let namespace = if node.is_namespaced() {
            node.name().to_owned()
        } else {
            String::new()
        };
        let index = self.root.children().len();
        let mut entries = Vec::new();
        collect_handlers(&node, &mut vec![index], &namespace, &mut entries)?;

        self.root.push_child(node);
        for (ty, entry) in entries {
            self.handlers.entry(ty).or_default().push(entry);
        }
        Ok(())
    }

    /// Apply every handler registered under the fully-qualified `ty`, then
    /// notify subscribers with an [`OperationKind::External`] record.
    pub fn commit(&mut self, ty: &str, payload: Value) -> Result<(), StoreError> {
        let entries = self
            .handlers
            .get(ty)
            .cloned()
            .ok_or_else(|| StoreError::UnknownOperation(ty.to_owned()))?;
        for entry in &entries {
            let node = node_at_mut(&mut self.root, &entry.path);
            if let Some(handler) = node.mutation(&entry.mutation) {
                handler(node.state_mut(), &payload);
            }
        }
        trace!(ty, handlers = entries.len(), "commit applied");

        let record = OperationRecord {
            ty: ty.to_owned(),
            payload,
            kind: OperationKind::External,
        };
        self.notify(&record);
        Ok(())
    }

    /// Notify subscribers of a plugin-originated overwrite.
    ///
    /// No handlers run; the record carries [`OperationKind::Internal`] so the
    /// publishing plugin's own subscriber can skip it.
    pub fn publish_internal(&mut self, ty: impl Into<String>, payload: Value) {
        let record = OperationRecord {
            ty: ty.into(),
            payload,
            kind: OperationKind::Internal,
        };
        trace!(ty = %record.ty, "internal operation published");
        self.notify(&record);
    }

    /// Subscribe to commit notifications. The callback runs synchronously
    /// after each state-changing operation completes.
    ///
    /// Returns a [`Subscription`] guard; dropping it unsubscribes the
    /// callback (the dead entry is pruned on the next notification).
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&Store, &OperationRecord) + 'static,
    ) -> Subscription {
        let strong: Rc<SubscriberFn> = Rc::new(callback);
        self.subscribers.push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Number of registered subscribers (including dead ones not yet pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify(&mut self, record: &OperationRecord) {
        self.subscribers.retain(|w| w.strong_count() > 0);
        let callbacks: Vec<Rc<SubscriberFn>> =
            self.subscribers.iter().filter_map(Weak::upgrade).collect();
        for callback in &callbacks {
            callback(self, record);
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("operation_types", &self.handlers.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the guard drops the strong reference, so the store's `Weak`
/// loses its referent and the callback is never invoked again.
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

fn qualify(namespace: &str, leaf: &str) -> String {
    if namespace.is_empty() {
        leaf.to_owned()
    } else {
        format!("{namespace}/{leaf}")
    }
}

fn node_at_mut<'a>(root: &'a mut ModuleNode, path: &[usize]) -> &'a mut ModuleNode {
    let mut node = root;
    for &index in path {
        node = &mut node.children_mut()[index];
    }
    node
}

/// Walk a subtree collecting `(qualified type, handler entry)` pairs.
///
/// `path` is the child-index cursor from the store root to `node`;
/// `namespace` is the accumulated namespace of `node` itself. Validation
/// errors leave `out` partially filled; callers only apply it on `Ok`.
fn collect_handlers(
    node: &ModuleNode,
    path: &mut Vec<usize>,
    namespace: &str,
    out: &mut Vec<(String, HandlerEntry)>,
) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for name in node.mutation_names() {
        if !seen.insert(name.to_owned()) {
            return Err(StoreError::DuplicateMutation(qualify(namespace, name)));
        }
        out.push((
            qualify(namespace, name),
            HandlerEntry {
                path: path.clone(),
                mutation: name.to_owned(),
            },
        ));
    }

    let mut seen_children = HashSet::new();
    for (index, child) in node.children().iter().enumerate() {
        if !seen_children.insert(child.name().to_owned()) {
            return Err(StoreError::DuplicateModule(child.name().to_owned()));
        }
        let child_namespace = if child.is_namespaced() {
            qualify(namespace, child.name())
        } else {
            namespace.to_owned()
        };
        path.push(index);
        collect_handlers(child, path, &child_namespace, out)?;
        path.pop();
    }
    Ok(())
}
