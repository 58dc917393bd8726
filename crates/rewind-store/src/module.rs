#![forbid(unsafe_code)]

//! Module tree building blocks.
//!
//! A module is declared with [`ModuleDef`] (a builder) and lives inside the
//! store as a [`ModuleNode`]. State is a dynamic JSON object so that a
//! snapshotting plugin can deep-copy it with `clone()` and restore it key by
//! key without knowing the module's schema.
//!
//! # Invariants
//!
//! 1. Sibling module names are unique (enforced at store build time).
//! 2. Mutation names are unique within one module (enforced at build time).
//! 3. A handler only ever receives its own module's state.

use std::rc::Rc;

use serde_json::Value;

/// Keyed state of a single module: field name → JSON value.
pub type ModuleState = serde_json::Map<String, Value>;

/// A named mutation handler. Receives the owning module's live state and the
/// committed payload.
pub type MutationFn = Rc<dyn Fn(&mut ModuleState, &Value)>;

/// Declarative description of a module, built up with chained calls and
/// turned into a live tree node when the store is built.
///
/// Modules default to transparent; call [`ModuleDef::namespaced`] to make the
/// module's name a path segment of its operations' qualified types.
#[derive(Default)]
pub struct ModuleDef {
    pub(crate) namespaced: bool,
    pub(crate) state: ModuleState,
    pub(crate) mutations: Vec<(String, MutationFn)>,
    pub(crate) children: Vec<(String, ModuleDef)>,
}

impl ModuleDef {
    /// Create an empty, transparent module definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make this module namespaced: its name becomes a path segment.
    #[must_use]
    pub fn namespaced(mut self) -> Self {
        self.namespaced = true;
        self
    }

    /// Set one initial state key.
    #[must_use]
    pub fn state(mut self, key: impl Into<String>, value: Value) -> Self {
        self.state.insert(key.into(), value);
        self
    }

    /// Register a named mutation handler.
    #[must_use]
    pub fn mutation(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut ModuleState, &Value) + 'static,
    ) -> Self {
        self.mutations.push((name.into(), Rc::new(handler)));
        self
    }

    /// Attach a child module under the given name.
    #[must_use]
    pub fn module(mut self, name: impl Into<String>, def: ModuleDef) -> Self {
        self.children.push((name.into(), def));
        self
    }

    pub(crate) fn into_node(self, name: String) -> ModuleNode {
        ModuleNode {
            name,
            namespaced: self.namespaced,
            state: self.state,
            mutations: self.mutations,
            children: self
                .children
                .into_iter()
                .map(|(child_name, def)| def.into_node(child_name))
                .collect(),
        }
    }
}

/// A live module inside the store tree.
///
/// Children keep registration order; path searches over the tree use that
/// order as the tie-break.
pub struct ModuleNode {
    name: String,
    namespaced: bool,
    state: ModuleState,
    mutations: Vec<(String, MutationFn)>,
    children: Vec<ModuleNode>,
}

impl ModuleNode {
    /// The module's name (empty for the root container).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this module's name is a path segment.
    #[must_use]
    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    /// The module's live state.
    #[must_use]
    pub fn state(&self) -> &ModuleState {
        &self.state
    }

    /// Mutable access to the module's live state.
    pub fn state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    /// Direct children, in registration order.
    #[must_use]
    pub fn children(&self) -> &[ModuleNode] {
        &self.children
    }

    /// Mutable access to the children, for tree traversals that end in a
    /// state write.
    pub fn children_mut(&mut self) -> &mut [ModuleNode] {
        &mut self.children
    }

    pub(crate) fn push_child(&mut self, node: ModuleNode) {
        self.children.push(node);
    }

    /// Look up a mutation handler by its unqualified name.
    pub(crate) fn mutation(&self, name: &str) -> Option<MutationFn> {
        self.mutations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| Rc::clone(f))
    }

    pub(crate) fn mutation_names(&self) -> impl Iterator<Item = &str> {
        self.mutations.iter().map(|(n, _)| n.as_str())
    }
}

impl std::fmt::Debug for ModuleNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleNode")
            .field("name", &self.name)
            .field("namespaced", &self.namespaced)
            .field("state_keys", &self.state.len())
            .field("mutations", &self.mutations.len())
            .field("children", &self.children.len())
            .finish()
    }
}
