#![forbid(unsafe_code)]

//! Minimal centralized state container.
//!
//! A [`Store`] holds a tree of named modules. Each module owns a keyed state
//! object ([`ModuleState`]) and a set of named mutation handlers. Modules are
//! either *namespaced* — their name is a path segment of the fully-qualified
//! operation types they handle — or *transparent*, in which case their
//! mutations and children attach to the parent's namespace.
//!
//! State changes flow through [`Store::commit`]: the fully-qualified type
//! selects every registered handler, each handler mutates its own module's
//! state, and subscribers are then notified synchronously with an
//! [`OperationRecord`]. Plugins that overwrite state themselves (such as an
//! undo engine) publish their writes with [`OperationKind::Internal`] so
//! co-subscribers can tell engine-originated operations from application
//! commits.
//!
//! # Role in rewind
//!
//! `rewind-store` is the host collaborator: it knows nothing about snapshots
//! or undo. The time-travel plugin in `rewind-history` consumes exactly the
//! surface exposed here — module-tree traversal, keyed state reads/writes,
//! commit notification, and post-construction module registration.
//!
//! # Concurrency
//!
//! Single-threaded and synchronous end-to-end. Subscribers run inside the
//! committing call; there is no event loop and no locking.

pub mod error;
pub mod module;
pub mod store;

pub use error::StoreError;
pub use module::{ModuleDef, ModuleNode, ModuleState, MutationFn};
pub use store::{OperationKind, OperationRecord, Store, StoreBuilder, Subscription};
