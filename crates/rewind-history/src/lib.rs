#![forbid(unsafe_code)]

//! Snapshot-based time travel for `rewind-store` modules.
//!
//! Installing a [`History`] adds transparent undo/redo to selected namespaced
//! modules: the tracked modules' own mutation handlers stay untouched, and
//! every accepted commit deposits a deep state snapshot into a per-module
//! stack pair.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         History                              │
//! │                                                              │
//! │  commit ──► interceptor ──► should_snapshot? ──► capture     │
//! │                                                   │          │
//! │             per tracked module                    ▼          │
//! │  ┌────────────────┐   ┌────────────────┐   ┌──────────┐     │
//! │  │   Done stack   │   │  Undone stack  │   │ pending  │     │
//! │  │ (past states)  │   │(future states) │   │ snapshot │     │
//! │  └────────────────┘   └────────────────┘   └──────────┘     │
//! │        ▲   │ undo()            ▲   │ redo()                 │
//! │        └───┴────────────────────┴──┴──► live-state restore  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Deferred capture
//!
//! A capture does not push the *current* state onto the done stack; it pushes
//! the previously observed state (the pending snapshot) and parks the current
//! state as the new pending one. Undo therefore restores the state a module
//! had *before* the mutation that triggered tracking, and the very first
//! accepted mutation becomes undoable immediately because install seeds the
//! pending slot with the module's initial state.
//!
//! # Module structure
//!
//! - [`locate`]: resolves a namespace path to a live module in the store tree
//! - [`stacks`]: the per-module done/undone/pending snapshot container
//! - [`options`]: tracking configuration and predicates
//! - [`engine`]: the orchestrator wiring interception, capture, and restore

pub mod engine;
pub mod error;
pub mod locate;
pub mod options;
pub mod stacks;

pub use engine::{History, ModuleId};
pub use error::InstallError;
pub use options::{HistoryConfig, HistoryOptions, ModuleOptions, OperationView};
pub use stacks::{Snapshot, SnapshotStacks};
