#![forbid(unsafe_code)]

//! Per-module snapshot container: the done/undone stack pair plus the
//! pending-snapshot slot.
//!
//! ```text
//! capture(s2)                       undo()
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │ Done:    [s0, s1]        │      │ Done:    [s0]            │
//! │ Undone:  []              │ ───► │ Undone:  [live]          │
//! │ Pending: s2              │      │ Pending: s1 (restored)   │
//! └──────────────────────────┘      └──────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. Stacks are strict LIFO: push/pop at the back only.
//! 2. `done.len() <= max_depth` after any operation; the oldest snapshot is
//!    evicted from the front when the bound is exceeded.
//! 3. A snapshot is owned by exactly one slot; popping transfers ownership
//!    to the caller.
//!
//! The engine composes these primitives; the stacks themselves never touch
//! live state. The one exception is [`restore`], the key-filtered write that
//! applies a popped snapshot.

use std::collections::VecDeque;

use rewind_store::ModuleState;

use crate::options::IncludeStateFn;

/// A deep, independent copy of a module's state at one instant.
pub type Snapshot = ModuleState;

/// The done/undone/pending snapshot container for one tracked module.
#[derive(Debug)]
pub struct SnapshotStacks {
    done: VecDeque<Snapshot>,
    undone: VecDeque<Snapshot>,
    pending: Option<Snapshot>,
    max_depth: usize,
}

impl SnapshotStacks {
    /// Create empty stacks with the given done-stack depth bound.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: VecDeque::new(),
            pending: None,
            max_depth,
        }
    }

    /// Push a snapshot of a past state, evicting the oldest if the depth
    /// bound is exceeded.
    pub fn push_done(&mut self, snapshot: Snapshot) {
        self.done.push_back(snapshot);
        while self.done.len() > self.max_depth {
            self.done.pop_front();
        }
    }

    /// Pop the most recent past state.
    pub fn pop_done(&mut self) -> Option<Snapshot> {
        self.done.pop_back()
    }

    /// Push a snapshot of a future state (reachable via redo).
    pub fn push_undone(&mut self, snapshot: Snapshot) {
        self.undone.push_back(snapshot);
    }

    /// Pop the most recently undone state.
    pub fn pop_undone(&mut self) -> Option<Snapshot> {
        self.undone.pop_back()
    }

    /// Drop the redo history.
    pub fn clear_undone(&mut self) {
        self.undone.clear();
    }

    /// Number of past states.
    #[must_use]
    pub fn done_len(&self) -> usize {
        self.done.len()
    }

    /// Number of future states.
    #[must_use]
    pub fn undone_len(&self) -> usize {
        self.undone.len()
    }

    /// Whether the pending slot holds a snapshot.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Overwrite the pending slot.
    pub fn set_pending(&mut self, snapshot: Snapshot) {
        self.pending = Some(snapshot);
    }

    /// Overwrite the pending slot, returning the previous occupant.
    pub fn replace_pending(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        self.pending.replace(snapshot)
    }
}

/// Write a snapshot back into live state, key by key.
///
/// Each key present in the snapshot is deep-copied into `live` only if the
/// `include` predicate accepts it (absent predicate accepts everything).
/// Excluded keys — and keys present in `live` but not in the snapshot — are
/// left untouched.
pub(crate) fn restore(
    snapshot: &Snapshot,
    live: &mut ModuleState,
    include: Option<&IncludeStateFn>,
) {
    for (key, value) in snapshot {
        let included = match include {
            Some(predicate) => predicate(live, key),
            None => true,
        };
        if included {
            live.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: i64) -> Snapshot {
        let mut state = Snapshot::new();
        state.insert("value".into(), json!(value));
        state
    }

    #[test]
    fn new_stacks_are_empty() {
        let stacks = SnapshotStacks::new(10);
        assert_eq!(stacks.done_len(), 0);
        assert_eq!(stacks.undone_len(), 0);
        assert!(!stacks.has_pending());
    }

    #[test]
    fn stacks_are_lifo() {
        let mut stacks = SnapshotStacks::new(10);
        stacks.push_done(snapshot(1));
        stacks.push_done(snapshot(2));
        assert_eq!(stacks.pop_done().unwrap()["value"], json!(2));
        assert_eq!(stacks.pop_done().unwrap()["value"], json!(1));
        assert!(stacks.pop_done().is_none());
    }

    #[test]
    fn done_and_undone_are_independent() {
        let mut stacks = SnapshotStacks::new(10);
        stacks.push_done(snapshot(1));
        stacks.push_undone(snapshot(2));
        assert_eq!(stacks.done_len(), 1);
        assert_eq!(stacks.undone_len(), 1);
        stacks.clear_undone();
        assert_eq!(stacks.done_len(), 1);
        assert_eq!(stacks.undone_len(), 0);
    }

    #[test]
    fn depth_bound_evicts_oldest_done() {
        let mut stacks = SnapshotStacks::new(2);
        stacks.push_done(snapshot(1));
        stacks.push_done(snapshot(2));
        stacks.push_done(snapshot(3));
        assert_eq!(stacks.done_len(), 2);
        assert_eq!(stacks.pop_done().unwrap()["value"], json!(3));
        assert_eq!(stacks.pop_done().unwrap()["value"], json!(2));
        assert!(stacks.pop_done().is_none());
    }

    #[test]
    fn replace_pending_hands_back_previous() {
        let mut stacks = SnapshotStacks::new(10);
        assert!(stacks.replace_pending(snapshot(1)).is_none());
        let previous = stacks.replace_pending(snapshot(2)).unwrap();
        assert_eq!(previous["value"], json!(1));
        assert!(stacks.has_pending());
    }

    #[test]
    fn restore_overwrites_every_key_without_predicate() {
        let mut live = Snapshot::new();
        live.insert("value".into(), json!("live"));
        live.insert("extra".into(), json!(true));

        let mut old = Snapshot::new();
        old.insert("value".into(), json!("old"));

        restore(&old, &mut live, None);
        assert_eq!(live["value"], json!("old"));
        // Keys absent from the snapshot are untouched.
        assert_eq!(live["extra"], json!(true));
    }

    #[test]
    fn restore_skips_keys_the_predicate_excludes() {
        let mut live = Snapshot::new();
        live.insert("value".into(), json!("live"));
        live.insert("theme".into(), json!("dark"));

        let mut old = Snapshot::new();
        old.insert("value".into(), json!("old"));
        old.insert("theme".into(), json!("light"));

        let include: IncludeStateFn = Box::new(|_, key| key != "theme");
        restore(&old, &mut live, Some(&include));
        assert_eq!(live["value"], json!("old"));
        assert_eq!(live["theme"], json!("dark"));
    }
}
