#![forbid(unsafe_code)]

//! Namespace-path resolution over the store's module tree.
//!
//! A namespace like `"a/b"` names a chain of *namespaced* modules, but the
//! chain may be interrupted by transparent modules that do not consume a path
//! segment. Resolution therefore works with an explicit segment cursor:
//!
//! - if a direct child is namespaced and matches the first segment, commit to
//!   it — descend with the cursor advanced, and do not fall back to siblings
//!   if the rest of the path dies inside that child;
//! - otherwise search every child (namespaced or not) for the *full*
//!   remaining path, depth-first in registration order, first match wins.
//!
//! Pure lookup; both variants return `None` for paths that resolve nowhere,
//! including the empty path.

use rewind_store::ModuleNode;

/// Resolve `segments` to a module, searching from (but never returning)
/// `node` itself.
#[must_use]
pub fn find<'a>(node: &'a ModuleNode, segments: &[String]) -> Option<&'a ModuleNode> {
    let (first, rest) = segments.split_first()?;
    if let Some(child) = node
        .children()
        .iter()
        .find(|c| c.is_namespaced() && c.name() == first.as_str())
    {
        return if rest.is_empty() {
            Some(child)
        } else {
            find(child, rest)
        };
    }
    node.children().iter().find_map(|c| find(c, segments))
}

/// Mutable variant of [`find`], for traversals that end in a state write.
pub fn find_mut<'a>(node: &'a mut ModuleNode, segments: &[String]) -> Option<&'a mut ModuleNode> {
    let (first, rest) = segments.split_first()?;
    let direct = node
        .children()
        .iter()
        .position(|c| c.is_namespaced() && c.name() == first.as_str());
    if let Some(index) = direct {
        let child = &mut node.children_mut()[index];
        return if rest.is_empty() {
            Some(child)
        } else {
            find_mut(child, rest)
        };
    }
    for child in node.children_mut() {
        if let Some(found) = find_mut(child, segments) {
            return Some(found);
        }
    }
    None
}

/// Split a namespace string into owned path segments.
#[must_use]
pub fn segments(namespace: &str) -> Vec<String> {
    namespace.split('/').map(str::to_owned).collect()
}
