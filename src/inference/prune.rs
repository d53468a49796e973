//! Reachability pruning.
//!
//! Array and object merging interns per-element shapes before the merged
//! shape exists; those intermediate entries are dead once the merge result
//! replaces them.
use std::collections::HashSet;

use super::registry::Registry;
use crate::shape::{NodeId, ShapeId};

/// Every registry entry reachable from `root`.
pub fn reachable(root: ShapeId, reg: &Registry) -> HashSet<NodeId> {
    reachable_from(&[root], reg)
}

/// Every registry entry reachable from any of `roots`.
pub fn reachable_from(roots: &[ShapeId], reg: &Registry) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<ShapeId> = roots.to_vec();
    while let Some(id) = stack.pop() {
        let Some(node) = id.node() else { continue };
        if !seen.insert(node) {
            continue;
        }
        if let Some(shape) = reg.get(node) {
            stack.extend(shape.children().filter(|c| c.node().is_some()));
        }
    }
    seen
}

/// Remove every entry not reachable from `root`; returns the number removed.
pub fn prune(root: ShapeId, reg: &mut Registry) -> usize {
    prune_from(&[root], reg)
}

/// Remove every entry not reachable from any of `roots`.
pub fn prune_from(roots: &[ShapeId], reg: &mut Registry) -> usize {
    let keep = reachable_from(roots, reg);
    let removed = reg.retain(&keep);
    tracing::debug!(removed, kept = reg.len(), "pruned unreachable shapes");
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Inference;
    use serde_json::json;

    #[test]
    fn merged_arrays_leave_no_dead_entries() {
        let mut inf = Inference::new(Default::default());
        let root = inf
            .observe(&json!({ "xs": [{ "a": 1 }, { "b": "x" }, { "a": 2, "b": "y" }] }))
            .unwrap();
        let mut reg = inf.into_registry();
        let before = reg.len();
        let removed = prune(root, &mut reg);
        assert!(removed > 0);
        assert_eq!(reg.len(), before - removed);
        // root, list, merged element
        assert_eq!(reg.len(), 3);
        let live: HashSet<_> = reg.iter().map(|(id, _)| id).collect();
        assert_eq!(live, reachable(root, &reg));
    }

    #[test]
    fn extra_roots_keep_detached_shapes() {
        let mut reg = Registry::new();
        let root = reg.intern_object(Default::default());
        let detached = reg.intern_array(crate::shape::ArrayShape::list(ShapeId::ANY));
        let dead = reg.intern_array(crate::shape::ArrayShape::list(ShapeId::NULL));
        assert_eq!(prune_from(&[root, detached], &mut reg), 1);
        assert!(reg.shape(detached).is_some());
        assert!(reg.shape(dead).is_none());
    }

    #[test]
    fn primitive_root_keeps_nothing() {
        let mut reg = Registry::new();
        reg.intern_object(Default::default());
        assert_eq!(prune(ShapeId::ANY, &mut reg), 1);
        assert!(reg.is_empty());
    }
}
