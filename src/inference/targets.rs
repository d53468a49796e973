//! Unification of explicit-reference targets.
//!
//! Every structural value annotated with the same `[Target]` describes one
//! declaration, so the object shapes found under those annotations are merged.
//! Members keep their place in the graph and the returned alias table maps
//! each member to the merged shape; naming follows it. The registry stays
//! acyclic even for self-referencing targets (`child[Node]` inside a `Node`).
use std::collections::{BTreeMap, BTreeSet, HashSet};

use indexmap::IndexMap;

use super::merge::merge;
use super::registry::Registry;
use crate::shape::{NodeId, Shape, ShapeId};

// Merging is a join, so a second round normally confirms the first.
const MAX_ROUNDS: usize = 16;

/// Merge the object shapes bound to each annotation target reachable from
/// `root`. Returns `member → merged` for every target with more than one
/// distinct structural shape.
pub fn unify_targets(root: ShapeId, reg: &mut Registry) -> BTreeMap<NodeId, NodeId> {
    let mut merged: IndexMap<String, NodeId> = IndexMap::new();
    let mut groups = IndexMap::new();

    for _ in 0..MAX_ROUNDS {
        let roots: Vec<ShapeId> = std::iter::once(root).chain(merged.values().map(|n| ShapeId::Node(*n))).collect();
        groups = collect_groups(&roots, reg);

        let mut changed = false;
        for (target, members) in &groups {
            let current = merged.get(target).copied();
            let mut candidates: Vec<ShapeId> = members.iter().map(|n| ShapeId::Node(*n)).collect();
            if let Some(node) = current.filter(|n| !members.contains(n)) {
                candidates.push(ShapeId::Node(node));
            }
            if candidates.len() < 2 {
                continue;
            }
            let Some(node) = merge(&candidates, reg).node() else { continue };
            if current != Some(node) {
                merged.insert(target.clone(), node);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut aliases = BTreeMap::new();
    for (target, members) in &groups {
        let Some(node) = merged.get(target) else { continue };
        for member in members.iter().filter(|m| *m != node) {
            // a shape bound to two targets follows the first one
            aliases.entry(*member).or_insert(*node);
        }
    }
    if !merged.is_empty() {
        tracing::debug!(targets = merged.len(), aliased = aliases.len(), "unified explicit-reference targets");
    }
    aliases
}

/// Structural object shapes per annotation target, in first-reach order.
fn collect_groups(roots: &[ShapeId], reg: &Registry) -> IndexMap<String, BTreeSet<NodeId>> {
    let mut groups: IndexMap<String, BTreeSet<NodeId>> = IndexMap::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<ShapeId> = roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let Some(node) = id.node() else { continue };
        if !seen.insert(node) {
            continue;
        }
        let Some(shape) = reg.get(node) else { continue };
        if let Shape::Object(object) = shape {
            for field in object.fields.values() {
                if let Some(target) = field.key.target() {
                    bound_objects(field.shape, reg, groups.entry(target.to_string()).or_default());
                }
            }
        }
        let children: Vec<ShapeId> = shape.children().collect();
        stack.extend(children.into_iter().rev());
    }
    groups
}

/// Non-empty objects a value position is built from: the object itself, or
/// the objects inside lists and unions. `{}` is a placeholder and never counts.
fn bound_objects(id: ShapeId, reg: &Registry, out: &mut BTreeSet<NodeId>) {
    let Some(node) = id.node() else { return };
    match reg.get(node) {
        Some(Shape::Object(o)) if !o.fields.is_empty() => {
            out.insert(node);
        }
        Some(Shape::Array(a)) => {
            for member in &a.members {
                bound_objects(*member, reg, out);
            }
        }
        _ => {}
    }
}
