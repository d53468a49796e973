//! Unification of shapes observed in the same position.
//!
//! Candidates are treated as a set. Unions are flattened into their members
//! before classification, so merging is associative and a union never
//! contains another union.
use indexmap::IndexMap;

use super::registry::Registry;
use crate::key::FieldKey;
use crate::shape::{ArrayShape, Field, ObjectShape, ShapeId};

/// Merge `candidates` into one shape identity.
pub fn merge(candidates: &[ShapeId], reg: &mut Registry) -> ShapeId {
    let mut ids = dedup(candidates.iter().copied());
    if ids.len() == 1 {
        return ids[0];
    }

    if ids.iter().any(|id| reg.is_union(*id)) {
        ids = dedup(ids.iter().flat_map(|id| match reg.array(*id) {
            Some(a) if a.is_union => a.members.iter().copied().collect::<Vec<_>>(),
            _ => vec![*id],
        }));
        if ids.len() == 1 {
            return ids[0];
        }
    }

    if ids.is_empty() {
        return reg.intern_array(ArrayShape::union([]));
    }

    let objects: Vec<ObjectShape> = ids.iter().filter_map(|id| reg.object(*id).cloned()).collect();
    let lists: Vec<ArrayShape> = ids
        .iter()
        .filter_map(|id| reg.array(*id).filter(|a| !a.is_union).cloned())
        .collect();
    let has_null = ids.iter().any(|id| id.is_null());

    if objects.len() == ids.len() {
        return merge_objects(&objects, reg);
    }
    if lists.len() == ids.len() {
        return merge_lists(&lists, reg);
    }
    if has_null && lists.len() + 1 == ids.len() {
        let merged = merge_lists(&lists, reg);
        return reg.intern_array(ArrayShape::union([merged, ShapeId::NULL]));
    }
    if has_null && objects.len() + 1 == ids.len() {
        let merged = merge_objects(&objects, reg);
        return reg.intern_array(ArrayShape::union([merged, ShapeId::NULL]));
    }

    // mixed kinds or incompatible primitives
    reg.intern_array(ArrayShape::union(ids))
}

struct MergedField {
    key: FieldKey,
    shapes: Vec<ShapeId>,
    seen_in: usize,
    optional: bool,
}

fn merge_objects(objects: &[ObjectShape], reg: &mut Registry) -> ShapeId {
    let mut merged: IndexMap<String, MergedField> = IndexMap::new();
    for object in objects {
        for (raw, field) in &object.fields {
            let entry = merged.entry(raw.clone()).or_insert_with(|| MergedField {
                key: field.key.clone(),
                shapes: Vec::new(),
                seen_in: 0,
                optional: false,
            });
            if !entry.shapes.contains(&field.shape) {
                entry.shapes.push(field.shape);
            }
            entry.seen_in += 1;
            entry.optional |= field.optional;
        }
    }

    let mut out = ObjectShape::default();
    for (raw, m) in merged {
        let shape = match m.shapes.as_slice() {
            [single] => *single,
            many => merge(many, reg),
        };
        let optional = m.optional || m.seen_in < objects.len();
        out.fields.insert(raw, Field { key: m.key, shape, optional });
    }
    reg.intern_object(out)
}

fn merge_lists(lists: &[ArrayShape], reg: &mut Registry) -> ShapeId {
    let elements = dedup(lists.iter().flat_map(|a| a.members.iter().copied()));
    let element = match elements.as_slice() {
        [single] => *single,
        many => merge(many, reg),
    };
    reg.intern_array(ArrayShape::list(element))
}

fn dedup<I: IntoIterator<Item = ShapeId>>(ids: I) -> Vec<ShapeId> {
    let mut out: Vec<ShapeId> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
