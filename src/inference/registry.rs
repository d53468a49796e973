//! Content-addressed shape store: an arena of shapes plus a canonical-key index.
use std::collections::{HashMap, HashSet};

use crate::shape::{ArrayShape, NodeId, ObjectShape, Shape, ShapeId};

/// Order-insensitive structural fingerprint of a shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CanonicalKey {
    Object(Vec<(String, bool, ShapeId)>),
    Array { members: Vec<ShapeId>, is_union: bool },
}

impl CanonicalKey {
    fn of(shape: &Shape) -> Self {
        match shape {
            Shape::Object(o) => {
                let mut entries: Vec<_> = o
                    .fields
                    .iter()
                    .map(|(raw, f)| (raw.clone(), f.optional, f.shape))
                    .collect();
                entries.sort();
                CanonicalKey::Object(entries)
            }
            // BTreeSet iteration is already sorted.
            Shape::Array(a) => CanonicalKey::Array {
                members: a.members.iter().copied().collect(),
                is_union: a.is_union,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    slots: Vec<Option<Shape>>,
    index: HashMap<CanonicalKey, NodeId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a structurally equal shape, inserting `shape` if none exists.
    pub fn intern(&mut self, shape: Shape) -> ShapeId {
        let key = CanonicalKey::of(&shape);
        if let Some(id) = self.index.get(&key) {
            return ShapeId::Node(*id);
        }
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(shape));
        self.index.insert(key, id);
        ShapeId::Node(id)
    }

    pub fn intern_object(&mut self, object: ObjectShape) -> ShapeId {
        self.intern(Shape::Object(object))
    }

    pub fn intern_array(&mut self, array: ArrayShape) -> ShapeId {
        self.intern(Shape::Array(array))
    }

    pub fn get(&self, id: NodeId) -> Option<&Shape> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Shape behind an identity; `None` for primitives and dates.
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        id.node().and_then(|n| self.get(n))
    }

    pub fn object(&self, id: ShapeId) -> Option<&ObjectShape> {
        self.shape(id).and_then(Shape::as_object)
    }

    pub fn array(&self, id: ShapeId) -> Option<&ArrayShape> {
        self.shape(id).and_then(Shape::as_array)
    }

    pub fn is_union(&self, id: ShapeId) -> bool {
        self.array(id).is_some_and(|a| a.is_union)
    }

    /// Live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Shape)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (NodeId(i as u32), s)))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Drop every entry not in `keep`; returns how many were removed.
    pub fn retain(&mut self, keep: &HashSet<NodeId>) -> usize {
        let before = self.len();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !keep.contains(&NodeId(i as u32)) {
                *slot = None;
            }
        }
        self.index.retain(|_, id| keep.contains(id));
        before - self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::FieldKey;
    use crate::shape::{Field, Primitive};

    fn object(fields: &[(&str, ShapeId, bool)]) -> ObjectShape {
        let mut o = ObjectShape::default();
        for (k, shape, optional) in fields {
            o.fields.insert(k.to_string(), Field { key: FieldKey::parse(k), shape: *shape, optional: *optional });
        }
        o
    }

    const STR: ShapeId = ShapeId::Primitive(Primitive::String);
    const NUM: ShapeId = ShapeId::Primitive(Primitive::Number);

    #[test]
    fn identical_objects_share_one_entry_regardless_of_key_order() {
        let mut r = Registry::new();
        let a = r.intern_object(object(&[("a", STR, false), ("b", NUM, false)]));
        let b = r.intern_object(object(&[("b", NUM, false), ("a", STR, false)]));
        assert_eq!(a, b);
        assert_eq!(r.len(), 1);
        // first-seen key order is what gets stored
        let keys: Vec<_> = r.object(a).unwrap().fields.keys().cloned().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn optionality_is_part_of_identity() {
        let mut r = Registry::new();
        let a = r.intern_object(object(&[("a", STR, false)]));
        let b = r.intern_object(object(&[("a", STR, true)]));
        assert_ne!(a, b);
    }

    #[test]
    fn union_flag_is_part_of_identity() {
        let mut r = Registry::new();
        let list = r.intern_array(ArrayShape::list(STR));
        let union = r.intern_array(ArrayShape::union([STR]));
        assert_ne!(list, union);
        assert!(r.is_union(union));
        assert!(!r.is_union(list));
    }

    #[test]
    fn empty_objects_are_interned_once() {
        let mut r = Registry::new();
        let a = r.intern_object(ObjectShape::default());
        let b = r.intern_object(ObjectShape::default());
        assert_eq!(a, b);
    }

    #[test]
    fn retain_removes_and_forgets() {
        let mut r = Registry::new();
        let a = r.intern_object(object(&[("a", STR, false)]));
        let b = r.intern_object(object(&[("b", STR, false)]));
        let removed = r.retain(&HashSet::from([a.node().unwrap()]));
        assert_eq!(removed, 1);
        assert!(r.shape(b).is_none());
        assert_eq!(r.iter().count(), 1);
        // re-interning a pruned shape yields a fresh slot
        let b2 = r.intern_object(object(&[("b", STR, false)]));
        assert_ne!(b, b2);
    }
}
