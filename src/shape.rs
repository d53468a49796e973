//! Shape model shared by the builder, the merge engine and the resolver.
//!
//! Primitive and date shapes are identity-only. Object and array shapes live
//! in the registry arena and are referenced by `NodeId`, so the shape graph is
//! a DAG of indices and never owns its children.
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::key::FieldKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Null,
    Any,
}

impl Primitive {
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Null => "null",
            Primitive::Any => "any",
        }
    }
}

/// Index of an object/array shape in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a shape. Equal identities mean structurally equal shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeId {
    Primitive(Primitive),
    Date,
    Node(NodeId),
}

impl ShapeId {
    pub const NULL: ShapeId = ShapeId::Primitive(Primitive::Null);
    pub const ANY: ShapeId = ShapeId::Primitive(Primitive::Any);

    pub fn node(self) -> Option<NodeId> {
        match self {
            ShapeId::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeId::Primitive(p) => f.write_str(p.keyword()),
            ShapeId::Date => f.write_str("Date"),
            ShapeId::Node(id) => write!(f, "#{}", id.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: FieldKey,
    pub shape: ShapeId,
    pub optional: bool,
}

/// Fields keyed by the raw JSON key, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectShape {
    pub fields: IndexMap<String, Field>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayShape {
    pub members: BTreeSet<ShapeId>,
    /// `true`: a union value `A | B`. `false`: a list `T[]`.
    pub is_union: bool,
}

impl ArrayShape {
    pub fn list(element: ShapeId) -> Self {
        Self { members: BTreeSet::from([element]), is_union: false }
    }

    pub fn union<I: IntoIterator<Item = ShapeId>>(members: I) -> Self {
        Self { members: members.into_iter().collect(), is_union: true }
    }

    /// The union of nothing: element type of `[]`.
    pub fn is_empty_union(&self) -> bool {
        self.is_union && self.members.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Object(ObjectShape),
    Array(ArrayShape),
}

impl Shape {
    pub fn as_object(&self) -> Option<&ObjectShape> {
        match self {
            Shape::Object(o) => Some(o),
            Shape::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayShape> {
        match self {
            Shape::Array(a) => Some(a),
            Shape::Object(_) => None,
        }
    }

    /// Identities this shape points at.
    pub fn children(&self) -> Box<dyn Iterator<Item = ShapeId> + '_> {
        match self {
            Shape::Object(o) => Box::new(o.fields.values().map(|f| f.shape)),
            Shape::Array(a) => Box::new(a.members.iter().copied()),
        }
    }
}

// ------------------------------ Classifier -------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeGroup {
    Primitive,
    Date,
    Array,
    Object,
}

pub fn classify(v: &Value, detect_dates: bool) -> TypeGroup {
    match v {
        Value::Array(_) => TypeGroup::Array,
        Value::Object(_) => TypeGroup::Object,
        Value::String(s) if detect_dates && looks_like_date(s) => TypeGroup::Date,
        _ => TypeGroup::Primitive,
    }
}

pub fn primitive_of(v: &Value) -> Primitive {
    match v {
        Value::Null => Primitive::Null,
        Value::Bool(_) => Primitive::Boolean,
        Value::Number(_) => Primitive::Number,
        Value::String(_) => Primitive::String,
        Value::Array(_) | Value::Object(_) => Primitive::Any,
    }
}

/// RFC 3339 timestamps and plain ISO 8601 calendar dates.
pub fn looks_like_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_groups() {
        assert_eq!(classify(&json!({}), false), TypeGroup::Object);
        assert_eq!(classify(&json!([1]), false), TypeGroup::Array);
        assert_eq!(classify(&json!(null), false), TypeGroup::Primitive);
        assert_eq!(classify(&json!("2024-01-15T10:30:00Z"), false), TypeGroup::Primitive);
        assert_eq!(classify(&json!("2024-01-15T10:30:00Z"), true), TypeGroup::Date);
        assert_eq!(classify(&json!("2024-01-15"), true), TypeGroup::Date);
        assert_eq!(classify(&json!("yesterday"), true), TypeGroup::Primitive);
    }

    #[test]
    fn all_numbers_collapse() {
        assert_eq!(primitive_of(&json!(1)), Primitive::Number);
        assert_eq!(primitive_of(&json!(-1.5)), Primitive::Number);
        assert_eq!(primitive_of(&json!(u64::MAX)), Primitive::Number);
    }

    #[test]
    fn identity_display() {
        assert_eq!(ShapeId::NULL.to_string(), "null");
        assert_eq!(ShapeId::Date.to_string(), "Date");
        assert_eq!(ShapeId::Node(NodeId(3)).to_string(), "#3");
    }
}
