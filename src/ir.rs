// Resolved declaration IR for codegen. No registry identities here.
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::shape::Primitive;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum TypeRef {
    Primitive(Primitive),
    Date,
    Named(String),
    Array(Box<TypeRef>),
    Union(Vec<TypeRef>),      // flat, never nested
}

impl TypeRef {
    pub const ANY: TypeRef = TypeRef::Primitive(Primitive::Any);

    /// Declaration this type points at, looking through one list level.
    pub fn named(&self) -> Option<&str> {
        match self {
            TypeRef::Named(n) => Some(n),
            TypeRef::Array(inner) => inner.named(),
            _ => None,
        }
    }

    /// Every declaration name mentioned anywhere in this type.
    pub fn references(&self) -> Vec<&str> {
        match self {
            TypeRef::Named(n) => vec![n.as_str()],
            TypeRef::Array(inner) => inner.references(),
            TypeRef::Union(arms) => arms.iter().flat_map(TypeRef::references).collect(),
            TypeRef::Primitive(_) | TypeRef::Date => Vec::new(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(p.keyword()),
            TypeRef::Date => f.write_str("Date"),
            TypeRef::Named(n) => f.write_str(n),
            TypeRef::Array(inner) if matches!(**inner, TypeRef::Union(_)) => write!(f, "({inner})[]"),
            TypeRef::Array(inner) => write!(f, "{inner}[]"),
            TypeRef::Union(arms) => {
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{arm}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Plain,
    Reference,
    /// Becomes `extends` in class form; an ordinary field in interface form.
    Subclass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclField {
    pub key: String,         // annotation stripped unless a sibling owns that key; unquoted
    pub ty: TypeRef,
    pub optional: bool,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub fields: Vec<DeclField>,  // first-seen key order
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    /// An explicit reference target and a differently shaped declaration wanted the same name.
    NameCollision { target: String, assigned: String },
    /// An explicit reference whose target is never declared.
    UnresolvedReference { declaration: String, field: String, target: String },
    /// A second `+key[Target]` tried to give `child` another parent.
    ConflictingParent { child: String, parent: String, kept: String },
    /// An annotated key strips to a key its object already has; the raw key is kept.
    DuplicateKey { declaration: String, key: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub declarations: Vec<Declaration>,
    /// child name → parent name
    pub subclasses: BTreeMap<String, String>,
    pub warnings: Vec<Warning>,
}

impl Resolution {
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }
}
