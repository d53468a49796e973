//! Field keys and the explicit-reference mini-grammar.
//!
//! - `base[Target]`  binds the field to declaration `Target`
//! - `+base[Target]` additionally makes `Target` a subclass of the declaring type
//! - `+base`         subclass whose name is derived from `base`
use once_cell::sync::Lazy;
use regex::Regex;

static ANNOTATED_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+)?(.*)\[([A-Za-z_$][A-Za-z0-9_$]*)\]$").expect("annotated key regex"));

static BARE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldAnnotation {
    Plain,
    Reference(String),
    Subclass(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    /// Key with any annotation stripped.
    pub name: String,
    pub annotation: FieldAnnotation,
}

impl FieldKey {
    pub fn parse(raw: &str) -> Self {
        if let Some(caps) = ANNOTATED_KEY.captures(raw) {
            let name = caps[2].to_string();
            let target = caps[3].to_string();
            let annotation = if caps.get(1).is_some() {
                FieldAnnotation::Subclass(target)
            } else {
                FieldAnnotation::Reference(target)
            };
            return Self { name, annotation };
        }
        if let Some(base) = raw.strip_prefix('+').filter(|b| !b.is_empty()) {
            let target = crate::naming::element_type_name(base);
            return Self { name: base.to_string(), annotation: FieldAnnotation::Subclass(target) };
        }
        Self { name: raw.to_string(), annotation: FieldAnnotation::Plain }
    }

    pub fn target(&self) -> Option<&str> {
        match &self.annotation {
            FieldAnnotation::Plain => None,
            FieldAnnotation::Reference(t) | FieldAnnotation::Subclass(t) => Some(t),
        }
    }
}

pub fn is_bare_identifier(s: &str) -> bool {
    BARE_IDENTIFIER.is_match(s)
}

/// Key as it appears in a declaration: quoted unless a bare identifier.
pub fn display_key(name: &str) -> String {
    if is_bare_identifier(name) {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_pass_through() {
        let k = FieldKey::parse("cats");
        assert_eq!(k.name, "cats");
        assert_eq!(k.annotation, FieldAnnotation::Plain);
        assert_eq!(k.target(), None);
    }

    #[test]
    fn reference_and_subclass_split() {
        let k = FieldKey::parse("masterCat[Cat]");
        assert_eq!(k.name, "masterCat");
        assert_eq!(k.annotation, FieldAnnotation::Reference("Cat".into()));

        let k = FieldKey::parse("+dog[Dog]");
        assert_eq!(k.name, "dog");
        assert_eq!(k.annotation, FieldAnnotation::Subclass("Dog".into()));

        let k = FieldKey::parse("+puppies");
        assert_eq!(k.name, "puppies");
        assert_eq!(k.annotation, FieldAnnotation::Subclass("Puppy".into()));
    }

    #[test]
    fn brackets_without_identifier_stay_plain() {
        assert_eq!(FieldKey::parse("a[0]").annotation, FieldAnnotation::Plain);
        assert_eq!(FieldKey::parse("a[b c]").annotation, FieldAnnotation::Plain);
        assert_eq!(FieldKey::parse("+").annotation, FieldAnnotation::Plain);
    }

    #[test]
    fn quoting() {
        assert_eq!(display_key("_marius"), "_marius");
        assert_eq!(display_key("hello world"), "'hello world'");
        assert_eq!(display_key("it's"), "'it\\'s'");
        assert_eq!(display_key("1st"), "'1st'");
    }
}
