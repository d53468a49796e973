//! Explicit reference resolution.
//!
//! Runs after naming. Annotated fields are rewritten onto their target
//! declaration, subclass markers become parent relations, and declarations
//! that only existed to hold a placeholder are discarded by a final
//! reachability pass over declaration names.
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::inference::ShapeGraph;
use crate::ir::{DeclField, Declaration, FieldKind, Resolution, TypeRef, Warning};
use crate::key::FieldAnnotation;
use crate::lower::{Lowering, collapse_null};
use crate::naming::{Naming, is_placeholder};
use crate::options::ReferencePolicy;
use crate::shape::{Field, Primitive, Shape};

pub fn resolve(graph: &ShapeGraph, naming: &Naming, policy: ReferencePolicy) -> Result<Resolution> {
    let lowering = Lowering::new(&graph.registry, naming);
    let mut warnings = naming.warnings.clone();
    let mut subclasses: BTreeMap<String, String> = BTreeMap::new();
    let mut declarations = Vec::with_capacity(naming.entries.len());

    for entry in &naming.entries {
        let Some(Shape::Object(object)) = graph.registry.get(entry.node) else { continue };
        let mut stripped: HashMap<&str, usize> = HashMap::new();
        for field in object.fields.values() {
            *stripped.entry(field.key.name.as_str()).or_default() += 1;
        }
        let mut fields = Vec::with_capacity(object.fields.len());
        for (raw, field) in &object.fields {
            let mut resolved = resolve_field(&lowering, naming, &entry.name, raw, field, policy, &mut warnings)?;
            if raw != &field.key.name && stripped.get(field.key.name.as_str()).is_some_and(|n| *n > 1) {
                tracing::warn!(declaration = %entry.name, key = %raw, "annotated key clashes with a sibling; keeping it verbatim");
                warnings.push(Warning::DuplicateKey { declaration: entry.name.clone(), key: raw.clone() });
                resolved.key = raw.clone();
            }
            if resolved.kind == FieldKind::Subclass {
                record_parent(&mut subclasses, &mut warnings, &resolved.ty, &entry.name);
            }
            fields.push(resolved);
        }
        declarations.push(Declaration { name: entry.name.clone(), fields });
    }

    let root = naming.entries.first().map(|e| e.name.as_str());
    let live = reachable_declarations(root, &declarations);
    let dropped = declarations.len() - live.len();
    if dropped > 0 {
        tracing::debug!(dropped, "discarded placeholder-only declarations");
    }
    declarations.retain(|d| live.contains(&d.name));
    subclasses.retain(|child, _| live.contains(child));

    Ok(Resolution { declarations, subclasses, warnings })
}

fn resolve_field(
    lowering: &Lowering<'_>,
    naming: &Naming,
    declaration: &str,
    raw: &str,
    field: &Field,
    policy: ReferencePolicy,
    warnings: &mut Vec<Warning>,
) -> Result<DeclField> {
    let natural = lowering.lower(field.shape);
    let kind = match field.key.annotation {
        FieldAnnotation::Plain => FieldKind::Plain,
        FieldAnnotation::Reference(_) => FieldKind::Reference,
        FieldAnnotation::Subclass(_) => FieldKind::Subclass,
    };

    let structural = !is_placeholder(field.shape, lowering.registry());
    let (ty, kind) = match field.key.target() {
        None => (natural, kind),
        // Objects carry the target name, or its suffixed form after a
        // collision naming already reported.
        Some(_) if structural && !natural.references().is_empty() => (natural, kind),
        Some(target) if naming.is_declared(target) => (bind(lowering, field, target), kind),
        Some(target) => match policy {
            ReferencePolicy::Error => {
                return Err(Error::UnresolvableExplicitReference { field: raw.to_string(), target: target.to_string() });
            }
            ReferencePolicy::Keep => {
                unresolved(warnings, declaration, &field.key.name, target);
                (bind(lowering, field, target), kind)
            }
            ReferencePolicy::Drop => {
                unresolved(warnings, declaration, &field.key.name, target);
                (natural, FieldKind::Plain)
            }
        },
    };

    let (ty, nullish) = collapse_null(ty);
    Ok(DeclField { key: field.key.name.clone(), ty, optional: field.optional || nullish, kind })
}

/// `Target`, or `Target[]` when the annotated value is a list.
fn bind(lowering: &Lowering<'_>, field: &Field, target: &str) -> TypeRef {
    let named = TypeRef::Named(target.to_string());
    if lowering.is_list(field.shape) {
        TypeRef::Array(Box::new(named))
    } else if field.shape.is_null() {
        // keeps the field optional through null collapse
        TypeRef::Union(vec![named, TypeRef::Primitive(Primitive::Null)])
    } else {
        named
    }
}

fn unresolved(warnings: &mut Vec<Warning>, declaration: &str, field: &str, target: &str) {
    tracing::warn!(declaration, field, target, "explicit reference target is never declared");
    warnings.push(Warning::UnresolvedReference {
        declaration: declaration.to_string(),
        field: field.to_string(),
        target: target.to_string(),
    });
}

fn record_parent(subclasses: &mut BTreeMap<String, String>, warnings: &mut Vec<Warning>, ty: &TypeRef, parent: &str) {
    let Some(child) = ty.named() else { return };
    if child == parent {
        return;
    }
    match subclasses.get(child) {
        None => {
            subclasses.insert(child.to_string(), parent.to_string());
        }
        Some(kept) if kept != parent => {
            tracing::warn!(child, parent, kept = %kept, "declaration already has a parent");
            warnings.push(Warning::ConflictingParent {
                child: child.to_string(),
                parent: parent.to_string(),
                kept: kept.clone(),
            });
        }
        Some(_) => {}
    }
}

fn reachable_declarations(root: Option<&str>, declarations: &[Declaration]) -> HashSet<String> {
    let by_name: HashMap<&str, &Declaration> = declarations.iter().map(|d| (d.name.as_str(), d)).collect();
    let mut live: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<&str> = root.into_iter().collect();
    while let Some(name) = queue.pop_front() {
        let Some(decl) = by_name.get(name) else { continue };
        if !live.insert(name.to_string()) {
            continue;
        }
        for field in &decl.fields {
            queue.extend(field.ty.references());
        }
    }
    live
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::infer;
    use crate::naming::assign_names;
    use crate::options::Options;
    use serde_json::{Value, json};

    fn run(v: Value, policy: ReferencePolicy) -> Result<Resolution> {
        let g = infer(&v, &Options::default())?;
        let naming = assign_names(&g, "RootObject");
        resolve(&g, &naming, policy)
    }

    fn resolved(v: Value) -> Resolution {
        run(v, ReferencePolicy::Drop).unwrap()
    }

    fn field<'a>(r: &'a Resolution, decl: &str, key: &str) -> &'a DeclField {
        r.get(decl).unwrap().fields.iter().find(|f| f.key == key).unwrap()
    }

    fn names(r: &Resolution) -> Vec<&str> {
        r.declarations.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn forward_placeholder_binds_to_later_structure() {
        let r = resolved(json!({ "masterCat[Cat]": {}, "cats": [{ "name": "Kittin" }] }));
        assert_eq!(names(&r), ["RootObject", "Cat"]);
        assert_eq!(field(&r, "RootObject", "masterCat").ty, TypeRef::Named("Cat".into()));
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn array_placeholders_before_and_after() {
        let r = resolved(json!({
            "moderators[Cat]": [],
            "cats": [{ "name": "Kittin" }],
            "specialCats[Cat]": [],
        }));
        assert_eq!(names(&r), ["RootObject", "Cat"]);
        let cat_list = TypeRef::Array(Box::new(TypeRef::Named("Cat".into())));
        assert_eq!(field(&r, "RootObject", "moderators").ty, cat_list);
        assert_eq!(field(&r, "RootObject", "specialCats").ty, cat_list);
    }

    #[test]
    fn placeholder_next_to_real_empty_object() {
        let r = resolved(json!({
            "emptyList": [],
            "emptyObject": {},
            "cats": [{ "name": "Kittin" }],
            "specialCats[Cat]": [],
            "masterCat[Cat]": {},
        }));
        assert_eq!(names(&r), ["RootObject", "EmptyObject", "Cat"]);
        assert_eq!(field(&r, "RootObject", "masterCat").ty.to_string(), "Cat");
        assert_eq!(field(&r, "RootObject", "emptyObject").ty.to_string(), "EmptyObject");
    }

    #[test]
    fn same_content_under_two_keys_is_one_declaration() {
        let r = resolved(json!({
            "cats": [{ "name": "Kittin" }],
            "masterCat[SpecialCat]": { "type": "SuperSpecial", "cat[Cat]": {} },
            "moderatorCat": { "type": "Moderator", "cat[Cat]": {} },
        }));
        assert_eq!(names(&r), ["RootObject", "Cat", "SpecialCat"]);
        assert_eq!(field(&r, "RootObject", "moderatorCat").ty.to_string(), "SpecialCat");
        assert_eq!(field(&r, "SpecialCat", "cat").ty.to_string(), "Cat");
    }

    #[test]
    fn placeholder_named_like_its_target_is_still_unresolved() {
        let v = json!({ "person[Person]": {} });
        let err = run(v.clone(), ReferencePolicy::Error).unwrap_err();
        assert_eq!(err, Error::UnresolvableExplicitReference { field: "person[Person]".into(), target: "Person".into() });
        let dropped = run(v, ReferencePolicy::Drop).unwrap();
        assert!(matches!(dropped.warnings.as_slice(), [Warning::UnresolvedReference { .. }]));
    }

    #[test]
    fn null_placeholder_is_optional_reference() {
        let r = resolved(json!({ "cats": [{ "name": "x" }], "favorite[Cat]": null }));
        let f = field(&r, "RootObject", "favorite");
        assert_eq!(f.ty.to_string(), "Cat");
        assert!(f.optional);
    }

    #[test]
    fn unresolved_reference_policies() {
        let v = json!({ "owner[Person]": {}, "id": 1 });

        let dropped = run(v.clone(), ReferencePolicy::Drop).unwrap();
        let owner = field(&dropped, "RootObject", "owner");
        assert_eq!(owner.ty.to_string(), "Owner");
        assert_eq!(owner.kind, FieldKind::Plain);
        assert_eq!(names(&dropped), ["RootObject", "Owner"]);
        assert!(matches!(dropped.warnings[0], Warning::UnresolvedReference { ref target, .. } if target == "Person"));

        let kept = run(v.clone(), ReferencePolicy::Keep).unwrap();
        assert_eq!(field(&kept, "RootObject", "owner").ty.to_string(), "Person");
        assert_eq!(names(&kept), ["RootObject"]);

        let err = run(v, ReferencePolicy::Error).unwrap_err();
        assert_eq!(err, Error::UnresolvableExplicitReference { field: "owner[Person]".into(), target: "Person".into() });
    }

    #[test]
    fn subclass_records_parent_relation() {
        let r = resolved(json!({
            "name": "Rex",
            "+dog[Dog]": { "bark": true },
        }));
        assert_eq!(r.subclasses.get("Dog").map(String::as_str), Some("RootObject"));
        let f = field(&r, "RootObject", "dog");
        assert_eq!(f.kind, FieldKind::Subclass);
        assert_eq!(f.ty.to_string(), "Dog");
    }

    #[test]
    fn conflicting_parents_keep_the_first() {
        let r = resolved(json!({
            "dogs": [{ "bark": true }],
            "a": { "+pet[Dog]": {} },
            "b": { "+pet[Dog]": {}, "x": 1 },
        }));
        assert_eq!(r.subclasses.get("Dog").map(String::as_str), Some("A"));
        assert!(r.warnings.iter().any(|w| matches!(w, Warning::ConflictingParent { kept, .. } if kept == "A")));
    }

    #[test]
    fn repeated_target_resolves_to_one_merged_declaration() {
        let r = resolved(json!({ "a[Cat]": { "name": "x" }, "b[Cat]": { "age": 1 } }));
        assert_eq!(names(&r), ["RootObject", "Cat"]);
        assert_eq!(field(&r, "RootObject", "a").ty.to_string(), "Cat");
        assert_eq!(field(&r, "RootObject", "b").ty.to_string(), "Cat");
        let cat = r.get("Cat").unwrap();
        assert!(cat.fields.iter().all(|f| f.optional));
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn recursive_target_references_itself() {
        let r = resolved(json!({ "root[Node]": { "v": 1, "child[Node]": { "v": 2 } } }));
        assert_eq!(names(&r), ["RootObject", "Node"]);
        let child = field(&r, "Node", "child");
        assert_eq!(child.ty.to_string(), "Node");
        assert!(child.optional);
        assert!(!field(&r, "Node", "v").optional);
    }

    #[test]
    fn non_object_value_under_undeclared_target_follows_policy() {
        let v = json!({ "tags[Tag]": ["a", "b"] });

        let dropped = run(v.clone(), ReferencePolicy::Drop).unwrap();
        let tags = field(&dropped, "RootObject", "tags");
        assert_eq!(tags.ty.to_string(), "string[]");
        assert_eq!(tags.kind, FieldKind::Plain);
        assert!(matches!(dropped.warnings.as_slice(), [Warning::UnresolvedReference { target, .. }] if target == "Tag"));

        let kept = run(v.clone(), ReferencePolicy::Keep).unwrap();
        assert_eq!(field(&kept, "RootObject", "tags").ty.to_string(), "Tag[]");

        let err = run(v, ReferencePolicy::Error).unwrap_err();
        assert_eq!(err, Error::UnresolvableExplicitReference { field: "tags[Tag]".into(), target: "Tag".into() });
    }

    #[test]
    fn annotated_key_clashing_with_plain_sibling_stays_verbatim() {
        let r = resolved(json!({
            "masterCat[Cat]": { "name": "x" },
            "masterCat": { "age": 1 },
        }));
        let keys: Vec<&str> = r.get("RootObject").unwrap().fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["masterCat[Cat]", "masterCat"]);
        assert_eq!(
            r.warnings,
            [Warning::DuplicateKey { declaration: "RootObject".into(), key: "masterCat[Cat]".into() }]
        );
    }
}
