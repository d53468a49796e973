use crate::inference::Registry;
use crate::ir::TypeRef;
use crate::naming::Naming;
use crate::shape::{NodeId, Primitive, Shape, ShapeId};

/// Lowers shape identities to display types using the assigned names.
pub struct Lowering<'a> {
    reg: &'a Registry,
    naming: &'a Naming,
}

impl<'a> Lowering<'a> {
    pub fn new(reg: &'a Registry, naming: &'a Naming) -> Self {
        Self { reg, naming }
    }

    pub fn lower(&self, id: ShapeId) -> TypeRef {
        let node = match id {
            ShapeId::Primitive(p) => return TypeRef::Primitive(p),
            ShapeId::Date => return TypeRef::Date,
            ShapeId::Node(node) => node,
        };
        match self.reg.get(node) {
            Some(Shape::Object(_)) => self.named(node),
            Some(Shape::Array(a)) if a.is_union => {
                let mut arms: Vec<TypeRef> = a.members.iter().map(|m| self.lower(*m)).collect();
                match arms.len() {
                    0 => TypeRef::ANY,
                    1 => arms.remove(0),
                    _ => TypeRef::Union(arms),
                }
            }
            Some(Shape::Array(a)) => {
                let mut elems: Vec<TypeRef> = a.members.iter().map(|m| self.lower_element(*m)).collect();
                let inner = match elems.len() {
                    0 => TypeRef::ANY,
                    1 => elems.remove(0),
                    _ => TypeRef::Union(elems),
                };
                TypeRef::Array(Box::new(inner))
            }
            None => TypeRef::ANY,
        }
    }

    // `[null]` is `any[]`, not `null[]`
    fn lower_element(&self, id: ShapeId) -> TypeRef {
        match self.lower(id) {
            TypeRef::Primitive(Primitive::Null) => TypeRef::ANY,
            other => other,
        }
    }

    fn named(&self, node: NodeId) -> TypeRef {
        match self.naming.name_of(node) {
            Some(name) => TypeRef::Named(name.to_string()),
            None => TypeRef::ANY,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.reg
    }

    pub fn is_list(&self, id: ShapeId) -> bool {
        self.reg.array(id).is_some_and(|a| !a.is_union)
    }
}

/// Field-level null collapse: `null` becomes optional `any`, and `T | null`
/// becomes optional `T`. Returns the collapsed type and whether null was seen.
pub fn collapse_null(ty: TypeRef) -> (TypeRef, bool) {
    match ty {
        TypeRef::Primitive(Primitive::Null) => (TypeRef::ANY, true),
        TypeRef::Union(arms) if arms.contains(&TypeRef::Primitive(Primitive::Null)) => {
            let mut rest: Vec<TypeRef> = arms.into_iter().filter(|t| *t != TypeRef::Primitive(Primitive::Null)).collect();
            let ty = match rest.len() {
                0 => TypeRef::ANY,
                1 => rest.remove(0),
                _ => TypeRef::Union(rest),
            };
            (ty, true)
        }
        other => (other, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::infer;
    use crate::naming::assign_names;
    use crate::options::Options;
    use serde_json::{Value, json};

    /// Lowered type of each root field, rendered.
    fn field_types(v: Value) -> Vec<(String, String)> {
        let g = infer(&v, &Options::default()).unwrap();
        let naming = assign_names(&g, "RootObject");
        let lowering = Lowering::new(&g.registry, &naming);
        g.registry
            .object(g.root)
            .unwrap()
            .fields
            .iter()
            .map(|(k, f)| (k.clone(), lowering.lower(f.shape).to_string()))
            .collect()
    }

    #[test]
    fn lowering_covers_every_shape_kind() {
        let got = field_types(json!({
            "s": "x",
            "n": 1.5,
            "b": true,
            "empty": [],
            "nulls": [null],
            "mixed": [1, "a"],
            "nested": [[1], [2, 3]],
            "cats": [{ "name": "Kittin" }],
            "maybe": [1, null],
        }));
        let want = [
            ("s", "string"),
            ("n", "number"),
            ("b", "boolean"),
            ("empty", "any[]"),
            ("nulls", "any[]"),
            ("mixed", "(string | number)[]"),
            ("nested", "number[][]"),
            ("cats", "Cat[]"),
            ("maybe", "(number | null)[]"),
        ];
        assert_eq!(got, want.map(|(k, t)| (k.to_string(), t.to_string())));
    }

    #[test]
    fn null_collapse() {
        assert_eq!(collapse_null(TypeRef::Primitive(Primitive::Null)), (TypeRef::ANY, true));
        let union = TypeRef::Union(vec![TypeRef::Named("Cat".into()), TypeRef::Primitive(Primitive::Null)]);
        assert_eq!(collapse_null(union), (TypeRef::Named("Cat".into()), true));
        let list = TypeRef::Array(Box::new(TypeRef::Primitive(Primitive::Null)));
        assert_eq!(collapse_null(list.clone()), (list, false));
    }
}
