//! Structural shape inference.
//!
//! Walk a JSON value, give every distinct structural shape one identity in a
//! content-addressed registry, unify shapes that share a position (array
//! elements, repeated fields), merge the object shapes written under one
//! explicit-reference target, then prune whatever the unification left
//! unreachable.
//!
//! Design goals:
//! - Structurally equal shapes collapse to one registry entry.
//! - Merge ⊔ works on sets: associative, commutative, idempotent.
//! - Recursion is bounded by a configurable depth ceiling.
pub mod merge;
pub mod prune;
pub mod registry;
pub mod targets;

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value, json};

use crate::error::{Error, Result, kind_name};
use crate::key::{FieldAnnotation, FieldKey};
use crate::options::Options;
use crate::shape::{ArrayShape, Field, NodeId, ObjectShape, Shape, ShapeId, TypeGroup, classify, primitive_of};

pub use registry::Registry;

// ------------------------------ Front API -------------------------------- //

/// Pruned output of one inference run.
#[derive(Debug)]
pub struct ShapeGraph {
    pub root: ShapeId,
    pub registry: Registry,
    /// Shapes written under an explicit-reference target, mapped to the
    /// merge of every shape written under that target.
    pub aliases: BTreeMap<NodeId, NodeId>,
}

impl ShapeGraph {
    /// The shape `id` stands for once target aliases are applied.
    pub fn canonical(&self, id: ShapeId) -> ShapeId {
        match id.node().and_then(|n| self.aliases.get(&n)) {
            Some(merged) => ShapeId::Node(*merged),
            None => id,
        }
    }
}

/// Incremental shape builder. One instance owns one registry.
pub struct Inference {
    registry: Registry,
    detect_dates: bool,
    max_depth: usize,
    /// Explicit-reference targets already bound to a non-empty array shape.
    array_bindings: HashMap<String, ShapeId>,
}

impl Inference {
    pub fn new(options: Options) -> Self {
        Self {
            registry: Registry::new(),
            detect_dates: options.detect_dates,
            max_depth: options.max_depth,
            array_bindings: HashMap::new(),
        }
    }

    /// Build the shape of `v`, interning everything it contains.
    pub fn observe(&mut self, v: &Value) -> Result<ShapeId> {
        self.build(v, 0)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Unify explicit-reference targets, prune against `root` and hand the
    /// graph over.
    pub fn finish(self, root: ShapeId) -> ShapeGraph {
        let mut registry = self.registry;
        let aliases = targets::unify_targets(root, &mut registry);
        let roots: Vec<ShapeId> = std::iter::once(root).chain(aliases.values().map(|n| ShapeId::Node(*n))).collect();
        prune::prune_from(&roots, &mut registry);
        ShapeGraph { root, registry, aliases }
    }
}

/// Validate, build and prune in one go.
pub fn infer(v: &Value, options: &Options) -> Result<ShapeGraph> {
    validate_root(v)?;
    let mut inf = Inference::new(options.clone());
    let root = inf.observe(v)?;
    tracing::debug!(shapes = inf.registry().len(), %root, "built shape registry");
    Ok(inf.finish(root))
}

/// Only objects and non-empty arrays of objects are accepted.
pub fn validate_root(v: &Value) -> Result<()> {
    match v {
        Value::Object(_) => Ok(()),
        Value::Array(xs) if !xs.is_empty() && xs.iter().all(Value::is_object) => Ok(()),
        other => Err(Error::InvalidRootShape { found: kind_name(other) }),
    }
}

// ------------------------------- Observe --------------------------------- //

impl Inference {
    fn build(&mut self, v: &Value, depth: usize) -> Result<ShapeId> {
        if depth > self.max_depth {
            return Err(Error::DepthLimitExceeded { limit: self.max_depth });
        }
        match (classify(v, self.detect_dates), v) {
            (TypeGroup::Date, _) => Ok(ShapeId::Date),
            (TypeGroup::Array, Value::Array(xs)) => self.build_array(xs, depth),
            (TypeGroup::Object, Value::Object(map)) => self.build_object(map, depth),
            _ => Ok(ShapeId::Primitive(primitive_of(v))),
        }
    }

    fn build_array(&mut self, xs: &[Value], depth: usize) -> Result<ShapeId> {
        let mut elements: Vec<ShapeId> = Vec::new();
        for x in xs {
            let id = self.build(x, depth + 1)?;
            if !elements.contains(&id) {
                elements.push(id);
            }
        }
        let element = merge::merge(&elements, &mut self.registry);
        Ok(self.registry.intern_array(ArrayShape::list(element)))
    }

    fn build_object(&mut self, map: &Map<String, Value>, depth: usize) -> Result<ShapeId> {
        let mut out = ObjectShape::default();
        for (raw, value) in map {
            let key = FieldKey::parse(raw);
            let shape = self.build_field(&key, value, depth)?;
            out.fields.insert(raw.clone(), Field { key, shape, optional: false });
        }
        Ok(self.registry.intern_object(out))
    }

    /// An empty array under an annotation reuses the shape its target was
    /// already bound to, so `xs[Cat]: []` never shadows `xs[Cat]: [{..}]`.
    fn build_field(&mut self, key: &FieldKey, value: &Value, depth: usize) -> Result<ShapeId> {
        let (Some(target), Value::Array(xs)) = (key.target(), value) else {
            return self.build(value, depth + 1);
        };
        if xs.is_empty() {
            if let Some(bound) = self.array_bindings.get(target) {
                return Ok(*bound);
            }
            return self.build(value, depth + 1);
        }
        let shape = self.build(value, depth + 1)?;
        self.array_bindings.entry(target.to_string()).or_insert(shape);
        Ok(shape)
    }
}

// ------------------------------- Emission -------------------------------- //

impl ShapeGraph {
    /// JSON debug view of the pruned registry.
    pub fn to_json(&self) -> Value {
        let mut shapes = Map::new();
        for (id, shape) in self.registry.iter() {
            let entry = match shape {
                Shape::Object(o) => {
                    let mut fields = Map::new();
                    for (raw, f) in &o.fields {
                        let mut field = json!({
                            "type": f.shape.to_string(),
                            "optional": f.optional,
                        });
                        match &f.key.annotation {
                            FieldAnnotation::Plain => {}
                            FieldAnnotation::Reference(t) => field["reference"] = Value::from(t.clone()),
                            FieldAnnotation::Subclass(t) => field["subclass"] = Value::from(t.clone()),
                        }
                        fields.insert(raw.clone(), field);
                    }
                    json!({ "kind": "object", "fields": fields })
                }
                Shape::Array(a) if a.is_union => json!({
                    "kind": "union",
                    "members": a.members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
                }),
                Shape::Array(a) => json!({
                    "kind": "list",
                    "element": a.members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
                }),
            };
            shapes.insert(ShapeId::Node(id).to_string(), entry);
        }
        let mut view = json!({ "root": self.root.to_string(), "shapes": shapes });
        if !self.aliases.is_empty() {
            let aliases: Map<String, Value> = self
                .aliases
                .iter()
                .map(|(member, merged)| (ShapeId::Node(*member).to_string(), Value::from(ShapeId::Node(*merged).to_string())))
                .collect();
            view["aliases"] = Value::Object(aliases);
        }
        view
    }
}

// ------------------------------- Tests ----------------------------------- //
