//! Display names for object shapes.
//!
//! Every reachable object shape gets exactly one unique name. Candidates come
//! from the path that reaches the shape, in priority tiers:
//!
//! 1. the root name
//! 2. an explicit reference target on a structural value (`cat[Cat]: {..}`)
//! 3. the PascalCase field key, singular when reached through a list
//! 4. the base key of a placeholder reference (`cat[Cat]: {}`), used only when
//!    nothing better exists; such names are usually discarded by the resolver
//!
//! Within a tier the first path in root-first, depth-first order wins. Shapes
//! merged under one reference target are named through their merged shape, so
//! a target never competes with itself; a collision between a target and a
//! differently shaped inferred name suffixes the inferred one and is reported.
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::inference::{Registry, ShapeGraph};
use crate::ir::Warning;
use crate::key::FieldAnnotation;
use crate::shape::{NodeId, Shape, ShapeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Root,
    Annotation,
    Inferred,
    Placeholder,
}

#[derive(Debug, Clone)]
struct Hint {
    word: String,
    tier: Tier,
    /// Use `word` verbatim instead of deriving a type name from it.
    exact: bool,
    /// Reached through a list: singularize.
    element: bool,
}

impl Hint {
    fn name(&self) -> String {
        match (self.exact, self.element) {
            (true, _) => self.word.clone(),
            (false, true) => element_type_name(&self.word),
            (false, false) => type_name(&self.word),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub node: NodeId,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct Naming {
    /// One entry per reachable object shape, in first-reach order.
    pub entries: Vec<NameEntry>,
    pub warnings: Vec<Warning>,
    by_node: HashMap<NodeId, String>,
    /// Nodes named only through a placeholder reference's base key.
    synthesized: HashSet<NodeId>,
    aliases: BTreeMap<NodeId, NodeId>,
}

impl Naming {
    /// Name of `node`, or of the merged shape it was unified into.
    pub fn name_of(&self, node: NodeId) -> Option<&str> {
        let node = self.aliases.get(&node).copied().unwrap_or(node);
        self.by_node.get(&node).map(String::as_str)
    }

    /// Whether `name` belongs to a real structural declaration.
    pub fn is_declared(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name && !self.synthesized.contains(&e.node))
    }
}

pub fn assign_names(graph: &ShapeGraph, root_name: &str) -> Naming {
    let mut walk = Walk { graph, order: Vec::new(), seen: HashSet::new(), candidates: HashMap::new() };
    let root_hint = Hint { word: root_name.to_string(), tier: Tier::Root, exact: true, element: false };
    walk.visit(graph.root, root_hint);

    let mut pending: Vec<(usize, NodeId, Hint)> = walk
        .order
        .iter()
        .enumerate()
        .filter_map(|(pos, node)| {
            let best = walk.candidates.get(node)?.iter().min_by_key(|h| h.tier)?;
            Some((pos, *node, best.clone()))
        })
        .collect();
    pending.sort_by_key(|(pos, _, hint)| (hint.tier, *pos));

    let mut naming = Naming { aliases: graph.aliases.clone(), ..Naming::default() };
    let mut used: HashSet<String> = HashSet::new();
    let mut targets: HashSet<String> = HashSet::new();
    for (_, node, hint) in &pending {
        let wanted = hint.name();
        let name = unique_name(&wanted, &used);
        let collided = match hint.tier {
            Tier::Annotation => true,
            Tier::Inferred => targets.contains(&wanted),
            Tier::Root | Tier::Placeholder => false,
        };
        if name != wanted && collided {
            tracing::warn!(target_name = %wanted, assigned = %name, "explicit reference target names two different shapes");
            naming.warnings.push(Warning::NameCollision { target: wanted, assigned: name.clone() });
        }
        match hint.tier {
            Tier::Annotation => {
                targets.insert(name.clone());
            }
            Tier::Placeholder => {
                naming.synthesized.insert(*node);
            }
            Tier::Root | Tier::Inferred => {}
        }
        used.insert(name.clone());
        naming.by_node.insert(*node, name);
    }
    naming.entries = walk
        .order
        .iter()
        .filter_map(|node| naming.by_node.get(node).map(|name| NameEntry { node: *node, name: name.clone() }))
        .collect();
    naming
}

struct Walk<'a> {
    graph: &'a ShapeGraph,
    order: Vec<NodeId>,
    seen: HashSet<NodeId>,
    candidates: HashMap<NodeId, Vec<Hint>>,
}

impl Walk<'_> {
    fn visit(&mut self, id: ShapeId, hint: Hint) {
        let graph = self.graph;
        let reg = &graph.registry;
        let Some(node) = graph.canonical(id).node() else { return };
        let Some(shape) = reg.get(node) else { return };
        match shape {
            Shape::Object(object) => {
                self.candidates.entry(node).or_default().push(hint);
                if !self.seen.insert(node) {
                    return;
                }
                self.order.push(node);
                for field in object.fields.values() {
                    let child = field_hint(reg, &field.key.name, &field.key.annotation, field.shape);
                    self.visit(field.shape, child);
                }
            }
            // Lists and unions are revisited so every path's hint reaches the
            // objects inside; recursion stops at already-seen objects.
            Shape::Array(array) => {
                let hint = if array.is_union { hint } else { Hint { element: true, ..hint } };
                for member in &array.members {
                    self.visit(*member, hint.clone());
                }
            }
        }
    }
}

fn field_hint(reg: &Registry, key: &str, annotation: &FieldAnnotation, shape: ShapeId) -> Hint {
    match annotation {
        FieldAnnotation::Reference(target) | FieldAnnotation::Subclass(target) if !is_placeholder(shape, reg) => {
            Hint { word: target.clone(), tier: Tier::Annotation, exact: true, element: false }
        }
        FieldAnnotation::Reference(_) | FieldAnnotation::Subclass(_) => {
            Hint { word: key.to_string(), tier: Tier::Placeholder, exact: false, element: false }
        }
        FieldAnnotation::Plain => Hint { word: key.to_string(), tier: Tier::Inferred, exact: false, element: false },
    }
}

/// `null`, `{}` and `[]`: values that carry no structure of their own.
pub fn is_placeholder(id: ShapeId, reg: &Registry) -> bool {
    if id.is_null() {
        return true;
    }
    match reg.shape(id) {
        Some(Shape::Object(o)) => o.fields.is_empty(),
        Some(Shape::Array(a)) if !a.is_union => {
            a.members.iter().all(|m| reg.array(*m).is_some_and(|e| e.is_empty_union()))
        }
        _ => false,
    }
}

fn unique_name(wanted: &str, used: &HashSet<String>) -> String {
    if !used.contains(wanted) {
        return wanted.to_string();
    }
    (2..)
        .map(|i| format!("{wanted}{i}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| wanted.to_string())
}

// ------------------------------ Case helpers ------------------------------ //

/// `favorite word` / `favorite_word` / `favoriteWord` → `FavoriteWord`.
pub fn type_name(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for part in word.split(|c: char| !c.is_alphanumeric()).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    match out.chars().next() {
        None => "Type".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{out}"),
        Some(_) => out,
    }
}

/// Type name for the elements of a list stored under `word`.
pub fn element_type_name(word: &str) -> String {
    type_name(&singular(word))
}

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("women", "woman"),
    ("men", "man"),
    ("mice", "mouse"),
    ("geese", "goose"),
];

/// Best-effort English singular of the last word in `word`.
pub fn singular(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.len() != word.len() {
        return word.to_string();
    }
    for (plural, single) in IRREGULAR {
        if lower.ends_with(plural) {
            let cut = word.len() - plural.len();
            let (head, tail) = word.split_at(cut);
            let mut replacement = single.to_string();
            if tail.starts_with(|c: char| c.is_uppercase()) {
                replacement = type_name(&replacement);
            }
            return format!("{head}{replacement}");
        }
    }
    let strip = |n: usize| word[..word.len() - n].to_string();
    if lower.ends_with("ies") && lower.len() > 3 {
        return format!("{}y", strip(3));
    }
    if ["sses", "xes", "ches", "shes", "zes"].iter().any(|s| lower.ends_with(s)) {
        return strip(2);
    }
    if ["ss", "us", "is"].iter().any(|s| lower.ends_with(s)) {
        return word.to_string();
    }
    if lower.ends_with('s') && lower.len() > 1 {
        return strip(1);
    }
    word.to_string()
}
