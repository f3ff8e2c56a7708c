//! Schema graph: canonical type descriptors shared by the builder, the lookup
//! and the validator.
//!
//! Nodes live in an arena and reference each other by [`NodeId`], so identical
//! types share one node and recursive types are plain back-references.
use std::fmt;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::LoadError;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Arena index of a [`SchemaNode`]. Two references denote the same type iff
/// their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A literal constant admissible by a node (enum member, literal union arm).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Num(OrderedFloat<f64>),
    Str(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_enum: bool,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub allowed_values: IndexSet<Literal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_of: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub union_of: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_optional: bool,
    #[serde(rename = "type")]
    pub ty: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub key_type: NodeId,
    pub value_type: NodeId,
}

/// Anything that can hand out nodes by id.
pub trait NodeSource {
    fn node(&self, id: NodeId) -> &SchemaNode;
}

/// The arena produced by one build pass.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    nodes: Vec<SchemaNode>,
}

/// The builder's output: the whole graph plus the named nodes, sorted by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct Schema {
    types: Vec<NodeId>,
    nodes: Vec<SchemaNode>,
}

#[derive(Deserialize)]
struct RawSchema {
    #[serde(default)]
    types: Vec<NodeId>,
    nodes: Vec<SchemaNode>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Literal {
    /// Strict equality against a data value (no coercion).
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Bool(a), Value::Bool(b)) => a == b,
            (Literal::Str(a), Value::String(b)) => a == b,
            (Literal::Num(a), Value::Number(b)) => b.as_f64() == Some(a.0),
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Str(s) => Value::String(s.clone()),
            Literal::Num(n) => json_num_pref_i64(n.0),
        }
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Num(OrderedFloat(value))
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl SchemaNode {
    /// A bare node carrying only its display text (primitive shortcuts, leaves).
    pub fn scalar(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// True when the node carries no shape besides literal values.
    pub fn is_literal_only(&self) -> bool {
        !self.allowed_values.is_empty()
            && self.array_of.is_none()
            && self.properties.is_empty()
            && self.indexes.is_empty()
    }
}

impl SchemaGraph {
    pub(crate) fn alloc(&mut self) -> NodeId {
        self.nodes.push(SchemaNode::default());
        NodeId::from_index(self.nodes.len() - 1)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SchemaNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId::from_index(i), n))
    }
}

impl NodeSource for SchemaGraph {
    fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }
}

impl Schema {
    /// Collect every named node of `graph`, sorted ascending by name.
    pub(crate) fn from_graph(graph: SchemaGraph) -> Self {
        let mut types: Vec<NodeId> = graph
            .iter()
            .filter(|(_, n)| n.name.is_some())
            .map(|(id, _)| id)
            .collect();
        // case folded first, exact spelling breaks ties
        types.sort_by_cached_key(|id| {
            let name = graph.node(*id).name.clone().unwrap_or_default();
            (name.to_lowercase(), name)
        });
        Self {
            types,
            nodes: graph.nodes,
        }
    }

    pub fn from_json_str(src: &str) -> Result<Self, LoadError> {
        crate::path_de::from_str_with_path(src)
    }

    /// Named nodes, sorted by name.
    pub fn types(&self) -> impl Iterator<Item = (NodeId, &SchemaNode)> {
        self.types.iter().map(|id| (*id, &self.nodes[id.index()]))
    }

    pub fn type_ids(&self) -> &[NodeId] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First named node called `name` whose location contains `qualifier`.
    pub fn find(&self, name: &str, qualifier: Option<&str>) -> Option<NodeId> {
        self.types()
            .find(|(_, n)| {
                n.name.as_deref() == Some(name)
                    && qualifier.is_none_or(|q| {
                        n.source_location.as_deref().is_some_and(|loc| loc.contains(q))
                    })
            })
            .map(|(id, _)| id)
    }
}

impl NodeSource for Schema {
    fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }
}

impl TryFrom<RawSchema> for Schema {
    type Error = LoadError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let len = raw.nodes.len();
        let check = |owner: usize, id: NodeId| {
            if id.index() < len {
                Ok(())
            } else {
                Err(LoadError::DanglingNode { owner, target: id.index() })
            }
        };
        for id in &raw.types {
            check(id.index(), *id)?;
        }
        for (i, node) in raw.nodes.iter().enumerate() {
            node.array_of.into_iter().try_for_each(|id| check(i, id))?;
            node.union_of.iter().try_for_each(|id| check(i, *id))?;
            node.properties.iter().try_for_each(|p| check(i, p.ty))?;
            node.indexes
                .iter()
                .try_for_each(|x| check(i, x.key_type).and_then(|_| check(i, x.value_type)))?;
        }
        Ok(Self {
            types: raw.types,
            nodes: raw.nodes,
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GRAPH QUERIES
// ————————————————————————————————————————————————————————————————————————————

static SIMPLE_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+(?:\[\])*$").expect("static regex"));

/// `null` admissible here or through any union branch.
pub fn is_nullable(source: &impl NodeSource, id: NodeId) -> bool {
    fn walk(source: &impl NodeSource, id: NodeId, seen: &mut Vec<NodeId>) -> bool {
        if seen.contains(&id) {
            return false;
        }
        seen.push(id);
        let node = source.node(id);
        node.is_nullable || node.union_of.iter().any(|b| walk(source, *b, seen))
    }
    walk(source, id, &mut Vec::new())
}

/// Human readable type text, expanding arrays and unions.
pub fn describe(source: &impl NodeSource, id: NodeId) -> String {
    fn walk(source: &impl NodeSource, id: NodeId, stack: &mut Vec<NodeId>) -> String {
        let node = source.node(id);
        if stack.contains(&id) {
            return node.display_name.clone();
        }
        stack.push(id);
        let out = if let Some(item) = node.array_of {
            let inner = walk(source, item, stack);
            if SIMPLE_TYPE_RE.is_match(&inner) {
                format!("{inner}[]")
            } else {
                format!("({inner})[]")
            }
        } else if !node.union_of.is_empty() {
            let mut arms: Vec<String> = node
                .union_of
                .iter()
                .map(|b| walk(source, *b, stack))
                .collect();
            arms.extend(node.allowed_values.iter().map(|v| v.to_string()));
            if node.is_nullable {
                arms.push("null".to_string());
            }
            arms.join(" | ")
        } else {
            node.display_name.clone()
        };
        stack.pop();
        out
    }
    walk(source, id, &mut Vec::new())
}

// Helper: prefer emitting integers when exact
fn json_num_pref_i64(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph_of(nodes: Vec<SchemaNode>) -> SchemaGraph {
        SchemaGraph { nodes }
    }

    #[test]
    fn integral_literals_serialize_as_integers() {
        let lits = vec![Literal::from(1.0), Literal::from(2.5), Literal::from("a"), Literal::from(true)];
        assert_eq!(serde_json::to_value(&lits).unwrap(), json!([1, 2.5, "a", true]));
    }

    #[test]
    fn literal_matching_is_strict() {
        assert!(Literal::from(5.0).matches(&json!(5)));
        assert!(!Literal::from(5.0).matches(&json!("5")));
        assert!(!Literal::from("true").matches(&json!(true)));
    }

    #[test]
    fn nullability_follows_union_branches() {
        let mut inner = SchemaNode::scalar("string");
        inner.is_nullable = true;
        let mut outer = SchemaNode::scalar("Id | number");
        outer.union_of = vec![NodeId(1), NodeId(2)];
        let g = graph_of(vec![outer, inner, SchemaNode::scalar("number")]);
        assert!(is_nullable(&g, NodeId(0)));
        assert!(!is_nullable(&g, NodeId(2)));
    }

    #[test]
    fn describe_wraps_union_arrays() {
        let mut union = SchemaNode::scalar("number | string");
        union.union_of = vec![NodeId(2), NodeId(3)];
        union.is_nullable = true;
        let mut arr = SchemaNode::scalar("(number | string | null)[]");
        arr.array_of = Some(NodeId(0));
        let mut plain = SchemaNode::scalar("string[]");
        plain.array_of = Some(NodeId(3));
        let g = graph_of(vec![
            union,
            arr,
            SchemaNode::scalar("number"),
            SchemaNode::scalar("string"),
            plain,
        ]);
        assert_eq!(describe(&g, NodeId(1)), "(number | string | null)[]");
        assert_eq!(describe(&g, NodeId(4)), "string[]");
    }

    #[test]
    fn describe_survives_cycles() {
        let mut tree = SchemaNode::scalar("Tree");
        tree.union_of = vec![NodeId(1), NodeId(2)];
        let mut arr = SchemaNode::scalar("Tree[]");
        arr.array_of = Some(NodeId(0));
        let g = graph_of(vec![tree, arr, SchemaNode::scalar("string")]);
        assert_eq!(describe(&g, NodeId(0)), "Tree[] | string");
    }

    #[test]
    fn named_nodes_are_sorted() {
        let mut b = SchemaNode::scalar("B");
        b.name = Some("B".into());
        let mut a = SchemaNode::scalar("A");
        a.name = Some("A".into());
        let schema = Schema::from_graph(graph_of(vec![b, SchemaNode::scalar("string"), a]));
        let names: Vec<_> = schema.types().map(|(_, n)| n.display_name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn schema_round_trips_through_json() {
        let mut rec = SchemaNode::scalar("Test");
        rec.name = Some("Test".into());
        rec.source_location = Some("src/test.ts:1".into());
        rec.properties = vec![PropInfo { name: "id".into(), is_optional: false, ty: NodeId(1) }];
        let schema = Schema::from_graph(graph_of(vec![rec, SchemaNode::scalar("number")]));
        let text = serde_json::to_string(&schema).unwrap();
        assert!(text.contains("\"displayName\":\"number\""));
        assert!(!text.contains("isNullable"));
        let back = Schema::from_json_str(&text).unwrap();
        assert_eq!(back.find("Test", Some("src/test")), Some(NodeId(0)));
        assert_eq!(back.find("Test", Some("other")), None);
    }

    #[test]
    fn dangling_references_are_rejected() {
        let text = r#"{"types":[0],"nodes":[{"name":"A","displayName":"A","arrayOf":7}]}"#;
        let err = Schema::from_json_str(text).unwrap_err();
        assert!(err.to_string().contains("7"), "{err}");
    }
}
