//! Schema lookup: textual type reference → node.
//!
//! References look like `Order`, `models/order/Order`, `number`, `Order[]`.
//! Primitive shortcuts and array wrappers have no node in the schema, so they
//! live in a small overlay on top of it.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{NodeId, NodeSource, Schema, SchemaNode};

static ARRAY_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*\[\s*\]\s*$").expect("static regex"));

const PRIMITIVES: [&str; 8] = [
    "number", "string", "boolean", "bigint", "Date", "RegExp", "undefined", "null",
];

/// A resolved reference: the schema plus any synthetic nodes the reference
/// needed. Synthetic ids continue after the schema's own ids.
#[derive(Debug, Clone)]
pub struct Resolved<'s> {
    schema: &'s Schema,
    synthetic: Vec<SchemaNode>,
    root: NodeId,
}

impl<'s> Resolved<'s> {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &SchemaNode {
        self.node(self.root)
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    fn push(&mut self, node: SchemaNode) -> NodeId {
        self.synthetic.push(node);
        NodeId::from_index(self.schema.len() + self.synthetic.len() - 1)
    }
}

impl NodeSource for Resolved<'_> {
    fn node(&self, id: NodeId) -> &SchemaNode {
        match id.index().checked_sub(self.schema.len()) {
            Some(i) => &self.synthetic[i],
            None => self.schema.node(id),
        }
    }
}

/// Resolve `reference` against `schema`.
pub fn resolve<'s>(schema: &'s Schema, reference: &str) -> Option<Resolved<'s>> {
    let (qualifier, short) = match reference.rsplit_once('/') {
        Some((q, s)) => (Some(q.trim()).filter(|q| !q.is_empty()), s.trim()),
        None => (None, reference.trim()),
    };
    let mut resolved = Resolved { schema, synthetic: Vec::new(), root: NodeId::from_index(0) };

    if PRIMITIVES.contains(&short) {
        let mut node = SchemaNode::scalar(short);
        node.is_nullable = short == "null";
        resolved.root = resolved.push(node);
        return Some(resolved);
    }

    if let Some(id) = schema.find(short, qualifier) {
        resolved.root = id;
        return Some(resolved);
    }

    let base = ARRAY_SUFFIX_RE.captures(reference)?.get(1)?.as_str();
    let mut inner = resolve(schema, base)?;
    let display_name = format!("{}[]", inner.root_node().display_name);
    let item = inner.root;
    inner.root = inner.push(SchemaNode {
        display_name,
        array_of: Some(item),
        ..SchemaNode::default()
    });
    Some(inner)
}

// ---- Tests ---- //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_json_str(
            &json!({
                "types": [0, 1],
                "nodes": [
                    { "name": "Order", "displayName": "Order", "sourceLocation": "models/order.ts:3" },
                    { "name": "Order", "displayName": "Order", "sourceLocation": "legacy/order.ts:1",
                      "properties": [{ "name": "id", "type": 2 }] },
                    { "displayName": "string" },
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn primitives_are_synthetic() {
        let schema = schema();
        let number = resolve(&schema, "number").unwrap();
        assert_eq!(number.root_node().display_name, "number");
        assert_eq!(number.root().index(), schema.len());
        assert!(resolve(&schema, "null").unwrap().root_node().is_nullable);
        assert!(!resolve(&schema, "Date").unwrap().root_node().is_nullable);
    }

    #[test]
    fn qualifiers_pick_by_location() {
        let schema = schema();
        assert_eq!(resolve(&schema, "Order").unwrap().root().index(), 0);
        assert_eq!(resolve(&schema, "legacy/Order").unwrap().root().index(), 1);
        assert!(resolve(&schema, "other/Order").is_none());
        assert!(resolve(&schema, "Missing").is_none());
    }

    #[test]
    fn array_suffixes_wrap_the_base() {
        let schema = schema();
        let orders = resolve(&schema, "legacy/Order[]").unwrap();
        assert_eq!(orders.root_node().display_name, "Order[]");
        assert_eq!(orders.root_node().array_of.map(|id| id.index()), Some(1));

        let grid = resolve(&schema, "number [ ][]").unwrap();
        let outer = grid.root_node();
        assert_eq!(outer.display_name, "number[][]");
        let middle = grid.node(outer.array_of.unwrap());
        assert_eq!(middle.display_name, "number[]");
        assert_eq!(grid.node(middle.array_of.unwrap()).display_name, "number");
    }

    #[test]
    fn unknown_array_bases_do_not_resolve() {
        assert!(resolve(&schema(), "Nope[]").is_none());
    }
}
