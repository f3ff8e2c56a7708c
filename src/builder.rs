//! Schema graph builder: walks a [`TypeOracle`] and materializes one
//! [`SchemaNode`] per distinct type identity.
//!
//! A node is registered in the identity cache before any of its children are
//! resolved, so recursive references land on the in-progress node.
use indexmap::IndexSet;
use tracing::{debug, info, trace};

use crate::cache::IdentityCache;
use crate::oracle::{DeclKind, Declaration, TypeOracle};
use crate::schema::{IndexInfo, NodeId, PropInfo, Schema, SchemaGraph, SchemaNode};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// State of one build pass. Dropped (with its cache) when the pass ends.
pub struct SchemaBuilder<'o, O: TypeOracle> {
    oracle: &'o O,
    cache: IdentityCache,
    graph: SchemaGraph,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

/// Build the schema of every exported declaration the oracle knows about.
pub fn build_schema<O: TypeOracle>(oracle: &O) -> Schema {
    let mut builder = SchemaBuilder::new(oracle);
    for ty in oracle.exported_types() {
        let id = builder.build_node(ty);
        debug!(ty = %oracle.display(ty), node = id.index(), "exported declaration");
    }
    let schema = builder.finish();
    info!(nodes = schema.len(), named = schema.type_ids().len(), "schema built");
    schema
}

impl<'o, O: TypeOracle> SchemaBuilder<'o, O> {
    pub fn new(oracle: &'o O) -> Self {
        Self {
            oracle,
            cache: IdentityCache::new(),
            graph: SchemaGraph::default(),
        }
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    /// Close the pass: named nodes sorted by name.
    pub fn finish(self) -> Schema {
        Schema::from_graph(self.graph)
    }

    pub fn build_node(&mut self, ty: O::Handle) -> NodeId {
        let oracle = self.oracle;
        let branches = self.union_branches(ty);
        let key = IdentityCache::key_of(oracle, &branches);
        if let Some(id) = self.cache.get(&key) {
            trace!(node = id.index(), "identity cache hit");
            return id;
        }
        let id = self.graph.alloc();
        self.cache.set(key, id);
        trace!(ty = %oracle.display(ty), node = id.index(), "identity cache miss");

        let mut node = SchemaNode::scalar(oracle.display(ty));

        let mut real = Vec::new();
        for branch in branches {
            if let Some(lit) = oracle.literal(branch) {
                node.allowed_values.insert(lit);
            } else if oracle.is_null(branch) {
                node.is_nullable = true;
            } else {
                real.push(branch);
            }
        }
        if !(real.len() == 1 && real[0] == ty) {
            node.union_of = real.into_iter().map(|b| self.build_node(b)).collect();
        }

        if let Some(element) = oracle.array_element(ty) {
            node.array_of = Some(self.build_node(element));
        }

        if let Some(decl) = oracle.declaration(ty) {
            self.populate_declared(&mut node, ty, &decl);
        }

        if !node.is_nullable && oracle.is_nullable(ty) {
            node.is_nullable = true;
        }

        *self.graph.node_mut(id) = node;
        id
    }

    /// Flattened union branches (enums stay whole), or just `ty`.
    fn union_branches(&self, ty: O::Handle) -> Vec<O::Handle> {
        let mut out = Vec::new();
        self.collect_branches(ty, &mut out, &mut Vec::new());
        out
    }

    fn collect_branches(
        &self,
        ty: O::Handle,
        out: &mut Vec<O::Handle>,
        unions: &mut Vec<O::Handle>,
    ) {
        let branches = if self.oracle.is_enum(ty) {
            None
        } else {
            self.oracle.union_branches(ty)
        };
        match branches {
            // a union reached again through its own branches adds nothing new
            Some(_) if unions.contains(&ty) => {}
            Some(branches) => {
                unions.push(ty);
                for branch in branches {
                    self.collect_branches(branch, out, unions);
                }
            }
            None if !out.contains(&ty) => out.push(ty),
            None => {}
        }
    }

    fn populate_declared(&mut self, node: &mut SchemaNode, ty: O::Handle, decl: &Declaration) {
        let oracle = self.oracle;
        if !decl.builtin {
            node.name = Some(decl.name.clone());
            node.source_location = decl.location.clone();
        }

        let is_enum = decl.kind == DeclKind::Enum || oracle.is_enum(ty);
        if is_enum {
            node.is_enum = true;
            node.allowed_values = oracle.enum_values(ty).into_iter().collect::<IndexSet<_>>();
        }

        let literal_union = oracle
            .union_branches(ty)
            .is_some_and(|bs| bs.iter().all(|b| oracle.literal(*b).is_some()));
        let dictionary = decl.builtin && decl.name == "Record";
        let collect_props = !is_enum && !literal_union && (!decl.builtin || dictionary);

        if collect_props {
            for member in oracle.members(ty) {
                // methods carry no data
                let Some(member_ty) = member.ty else { continue };
                let prop = PropInfo {
                    name: member.name,
                    is_optional: member.optional,
                    ty: self.build_node(member_ty),
                };
                node.properties.push(prop);
            }
            for index in oracle.index_signatures(ty) {
                let info = IndexInfo {
                    key_type: self.build_node(index.key),
                    value_type: self.build_node(index.value),
                };
                node.indexes.push(info);
            }
        }
    }
}

// ---- Tests ---- //
