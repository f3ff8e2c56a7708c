//! Graph-identity cache: canonical keys for types and the key → node table of
//! one build pass.
use crate::oracle::{SymbolId, TypeOracle};
use crate::schema::{Literal, NodeId};

/// Canonical identity of a type (or of a flattened union branch set).
#[derive(Debug, Clone)]
pub enum TypeKey {
    Null,
    Undefined,
    Literal(Literal),
    /// `string`, `number`, `any`, ...
    Intrinsic(&'static str),
    Symbol(SymbolId),
    /// Generic instantiation; arguments compare positionally.
    Generic { base: SymbolId, args: Vec<TypeKey> },
    /// Union branch set; compares as a multiset.
    Union(Vec<TypeKey>),
    /// Back-reference to an aliased union that is still being keyed.
    Recursive(SymbolId),
    /// No identity available, keyed by display text.
    Opaque(String),
}

impl TypeKey {
    /// Key of a single handle.
    pub fn of<O: TypeOracle>(oracle: &O, ty: O::Handle) -> TypeKey {
        Self::keyed(oracle, ty, &mut Vec::new())
    }

    /// `open` holds the unions currently being keyed; meeting one again yields
    /// a back-reference instead of another expansion.
    fn keyed<O: TypeOracle>(oracle: &O, ty: O::Handle, open: &mut Vec<O::Handle>) -> TypeKey {
        match oracle.intrinsic_name(ty) {
            Some("null") => return TypeKey::Null,
            Some("undefined") => return TypeKey::Undefined,
            Some(name) => return TypeKey::Intrinsic(name),
            None => {}
        }
        if let Some(lit) = oracle.literal(ty) {
            return TypeKey::Literal(lit);
        }
        if let Some(branches) = oracle.union_branches(ty) {
            if open.contains(&ty) {
                return match oracle.symbol(ty) {
                    Some(alias) => TypeKey::Recursive(alias),
                    None => TypeKey::Opaque(oracle.display(ty)),
                };
            }
            open.push(ty);
            let keys = branches.into_iter().map(|b| Self::keyed(oracle, b, open)).collect();
            open.pop();
            return TypeKey::Union(keys);
        }
        let Some(symbol) = oracle.symbol(ty) else {
            return TypeKey::Opaque(oracle.display(ty));
        };
        let args = oracle.type_arguments(ty);
        if args.is_empty() {
            return TypeKey::Symbol(symbol);
        }
        TypeKey::Generic {
            base: symbol,
            args: args.into_iter().map(|a| Self::keyed(oracle, a, open)).collect(),
        }
    }

    /// Key of a flattened branch set: the branch's own key when there is one.
    pub fn of_branches<O: TypeOracle>(oracle: &O, branches: &[O::Handle]) -> TypeKey {
        match branches {
            [] => TypeKey::Null,
            [single] => TypeKey::of(oracle, *single),
            many => TypeKey::Union(many.iter().map(|b| TypeKey::of(oracle, *b)).collect()),
        }
    }

    pub fn is_equal(&self, other: &TypeKey) -> bool {
        use TypeKey::*;
        match (self, other) {
            (Null, Null) | (Undefined, Undefined) => true,
            (Literal(a), Literal(b)) => a == b,
            (Intrinsic(a), Intrinsic(b)) => a == b,
            (Symbol(a), Symbol(b)) | (Recursive(a), Recursive(b)) => a == b,
            (Generic { base: a, args: xs }, Generic { base: b, args: ys }) => {
                a == b && xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| x.is_equal(y))
            }
            (Union(xs), Union(ys)) => same_multiset(xs, ys),
            (Opaque(a), Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

fn same_multiset(xs: &[TypeKey], ys: &[TypeKey]) -> bool {
    if xs.len() != ys.len() {
        return false;
    }
    let mut used = vec![false; ys.len()];
    xs.iter().all(|x| {
        let hit = ys
            .iter()
            .enumerate()
            .position(|(i, y)| !used[i] && x.is_equal(y));
        match hit {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Key → node table of one build pass, scanned linearly.
#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: Vec<(TypeKey, NodeId)>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &TypeKey) -> Option<NodeId> {
        self.entries.iter().find(|(k, _)| k.is_equal(key)).map(|(_, id)| *id)
    }

    pub fn set(&mut self, key: TypeKey, node: NodeId) {
        self.entries.push((key, node));
    }

    pub fn key_of<O: TypeOracle>(oracle: &O, branches: &[O::Handle]) -> TypeKey {
        TypeKey::of_branches(oracle, branches)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---- Tests ---- //
