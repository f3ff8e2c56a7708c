//! Type oracle: the read-only view of a resolved type system that the schema
//! builder walks.
//!
//! The builder never inspects anything beyond [`TypeOracle`]. [`TypeUniverse`]
//! is the in-crate implementation, fed by JSON declaration documents.
pub mod doc;
pub mod universe;

use std::fmt;

use crate::schema::Literal;

pub use doc::{DeclarationDoc, SourceUnit, TypeExpr};
pub use universe::{TypeId, TypeUniverse};

/// Stable identity of a declaration, alias, builtin or anonymous object type.
/// Compared by identity, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Interface,
    Alias,
    Enum,
}

/// The named declaration backing a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    /// `file:line` provenance.
    pub location: Option<String>,
    /// Provided by the type system itself (`Array`, `Date`, `Record`, ...).
    pub builtin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member<H> {
    pub name: String,
    pub optional: bool,
    /// `None` for methods.
    pub ty: Option<H>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSignature<H> {
    pub key: H,
    pub value: H,
}

pub trait TypeOracle {
    type Handle: Copy + Eq + fmt::Debug;

    /// Types of the exported top-level declarations, in source order.
    fn exported_types(&self) -> Vec<Self::Handle>;

    /// Display text, e.g. `Record<string, Bucket[]>`.
    fn display(&self, ty: Self::Handle) -> String;

    /// `string`, `number`, `null`, `undefined`, ... for intrinsic types.
    fn intrinsic_name(&self, ty: Self::Handle) -> Option<&'static str>;

    fn literal(&self, ty: Self::Handle) -> Option<Literal>;

    /// Alias identity when the type was introduced by an alias, otherwise the
    /// type's own identity.
    fn symbol(&self, ty: Self::Handle) -> Option<SymbolId>;

    fn union_branches(&self, ty: Self::Handle) -> Option<Vec<Self::Handle>>;

    fn is_enum(&self, ty: Self::Handle) -> bool;

    fn array_element(&self, ty: Self::Handle) -> Option<Self::Handle>;

    /// Ordered generic arguments (alias arguments win over reference arguments).
    fn type_arguments(&self, ty: Self::Handle) -> Vec<Self::Handle>;

    fn declaration(&self, ty: Self::Handle) -> Option<Declaration>;

    fn members(&self, ty: Self::Handle) -> Vec<Member<Self::Handle>>;

    fn index_signatures(&self, ty: Self::Handle) -> Vec<IndexSignature<Self::Handle>>;

    fn enum_values(&self, ty: Self::Handle) -> Vec<Literal>;

    fn is_null(&self, ty: Self::Handle) -> bool {
        self.intrinsic_name(ty) == Some("null")
    }

    fn is_nullable(&self, ty: Self::Handle) -> bool;
}
