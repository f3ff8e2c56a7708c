//! Schema graphs from static type declarations, and structural validation of
//! JSON data against them.
//!
//! ```text
//! declarations ──TypeOracle──▶ builder ──▶ Schema ──lookup──▶ validate(data)
//! ```
pub mod builder;
pub mod cache;
pub mod error;
pub mod jq_exec;
pub mod lookup;
pub mod oracle;
pub mod path_de;
pub mod schema;
pub mod validate;

pub use builder::{build_schema, SchemaBuilder};
pub use cache::{IdentityCache, TypeKey};
pub use error::LoadError;
pub use lookup::{resolve, Resolved};
pub use oracle::{TypeOracle, TypeUniverse};
pub use schema::{IndexInfo, Literal, NodeId, NodeSource, PropInfo, Schema, SchemaGraph, SchemaNode};
pub use validate::{
    validate, validate_node, ErrorKind, PathSegment, Severity, ValidationError, ValidationResult,
};
