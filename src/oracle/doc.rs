//! JSON declaration documents: the on-disk input of [`super::TypeUniverse`].
//!
//! One [`SourceUnit`] per source file. Type expressions are structured JSON,
//! never source text.
use serde::Deserialize;

use crate::schema::Literal;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUnit {
    pub file: String,
    #[serde(default)]
    pub declarations: Vec<DeclarationDoc>,
}

/// A declarations file holds either one unit or a list of units.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DeclarationFile {
    Many(Vec<SourceUnit>),
    One(SourceUnit),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeclarationDoc {
    Interface(InterfaceDoc),
    Alias(AliasDoc),
    Enum(EnumDoc),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDoc {
    pub name: String,
    #[serde(default = "default_exported")]
    pub exported: bool,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub extends: Vec<TypeExpr>,
    #[serde(default)]
    pub members: Vec<MemberDoc>,
    #[serde(default)]
    pub indexes: Vec<IndexDoc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasDoc {
    pub name: String,
    #[serde(default = "default_exported")]
    pub exported: bool,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDoc {
    pub name: String,
    #[serde(default = "default_exported")]
    pub exported: bool,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub members: Vec<EnumMemberDoc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnumMemberDoc {
    pub name: String,
    #[serde(default)]
    pub value: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberDoc {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub method: bool,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexDoc {
    pub key: TypeExpr,
    pub value: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ObjectDoc {
    #[serde(default)]
    pub members: Vec<MemberDoc>,
    #[serde(default)]
    pub indexes: Vec<IndexDoc>,
}

/// Structured type expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    /// `string`, `Date`, `T`, `Order`, ...
    Name(String),
    Generic {
        #[serde(rename = "ref")]
        name: String,
        #[serde(default)]
        args: Vec<TypeExpr>,
    },
    Array {
        array: Box<TypeExpr>,
    },
    Union {
        union: Vec<TypeExpr>,
    },
    Intersection {
        intersection: Vec<TypeExpr>,
    },
    Literal {
        literal: Literal,
    },
    Object {
        object: ObjectDoc,
    },
}

impl DeclarationDoc {
    pub fn name(&self) -> &str {
        match self {
            DeclarationDoc::Interface(d) => &d.name,
            DeclarationDoc::Alias(d) => &d.name,
            DeclarationDoc::Enum(d) => &d.name,
        }
    }

    pub fn exported(&self) -> bool {
        match self {
            DeclarationDoc::Interface(d) => d.exported,
            DeclarationDoc::Alias(d) => d.exported,
            DeclarationDoc::Enum(d) => d.exported,
        }
    }

    pub fn line(&self) -> Option<u32> {
        match self {
            DeclarationDoc::Interface(d) => d.line,
            DeclarationDoc::Alias(d) => d.line,
            DeclarationDoc::Enum(d) => d.line,
        }
    }

    pub fn type_params(&self) -> &[String] {
        match self {
            DeclarationDoc::Interface(d) => &d.type_params,
            DeclarationDoc::Alias(d) => &d.type_params,
            DeclarationDoc::Enum(_) => &[],
        }
    }
}

impl DeclarationFile {
    pub fn into_units(self) -> Vec<SourceUnit> {
        match self {
            DeclarationFile::Many(units) => units,
            DeclarationFile::One(unit) => vec![unit],
        }
    }
}

fn default_exported() -> bool { true }

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_expressions_pick_the_right_shape() {
        let exprs: Vec<TypeExpr> = serde_json::from_value(json!([
            "string",
            { "ref": "Record", "args": ["string", { "array": "Bucket" }] },
            { "union": ["Id", { "literal": "ref" }, "null"] },
            { "object": { "members": [{ "name": "id", "type": "string" }] } },
            { "intersection": ["A", "B"] },
        ]))
        .unwrap();
        assert_eq!(exprs[0], TypeExpr::Name("string".into()));
        assert!(matches!(&exprs[1], TypeExpr::Generic { name, args } if name == "Record" && args.len() == 2));
        assert!(matches!(&exprs[2], TypeExpr::Union { union } if union[1] == TypeExpr::Literal { literal: Literal::from("ref") }));
        assert!(matches!(&exprs[3], TypeExpr::Object { object } if object.members.len() == 1));
        assert!(matches!(&exprs[4], TypeExpr::Intersection { .. }));
    }

    #[test]
    fn declarations_default_to_exported() {
        let unit: SourceUnit = serde_json::from_value(json!({
            "file": "a.ts",
            "declarations": [
                { "kind": "alias", "name": "Id", "type": "string", "exported": false },
                { "kind": "enum", "name": "Kind", "members": [{ "name": "t" }, { "name": "u", "value": 4 }] },
            ]
        }))
        .unwrap();
        assert!(!unit.declarations[0].exported());
        assert!(unit.declarations[1].exported());
        let DeclarationDoc::Enum(kind) = &unit.declarations[1] else { panic!("enum expected") };
        assert_eq!(kind.members[1].value, Some(Literal::from(4.0)));
    }

    #[test]
    fn files_hold_one_or_many_units() {
        let one: DeclarationFile = serde_json::from_value(json!({ "file": "a.ts" })).unwrap();
        let many: DeclarationFile =
            serde_json::from_value(json!([{ "file": "a.ts" }, { "file": "b.ts" }])).unwrap();
        assert_eq!(one.into_units().len(), 1);
        assert_eq!(many.into_units().len(), 2);
    }
}
