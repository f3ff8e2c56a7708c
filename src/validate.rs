//! Structural validator: checks a JSON value against a schema node and
//! collects every mismatch, located by path and ranked by severity.
//!
//! Union branches are tried with `strict = false`: a trial reports success or
//! failure but records no errors. Only the decisive call records anything.
pub mod scalar;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::lookup;
use crate::schema::{self, IndexInfo, Literal, NodeId, NodeSource, Schema, SchemaNode};
use scalar::DateForm;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hint,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    TypeMismatch,
    MissingProperty,
    UnknownProperty,
    ArrayExpected,
    ObjectExpected,
    Unsupported,
    StringToDate,
    StringToRegExp,
}

/// One step from the root: a property name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub path: Vec<PathSegment>,
    pub message: String,
    pub error_type: ErrorKind,
    /// The offending fragment; `None` when the value is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_info: Option<SchemaNode>,
}

/// Empty (serialized as `{}`) when the data conforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

struct Validator<'a, S: NodeSource> {
    source: &'a S,
    errors: Vec<ValidationError>,
    path: Vec<PathSegment>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ErrorKind {
    pub fn severity(self) -> Severity {
        match self {
            ErrorKind::ArrayExpected
            | ErrorKind::ObjectExpected
            | ErrorKind::Unsupported
            | ErrorKind::MissingProperty
            | ErrorKind::TypeMismatch => Severity::Error,
            ErrorKind::UnknownProperty => Severity::Warning,
            ErrorKind::StringToDate | ErrorKind::StringToRegExp => Severity::Hint,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Hint => "hint",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::TypeMismatch => "typeMismatch",
            ErrorKind::MissingProperty => "missingProperty",
            ErrorKind::UnknownProperty => "unknownProperty",
            ErrorKind::ArrayExpected => "arrayExpected",
            ErrorKind::ObjectExpected => "objectExpected",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::StringToDate => "stringToDate",
            ErrorKind::StringToRegExp => "stringToRegExp",
        })
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl ValidationError {
    pub fn severity(&self) -> Severity {
        self.error_type.severity()
    }

    /// Dotted path, empty at the root.
    pub fn dotted_path(&self) -> String {
        dotted(&self.path)
    }
}

impl ValidationResult {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when any finding is error-severity.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity() == Severity::Error)
    }

    /// Findings at or above `min`.
    pub fn by_severity(&self, min: Severity) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.severity() >= min)
    }
}

/// Validate `data` against the type named by `root` (`Name`, `path/Name`,
/// `Name[]`, or a primitive).
pub fn validate(data: &Value, schema: &Schema, root: &str) -> ValidationResult {
    match lookup::resolve(schema, root) {
        Some(resolved) => validate_node(data, &resolved, resolved.root()),
        None => {
            debug!(root, "validation root not found");
            let mut v = Validator::new(schema);
            v.add_error(
                format!("Schema for expected type {root} not found"),
                ErrorKind::Unsupported,
                Some(data),
                None,
            );
            v.finish()
        }
    }
}

/// Validate `data` against an already resolved node.
pub fn validate_node(data: &Value, source: &impl NodeSource, root: NodeId) -> ValidationResult {
    let mut v = Validator::new(source);
    v.try_check(Some(data), root, false, true);
    v.finish()
}

impl<'a, S: NodeSource> Validator<'a, S> {
    fn new(source: &'a S) -> Self {
        Self { source, errors: Vec::new(), path: Vec::new() }
    }

    fn finish(self) -> ValidationResult {
        ValidationResult { errors: self.errors }
    }

    fn add_error(
        &mut self,
        mut message: String,
        kind: ErrorKind,
        value: Option<&Value>,
        node: Option<&SchemaNode>,
    ) {
        if !self.path.is_empty() {
            message.push_str(": ");
            message.push_str(&dotted(&self.path));
        }
        self.errors.push(ValidationError {
            path: self.path.clone(),
            message,
            error_type: kind,
            value: value.cloned(),
            type_info: node.cloned(),
        });
    }

    fn mismatch(&mut self, node: &SchemaNode, value: Option<&Value>, encountered: &str) {
        let message = format!("A {} value expected, encountered {encountered}", node.display_name);
        self.add_error(message, ErrorKind::TypeMismatch, value, Some(node));
    }

    fn try_check(
        &mut self,
        value: Option<&Value>,
        id: NodeId,
        optional: bool,
        strict: bool,
    ) -> bool {
        let source = self.source;
        let node = source.node(id);
        if node.union_of.is_empty() {
            return self.check(value, id, optional, strict);
        }

        for candidate in std::iter::once(id).chain(node.union_of.iter().copied()) {
            let mark = self.errors.len();
            if self.check(value, candidate, optional, false) {
                return true;
            }
            // advisory entries of a failed trial go with it
            self.errors.truncate(mark);
        }

        if strict {
            let message = format!(
                "Expected a value matching `{}`, encountered {}",
                schema::describe(source, id),
                scalar::type_of(value)
            );
            self.add_error(message, ErrorKind::TypeMismatch, value, Some(node));
        }
        false
    }

    fn check(&mut self, value: Option<&Value>, id: NodeId, optional: bool, strict: bool) -> bool {
        let source = self.source;
        let node = source.node(id);

        let Some(value) = value else {
            if optional {
                return true;
            }
            if strict {
                let message = format!("Required \"{}\" expected", node.display_name);
                self.add_error(message, ErrorKind::MissingProperty, None, Some(node));
            }
            return false;
        };

        if value.is_null() {
            if schema::is_nullable(source, id) {
                return true;
            }
            if strict {
                let message = format!("Required \"{}\" expected", node.display_name);
                self.add_error(message, ErrorKind::MissingProperty, Some(value), Some(node));
            }
            return false;
        }

        if let Some(item) = node.array_of {
            let Value::Array(items) = value else {
                if strict {
                    let message = format!(
                        "Array of {} expected, encountered scalar {}",
                        source.node(item).display_name,
                        scalar::type_of(Some(value))
                    );
                    self.add_error(message, ErrorKind::ArrayExpected, Some(value), Some(node));
                }
                return false;
            };
            let mut ok = true;
            for (i, element) in items.iter().enumerate() {
                self.path.push(PathSegment::Index(i));
                ok &= self.try_check(Some(element), item, false, strict);
                self.path.pop();
            }
            return ok;
        }

        if value.is_array() {
            if strict {
                let message =
                    format!("A scalar {} expected, encountered an array", node.display_name);
                self.add_error(message, ErrorKind::ObjectExpected, Some(value), Some(node));
            }
            return false;
        }

        if node.allowed_values.iter().any(|lit| lit.matches(value)) {
            return true;
        }

        match node.display_name.as_str() {
            name @ ("boolean" | "string" | "number" | "bigint") => {
                if scalar::matches_primitive(name, value) {
                    return true;
                }
                if strict {
                    self.mismatch(node, Some(value), scalar::type_of(Some(value)));
                }
                return false;
            }
            "Date" => {
                return match scalar::date_form(value) {
                    Some(DateForm::String) => {
                        let message = format!(
                            "A Date expected but string \"{}\" is encountered. \
                             Would be better to convert the string pattern to Date instance",
                            scalar::text_of(value)
                        );
                        self.add_error(message, ErrorKind::StringToDate, Some(value), Some(node));
                        true
                    }
                    Some(_) => true,
                    None => {
                        if strict {
                            self.mismatch(node, Some(value), &scalar::text_of(value));
                        }
                        false
                    }
                };
            }
            "RegExp" => {
                if scalar::is_tagged_regex(value) {
                    return true;
                }
                if let Value::String(s) = value {
                    let message = format!(
                        "A RegExp expected but string \"{s}\" is encountered. \
                         Would be better to convert the string pattern to RegExp instance"
                    );
                    self.add_error(message, ErrorKind::StringToRegExp, Some(value), Some(node));
                    return true;
                }
                if strict {
                    self.mismatch(node, Some(value), scalar::type_of(Some(value)));
                }
                return false;
            }
            _ => {}
        }

        if !node.properties.is_empty() || !node.indexes.is_empty() {
            return self.check_object(value, node, strict);
        }

        if strict && node.is_literal_only() {
            self.mismatch(node, Some(value), &scalar::text_of(value));
        }
        false
    }

    fn check_object(&mut self, value: &Value, node: &'a SchemaNode, strict: bool) -> bool {
        let Value::Object(map) = value else {
            if strict {
                let message = format!("Expected object, got {}", scalar::type_of(Some(value)));
                self.add_error(message, ErrorKind::ObjectExpected, Some(value), Some(node));
            }
            return false;
        };

        let mut ok = true;
        for prop in &node.properties {
            self.path.push(PathSegment::Key(prop.name.clone()));
            ok &= self.try_check(map.get(&prop.name), prop.ty, prop.is_optional, strict);
            self.path.pop();
        }

        let mut unknown = Vec::new();
        for (key, field) in map {
            if node.property(key).is_some() {
                continue;
            }
            match self.matching_index(&node.indexes, key) {
                Some(index) => {
                    self.path.push(PathSegment::Key(key.clone()));
                    ok &= self.try_check(Some(field), index.value_type, false, strict);
                    self.path.pop();
                }
                None => unknown.push(key.as_str()),
            }
        }

        if strict && !unknown.is_empty() {
            let message = format!("Unknown properties: {}", unknown.join(", "));
            self.add_error(message, ErrorKind::UnknownProperty, Some(value), Some(node));
        }
        ok
    }

    fn matching_index<'n>(&self, indexes: &'n [IndexInfo], key: &str) -> Option<&'n IndexInfo> {
        indexes.iter().find(|x| self.key_admits(x.key_type, key, &mut Vec::new()))
    }

    /// Whether an index key type admits the object key `key`.
    fn key_admits(&self, id: NodeId, key: &str, seen: &mut Vec<NodeId>) -> bool {
        if seen.contains(&id) {
            return false;
        }
        seen.push(id);
        let node = self.source.node(id);
        let numeric = scalar::numeric_key(key);
        let literal_hit = node.allowed_values.iter().any(|lit| match lit {
            Literal::Str(s) => s == key,
            Literal::Num(n) => numeric == Some(n.0),
            Literal::Bool(_) => false,
        });
        literal_hit
            || match node.display_name.as_str() {
                "string" | "any" | "unknown" => true,
                "number" => numeric.is_some(),
                _ => false,
            }
            || node.union_of.iter().any(|b| self.key_admits(*b, key, seen))
    }
}

fn dotted(path: &[PathSegment]) -> String {
    let parts: Vec<String> = path.iter().map(ToString::to_string).collect();
    parts.join(".")
}

// ---- Tests ---- //
