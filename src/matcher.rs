//! Schema matching
//!
//! Walks a schema depth-first in field declaration order and collects a
//! [`Failure`] for every field of the data that does not match. Failures
//! are appended to one collector shared by the whole recursion, so their
//! order is traversal order followed by validator order within a field.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::schema::{child_path, FieldSpec, FieldType, ScalarKind, Schema, StructuralKind};
use crate::value::Value;

const INVALID_SCHEMA: &str = "invalid schema";
const MISSING_VALUE: &str = "missing value";

/// Options for a validation call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateOptions {
    /// Do not report required fields that are absent
    #[serde(default)]
    pub ignore_missing: bool,
}

impl ValidateOptions {
    pub fn ignore_missing() -> Self {
        Self {
            ignore_missing: true,
        }
    }
}

/// A single path-qualified validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub path: String,
    pub message: String,
}

impl Failure {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Recursive matcher holding the failure collector for one call
pub(crate) struct Matcher<'a> {
    options: &'a ValidateOptions,
    failures: Vec<Failure>,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(options: &'a ValidateOptions) -> Self {
        Self {
            options,
            failures: Vec::new(),
        }
    }

    /// Match `data` against `schema` from the root path
    pub(crate) fn run(mut self, schema: &Schema, data: &Value) -> Vec<Failure> {
        self.match_schema("", schema, data);
        debug!(
            failures = self.failures.len(),
            ignore_missing = self.options.ignore_missing,
            "schema match finished"
        );
        self.failures
    }

    fn fail(&mut self, path: &str, message: impl Into<String>) {
        let failure = Failure::new(path, message);
        trace!(path = %failure.path, message = %failure.message, "field failed");
        self.failures.push(failure);
    }

    fn match_schema(&mut self, path: &str, schema: &Schema, data: &Value) {
        for (key, spec) in schema.fields() {
            let field_path = child_path(path, key);
            self.match_field(&field_path, spec, data.get(key));
        }
    }

    fn match_field(&mut self, path: &str, spec: &FieldSpec, value: Option<&Value>) {
        let Some(field_type) = &spec.field_type else {
            self.fail(path, INVALID_SCHEMA);
            return;
        };

        let Some(value) = value else {
            if spec.required && !self.options.ignore_missing {
                self.fail(path, MISSING_VALUE);
            }
            return;
        };

        match field_type {
            FieldType::Scalar(kind) => self.match_scalar(path, *kind, spec, value),
            FieldType::Structural(kind) => {
                let matches = match kind {
                    StructuralKind::Object => matches!(value, Value::Object(_)),
                    StructuralKind::Array => matches!(value, Value::Array(_)),
                };
                if !matches {
                    self.fail(path, format!("must be of type {}", kind.type_name()));
                }
            }
            FieldType::ArrayOf(item_schema) => match value {
                Value::Array(items) => {
                    for (index, item) in items.iter().enumerate() {
                        let item_path = child_path(path, &index.to_string());
                        self.match_schema(&item_path, item_schema, item);
                    }
                }
                _ => self.fail(path, "must be an array"),
            },
            FieldType::Nested(nested) => self.match_schema(path, nested, value),
        }

        for validator in &spec.validators {
            if let Err(message) = validator.check(value) {
                self.fail(path, message);
            }
        }
    }

    fn match_scalar(&mut self, path: &str, kind: ScalarKind, spec: &FieldSpec, value: &Value) {
        match kind {
            ScalarKind::String => match value {
                Value::String(s) => {
                    if let Some(allowed) = &spec.enum_values {
                        if !allowed.iter().any(|a| a == s) {
                            self.fail(path, format!("must be one of {}", allowed.join(", ")));
                        }
                    }
                }
                _ => self.fail(path, "must be a string"),
            },
            ScalarKind::Boolean => {
                if !matches!(value, Value::Bool(_)) {
                    self.fail(path, "must be true or false");
                }
            }
            ScalarKind::Number => {
                if !matches!(value, Value::Number(_)) {
                    self.fail(path, "must be a number");
                }
            }
            ScalarKind::Date => {
                if !matches!(value, Value::Date(_)) {
                    self.fail(path, format!("must be of type {}", kind.type_name()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(schema: &Schema, data: serde_json::Value) -> Vec<String> {
        schema
            .check(&Value::from(data), &ValidateOptions::default())
            .iter()
            .map(Failure::to_string)
            .collect()
    }

    #[test]
    fn test_failure_display() {
        let failure = Failure::new("/a/0/b", "must be a number");
        assert_eq!(failure.to_string(), "/a/0/b: must be a number");
    }

    #[test]
    fn test_untyped_field_reported_even_when_absent() {
        let schema = Schema::builder()
            .field("name", FieldSpec::untyped().required())
            .build();
        assert_eq!(check(&schema, json!({})), vec!["/name: invalid schema"]);
        assert_eq!(
            check(&schema, json!({"name": 1})),
            vec!["/name: invalid schema"]
        );
    }

    #[test]
    fn test_untyped_field_skips_validators() {
        let schema = Schema::builder()
            .field(
                "name",
                FieldSpec::untyped()
                    .validate_with(|_: &Value| -> Result<(), String> { Err("nope".into()) }),
            )
            .build();
        assert_eq!(check(&schema, json!({"name": 1})), vec!["/name: invalid schema"]);
    }

    #[test]
    fn test_null_is_present_not_missing() {
        let schema = Schema::builder()
            .field("name", FieldSpec::string().required())
            .build();
        assert_eq!(
            check(&schema, json!({"name": null})),
            vec!["/name: must be a string"]
        );
    }

    #[test]
    fn test_structural_kinds() {
        let schema = Schema::builder()
            .field("obj", FieldSpec::object())
            .field("arr", FieldSpec::array())
            .field("when", FieldSpec::date())
            .build();
        assert_eq!(
            check(&schema, json!({"obj": [], "arr": {}, "when": "2014-01-02"})),
            vec![
                "/obj: must be of type Object",
                "/arr: must be of type Array",
                "/when: must be of type Date",
            ]
        );
        assert!(check(&schema, json!({"obj": {}, "arr": []})).is_empty());
    }

    #[test]
    fn test_nested_schema_on_non_object_treats_fields_as_absent() {
        let inner = Schema::builder()
            .field("name", FieldSpec::string().required())
            .field("age", FieldSpec::number())
            .build();
        let schema = Schema::builder().field("child", FieldSpec::nested(inner)).build();
        assert_eq!(
            check(&schema, json!({"child": "text"})),
            vec!["/child/name: missing value"]
        );
    }
}
