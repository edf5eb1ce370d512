//! Schema definitions loaded from JSON
//!
//! A definition is a JSON object mapping field names to field specs:
//!
//! ```json
//! {
//!   "name":     { "type": "String", "required": true, "enum": ["a", "b"] },
//!   "age":      { "type": "Number", "validate": ["positive"] },
//!   "address":  { "type": { "street": { "type": "String" } } },
//!   "children": { "type": [ { "name": { "type": "String" } } ] }
//! }
//! ```
//!
//! `type` is one of `String`, `Number`, `Boolean`, `Date`, `Object`,
//! `Array`, a nested definition object, or a one-element array holding the
//! definition of each item. Validator names are looked up in a
//! [`ValidatorRegistry`].

use std::fs;
use std::path::Path;

use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::schema::{child_path, FieldSpec, FieldType, ScalarKind, Schema, StructuralKind};
use crate::validator::ValidatorRegistry;

/// Build a schema from a JSON definition without named validators
pub fn make_schema(definition: &Json) -> Result<Schema> {
    Schema::from_json(definition)
}

impl Schema {
    /// Build a schema from a JSON definition.
    ///
    /// Fails with [`SchemaError::EmptySchema`] when the definition is null,
    /// `false`, zero or an empty string.
    pub fn from_json(definition: &Json) -> Result<Schema> {
        Self::from_json_with(definition, &ValidatorRegistry::default())
    }

    /// Build a schema from a JSON definition, resolving `validate` names
    /// through `registry`
    pub fn from_json_with(definition: &Json, registry: &ValidatorRegistry) -> Result<Schema> {
        if is_empty_definition(definition) {
            return Err(SchemaError::EmptySchema);
        }

        let schema = DefinitionLoader { registry }.schema("", definition)?;
        debug!(fields = schema.len(), "schema definition loaded");
        Ok(schema)
    }

    /// Read and build a schema from a JSON definition file
    pub fn from_path(path: impl AsRef<Path>, registry: &ValidatorRegistry) -> Result<Schema> {
        let content = fs::read_to_string(path.as_ref())?;
        let definition: Json = serde_json::from_str(&content)?;
        Self::from_json_with(&definition, registry)
    }
}

fn is_empty_definition(definition: &Json) -> bool {
    match definition {
        Json::Null => true,
        Json::Bool(b) => !b,
        Json::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Json::String(s) => s.is_empty(),
        Json::Array(_) | Json::Object(_) => false,
    }
}

struct DefinitionLoader<'a> {
    registry: &'a ValidatorRegistry,
}

impl DefinitionLoader<'_> {
    fn schema(&self, path: &str, definition: &Json) -> Result<Schema> {
        let fields = definition
            .as_object()
            .ok_or_else(|| invalid(path, "expected an object of field specs"))?;

        let mut builder = Schema::builder();
        for (name, spec) in fields {
            let field_path = child_path(path, name);
            builder = builder.field(name.clone(), self.field(&field_path, spec)?);
        }
        Ok(builder.build())
    }

    fn field(&self, path: &str, definition: &Json) -> Result<FieldSpec> {
        let attrs = definition
            .as_object()
            .ok_or_else(|| invalid(path, "field spec must be an object"))?;

        // A falsy `type` declares nothing; validate reports it as an invalid schema.
        let mut spec = match attrs.get("type") {
            Some(type_def) if !is_empty_definition(type_def) => {
                FieldSpec::new(self.field_type(path, type_def)?)
            }
            _ => FieldSpec::untyped(),
        };

        spec.required = match attrs.get("required") {
            None | Some(Json::Null) => false,
            Some(Json::Bool(b)) => *b,
            Some(_) => return Err(invalid(path, "\"required\" must be a boolean")),
        };

        spec.enum_values = enum_values(path, attrs)?;

        if let Some(names) = attrs.get("validate") {
            let names = names
                .as_array()
                .ok_or_else(|| invalid(path, "\"validate\" must be an array of names"))?;
            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| invalid(path, "validator names must be strings"))?;
                let unknown = || SchemaError::UnknownValidator {
                    path: path.to_string(),
                    name: name.to_string(),
                };
                let validator = self.registry.get(name).ok_or_else(unknown)?;
                spec.push_validator(validator);
            }
        }

        Ok(spec)
    }

    fn field_type(&self, path: &str, definition: &Json) -> Result<FieldType> {
        match definition {
            Json::String(name) => match name.as_str() {
                "String" => Ok(FieldType::Scalar(ScalarKind::String)),
                "Number" => Ok(FieldType::Scalar(ScalarKind::Number)),
                "Boolean" => Ok(FieldType::Scalar(ScalarKind::Boolean)),
                "Date" => Ok(FieldType::Scalar(ScalarKind::Date)),
                "Object" => Ok(FieldType::Structural(StructuralKind::Object)),
                "Array" => Ok(FieldType::Structural(StructuralKind::Array)),
                other => Err(invalid(path, format!("unknown type name {:?}", other))),
            },
            Json::Object(_) => Ok(FieldType::Nested(self.schema(path, definition)?)),
            Json::Array(items) => match items.as_slice() {
                [item @ Json::Object(_)] => Ok(FieldType::ArrayOf(self.schema(path, item)?)),
                _ => Err(invalid(path, "array type must hold exactly one schema object")),
            },
            _ => Err(invalid(path, "unsupported type definition")),
        }
    }
}

fn enum_values(path: &str, attrs: &Map<String, Json>) -> Result<Option<Vec<String>>> {
    let Some(values) = attrs.get("enum") else {
        return Ok(None);
    };
    if values.is_null() {
        return Ok(None);
    }

    let values = values
        .as_array()
        .ok_or_else(|| invalid(path, "\"enum\" must be an array of strings"))?;
    values
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(path, "\"enum\" must be an array of strings"))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn invalid(path: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidFormat {
        path: if path.is_empty() { "/".to_string() } else { path.to_string() },
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn test_empty_definitions_rejected() {
        for definition in [json!(null), json!(false), json!(0), json!("")] {
            let err = make_schema(&definition).unwrap_err();
            assert!(matches!(err, SchemaError::EmptySchema));
            assert_eq!(err.to_string(), "Schema is empty");
        }
        assert!(make_schema(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_type_forms_classified() {
        let schema = make_schema(&json!({
            "name": { "type": "String" },
            "cars": { "type": "Array" },
            "address": { "type": { "street": { "type": "String" } } },
            "children": { "type": [ { "age": { "type": "Number" } } ] },
            "broken": {}
        }))
        .unwrap();

        assert!(matches!(
            schema.field("name").unwrap().field_type,
            Some(FieldType::Scalar(ScalarKind::String))
        ));
        assert!(matches!(
            schema.field("cars").unwrap().field_type,
            Some(FieldType::Structural(StructuralKind::Array))
        ));
        match &schema.field("address").unwrap().field_type {
            Some(FieldType::Nested(nested)) => assert!(nested.field("street").is_some()),
            other => panic!("Expected Nested, got {:?}", other),
        }
        match &schema.field("children").unwrap().field_type {
            Some(FieldType::ArrayOf(items)) => assert!(items.field("age").is_some()),
            other => panic!("Expected ArrayOf, got {:?}", other),
        }
        assert!(schema.field("broken").unwrap().field_type.is_none());
    }

    #[test]
    fn test_falsy_type_loads_untyped() {
        for type_def in [json!(false), json!(""), json!(0), json!(null)] {
            let schema = make_schema(&json!({ "a": { "type": type_def.clone() } })).unwrap();
            assert!(schema.field("a").unwrap().field_type.is_none(), "{}", type_def);

            let err = schema.validate(&Value::from(json!({ "a": 1 }))).unwrap_err();
            assert_eq!(err.failures(), ["/a: invalid schema"]);
        }
    }

    #[test]
    fn test_invalid_type_definitions() {
        let err = make_schema(&json!({ "a": { "type": "Integer" } })).unwrap_err();
        match err {
            SchemaError::InvalidFormat { path, .. } => assert_eq!(path, "/a"),
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }

        let err = make_schema(&json!({ "a": { "type": [] } })).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFormat { .. }));

        let err = make_schema(&json!({ "a": { "type": { "b": { "type": 5 } } } })).unwrap_err();
        match err {
            SchemaError::InvalidFormat { path, .. } => assert_eq!(path, "/a/b"),
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }

        let err = make_schema(&json!(["not", "an", "object"])).unwrap_err();
        match err {
            SchemaError::InvalidFormat { path, .. } => assert_eq!(path, "/"),
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_required_and_enum() {
        let schema = make_schema(&json!({
            "role": { "type": "String", "required": true, "enum": ["admin", "guest"] }
        }))
        .unwrap();
        let role = schema.field("role").unwrap();
        assert!(role.required);
        assert_eq!(
            role.enum_values,
            Some(vec!["admin".to_string(), "guest".to_string()])
        );

        let err = make_schema(&json!({ "role": { "type": "String", "enum": [1] } })).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFormat { .. }));
    }

    #[test]
    fn test_named_validators_resolved() {
        let registry = ValidatorRegistry::new().with("positive", |value: &Value| {
            match value {
                Value::Number(n) if n.as_f64().unwrap_or(0.0) > 0.0 => Ok(()),
                _ => Err("must be positive".to_string()),
            }
        });

        let definition = json!({ "age": { "type": "Number", "validate": ["positive"] } });
        let schema = Schema::from_json_with(&definition, &registry).unwrap();
        assert_eq!(schema.field("age").unwrap().validators.len(), 1);

        let err = Schema::from_json(&definition).unwrap_err();
        match err {
            SchemaError::UnknownValidator { path, name } => {
                assert_eq!(path, "/age");
                assert_eq!(name, "positive");
            }
            other => panic!("Expected UnknownValidator, got {:?}", other),
        }
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("schema.json");
        fs::write(&file, r#"{ "name": { "type": "String", "required": true } }"#).unwrap();

        let schema = Schema::from_path(&file, &ValidatorRegistry::default()).unwrap();
        assert!(schema.field("name").unwrap().required);

        let missing =
            Schema::from_path(dir.path().join("nope.json"), &ValidatorRegistry::default());
        assert!(matches!(missing, Err(SchemaError::Io(_))));
    }
}
