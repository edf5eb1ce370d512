//! Schema types and structures

use std::fmt;
use std::sync::Arc;

use crate::coercer::Coercer;
use crate::error::{Result, SchemaError};
use crate::matcher::{Failure, Matcher, ValidateOptions};
use crate::validator::Validator;
use crate::value::Value;

/// Primitive kinds checked by runtime kind and coerced by typeify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Date,
}

/// Structural kinds checked by shape only and never coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralKind {
    Object,
    Array,
}

impl ScalarKind {
    /// Type name as written in schema definitions
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Number => "Number",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Date => "Date",
        }
    }
}

impl StructuralKind {
    /// Type name as written in schema definitions
    pub fn type_name(&self) -> &'static str {
        match self {
            StructuralKind::Object => "Object",
            StructuralKind::Array => "Array",
        }
    }
}

/// What a field's `type` means
#[derive(Debug, Clone)]
pub enum FieldType {
    Scalar(ScalarKind),
    Structural(StructuralKind),
    /// The field is an object matching this sub-schema
    Nested(Schema),
    /// The field is a sequence whose items each match this sub-schema
    ArrayOf(Schema),
}

/// Expected type, requiredness and extra checks for one field
#[derive(Clone, Default)]
pub struct FieldSpec {
    /// `None` marks an invalid field spec
    pub field_type: Option<FieldType>,
    /// Only consulted when the field is absent
    pub required: bool,
    /// Allowed values, only applied to string fields
    pub enum_values: Option<Vec<String>>,
    /// Run in order after the type check
    pub validators: Vec<Arc<dyn Validator>>,
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    /// A field spec without a type
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn string() -> Self {
        Self::new(FieldType::Scalar(ScalarKind::String))
    }

    pub fn number() -> Self {
        Self::new(FieldType::Scalar(ScalarKind::Number))
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Scalar(ScalarKind::Boolean))
    }

    pub fn date() -> Self {
        Self::new(FieldType::Scalar(ScalarKind::Date))
    }

    pub fn object() -> Self {
        Self::new(FieldType::Structural(StructuralKind::Object))
    }

    pub fn array() -> Self {
        Self::new(FieldType::Structural(StructuralKind::Array))
    }

    pub fn nested(schema: Schema) -> Self {
        Self::new(FieldType::Nested(schema))
    }

    pub fn array_of(schema: Schema) -> Self {
        Self::new(FieldType::ArrayOf(schema))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate_with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub(crate) fn push_validator(&mut self, validator: Arc<dyn Validator>) {
        self.validators.push(validator);
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("enum_values", &self.enum_values)
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// An ordered mapping of field name to [`FieldSpec`].
///
/// Keys present in data but not in the schema are ignored.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate data against this schema with default options
    pub fn validate(&self, data: &Value) -> Result<()> {
        self.validate_with(data, &ValidateOptions::default())
    }

    /// Validate data against this schema.
    ///
    /// Fails with [`SchemaError::EmptyObject`] when `data` is empty, and with
    /// [`SchemaError::ValidationFailed`] carrying every `"path: message"`
    /// failure when any field does not match.
    pub fn validate_with(&self, data: &Value, options: &ValidateOptions) -> Result<()> {
        if data.is_falsy() {
            return Err(SchemaError::EmptyObject);
        }

        let failures = self.check(data, options);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed {
                failures: failures.iter().map(Failure::to_string).collect(),
            })
        }
    }

    /// Collect the failures of `data` against this schema without raising
    pub fn check(&self, data: &Value, options: &ValidateOptions) -> Vec<Failure> {
        Matcher::new(options).run(self, data)
    }

    /// Coerce leaf values of `data` towards the declared field types.
    ///
    /// Returns a new tree and never fails. Empty input is returned as is.
    pub fn typeify(&self, data: &Value) -> Value {
        Coercer::new().run(self, data)
    }
}

/// Builds a [`Schema`] field by field, keeping declaration order
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, FieldSpec)>,
}

impl SchemaBuilder {
    /// Add a field. Redeclaring a name replaces the earlier spec in place.
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = spec,
            None => self.fields.push((name, spec)),
        }
        self
    }

    pub fn build(self) -> Schema {
        Schema { fields: self.fields }
    }
}

/// Path of a child key or array index below `base`
pub(crate) fn child_path(base: &str, segment: &str) -> String {
    format!("{}/{}", base, segment)
}
