//! Simple Schema
//!
//! Recursive validation and best-effort type coercion of loosely-typed
//! nested data against a declarative schema.
//!
//! ## Features
//!
//! - **Validation**: Every mismatch is collected as a path-qualified failure
//!   such as `/children/0/age: must be a number`
//! - **Typeify**: Leaf values are coerced towards their declared type
//!   (`"yes"` -> `true`, `"23"` -> `23`, `"2014-01-02"` -> a date)
//! - **Custom Validators**: Arbitrary checks run after the type check
//! - **JSON Definitions**: Schemas can be loaded from JSON documents
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use simple_schema::{make_schema, Value};
//!
//! let schema = make_schema(&json!({
//!     "name": { "type": "String", "required": true },
//!     "children": { "type": [ { "age": { "type": "Number" } } ] }
//! }))
//! .unwrap();
//!
//! let data = Value::from(json!({ "children": [ { "age": "23" } ] }));
//! let err = schema.validate(&data).unwrap_err();
//! assert_eq!(
//!     err.failures(),
//!     ["/name: missing value", "/children/0/age: must be a number"]
//! );
//!
//! let fixed = schema.typeify(&data);
//! assert_eq!(fixed, Value::from(json!({ "children": [ { "age": 23 } ] })));
//! ```

mod coercer;
pub mod config;
pub mod definition;
pub mod error;
pub mod matcher;
pub mod schema;
pub mod validator;
pub mod value;

pub use config::{OutputFormat, SchemaConfig};
pub use definition::make_schema;
pub use error::{Result, SchemaError};
pub use matcher::{Failure, ValidateOptions};
pub use schema::{FieldSpec, FieldType, ScalarKind, Schema, SchemaBuilder, StructuralKind};
pub use validator::{Validator, ValidatorRegistry};
pub use value::{Object, Value};
