//! JSON Schema services for patch lenses
//!
//! - `propagate`: the schema a lens's output satisfies
//! - `defaults`: minimal values for fields a converted patch leaves unset
//! - `infer`: a schema from a sample document
//!
//! [`JsonSchemaOracle`] packages these as the core's [`SchemaOracle`].

pub mod defaults;
pub mod error;
pub mod infer;
pub mod propagate;
pub mod schema;

use patchlens_core::{BoxError, LensSource, Patch, SchemaOracle};
use serde_json::Value;

pub use defaults::{add_default_values, default_document, default_value};
pub use error::SchemaError;
pub use infer::infer_schema;
pub use propagate::{update_schema, update_schema_op};
pub use schema::{default_for_type, JsonSchema, DRAFT_07};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaOracle;

impl SchemaOracle for JsonSchemaOracle {
    type Schema = JsonSchema;

    fn propagate(&self, schema: &JsonSchema, lens: &LensSource) -> Result<JsonSchema, BoxError> {
        Ok(update_schema(schema, lens)?)
    }

    fn synthesize_defaults(&self, patch: Patch, schema: &JsonSchema) -> Result<Patch, BoxError> {
        Ok(add_default_values(patch, schema))
    }

    fn default_document(&self, schema: &JsonSchema) -> Result<Value, BoxError> {
        Ok(default_document(schema))
    }

    fn infer(&self, doc: &Value) -> JsonSchema {
        infer_schema(doc)
    }
}
