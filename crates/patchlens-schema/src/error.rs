use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("`{op}` refers to missing property `{name}`")]
    MissingProperty { op: &'static str, name: String },

    #[error("`{op}` expects `{name}` to be an array with an item schema")]
    NotAnArray { op: &'static str, name: String },

    #[error("`{op}` needs a property name")]
    MissingName { op: &'static str },
}
