use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("path `{path}` does not exist")]
    PathNotFound { path: String },

    #[error("`{token}` is not a valid array index at `{path}`")]
    InvalidIndex { path: String, token: String },

    #[error("index {index} out of bounds (len {len}) at `{path}`")]
    IndexOutOfBounds { path: String, index: usize, len: usize },

    #[error("parent of `{path}` is not a container")]
    NotAContainer { path: String },

    #[error("cannot move `{from}` into its own child `{path}`")]
    MoveIntoChild { from: String, path: String },

    #[error("test failed at `{path}`: expected {expected}, found {actual:?}")]
    TestFailed {
        path: String,
        expected: Value,
        actual: Option<Value>,
    },
}
