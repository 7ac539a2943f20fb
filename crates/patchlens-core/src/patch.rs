//! JSON Patch (RFC 6902) operations addressed by JSON Pointers (RFC 6901).
//!
//! Paths are kept tokenized: every lens op reasons about the *shape* of a
//! path (its first token, whether it carries an array index, ...), never about
//! its string form. The string form only exists at the serde boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{LensError, Result};

// ============================================================================
// Path tokens
// ============================================================================

/// One segment of a [`JsonPointer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathToken {
    Key(String),
    Index(usize),
}

impl PathToken {
    /// Classify a raw (already unescaped) pointer segment.
    ///
    /// Canonical decimal numbers become array indices, everything else is an
    /// object key.
    pub fn parse(raw: &str) -> Self {
        let canonical = !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && (raw == "0" || !raw.starts_with('0'));
        if canonical {
            if let Ok(index) = raw.parse::<usize>() {
                return PathToken::Index(index);
            }
        }
        PathToken::Key(raw.to_string())
    }

    /// True when the textual form of this token is `name`.
    pub fn is_named(&self, name: &str) -> bool {
        match self {
            PathToken::Key(key) => key == name,
            PathToken::Index(index) => index.to_string() == name,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathToken::Index(index) => Some(*index),
            PathToken::Key(_) => None,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathToken::Index(_))
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathToken::Key(key) => f.write_str(key),
            PathToken::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Names are classified like pointer segments, so `"0"` is an index.
impl From<&str> for PathToken {
    fn from(raw: &str) -> Self {
        PathToken::parse(raw)
    }
}

impl From<String> for PathToken {
    fn from(raw: String) -> Self {
        PathToken::parse(&raw)
    }
}

impl From<usize> for PathToken {
    fn from(index: usize) -> Self {
        PathToken::Index(index)
    }
}

// ============================================================================
// JSON Pointer
// ============================================================================

/// A root-relative location in a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer(Vec<PathToken>);

impl JsonPointer {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(tokens: Vec<PathToken>) -> Self {
        Self(tokens)
    }

    /// Parse the RFC 6901 string form (`""` is the root, otherwise `/a/0/b`).
    pub fn parse(pointer: &str) -> Result<Self> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(LensError::InvalidPointer {
                pointer: pointer.to_string(),
                reason: "must be empty or start with `/`".to_string(),
            });
        };

        let mut tokens = Vec::new();
        for segment in rest.split('/') {
            tokens.push(PathToken::parse(&unescape(pointer, segment)?));
        }
        Ok(Self(tokens))
    }

    pub fn tokens(&self) -> &[PathToken] {
        &self.0
    }

    pub fn into_tokens(self) -> Vec<PathToken> {
        self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&PathToken> {
        self.0.first()
    }

    /// True when the first token is `name`.
    pub fn starts_with_name(&self, name: &str) -> bool {
        self.first().is_some_and(|token| token.is_named(name))
    }

    /// The pointer without its first token (root stays root).
    pub fn tail(&self) -> JsonPointer {
        Self(self.0.iter().skip(1).cloned().collect())
    }

    pub fn parent(&self) -> Option<(JsonPointer, &PathToken)> {
        let (last, init) = self.0.split_last()?;
        Some((Self(init.to_vec()), last))
    }

    /// Append one token, returning the extended pointer.
    pub fn child(&self, token: impl Into<PathToken>) -> JsonPointer {
        let mut tokens = self.0.clone();
        tokens.push(token.into());
        Self(tokens)
    }

    /// Prefix this pointer with one token.
    pub fn prefixed(&self, token: impl Into<PathToken>) -> JsonPointer {
        let mut tokens = Vec::with_capacity(self.0.len() + 1);
        tokens.push(token.into());
        tokens.extend(self.0.iter().cloned());
        Self(tokens)
    }

    /// Insert a token at `position` (clamped to the end).
    pub fn inserted(&self, position: usize, token: impl Into<PathToken>) -> JsonPointer {
        let mut tokens = self.0.clone();
        tokens.insert(position.min(tokens.len()), token.into());
        Self(tokens)
    }

    /// Remove the token at `position`, if any.
    pub fn removed(&self, position: usize) -> JsonPointer {
        let mut tokens = self.0.clone();
        if position < tokens.len() {
            tokens.remove(position);
        }
        Self(tokens)
    }

    /// Position of the first array-index token.
    pub fn first_index_position(&self) -> Option<usize> {
        self.0.iter().position(PathToken::is_index)
    }
}

fn unescape(pointer: &str, segment: &str) -> Result<String> {
    if !segment.contains('~') {
        return Ok(segment.to_string());
    }
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            other => {
                return Err(LensError::InvalidPointer {
                    pointer: pointer.to_string(),
                    reason: format!("bad escape `~{}`", other.map(String::from).unwrap_or_default()),
                })
            }
        }
    }
    Ok(out)
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            f.write_str("/")?;
            match token {
                PathToken::Key(key) => f.write_str(&key.replace('~', "~0").replace('/', "~1"))?,
                PathToken::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Vec<PathToken>> for JsonPointer {
    fn from(tokens: Vec<PathToken>) -> Self {
        Self(tokens)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        JsonPointer::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Patch operations
// ============================================================================

/// A single RFC 6902 operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: JsonPointer, value: Value },
    Remove { path: JsonPointer },
    Replace { path: JsonPointer, value: Value },
    Move { from: JsonPointer, path: JsonPointer },
    Copy { from: JsonPointer, path: JsonPointer },
    Test { path: JsonPointer, value: Value },
}

/// An ordered list of operations. Order is significant.
pub type Patch = Vec<PatchOp>;

impl PatchOp {
    pub fn add(path: JsonPointer, value: Value) -> Self {
        PatchOp::Add { path, value }
    }

    pub fn replace(path: JsonPointer, value: Value) -> Self {
        PatchOp::Replace { path, value }
    }

    pub fn remove(path: JsonPointer) -> Self {
        PatchOp::Remove { path }
    }

    /// The `"op"` tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            PatchOp::Add { .. } => "add",
            PatchOp::Remove { .. } => "remove",
            PatchOp::Replace { .. } => "replace",
            PatchOp::Move { .. } => "move",
            PatchOp::Copy { .. } => "copy",
            PatchOp::Test { .. } => "test",
        }
    }

    /// The target location of the operation.
    pub fn path(&self) -> &JsonPointer {
        match self {
            PatchOp::Add { path, .. }
            | PatchOp::Remove { path }
            | PatchOp::Replace { path, .. }
            | PatchOp::Move { path, .. }
            | PatchOp::Copy { path, .. }
            | PatchOp::Test { path, .. } => path,
        }
    }

    /// Same operation, retargeted at `new_path`. `from` is left untouched.
    pub fn with_path(self, new_path: JsonPointer) -> Self {
        match self {
            PatchOp::Add { value, .. } => PatchOp::Add { path: new_path, value },
            PatchOp::Remove { .. } => PatchOp::Remove { path: new_path },
            PatchOp::Replace { value, .. } => PatchOp::Replace { path: new_path, value },
            PatchOp::Move { from, .. } => PatchOp::Move { from, path: new_path },
            PatchOp::Copy { from, .. } => PatchOp::Copy { from, path: new_path },
            PatchOp::Test { value, .. } => PatchOp::Test { path: new_path, value },
        }
    }

    /// `add` and `replace` are the value-carrying writes lens ops rewrite.
    pub fn is_write(&self) -> bool {
        matches!(self, PatchOp::Add { .. } | PatchOp::Replace { .. })
    }

    /// The written value of an `add`/`replace`.
    pub fn write_value(&self) -> Option<&Value> {
        match self {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Same write kind (`add` or `replace`) with a different path and value.
    ///
    /// Non-write operations are returned unchanged.
    pub fn rewrite(self, path: JsonPointer, value: Value) -> Self {
        match self {
            PatchOp::Add { .. } => PatchOp::Add { path, value },
            PatchOp::Replace { .. } => PatchOp::Replace { path, value },
            other => other,
        }
    }
}

pub fn parse_patch(json: &str) -> Result<Patch> {
    Ok(serde_json::from_str(json)?)
}
