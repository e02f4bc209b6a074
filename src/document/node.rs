// src/document/node.rs
// Typed tree node shared by decoded JSON sub-chunks and opaque binary spans.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// One node of a decoded document tree.
///
/// Objects are keyed by a `BTreeMap` so key order never depends on the source text.
/// Integers keep their integer identity (`Int`) and cover the full `i64` and `u64` ranges.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Object(BTreeMap<String, Node>),
    Array(Vec<Node>),
    Int(i128),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    /// Opaque binary span, never interpreted
    Bytes(Vec<u8>),
}

/// Discriminant of a [`Node`], used for type-mismatch reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Object,
    Array,
    Int,
    Float,
    Str,
    Bool,
    Null,
    Bytes,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::Bool => "bool",
            Self::Null => "null",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Node {
    /// Parse a JSON sub-chunk. Trailing space or NUL padding is accepted.
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Node> {
        let end = bytes
            .iter()
            .rposition(|&b| b != 0 && b != b' ')
            .map_or(0, |i| i + 1);
        let value: JsonValue = serde_json::from_slice(&bytes[..end])?;
        Ok(Node::from(value))
    }

    /// Parse JSON text
    pub fn from_json_str(text: &str) -> serde_json::Result<Node> {
        Self::from_json_slice(text.as_bytes())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Object(_) => NodeKind::Object,
            Self::Array(_) => NodeKind::Array,
            Self::Int(_) => NodeKind::Int,
            Self::Float(_) => NodeKind::Float,
            Self::Str(_) => NodeKind::Str,
            Self::Bool(_) => NodeKind::Bool,
            Self::Null => NodeKind::Null,
            Self::Bytes(_) => NodeKind::Bytes,
        }
    }

    /// Look up a key on an object node
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Numeric value of an `Int` or `Float` node
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => i64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Non-negative integer usable as an array index
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Int(i) => usize::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Display form capped at `max_chars` characters
    pub fn preview(&self, max_chars: usize) -> String {
        let full = self.to_string();
        if full.chars().count() <= max_chars {
            return full;
        }
        let mut cut: String = full.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}

impl From<JsonValue> for Node {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Node::Null,
            JsonValue::Bool(b) => Node::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Node::Int(i as i128)
                } else if let Some(u) = n.as_u64() {
                    Node::Int(u as i128)
                } else {
                    Node::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Node::Str(s),
            JsonValue::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            JsonValue::Object(map) => {
                Node::Object(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", JsonValue::String(key.clone()), value)?;
                }
                f.write_str("}")
            }
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Int(i) => write!(f, "{}", i),
            // Debug keeps the decimal point and the shortest round-trip digits
            Self::Float(v) => write!(f, "{:?}", v),
            Self::Str(s) => write!(f, "{}", JsonValue::String(s.clone())),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Null => f.write_str("null"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_stay_integers() {
        let node = Node::from_json_str(r#"{"a": 1, "b": 1.0, "c": 18446744073709551615, "d": -5}"#)
            .unwrap();
        assert_eq!(node.get("a"), Some(&Node::Int(1)));
        assert_eq!(node.get("b"), Some(&Node::Float(1.0)));
        assert_eq!(node.get("c"), Some(&Node::Int(u64::MAX as i128)));
        assert_eq!(node.get("d").and_then(Node::as_index), None);
    }

    #[test]
    fn test_padding_is_ignored() {
        let mut bytes = br#"{"BATCH_LENGTH":0}"#.to_vec();
        bytes.extend_from_slice(b"   \0\0");
        let node = Node::from_json_slice(&bytes).unwrap();
        assert_eq!(node.get("BATCH_LENGTH").and_then(Node::as_u64), Some(0));
    }

    #[test]
    fn test_display_is_compact_json() {
        let node = Node::from_json_str(r#"{"z": [1, 2.5, "x"], "a": null}"#).unwrap();
        assert_eq!(node.to_string(), r#"{"a":null,"z":[1,2.5,"x"]}"#);
        assert_eq!(Node::Float(3.0).to_string(), "3.0");
        assert_eq!(Node::Bytes(vec![0; 7]).to_string(), "<7 bytes>");
    }

    #[test]
    fn test_preview_truncates() {
        let node = Node::Str("abcdefghijklmnop".into());
        assert_eq!(node.preview(5), "\"abcd...");
    }
}
