//! Container box trees as emitted by `mp4dump --format json`.
//!
//! Every box is a JSON object with a `name`, usually a `size` and
//! `header_size`, an optional ordered `children` list, and any number of
//! box-specific scalar fields (`"timescale"`, `"sample count"`, …), which are
//! kept in [`BoxNode::fields`].
//!
//! Lookups go by box name and take the first match, never by position in the
//! `children` list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::VvizError;

/// One box of the dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxNode {
    /// Four-character box type (`"moof"`, `"mdat"`, …).
    #[serde(default)]
    pub name: String,
    /// Total box size in bytes, header included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BoxNode>,
    /// Box-specific fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl BoxNode {
    /// A bare box with a name and nothing else.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            size: None,
            header_size: None,
            children: Vec::new(),
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: BoxNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&BoxNode> {
        self.children.iter().find(|child| child.is(name))
    }

    /// An unsigned integer field.
    pub fn field_u64(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }

    /// First direct child named `name`, or an
    /// [`UnexpectedBoxLayout`](VvizError::UnexpectedBoxLayout) error naming
    /// `path/name`.
    pub(crate) fn require_child(&self, path: &str, name: &str) -> Result<&BoxNode, VvizError> {
        self.child(name).ok_or_else(|| VvizError::UnexpectedBoxLayout {
            path: path.to_string(),
            expected: format!("a `{name}` child box"),
        })
    }

    /// An unsigned integer field, or an
    /// [`UnexpectedBoxLayout`](VvizError::UnexpectedBoxLayout) error.
    pub(crate) fn require_u64(&self, path: &str, key: &str) -> Result<u64, VvizError> {
        self.field_u64(key).ok_or_else(|| VvizError::UnexpectedBoxLayout {
            path: path.to_string(),
            expected: format!("an unsigned integer field `{key}`"),
        })
    }

    /// The box size, or an
    /// [`UnexpectedBoxLayout`](VvizError::UnexpectedBoxLayout) error.
    pub(crate) fn require_size(&self, path: &str) -> Result<u64, VvizError> {
        self.size.ok_or_else(|| VvizError::UnexpectedBoxLayout {
            path: path.to_string(),
            expected: "a `size` field".to_string(),
        })
    }
}

/// Parse the top-level box list of a dump.
pub fn parse_box_list(text: &str) -> Result<Vec<BoxNode>, VvizError> {
    Ok(serde_json::from_str(text)?)
}
