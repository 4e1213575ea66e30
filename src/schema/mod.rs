//! Structural descriptors for card configuration
//!
//! A [`SchemaNode`] describes the shape of a template's configuration payload:
//! objects with ordered fields, arrays with a single element descriptor,
//! enumerations of literal values and primitives. It is the data contract a
//! card's `user_config` is validated against.
//!
//! The editable surface for the same payload is described separately by
//! [`OptionDescriptor`] trees. The two are cross-checked by
//! [`crate::reconcile`].
//!
//! # Example
//!
//! ```rust
//! use site_composer::schema::{Field, SchemaNode};
//!
//! let schema = SchemaNode::object([
//!     Field::optional("title", SchemaNode::string().describe("Primary headline")),
//!     Field::optional(
//!         "items",
//!         SchemaNode::array(SchemaNode::object([Field::optional("title", SchemaNode::string())])),
//!     ),
//! ]);
//!
//! assert_eq!(schema.field("title").map(|f| f.node.label()), Some("string, Primary headline".to_string()));
//! ```

pub mod option;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use option::{InputKind, OptionDescriptor};

/// Path segment standing in for "any element" of an array
pub const ARRAY_INDEX: &str = "0";

/// Separator between dot-path segments
pub const PATH_SEPARATOR: char = '.';

/// Join two dot-path fragments, skipping empty ones
pub fn join_path(prefix: &str, key: &str) -> String {
    match (prefix.is_empty(), key.is_empty()) {
        (true, _) => key.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{}{}{}", prefix, PATH_SEPARATOR, key),
    }
}

/// Kind of a primitive leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    /// Anything the validation layer cannot describe (functions, custom checks)
    Unknown,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Unknown => "unknown",
        }
    }
}

/// The structural part of a schema node
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Object(Vec<Field>),
    Array(Box<SchemaNode>),
    Enum(Vec<Value>),
    Primitive(PrimitiveKind),
}

/// A node in a schema tree, optionally carrying a human-readable hint
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub description: Option<String>,
}

/// A named member of an object node
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub node: SchemaNode,
    pub required: bool,
}

impl Field {
    pub fn required(name: impl Into<String>, node: SchemaNode) -> Self {
        Self {
            name: name.into(),
            node,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, node: SchemaNode) -> Self {
        Self {
            name: name.into(),
            node,
            required: false,
        }
    }
}

impl SchemaNode {
    fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    /// Object node with fields in the given order
    pub fn object(fields: impl IntoIterator<Item = Field>) -> Self {
        Self::new(SchemaKind::Object(fields.into_iter().collect()))
    }

    /// Array node whose elements all match `element`
    pub fn array(element: SchemaNode) -> Self {
        Self::new(SchemaKind::Array(Box::new(element)))
    }

    /// Enumeration of literal values
    pub fn enumeration(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::new(SchemaKind::Enum(values.into_iter().map(Into::into).collect()))
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(SchemaKind::Primitive(kind))
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn number() -> Self {
        Self::primitive(PrimitiveKind::Number)
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean)
    }

    pub fn unknown() -> Self {
        Self::primitive(PrimitiveKind::Unknown)
    }

    /// Attach a description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up a direct field of an object node
    pub fn field(&self, name: &str) -> Option<&Field> {
        match &self.kind {
            SchemaKind::Object(fields) => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    /// Fields of an object node, empty for every other kind
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            SchemaKind::Object(fields) => fields,
            _ => &[],
        }
    }

    /// Element descriptor of an array node
    pub fn element(&self) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, SchemaKind::Object(_) | SchemaKind::Array(_))
    }

    /// Kind name without the description
    ///
    /// Enumerations report the common kind of their literals, or `enum`
    /// when they mix kinds.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            SchemaKind::Object(_) => "object",
            SchemaKind::Array(_) => "array",
            SchemaKind::Primitive(p) => p.as_str(),
            SchemaKind::Enum(values) => {
                if !values.is_empty() && values.iter().all(Value::is_string) {
                    "string"
                } else if !values.is_empty() && values.iter().all(Value::is_number) {
                    "number"
                } else if !values.is_empty() && values.iter().all(Value::is_boolean) {
                    "boolean"
                } else {
                    "enum"
                }
            }
        }
    }

    /// Kind name followed by the description, if any
    pub fn label(&self) -> String {
        match &self.description {
            Some(d) => format!("{}, {}", self.kind_name(), d),
            None => self.kind_name().to_string(),
        }
    }

    /// Resolve a dot-path (using `0` for array elements) to a node
    pub fn at_path(&self, path: &str) -> Option<&SchemaNode> {
        if path.is_empty() {
            return Some(self);
        }
        let mut node = self;
        for segment in path.split(PATH_SEPARATOR) {
            node = match &node.kind {
                SchemaKind::Object(fields) => &fields.iter().find(|f| f.name == segment)?.node,
                SchemaKind::Array(element) if segment == ARRAY_INDEX => element,
                _ => return None,
            };
        }
        Some(node)
    }
}
