//! Nested, documentation-oriented view of a schema

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::schema::{SchemaKind, SchemaNode};

/// Prefix of the sibling key marking a container field
pub const SELF_MARKER_PREFIX: char = '_';

/// A schema rendered as nested labels
///
/// Container fields get a sibling `_<name>` entry carrying their own label,
/// so "this field is itself an object" stays visible next to its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleTree {
    Label(String),
    Node(Vec<(String, SimpleTree)>),
    List(Vec<SimpleTree>),
}

impl SimpleTree {
    /// Child entry of a node by key
    pub fn get(&self, key: &str) -> Option<&SimpleTree> {
        match self {
            SimpleTree::Node(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            SimpleTree::Label(label) => Some(label),
            _ => None,
        }
    }

    /// Keys of a node in order
    pub fn keys(&self) -> Vec<&str> {
        match self {
            SimpleTree::Node(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

impl Serialize for SimpleTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SimpleTree::Label(label) => serializer.serialize_str(label),
            SimpleTree::Node(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            SimpleTree::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// Convert a schema into a [`SimpleTree`]
pub fn schema_to_simple_tree(schema: &SchemaNode) -> SimpleTree {
    match &schema.kind {
        SchemaKind::Object(fields) => {
            let mut entries = Vec::with_capacity(fields.len());
            for field in fields {
                if field.node.is_container() {
                    entries.push((
                        format!("{}{}", SELF_MARKER_PREFIX, field.name),
                        SimpleTree::Label(field.node.label()),
                    ));
                }
                entries.push((field.name.clone(), schema_to_simple_tree(&field.node)));
            }
            SimpleTree::Node(entries)
        }
        SchemaKind::Array(element) => SimpleTree::List(vec![schema_to_simple_tree(element)]),
        SchemaKind::Enum(_) | SchemaKind::Primitive(_) => SimpleTree::Label(schema.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    #[test]
    fn test_markers_sit_before_containers() {
        let schema = SchemaNode::object([
            Field::optional("title", SchemaNode::string().describe("Headline")),
            Field::optional(
                "details",
                SchemaNode::array(SchemaNode::object([Field::optional("name", SchemaNode::string())]))
                    .describe("List of details"),
            ),
        ]);
        let tree = schema_to_simple_tree(&schema);
        assert_eq!(tree.keys(), vec!["title", "_details", "details"]);
        assert_eq!(
            tree.get("_details").and_then(SimpleTree::as_label),
            Some("array, List of details")
        );
        assert_eq!(
            tree.get("title").and_then(SimpleTree::as_label),
            Some("string, Headline")
        );
    }

    #[test]
    fn test_array_of_primitives() {
        let schema = SchemaNode::object([Field::optional("tags", SchemaNode::array(SchemaNode::string()))]);
        let tree = schema_to_simple_tree(&schema);
        assert_eq!(
            tree.get("tags"),
            Some(&SimpleTree::List(vec![SimpleTree::Label("string".to_string())]))
        );
    }

    #[test]
    fn test_serializes_in_order() {
        let schema = SchemaNode::object([
            Field::optional("zeta", SchemaNode::string()),
            Field::optional(
                "alpha",
                SchemaNode::object([Field::optional("flip", SchemaNode::boolean())]),
            ),
        ]);
        let json = serde_json::to_string(&schema_to_simple_tree(&schema)).unwrap();
        assert_eq!(
            json,
            r#"{"zeta":"string","_alpha":"object","alpha":{"flip":"boolean"}}"#
        );
    }
}
