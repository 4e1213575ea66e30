//! Reconciliation of option trees against schemas
//!
//! Templates describe their configuration twice: once as a validated
//! [`SchemaNode`] and once as a hand-authored [`OptionDescriptor`] tree that
//! drives the editor. This module walks both and reports where they drift
//! apart:
//!
//! - schema paths no option can edit ([`Reconciliation::unused_schema`])
//! - options pointing at paths the schema does not have
//!   ([`Reconciliation::hidden_options`])
//!
//! Drift is returned as data. Deciding whether it is fatal is left to the
//! caller (a test, or the `lint` command).

mod simple_tree;

use std::collections::HashSet;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::schema::{join_path, OptionDescriptor, SchemaKind, SchemaNode, ARRAY_INDEX, PATH_SEPARATOR};

pub use simple_tree::{schema_to_simple_tree, SimpleTree};

/// Ordered record of dot-path to kind label
///
/// Keeps insertion order so output is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotRecord {
    entries: Vec<(String, String)>,
}

impl DotRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; a repeated path keeps its first position and takes the new label
    pub fn insert(&mut self, path: impl Into<String>, label: impl Into<String>) {
        let path = path.into();
        let label = label.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some(entry) => entry.1 = label,
            None => self.entries.push((path, label)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, label)| label.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, l)| (p.as_str(), l.as_str()))
    }
}

impl<P: Into<String>, L: Into<String>> FromIterator<(P, L)> for DotRecord {
    fn from_iter<I: IntoIterator<Item = (P, L)>>(iter: I) -> Self {
        let mut record = DotRecord::new();
        for (path, label) in iter {
            record.insert(path, label);
        }
        record
    }
}

impl Serialize for DotRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, label) in &self.entries {
            map.serialize_entry(path, label)?;
        }
        map.end()
    }
}

impl fmt::Display for DotRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (path, label) in &self.entries {
            writeln!(f, "{}: {}", path, label)?;
        }
        Ok(())
    }
}

/// Flatten a schema into dot-paths
///
/// Every object field is emitted, containers included. Arrays emit their own
/// path and, when their element is an object, the element's fields under
/// `<path>.0`.
pub fn dot_record(schema: &SchemaNode) -> DotRecord {
    let mut record = DotRecord::new();
    collect_schema_paths(schema, "", &mut record);
    record
}

fn collect_schema_paths(node: &SchemaNode, prefix: &str, record: &mut DotRecord) {
    match &node.kind {
        SchemaKind::Object(fields) => {
            for field in fields {
                let path = join_path(prefix, &field.name);
                record.insert(path.clone(), field.node.label());
                collect_schema_paths(&field.node, &path, record);
            }
        }
        SchemaKind::Array(element) => {
            if matches!(element.kind, SchemaKind::Object(_) | SchemaKind::Array(_)) {
                let element_path = join_path(prefix, ARRAY_INDEX);
                if let SchemaKind::Array(_) = element.kind {
                    record.insert(element_path.clone(), element.label());
                }
                collect_schema_paths(element, &element_path, record);
            }
        }
        SchemaKind::Enum(_) | SchemaKind::Primitive(_) => {}
    }
}

/// A fully qualified option path and the descriptor it came from
#[derive(Debug, Clone, PartialEq)]
pub struct OptionPath<'a> {
    pub path: String,
    pub option: &'a OptionDescriptor,
}

/// Flatten an option tree into fully qualified paths, in tree order
///
/// Groups contribute no path of their own. Lists contribute their path and
/// scope their children under `<path>.0`.
pub fn flatten_options(options: &[OptionDescriptor]) -> Vec<OptionPath<'_>> {
    let mut out = Vec::new();
    collect_option_paths(options, "", &mut out);
    out
}

fn collect_option_paths<'a>(options: &'a [OptionDescriptor], scope: &str, out: &mut Vec<OptionPath<'a>>) {
    for option in options {
        if option.is_group() {
            collect_option_paths(&option.children, scope, out);
            continue;
        }

        let path = join_path(scope, &option.key);
        let child_scope = if option.is_list() {
            join_path(&path, ARRAY_INDEX)
        } else {
            path.clone()
        };
        out.push(OptionPath { path, option });
        collect_option_paths(&option.children, &child_scope, out);
    }
}

/// `true` when `path` lies strictly below `ancestor`
fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with(PATH_SEPARATOR)
}

/// Outcome of matching an option tree against a schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    /// Every schema path with its kind label
    pub dot_record: DotRecord,
    /// Schema paths no option can reach
    pub unused_schema: DotRecord,
    /// Option paths the schema does not define
    pub hidden_options: Vec<String>,
}

impl Reconciliation {
    /// No drift in either direction
    pub fn is_clean(&self) -> bool {
        self.unused_schema.is_empty() && self.hidden_options.is_empty()
    }

    /// Drift as a flat warning list, unused schema first
    pub fn drift(&self) -> Vec<Drift> {
        let unused = self.unused_schema.iter().map(|(path, label)| Drift {
            category: DriftCategory::UnusedSchema,
            path: path.to_string(),
            detail: label.to_string(),
        });
        let hidden = self.hidden_options.iter().map(|path| Drift {
            category: DriftCategory::HiddenOption,
            path: path.clone(),
            detail: String::new(),
        });
        unused.chain(hidden).collect()
    }
}

/// Match an option tree against a schema
///
/// Only leaf schema paths (entries with nothing beneath them in the dot
/// record) can be unused. A leaf path counts as covered when an option
/// addresses it directly, or when a leaf option addresses one of its
/// ancestors (a media input covers `media.url`). Both directions are
/// reported independently; a field that was renamed and moved at once shows
/// up in both lists.
pub fn reconcile(options: &[OptionDescriptor], schema: &SchemaNode) -> Reconciliation {
    let dot_record = dot_record(schema);
    let option_paths = flatten_options(options);

    let all: HashSet<&str> = option_paths.iter().map(|o| o.path.as_str()).collect();
    let leaves: Vec<&str> = option_paths
        .iter()
        .filter(|o| o.option.is_leaf())
        .map(|o| o.path.as_str())
        .collect();

    let unused_schema = dot_record
        .iter()
        .filter(|(path, _)| !dot_record.keys().any(|other| is_descendant(other, path)))
        .filter(|(path, _)| {
            let direct = all.contains(path);
            let under_leaf = leaves.iter().any(|leaf| is_descendant(path, leaf));
            !(direct || under_leaf)
        })
        .collect();

    let mut hidden_options: Vec<String> = Vec::new();
    for option in &option_paths {
        if !dot_record.contains(&option.path) && !hidden_options.contains(&option.path) {
            hidden_options.push(option.path.clone());
        }
    }

    Reconciliation {
        dot_record,
        unused_schema,
        hidden_options,
    }
}

/// Direction of a mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftCategory {
    UnusedSchema,
    HiddenOption,
}

impl fmt::Display for DriftCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftCategory::UnusedSchema => write!(f, "unused-schema"),
            DriftCategory::HiddenOption => write!(f, "hidden-option"),
        }
    }
}

/// A single mismatch between options and schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub category: DriftCategory,
    pub path: String,
    /// Kind label for unused schema paths, empty for hidden options
    pub detail: String,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            DriftCategory::UnusedSchema => {
                write!(f, "schema path '{}' ({}) has no option", self.path, self.detail)
            }
            DriftCategory::HiddenOption => {
                write!(f, "option '{}' has no schema path", self.path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, InputKind};

    fn text(key: &str) -> OptionDescriptor {
        OptionDescriptor::new(key, InputKind::Text)
    }

    #[test]
    fn test_dot_record_emits_containers() {
        let schema = SchemaNode::object([
            Field::optional(
                "media",
                SchemaNode::object([Field::optional("url", SchemaNode::string())]),
            ),
            Field::optional("tags", SchemaNode::array(SchemaNode::string())),
        ]);
        let record = dot_record(&schema);
        let keys: Vec<_> = record.keys().collect();
        assert_eq!(keys, vec!["media", "media.url", "tags"]);
        assert_eq!(record.get("tags"), Some("array"));
    }

    #[test]
    fn test_dot_record_nested_arrays() {
        let schema = SchemaNode::object([Field::optional(
            "grid",
            SchemaNode::array(SchemaNode::array(SchemaNode::object([Field::optional(
                "cell",
                SchemaNode::string(),
            )]))),
        )]);
        let keys: Vec<_> = dot_record(&schema).keys().map(str::to_string).collect();
        assert_eq!(keys, vec!["grid", "grid.0", "grid.0.0.cell"]);
    }

    #[test]
    fn test_dot_record_insert_keeps_position() {
        let mut record = DotRecord::new();
        record.insert("a", "string");
        record.insert("b", "number");
        record.insert("a", "boolean");
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some("boolean"));
    }

    #[test]
    fn test_flatten_group_and_list() {
        let options = vec![
            text("text"),
            OptionDescriptor::list("sub", vec![text("subText"), text("author.name")]),
            OptionDescriptor::group("grp", vec![text("groupInput")]),
        ];
        let paths: Vec<_> = flatten_options(&options).into_iter().map(|o| o.path).collect();
        assert_eq!(
            paths,
            vec!["text", "sub", "sub.0.subText", "sub.0.author.name", "groupInput"]
        );
    }

    #[test]
    fn test_group_inside_list_uses_list_scope() {
        let options = vec![OptionDescriptor::list(
            "items",
            vec![OptionDescriptor::group("layout", vec![text("title")])],
        )];
        let paths: Vec<_> = flatten_options(&options).into_iter().map(|o| o.path).collect();
        assert_eq!(paths, vec!["items", "items.0.title"]);
    }

    #[test]
    fn test_leaf_option_covers_subtree() {
        let schema = SchemaNode::object([Field::optional(
            "media",
            SchemaNode::object([
                Field::optional("url", SchemaNode::string()),
                Field::optional(
                    "modify",
                    SchemaNode::object([Field::optional("flip", SchemaNode::boolean())]),
                ),
            ]),
        )]);
        let result = reconcile(&[OptionDescriptor::new("media", InputKind::Media)], &schema);
        assert!(result.is_clean(), "{:?}", result);
    }

    #[test]
    fn test_only_leaf_schema_paths_are_unused() {
        let schema = SchemaNode::object([
            Field::optional("title", SchemaNode::string()),
            Field::optional(
                "action",
                SchemaNode::object([Field::optional("href", SchemaNode::string())]),
            ),
        ]);
        let result = reconcile(&[text("title")], &schema);
        let unused: Vec<_> = result.unused_schema.keys().collect();
        assert_eq!(unused, vec!["action.href"]);
    }

    #[test]
    fn test_empty_containers_count_as_leaves() {
        let schema = SchemaNode::object([
            Field::optional("title", SchemaNode::string()),
            Field::optional("meta", SchemaNode::object(Vec::<Field>::new())),
            Field::optional("tags", SchemaNode::array(SchemaNode::string())),
        ]);
        let result = reconcile(&[text("title")], &schema);
        assert_eq!(result.unused_schema.keys().collect::<Vec<_>>(), vec!["meta", "tags"]);
        assert_eq!(result.unused_schema.get("meta"), Some("object"));
    }

    #[test]
    fn test_container_with_partial_coverage() {
        let schema = SchemaNode::object([Field::optional(
            "action",
            SchemaNode::object([
                Field::optional("href", SchemaNode::string()),
                Field::optional("label", SchemaNode::string()),
            ]),
        )]);
        let result = reconcile(&[text("action.href")], &schema);
        assert_eq!(result.unused_schema.keys().collect::<Vec<_>>(), vec!["action.label"]);
    }

    #[test]
    fn test_hidden_options_are_deduplicated() {
        let schema = SchemaNode::object([Field::optional("title", SchemaNode::string())]);
        let result = reconcile(&[text("gone"), text("gone"), text("title")], &schema);
        assert_eq!(result.hidden_options, vec!["gone".to_string()]);
    }

    #[test]
    fn test_is_descendant() {
        assert!(is_descendant("media.url", "media"));
        assert!(!is_descendant("mediaUrl", "media"));
        assert!(!is_descendant("media", "media"));
    }

    #[test]
    fn test_drift_display() {
        let schema = SchemaNode::object([Field::optional("lines", SchemaNode::number())]);
        let result = reconcile(&[text("old")], &schema);
        let messages: Vec<_> = result.drift().iter().map(|d| d.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "schema path 'lines' (number) has no option".to_string(),
                "option 'old' has no schema path".to_string(),
            ]
        );
    }
}
