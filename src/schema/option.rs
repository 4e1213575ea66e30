//! Editable-option descriptors
//!
//! Options describe the editing surface of a template: which configuration
//! paths an author can change and with which input. Keys are dot-paths
//! relative to the enclosing scope.
//!
//! Two container kinds exist:
//! - [`InputKind::Group`] is presentational only; its children use their keys
//!   as-is in the parent's scope.
//! - [`InputKind::List`] edits an array; its children are addressed relative to
//!   the representative element `<key>.0`.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Input used to edit an option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputKind {
    Text,
    Textarea,
    Number,
    Toggle,
    Select,
    Color,
    Media,
    Icon,
    Actions,
    /// Layout wrapper, adds no path segment
    Group,
    /// Array editor, children are relative to element `0`
    List,
    /// Any input not known to the engine
    Other(String),
}

impl InputKind {
    pub fn as_str(&self) -> &str {
        match self {
            InputKind::Text => "text",
            InputKind::Textarea => "textarea",
            InputKind::Number => "number",
            InputKind::Toggle => "toggle",
            InputKind::Select => "select",
            InputKind::Color => "color",
            InputKind::Media => "media",
            InputKind::Icon => "icon",
            InputKind::Actions => "actions",
            InputKind::Group => "group",
            InputKind::List => "list",
            InputKind::Other(name) => name,
        }
    }
}

impl From<String> for InputKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "text" => InputKind::Text,
            "textarea" => InputKind::Textarea,
            "number" => InputKind::Number,
            "toggle" => InputKind::Toggle,
            "select" => InputKind::Select,
            "color" => InputKind::Color,
            "media" => InputKind::Media,
            "icon" => InputKind::Icon,
            "actions" => InputKind::Actions,
            "group" => InputKind::Group,
            "list" => InputKind::List,
            _ => InputKind::Other(name),
        }
    }
}

impl From<&str> for InputKind {
    fn from(name: &str) -> Self {
        InputKind::from(name.to_string())
    }
}

impl From<InputKind> for String {
    fn from(kind: InputKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One editable field, or a container of them
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDescriptor {
    /// Dot-path relative to the parent scope
    pub key: String,
    pub input: InputKind,
    pub label: Option<String>,
    pub children: Vec<OptionDescriptor>,
    /// Byte range of the key in the manifest it was loaded from
    pub span: Option<Range<usize>>,
}

impl OptionDescriptor {
    pub fn new(key: impl Into<String>, input: impl Into<InputKind>) -> Self {
        Self {
            key: key.into(),
            input: input.into(),
            label: None,
            children: Vec::new(),
            span: None,
        }
    }

    /// Presentational group of options
    pub fn group(key: impl Into<String>, children: Vec<OptionDescriptor>) -> Self {
        Self::new(key, InputKind::Group).with_children(children)
    }

    /// Array editor whose children describe one element
    pub fn list(key: impl Into<String>, children: Vec<OptionDescriptor>) -> Self {
        Self::new(key, InputKind::List).with_children(children)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_children(mut self, children: Vec<OptionDescriptor>) -> Self {
        self.children = children;
        self
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_group(&self) -> bool {
        self.input == InputKind::Group
    }

    pub fn is_list(&self) -> bool {
        self.input == InputKind::List
    }

    /// Leaf options address a single position and cover everything below it
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && !self.is_group()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_from_str() {
        assert_eq!(InputKind::from("list"), InputKind::List);
        assert_eq!(InputKind::from("group"), InputKind::Group);
        assert_eq!(
            InputKind::from("fancySlider"),
            InputKind::Other("fancySlider".to_string())
        );
        assert_eq!(InputKind::from("fancySlider").to_string(), "fancySlider");
    }

    #[test]
    fn test_leaf_detection() {
        assert!(OptionDescriptor::new("title", InputKind::Text).is_leaf());
        assert!(OptionDescriptor::new("media", InputKind::Media).is_leaf());
        assert!(!OptionDescriptor::group("grp", vec![]).is_leaf());
        let list = OptionDescriptor::list("items", vec![OptionDescriptor::new("title", "text")]);
        assert!(!list.is_leaf());
        assert!(OptionDescriptor::list("tags", vec![]).is_leaf());
    }

    #[test]
    fn test_builder() {
        let opt = OptionDescriptor::new("title", "textarea")
            .with_label("Title")
            .with_span(3..8);
        assert_eq!(opt.label.as_deref(), Some("Title"));
        assert_eq!(opt.span, Some(3..8));
        assert_eq!(opt.input, InputKind::Textarea);
    }
}
