//! Templates: reusable card kinds
//!
//! A [`Template`] pairs an opaque render handle with the configuration
//! contract of a card kind: its base configuration, its schema, its
//! editable options and, optionally, a [`ConfigLoader`] that supplies the
//! heavier parts on demand. Templates are registered once in a
//! [`TemplateRegistry`] and never mutated afterwards; cards refer to them by
//! id.
//!
//! # Example
//!
//! ```rust
//! use site_composer::template::{Template, TemplateRegistry};
//! use site_composer::schema::{Field, SchemaNode};
//!
//! let mut registry = TemplateRegistry::with_builtins();
//! registry
//!     .register(
//!         Template::new("quote")
//!             .with_title("Quote")
//!             .with_schema(SchemaNode::object([Field::optional("text", SchemaNode::string())])),
//!     )
//!     .unwrap();
//!
//! assert!(registry.contains("quote"));
//! assert!(registry.contains("wrap"));
//! ```

pub mod builtin;
mod registry;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card::CardArgs;
use crate::context::BuildContext;
use crate::reconcile::{reconcile, Reconciliation};
use crate::schema::{OptionDescriptor, SchemaNode};

pub use registry::{TemplateError, TemplateRegistry};

/// Error type loaders report; carried unchanged inside [`TemplateError::Load`]
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// Opaque rendering-component handle, never inspected
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderHandle(pub String);

impl RenderHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The lazily loaded part of a template
#[derive(Debug, Clone, Default)]
pub struct TemplateDefinition {
    pub schema: Option<SchemaNode>,
    pub options: Vec<OptionDescriptor>,
    /// Cards that showcase the template on its demo page
    pub demo_page: Vec<CardArgs>,
}

/// Supplies a template's definition and per-card defaults
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// Schema, options and demo cards; called at most once per registry entry
    async fn load_definition(&self, ctx: &BuildContext) -> Result<TemplateDefinition, LoadError>;

    /// Default user configuration for one new card
    ///
    /// Called for every card built without an explicit user configuration,
    /// so implementations may draw fresh media each time.
    async fn default_user_config(&self, _ctx: &BuildContext) -> Result<Option<Value>, LoadError> {
        Ok(None)
    }
}

/// A card kind
#[derive(Clone)]
pub struct Template {
    pub template_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Vec<String>,
    /// Offered to site authors in the card picker
    pub is_public: bool,
    /// Renders a whole page around its children
    pub is_page_card: bool,
    /// Exists to hold child cards
    pub is_container: bool,
    pub el: Option<RenderHandle>,
    /// Lowest-precedence configuration layer
    pub base_config: Value,
    pub schema: Option<SchemaNode>,
    pub options: Vec<OptionDescriptor>,
    pub loader: Option<Arc<dyn ConfigLoader>>,
}

impl Template {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            title: None,
            description: None,
            category: Vec::new(),
            is_public: false,
            is_page_card: false,
            is_container: false,
            el: None,
            base_config: Value::Object(Default::default()),
            schema: None,
            options: Vec::new(),
            loader: None,
        }
    }

    /// Template wrapping a bare render handle, used for inline cards
    pub fn inline(base_id: &str, el: RenderHandle) -> Self {
        Self::new(format!("{}-inline", base_id)).with_el(el)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.category = category.into_iter().map(Into::into).collect();
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn page_card(mut self) -> Self {
        self.is_page_card = true;
        self
    }

    pub fn container(mut self) -> Self {
        self.is_container = true;
        self
    }

    pub fn with_el(mut self, el: RenderHandle) -> Self {
        self.el = Some(el);
        self
    }

    pub fn with_base_config(mut self, config: Value) -> Self {
        self.base_config = config;
        self
    }

    pub fn with_schema(mut self, schema: SchemaNode) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_options(mut self, options: Vec<OptionDescriptor>) -> Self {
        self.options = options;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ConfigLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Load the definition, from the loader if there is one
    pub async fn load_definition(&self, ctx: &BuildContext) -> Result<TemplateDefinition, TemplateError> {
        match &self.loader {
            Some(loader) => loader
                .load_definition(ctx)
                .await
                .map_err(|source| TemplateError::Load {
                    template_id: self.template_id.clone(),
                    source,
                }),
            None => Ok(TemplateDefinition {
                schema: self.schema.clone(),
                options: self.options.clone(),
                demo_page: Vec::new(),
            }),
        }
    }

    /// Per-card default configuration, `None` without a loader
    pub async fn default_user_config(&self, ctx: &BuildContext) -> Result<Option<Value>, LoadError> {
        match &self.loader {
            Some(loader) => loader.default_user_config(ctx).await,
            None => Ok(None),
        }
    }
}

/// Picker entry for a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub template_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Vec<String>,
    pub is_public: bool,
}

impl Template {
    /// Picker entry; the title falls back to the id
    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            template_id: self.template_id.clone(),
            title: self.title.clone().unwrap_or_else(|| self.template_id.clone()),
            description: self.description.clone(),
            category: self.category.clone(),
            is_public: self.is_public,
        }
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category.iter().any(|c| c == category)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("template_id", &self.template_id)
            .field("title", &self.title)
            .field("category", &self.category)
            .field("is_public", &self.is_public)
            .field("is_page_card", &self.is_page_card)
            .field("is_container", &self.is_container)
            .field("el", &self.el)
            .field("has_loader", &self.loader.is_some())
            .finish_non_exhaustive()
    }
}

/// How a card request names its template
#[derive(Debug, Clone)]
pub enum TemplateRef {
    Named(String),
    Inline(Arc<Template>),
}

impl TemplateRef {
    pub fn id(&self) -> &str {
        match self {
            TemplateRef::Named(id) => id,
            TemplateRef::Inline(template) => &template.template_id,
        }
    }
}

impl From<&str> for TemplateRef {
    fn from(id: &str) -> Self {
        TemplateRef::Named(id.to_string())
    }
}

impl From<String> for TemplateRef {
    fn from(id: String) -> Self {
        TemplateRef::Named(id)
    }
}

impl From<Template> for TemplateRef {
    fn from(template: Template) -> Self {
        TemplateRef::Inline(Arc::new(template))
    }
}

/// A template together with its loaded definition
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub template: Arc<Template>,
    pub definition: TemplateDefinition,
}

impl ResolvedTemplate {
    pub fn template_id(&self) -> &str {
        &self.template.template_id
    }

    /// Cross-check options against the schema, `None` without a schema
    pub fn reconcile(&self) -> Option<Reconciliation> {
        self.definition
            .schema
            .as_ref()
            .map(|schema| reconcile(&self.definition.options, schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, InputKind};

    struct FailingLoader;

    #[async_trait]
    impl ConfigLoader for FailingLoader {
        async fn load_definition(&self, _ctx: &BuildContext) -> Result<TemplateDefinition, LoadError> {
            Err("backend offline".into())
        }
    }

    #[test]
    fn test_inline_template_id() {
        let template = Template::inline("area", RenderHandle::new("CardSpacer"));
        assert_eq!(template.template_id, "area-inline");
        assert_eq!(template.el.as_ref().map(RenderHandle::as_str), Some("CardSpacer"));
    }

    #[test]
    fn test_template_ref_id() {
        assert_eq!(TemplateRef::from("hero").id(), "hero");
        assert_eq!(TemplateRef::from(Template::new("x")).id(), "x");
    }

    #[tokio::test]
    async fn test_resident_definition() {
        let template = Template::new("quote")
            .with_schema(SchemaNode::object([Field::optional("text", SchemaNode::string())]))
            .with_options(vec![OptionDescriptor::new("text", InputKind::Textarea)]);
        let definition = template.load_definition(&BuildContext::empty()).await.unwrap();
        assert_eq!(definition.options.len(), 1);
        assert!(definition.schema.is_some());
    }

    #[tokio::test]
    async fn test_loader_error_keeps_source() {
        let template = Template::new("broken").with_loader(Arc::new(FailingLoader));
        let err = template.load_definition(&BuildContext::empty()).await.unwrap_err();
        match err {
            TemplateError::Load { template_id, source } => {
                assert_eq!(template_id, "broken");
                assert_eq!(source.to_string(), "backend offline");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolved_reconcile() {
        let resolved = ResolvedTemplate {
            template: Arc::new(Template::new("t")),
            definition: TemplateDefinition {
                schema: Some(SchemaNode::object([Field::optional("lines", SchemaNode::number())])),
                options: vec![],
                demo_page: vec![],
            },
        };
        let result = resolved.reconcile().unwrap();
        assert_eq!(result.unused_schema.keys().collect::<Vec<_>>(), vec!["lines"]);
    }
}
