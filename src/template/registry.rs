//! Template registry for storing and resolving templates

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;

use super::{builtin, LoadError, ResolvedTemplate, Template, TemplateRef, TemplateSummary};
use crate::context::BuildContext;

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not found in registry
    #[error("template not found: {template_id}")]
    NotFound { template_id: String },

    /// Duplicate template registration
    #[error("duplicate template definition: {template_id}")]
    Duplicate { template_id: String },

    /// The template's loader failed
    #[error("failed to load template {template_id}: {source}")]
    Load {
        template_id: String,
        #[source]
        source: LoadError,
    },
}

#[derive(Debug)]
struct Entry {
    template: Arc<Template>,
    resolved: OnceCell<Arc<ResolvedTemplate>>,
}

impl Entry {
    fn new(template: Template) -> Self {
        Self {
            template: Arc::new(template),
            resolved: OnceCell::new(),
        }
    }
}

/// Registry of templates keyed by id
///
/// Definitions are loaded on first resolution and cached for the lifetime
/// of the registry. Concurrent first resolutions of the same id share one
/// load; a failed load is not cached.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    entries: HashMap<String, Entry>,
    /// Registration order
    order: Vec<String>,
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the structural templates `wrap`, `area` and `hero`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for template in builtin::templates() {
            registry.insert(template);
        }
        registry
    }

    /// Register a template, rejecting duplicate ids
    pub fn register(&mut self, template: Template) -> Result<(), TemplateError> {
        if self.entries.contains_key(&template.template_id) {
            return Err(TemplateError::Duplicate {
                template_id: template.template_id,
            });
        }
        self.insert(template);
        Ok(())
    }

    /// Register a template, replacing any existing one with the same id
    ///
    /// The replaced template keeps its position in [`ids`](Self::ids).
    pub fn insert(&mut self, template: Template) {
        let id = template.template_id.clone();
        if self.entries.insert(id.clone(), Entry::new(template)).is_none() {
            self.order.push(id);
        }
    }

    /// Get a template by id
    pub fn get(&self, template_id: &str) -> Option<&Arc<Template>> {
        self.entries.get(template_id).map(|e| &e.template)
    }

    /// Check if a template exists
    pub fn contains(&self, template_id: &str) -> bool {
        self.entries.contains_key(template_id)
    }

    /// All template ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Resolve a template id, loading its definition on first use
    pub async fn resolve(
        &self,
        template_id: &str,
        ctx: &BuildContext,
    ) -> Result<Arc<ResolvedTemplate>, TemplateError> {
        let entry = self
            .entries
            .get(template_id)
            .ok_or_else(|| TemplateError::NotFound {
                template_id: template_id.to_string(),
            })?;

        if let Some(resolved) = entry.resolved.get() {
            tracing::trace!(template_id, "template cache hit");
            return Ok(resolved.clone());
        }

        let resolved = entry
            .resolved
            .get_or_try_init(|| async {
                tracing::debug!(template_id, "loading template definition");
                let definition = entry.template.load_definition(ctx).await?;
                Ok::<_, TemplateError>(Arc::new(ResolvedTemplate {
                    template: entry.template.clone(),
                    definition,
                }))
            })
            .await?;
        Ok(resolved.clone())
    }

    /// Resolve a named or inline reference
    ///
    /// Inline templates are not registered, so their definition is loaded
    /// on every call.
    pub async fn resolve_ref(
        &self,
        template_ref: &TemplateRef,
        ctx: &BuildContext,
    ) -> Result<Arc<ResolvedTemplate>, TemplateError> {
        match template_ref {
            TemplateRef::Named(id) => self.resolve(id, ctx).await,
            TemplateRef::Inline(template) => {
                let definition = template.load_definition(ctx).await?;
                Ok(Arc::new(ResolvedTemplate {
                    template: template.clone(),
                    definition,
                }))
            }
        }
    }

    /// Templates offered to site authors, in registration order
    pub fn public_templates(&self) -> Vec<&Arc<Template>> {
        self.order
            .iter()
            .filter_map(|id| self.get(id))
            .filter(|t| t.is_public)
            .collect()
    }

    /// Picker entries in registration order, optionally limited to one category
    pub fn catalog(&self, category: Option<&str>) -> Vec<TemplateSummary> {
        self.order
            .iter()
            .filter_map(|id| self.get(id))
            .filter(|t| category.map_or(true, |c| t.in_category(c)))
            .map(|t| t.summary())
            .collect()
    }
}
