//! Site Composer - card composition and option/schema reconciliation
//!
//! Pages are trees of configurable cards, each bound to a reusable template.
//! This library resolves templates, layers configuration, builds card trees
//! and checks that each template's editable options stay in step with its
//! configuration schema.
//!
//! # Example
//!
//! ```rust
//! use site_composer::{build_site, Manifest};
//!
//! let manifest = Manifest::from_str(r#"
//! [[pages]]
//! slug = "_home"
//! cards = [{ template = "hero", user_config = { heading = "Welcome" } }]
//! "#).unwrap();
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let site = runtime.block_on(build_site(&manifest)).unwrap();
//! assert_eq!(site.pages[0].cards[0].user_config["heading"], "Welcome");
//! ```

pub mod card;
pub mod config;
pub mod context;
pub mod error;
pub mod manifest;
pub mod reconcile;
pub mod schema;
pub mod site;
pub mod template;

pub use card::{Card, CardArgs, CardFactory, RegionId};
pub use config::ComposerConfig;
pub use context::{BuildContext, MediaProvider, StockMedia};
pub use error::{drift_report, CompositionError};
pub use manifest::{Manifest, ManifestError};
pub use reconcile::{reconcile, schema_to_simple_tree, Reconciliation};
pub use schema::{OptionDescriptor, SchemaNode};
pub use site::{SiteConfig, Theme};
pub use template::{Template, TemplateError, TemplateRef, TemplateRegistry};

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur in the manifest pipeline
#[derive(Debug, Error)]
pub enum ComposerError {
    /// Error while loading the manifest
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Error while resolving a template
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Error while building cards
    #[error("composition error: {0}")]
    Composition(#[from] CompositionError),
}

/// Drift check result for one manifest template
#[derive(Debug, Clone)]
pub struct TemplateLint {
    pub template_id: String,
    pub reconciliation: Reconciliation,
    /// Rendered ariadne report, empty when clean
    pub report: String,
}

impl TemplateLint {
    pub fn is_clean(&self) -> bool {
        self.reconciliation.is_clean()
    }
}

/// Reconcile every manifest template that declares a schema
///
/// `source` and `filename` are used to point reports at the manifest text.
/// With `public_only`, templates not offered to site authors are skipped.
pub async fn lint_manifest(
    manifest: &Manifest,
    source: &str,
    filename: &str,
    public_only: bool,
) -> Result<Vec<TemplateLint>, ComposerError> {
    let registry = manifest.registry();
    let ctx = manifest.context();

    let mut lints = Vec::new();
    for entry in &manifest.templates {
        let template = &entry.template;
        if public_only && !template.is_public {
            continue;
        }
        let resolved = registry.resolve(&template.template_id, &ctx).await?;
        let Some(reconciliation) = resolved.reconcile() else {
            tracing::debug!(template_id = %template.template_id, "no schema, skipping");
            continue;
        };
        let report = drift_report(
            source,
            filename,
            &template.template_id,
            entry.id_span.clone(),
            &resolved.definition.options,
            &reconciliation,
        );
        lints.push(TemplateLint {
            template_id: template.template_id.clone(),
            reconciliation,
            report,
        });
    }
    Ok(lints)
}

/// Build the manifest's theme into a site configuration
pub async fn build_site(manifest: &Manifest) -> Result<SiteConfig, ComposerError> {
    let registry = Arc::new(manifest.registry());
    let theme = manifest.theme(registry);
    Ok(theme.get_config(&manifest.context()).await?)
}

/// Schema of any registered template, built-ins included
pub async fn template_schema(
    manifest: &Manifest,
    template_id: &str,
) -> Result<Option<SchemaNode>, ComposerError> {
    let registry = manifest.registry();
    let resolved = registry.resolve(template_id, &manifest.context()).await?;
    Ok(resolved.definition.schema.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
[[templates]]
id = "stats"
is_public = true

[templates.schema]
lines = { type = "number" }

[[templates]]
id = "internal"

[templates.schema]
title = "string"

[[templates.options]]
key = "oldField"
input = "text"

[[pages]]
slug = "_home"
"#;

    #[tokio::test]
    async fn test_lint_reports_drift() {
        let manifest = Manifest::from_str(SOURCE).unwrap();
        let lints = lint_manifest(&manifest, SOURCE, "site.toml", false).await.unwrap();
        assert_eq!(lints.len(), 2);
        assert!(!lints[0].is_clean());
        assert_eq!(
            lints[0].reconciliation.unused_schema.keys().collect::<Vec<_>>(),
            vec!["lines"]
        );
        assert_eq!(lints[1].reconciliation.hidden_options, vec!["oldField"]);
        assert!(lints[1].report.contains("oldField"));
    }

    #[tokio::test]
    async fn test_lint_public_only() {
        let manifest = Manifest::from_str(SOURCE).unwrap();
        let lints = lint_manifest(&manifest, SOURCE, "site.toml", true).await.unwrap();
        let ids: Vec<_> = lints.iter().map(|l| l.template_id.as_str()).collect();
        assert_eq!(ids, vec!["stats"]);
    }

    #[tokio::test]
    async fn test_build_site() {
        let manifest = Manifest::from_str(SOURCE).unwrap();
        let site = build_site(&manifest).await.unwrap();
        assert_eq!(site.pages.len(), 1);
        assert_eq!(site.pages[0].template_id, "wrap");
    }

    #[tokio::test]
    async fn test_template_schema_includes_builtins() {
        let manifest = Manifest::from_str(SOURCE).unwrap();
        let schema = template_schema(&manifest, "hero").await.unwrap();
        assert!(schema.unwrap().field("heading").is_some());
        let err = template_schema(&manifest, "nope").await.unwrap_err();
        assert!(matches!(err, ComposerError::Template(TemplateError::NotFound { .. })));
    }
}
