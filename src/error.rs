//! Error types for card composition and drift reporting

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::context::MediaError;
use crate::reconcile::{flatten_options, Reconciliation};
use crate::schema::OptionDescriptor;
use crate::template::TemplateError;

/// Errors that abort building a card tree
///
/// A template that cannot be found is not one of them: the factory
/// substitutes a fallback card and carries on.
#[derive(Debug, Error)]
pub enum CompositionError {
    /// Neither a template id, an inline template, nor a default applies
    #[error("card request from {caller} names no template and no default applies")]
    MissingTemplate { caller: String },

    /// Registry failure
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Media provider failure
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Failure reported by a template loader or theme source
    #[error(transparent)]
    External(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// A site needs exactly one home page
    #[error("site must have exactly one home page, found {count}")]
    HomePage { count: usize },

    /// A site may have at most one not-found page
    #[error("site may have at most one 404 page, found {count}")]
    NotFoundPage { count: usize },
}

impl CompositionError {
    /// Wrap any collaborator error without altering it
    pub fn external(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CompositionError::External(Box::new(err))
    }
}

/// Render drift for one template as an ariadne report
///
/// Hidden options are labelled at their key in `source` when the option
/// carries a span; unused schema paths are attached to `template_span`.
/// Returns an empty string when there is no drift.
pub fn drift_report(
    source: &str,
    filename: &str,
    template_id: &str,
    template_span: Range<usize>,
    options: &[OptionDescriptor],
    reconciliation: &Reconciliation,
) -> String {
    if reconciliation.is_clean() {
        return String::new();
    }

    let mut builder = Report::build(ReportKind::Warning, filename, template_span.start)
        .with_message(format!("template '{}' options drift from its schema", template_id));

    let option_paths = flatten_options(options);
    for hidden in &reconciliation.hidden_options {
        let span = option_paths
            .iter()
            .find(|o| &o.path == hidden)
            .and_then(|o| o.option.span.clone())
            .unwrap_or_else(|| template_span.clone());
        builder = builder.with_label(
            Label::new((filename, span))
                .with_message(format!("option '{}' has no schema path", hidden))
                .with_color(Color::Yellow),
        );
    }

    if !reconciliation.unused_schema.is_empty() {
        let unused: Vec<String> = reconciliation
            .unused_schema
            .iter()
            .map(|(path, label)| format!("{} ({})", path, label))
            .collect();
        builder = builder
            .with_label(
                Label::new((filename, template_span.clone()))
                    .with_message(format!(
                        "{} schema path(s) have no option",
                        unused.len()
                    ))
                    .with_color(Color::Red),
            )
            .with_note(format!("unused: {}", unused.join(", ")));
    }

    let mut buf = Vec::new();
    if let Err(err) = builder
        .finish()
        .write((filename, Source::from(source)), &mut buf)
    {
        tracing::warn!(%err, template_id, "failed to render drift report");
    }
    String::from_utf8_lossy(&buf).into_owned()
}
