//! TOML manifests: a data-driven template catalog and site
//!
//! A manifest declares templates (schema, options, defaults, demo cards),
//! stock media, and the pages and sections of one theme:
//!
//! ```toml
//! [theme]
//! id = "minimal"
//!
//! [[templates]]
//! id = "quote"
//! el = "ElQuote"
//! default_user_config = { text = "Simplicity is the ultimate sophistication." }
//!
//! [templates.schema]
//! text = { type = "string", description = "Quote text" }
//! author = "string"
//!
//! [[templates.options]]
//! key = "text"
//! input = "textarea"
//!
//! [[pages]]
//! slug = "_home"
//! cards = [{ template = "quote" }]
//! ```
//!
//! Schema fields keep their document order. Option keys and template ids
//! keep their byte spans so drift can be reported against the source.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use thiserror::Error;
use toml::Spanned;

use crate::card::{set_path, CardArgs};
use crate::config::ComposerConfig;
use crate::context::{BuildContext, MediaItem, MediaQuery, StockMedia};
use crate::schema::{join_path, Field, OptionDescriptor, SchemaNode, ARRAY_INDEX};
use crate::site::{SectionArgs, StaticTheme, Theme};
use crate::template::{
    ConfigLoader, LoadError, RenderHandle, Template, TemplateDefinition, TemplateError,
    TemplateRegistry,
};

/// Errors that can occur when loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse manifest TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown schema type '{type_name}' at '{path}'")]
    UnknownType { path: String, type_name: String },

    #[error("array schema at '{path}' has no items")]
    MissingItems { path: String },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Theme settings from the `[theme]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeSpec {
    pub id: String,
    pub title: Option<String>,
    /// Template for pages that name none
    pub page_template: Option<String>,
    pub user_config: Option<Value>,
}

impl Default for ThemeSpec {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            title: None,
            page_template: None,
            user_config: None,
        }
    }
}

/// A template declared in a manifest
#[derive(Debug, Clone)]
pub struct ManifestTemplate {
    pub template: Template,
    /// Byte range of the template id in the manifest
    pub id_span: Range<usize>,
}

/// A parsed manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    pub composer: ComposerConfig,
    pub theme: ThemeSpec,
    pub media: Vec<MediaItem>,
    pub templates: Vec<ManifestTemplate>,
    pub pages: Vec<CardArgs>,
    pub sections: SectionArgs,
}

impl Manifest {
    /// Load a manifest from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a manifest from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(content)?;

        let mut seen = HashSet::new();
        let mut templates = Vec::with_capacity(raw.templates.len());
        for raw_template in raw.templates {
            let template = raw_template.into_template()?;
            if !seen.insert(template.template.template_id.clone()) {
                return Err(TemplateError::Duplicate {
                    template_id: template.template.template_id,
                }
                .into());
            }
            templates.push(template);
        }

        tracing::debug!(templates = templates.len(), pages = raw.pages.len(), "manifest loaded");

        Ok(Manifest {
            composer: raw.composer,
            theme: raw.theme,
            media: raw.media,
            templates,
            pages: raw.pages,
            sections: raw.sections,
        })
    }

    /// Built-in templates plus every manifest template
    ///
    /// A manifest template with a built-in id replaces the built-in.
    pub fn registry(&self) -> TemplateRegistry {
        let mut registry = TemplateRegistry::with_builtins();
        for entry in &self.templates {
            registry.insert(entry.template.clone());
        }
        registry
    }

    pub fn template(&self, template_id: &str) -> Option<&ManifestTemplate> {
        self.templates
            .iter()
            .find(|t| t.template.template_id == template_id)
    }

    /// Build context whose media allocator holds the manifest's media
    pub fn context(&self) -> BuildContext {
        BuildContext::new(Arc::new(StockMedia::new(self.media.clone())))
    }

    /// Theme over the manifest's pages and sections
    pub fn theme(&self, registry: Arc<TemplateRegistry>) -> Theme {
        let mut source = StaticTheme::new(self.pages.clone()).with_sections(self.sections.clone());
        if let Some(config) = &self.theme.user_config {
            source = source.with_user_config(config.clone());
        }

        let mut theme = Theme::new(self.theme.id.clone(), registry, Arc::new(source))
            .with_config(self.composer.clone());
        if let Some(title) = &self.theme.title {
            theme = theme.with_title(title.clone());
        }
        if let Some(page_template) = &self.theme.page_template {
            theme = theme.with_page_template(page_template.clone());
        }
        theme
    }
}

/// Loader backing every manifest template
///
/// The definition is fixed; per-card defaults layer picked media over the
/// declared default configuration.
#[derive(Debug, Clone, Default)]
pub struct ManifestLoader {
    definition: TemplateDefinition,
    default_user_config: Option<Value>,
    /// Dot-path in the user config to the media query filling it
    default_media: BTreeMap<String, MediaQuery>,
}

#[async_trait]
impl ConfigLoader for ManifestLoader {
    async fn load_definition(&self, _ctx: &BuildContext) -> Result<TemplateDefinition, LoadError> {
        Ok(self.definition.clone())
    }

    async fn default_user_config(&self, ctx: &BuildContext) -> Result<Option<Value>, LoadError> {
        if self.default_user_config.is_none() && self.default_media.is_empty() {
            return Ok(None);
        }

        let mut config = self
            .default_user_config
            .clone()
            .unwrap_or_else(|| json!({}));
        for (path, query) in &self.default_media {
            let item = ctx.media.pick(query.clone()).await?;
            set_path(&mut config, path, json!({ "url": item.url, "format": item.format }));
        }
        Ok(Some(config))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    composer: ComposerConfig,
    #[serde(default)]
    theme: ThemeSpec,
    #[serde(default)]
    media: Vec<MediaItem>,
    #[serde(default)]
    templates: Vec<RawTemplate>,
    #[serde(default)]
    pages: Vec<CardArgs>,
    #[serde(default)]
    sections: SectionArgs,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTemplate {
    id: Spanned<String>,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    category: Vec<String>,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    is_page_card: bool,
    #[serde(default)]
    is_container: bool,
    el: Option<String>,
    base_config: Option<Value>,
    default_user_config: Option<Value>,
    #[serde(default)]
    default_media: BTreeMap<String, MediaQuery>,
    schema: Option<OrderedFields>,
    #[serde(default)]
    options: Vec<RawOption>,
    #[serde(default)]
    demo: Vec<CardArgs>,
}

impl RawTemplate {
    fn into_template(self) -> Result<ManifestTemplate, ManifestError> {
        let id_span = self.id.span();
        let template_id = self.id.into_inner();

        let schema = self
            .schema
            .map(|fields| object_node(fields, ""))
            .transpose()?;
        let options = self.options.into_iter().map(RawOption::into_descriptor).collect();

        let loader = ManifestLoader {
            definition: TemplateDefinition {
                schema,
                options,
                demo_page: self.demo,
            },
            default_user_config: self.default_user_config,
            default_media: self.default_media,
        };

        let mut template = Template::new(template_id)
            .with_category(self.category)
            .public(self.is_public)
            .with_loader(Arc::new(loader));
        template.title = self.title;
        template.description = self.description;
        template.is_page_card = self.is_page_card;
        template.is_container = self.is_container;
        template.el = self.el.map(RenderHandle::new);
        if let Some(base) = self.base_config {
            template.base_config = base;
        }

        Ok(ManifestTemplate { template, id_span })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOption {
    key: Spanned<String>,
    input: String,
    label: Option<String>,
    #[serde(default)]
    options: Vec<RawOption>,
}

impl RawOption {
    fn into_descriptor(self) -> OptionDescriptor {
        let span = self.key.span();
        let mut option = OptionDescriptor::new(self.key.into_inner(), self.input.as_str())
            .with_span(span)
            .with_children(self.options.into_iter().map(RawOption::into_descriptor).collect());
        option.label = self.label;
        option
    }
}

/// A schema entry: either a bare type name or a full table
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSchema {
    Kind(String),
    Spec(RawSchemaSpec),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchemaSpec {
    #[serde(rename = "type")]
    kind: String,
    description: Option<String>,
    #[serde(default)]
    required: bool,
    fields: Option<OrderedFields>,
    items: Option<Box<RawSchema>>,
    #[serde(default)]
    values: Vec<Value>,
}

impl From<RawSchema> for RawSchemaSpec {
    fn from(raw: RawSchema) -> Self {
        match raw {
            RawSchema::Spec(spec) => spec,
            RawSchema::Kind(kind) => RawSchemaSpec {
                kind,
                description: None,
                required: false,
                fields: None,
                items: None,
                values: Vec::new(),
            },
        }
    }
}

/// Schema fields in document order
struct OrderedFields(Vec<(String, RawSchema)>);

impl<'de> Deserialize<'de> for OrderedFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = OrderedFields;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of schema fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut fields: Vec<(String, RawSchema)> = Vec::new();
                while let Some((name, schema)) = map.next_entry::<String, RawSchema>()? {
                    if fields.iter().any(|(existing, _)| *existing == name) {
                        return Err(de::Error::custom(format!("duplicate schema field '{}'", name)));
                    }
                    fields.push((name, schema));
                }
                Ok(OrderedFields(fields))
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

fn object_node(fields: OrderedFields, path: &str) -> Result<SchemaNode, ManifestError> {
    let fields = fields
        .0
        .into_iter()
        .map(|(name, raw)| {
            let spec = RawSchemaSpec::from(raw);
            let required = spec.required;
            let node = schema_node(spec, &join_path(path, &name))?;
            Ok(if required {
                Field::required(name, node)
            } else {
                Field::optional(name, node)
            })
        })
        .collect::<Result<Vec<_>, ManifestError>>()?;
    Ok(SchemaNode::object(fields))
}

fn schema_node(spec: RawSchemaSpec, path: &str) -> Result<SchemaNode, ManifestError> {
    let node = match spec.kind.as_str() {
        "string" => SchemaNode::string(),
        "number" | "integer" => SchemaNode::number(),
        "boolean" => SchemaNode::boolean(),
        "unknown" | "any" => SchemaNode::unknown(),
        "enum" => SchemaNode::enumeration(spec.values),
        "object" => object_node(spec.fields.unwrap_or(OrderedFields(Vec::new())), path)?,
        "array" => {
            let items = spec.items.ok_or_else(|| ManifestError::MissingItems {
                path: path.to_string(),
            })?;
            SchemaNode::array(schema_node(
                RawSchemaSpec::from(*items),
                &join_path(path, ARRAY_INDEX),
            )?)
        }
        other => {
            return Err(ManifestError::UnknownType {
                path: path.to_string(),
                type_name: other.to_string(),
            })
        }
    };
    Ok(match spec.description {
        Some(description) => node.describe(description),
        None => node,
    })
}
