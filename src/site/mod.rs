//! Themes and the site configuration they produce
//!
//! A [`Theme`] pairs a template registry with a [`ThemeSource`] that supplies
//! page and section requests. [`Theme::get_config`] builds every root card
//! through one shared [`CardFactory`] and checks the page invariants.

mod view;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card::{deep_merge, Card, CardArgs, CardFactory, RegionId};
use crate::config::ComposerConfig;
use crate::context::BuildContext;
use crate::error::CompositionError;
use crate::template::{builtin, LoadError, TemplateRegistry};

pub use view::{ViewMap, HOME_ALIAS, HOME_VIEW, NOT_FOUND_VIEW};

/// Section requests, one per fixed region
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectionArgs {
    pub header: Option<CardArgs>,
    pub footer: Option<CardArgs>,
    pub hidden: Option<CardArgs>,
}

/// Supplies the card requests of a theme
#[async_trait]
pub trait ThemeSource: Send + Sync {
    /// One request per page
    async fn pages(&self, ctx: &BuildContext) -> Result<Vec<CardArgs>, LoadError>;

    async fn sections(&self, _ctx: &BuildContext) -> Result<SectionArgs, LoadError> {
        Ok(SectionArgs::default())
    }

    /// Site-wide configuration layered over the theme's base configuration
    async fn user_config(&self, _ctx: &BuildContext) -> Result<Option<Value>, LoadError> {
        Ok(None)
    }
}

/// Theme source over fixed data
#[derive(Debug, Clone, Default)]
pub struct StaticTheme {
    pub pages: Vec<CardArgs>,
    pub sections: SectionArgs,
    pub user_config: Option<Value>,
}

impl StaticTheme {
    pub fn new(pages: Vec<CardArgs>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn with_sections(mut self, sections: SectionArgs) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_user_config(mut self, config: Value) -> Self {
        self.user_config = Some(config);
        self
    }
}

#[async_trait]
impl ThemeSource for StaticTheme {
    async fn pages(&self, _ctx: &BuildContext) -> Result<Vec<CardArgs>, LoadError> {
        Ok(self.pages.clone())
    }

    async fn sections(&self, _ctx: &BuildContext) -> Result<SectionArgs, LoadError> {
        Ok(self.sections.clone())
    }

    async fn user_config(&self, _ctx: &BuildContext) -> Result<Option<Value>, LoadError> {
        Ok(self.user_config.clone())
    }
}

/// Built section cards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sections {
    pub header: Card,
    pub footer: Card,
    pub hidden: Card,
}

/// A fully built site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub theme_id: String,
    pub title: String,
    pub user_config: Value,
    pub sections: Sections,
    pub pages: Vec<Card>,
}

impl SiteConfig {
    /// Slug to card id, plus the `_home`, `_404` and `_` aliases
    pub fn view_map(&self) -> ViewMap {
        ViewMap::from_pages(&self.pages)
    }

    /// Page shown for a view id
    ///
    /// An empty id means the home page; unknown ids fall back to the 404
    /// page if there is one.
    pub fn page_for_view(&self, view_id: &str) -> Option<&Card> {
        let card_id = self.view_map().resolve(view_id)?.to_string();
        self.pages.iter().find(|p| p.card_id == card_id)
    }

    pub fn home(&self) -> Option<&Card> {
        self.pages.iter().find(|p| p.is_home_page())
    }

    pub fn not_found(&self) -> Option<&Card> {
        self.pages.iter().find(|p| p.is_404)
    }

    /// Every card in the site, sections first, depth-first
    pub fn all_cards(&self) -> Vec<&Card> {
        [&self.sections.header, &self.sections.footer, &self.sections.hidden]
            .into_iter()
            .chain(self.pages.iter())
            .flat_map(Card::walk)
            .collect()
    }
}

/// A theme: templates plus the requests that make up a site
pub struct Theme {
    pub theme_id: String,
    pub title: String,
    /// Site configuration the source's configuration is layered over
    pub base_user_config: Value,
    /// Template for pages that name none
    pub page_template: String,
    registry: Arc<TemplateRegistry>,
    source: Arc<dyn ThemeSource>,
    config: ComposerConfig,
}

impl Theme {
    pub fn new(
        theme_id: impl Into<String>,
        registry: Arc<TemplateRegistry>,
        source: Arc<dyn ThemeSource>,
    ) -> Self {
        let theme_id = theme_id.into();
        Self {
            title: theme_id.clone(),
            theme_id,
            base_user_config: Value::Object(Default::default()),
            page_template: builtin::WRAP.to_string(),
            registry,
            source,
            config: ComposerConfig::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_base_user_config(mut self, config: Value) -> Self {
        self.base_user_config = config;
        self
    }

    pub fn with_page_template(mut self, template_id: impl Into<String>) -> Self {
        self.page_template = template_id.into();
        self
    }

    pub fn with_config(mut self, config: ComposerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    /// Factory bound to this theme's registry
    pub fn factory(&self, ctx: &BuildContext) -> CardFactory {
        CardFactory::new(self.registry.clone(), ctx.clone())
            .with_config(self.config.clone())
            .with_caller(format!("Theme({})", self.theme_id))
    }

    /// Build every page and section of the theme
    pub async fn get_config(&self, ctx: &BuildContext) -> Result<SiteConfig, CompositionError> {
        let (pages, sections, user_config) = futures::try_join!(
            self.source.pages(ctx),
            self.source.sections(ctx),
            self.source.user_config(ctx),
        )?;

        let pages: Vec<CardArgs> = pages
            .into_iter()
            .map(|mut page| {
                if page.needs_default_template() {
                    page.template_id = Some(self.page_template.clone());
                }
                page
            })
            .collect();

        let factory = self.factory(ctx);
        let (header, footer, hidden, pages) = futures::try_join!(
            factory.from_template(section(sections.header, RegionId::Header)),
            factory.from_template(section(sections.footer, RegionId::Footer)),
            factory.from_template(section(sections.hidden, RegionId::Hidden)),
            try_join_all(pages.into_iter().map(|page| factory.from_template(page))),
        )?;

        check_pages(&pages)?;

        let user_config = deep_merge([&self.base_user_config].into_iter().chain(user_config.as_ref()));

        tracing::info!(
            theme_id = %self.theme_id,
            pages = pages.len(),
            "theme built"
        );

        Ok(SiteConfig {
            theme_id: self.theme_id.clone(),
            title: self.title.clone(),
            user_config,
            sections: Sections {
                header,
                footer,
                hidden,
            },
            pages,
        })
    }
}

impl std::fmt::Debug for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Theme")
            .field("theme_id", &self.theme_id)
            .field("title", &self.title)
            .field("page_template", &self.page_template)
            .finish_non_exhaustive()
    }
}

/// Section request pinned to its region; a missing section is an empty area
fn section(args: Option<CardArgs>, region: RegionId) -> CardArgs {
    args.unwrap_or_else(|| CardArgs::template(builtin::AREA))
        .with_region(region)
}

/// Exactly one home page, at most one 404 page
fn check_pages(pages: &[Card]) -> Result<(), CompositionError> {
    let homes = pages.iter().filter(|p| p.is_home_page()).count();
    if homes != 1 {
        tracing::warn!(count = homes, "site needs exactly one home page");
        return Err(CompositionError::HomePage { count: homes });
    }
    let not_found = pages.iter().filter(|p| p.is_404).count();
    if not_found > 1 {
        tracing::warn!(count = not_found, "site has more than one 404 page");
        return Err(CompositionError::NotFoundPage { count: not_found });
    }
    Ok(())
}
