//! Cards: configured instances of templates
//!
//! [`CardArgs`] is a request to build a card; [`Card`] is the finished,
//! storable record produced by [`CardFactory`]. Cards name their template by
//! id and never hold the template itself.

mod factory;
mod merge;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template::{RenderHandle, Template, TemplateRef};

pub use factory::{new_card_id, CardFactory};
pub use merge::{deep_merge, merge_into, set_path};

/// Page region a card renders in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionId {
    Header,
    Footer,
    #[default]
    Main,
    Hidden,
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionId::Header => "header",
            RegionId::Footer => "footer",
            RegionId::Main => "main",
            RegionId::Hidden => "hidden",
        };
        f.write_str(name)
    }
}

/// A finished card record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_id: String,
    pub template_id: String,
    #[serde(default)]
    pub region_id: RegionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_home: bool,
    #[serde(default, rename = "is404")]
    pub is_404: bool,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub user_config: Value,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub el: Option<RenderHandle>,
}

impl Card {
    /// Depth-first walk over this card and all descendants
    pub fn walk(&self) -> Vec<&Card> {
        let mut out = vec![self];
        for child in &self.cards {
            out.extend(child.walk());
        }
        out
    }

    /// Home page either by flag or by the `_home` slug
    pub fn is_home_page(&self) -> bool {
        self.is_home || self.slug.as_deref() == Some("_home")
    }
}

/// A request to build one card
///
/// Every field is optional; the factory fills in the template default, a
/// generated card id and the parent's region.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardArgs {
    pub card_id: Option<String>,
    #[serde(alias = "template")]
    pub template_id: Option<String>,
    /// Template supplied by the caller instead of a registry id
    #[serde(skip)]
    pub inline: Option<Arc<Template>>,
    /// Bare render handle, wrapped in an inline template
    pub el: Option<RenderHandle>,
    #[serde(alias = "region")]
    pub region_id: Option<RegionId>,
    pub layout_id: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_home: bool,
    pub is_404: bool,
    pub is_system: bool,
    pub base_config: Option<Value>,
    pub user_config: Option<Value>,
    pub cards: Vec<CardArgs>,
}

impl CardArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request for a card of the given template
    pub fn template(template_id: impl Into<String>) -> Self {
        Self {
            template_id: Some(template_id.into()),
            ..Self::default()
        }
    }

    /// Request for a page; the page template applies unless one is set
    pub fn page(slug: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
            ..Self::default()
        }
    }

    /// Request whose template is given by reference
    pub fn from_ref(template_ref: TemplateRef) -> Self {
        match template_ref {
            TemplateRef::Named(id) => Self::template(id),
            TemplateRef::Inline(template) => Self::new().with_inline(template),
        }
    }

    pub fn with_inline(mut self, template: Arc<Template>) -> Self {
        self.inline = Some(template);
        self
    }

    pub fn with_el(mut self, el: RenderHandle) -> Self {
        self.el = Some(el);
        self
    }

    pub fn with_card_id(mut self, card_id: impl Into<String>) -> Self {
        self.card_id = Some(card_id.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_region(mut self, region: RegionId) -> Self {
        self.region_id = Some(region);
        self
    }

    pub fn with_layout(mut self, layout_id: impl Into<String>) -> Self {
        self.layout_id = Some(layout_id.into());
        self
    }

    pub fn with_base_config(mut self, config: Value) -> Self {
        self.base_config = Some(config);
        self
    }

    pub fn with_user_config(mut self, config: Value) -> Self {
        self.user_config = Some(config);
        self
    }

    pub fn with_cards(mut self, cards: Vec<CardArgs>) -> Self {
        self.cards = cards;
        self
    }

    pub fn home(mut self) -> Self {
        self.is_home = true;
        self
    }

    pub fn not_found(mut self) -> Self {
        self.is_404 = true;
        self
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    /// `true` when nothing names a template, so a default applies
    pub fn needs_default_template(&self) -> bool {
        self.template_id.is_none() && self.inline.is_none()
    }
}

/// Re-enter a stored card as a new request, keeping its configuration
impl From<Card> for CardArgs {
    fn from(card: Card) -> Self {
        Self {
            card_id: Some(card.card_id),
            template_id: Some(card.template_id),
            inline: None,
            el: None,
            region_id: Some(card.region_id),
            layout_id: card.layout_id,
            slug: card.slug,
            title: card.title,
            description: card.description,
            is_home: card.is_home,
            is_404: card.is_404,
            is_system: card.is_system,
            base_config: None,
            user_config: Some(card.user_config),
            cards: card.cards.into_iter().map(CardArgs::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Card {
        Card {
            card_id: "crd1".to_string(),
            template_id: "hero".to_string(),
            region_id: RegionId::Header,
            layout_id: None,
            slug: None,
            title: Some("Top".to_string()),
            description: None,
            is_home: false,
            is_404: true,
            is_system: false,
            user_config: json!({"heading": "Hi"}),
            cards: vec![],
            el: None,
        }
    }

    #[test]
    fn test_card_serializes_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "cardId": "crd1",
                "templateId": "hero",
                "regionId": "header",
                "title": "Top",
                "isHome": false,
                "is404": true,
                "isSystem": false,
                "userConfig": {"heading": "Hi"},
                "cards": []
            })
        );
    }

    #[test]
    fn test_card_round_trips_into_args() {
        let args = CardArgs::from(sample());
        assert_eq!(args.card_id.as_deref(), Some("crd1"));
        assert_eq!(args.template_id.as_deref(), Some("hero"));
        assert_eq!(args.region_id, Some(RegionId::Header));
        assert_eq!(args.user_config, Some(json!({"heading": "Hi"})));
        assert!(args.is_404);
    }

    #[test]
    fn test_args_from_toml() {
        let args: CardArgs = toml::from_str(
            r#"
            template = "hero"
            slug = "about"
            is_home = false
            region = "footer"
            [user_config]
            heading = "About"
            "#,
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(args.template_id.as_deref(), Some("hero"));
        assert_eq!(args.region_id, Some(RegionId::Footer));
        assert_eq!(args.user_config, Some(json!({"heading": "About"})));
    }

    #[test]
    fn test_walk_is_depth_first() {
        let mut root = sample();
        let mut child = sample();
        child.card_id = "crd2".to_string();
        let mut grandchild = sample();
        grandchild.card_id = "crd3".to_string();
        child.cards.push(grandchild);
        let mut sibling = sample();
        sibling.card_id = "crd4".to_string();
        root.cards = vec![child, sibling];
        let ids: Vec<_> = root.walk().into_iter().map(|c| c.card_id.as_str()).collect();
        assert_eq!(ids, vec!["crd1", "crd2", "crd3", "crd4"]);
    }
}
