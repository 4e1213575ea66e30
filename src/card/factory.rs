//! Card factory: turns card requests into finished card trees

use std::sync::Arc;

use futures::future::{self, try_join_all, BoxFuture, FutureExt};
use serde_json::json;
use uuid::Uuid;

use super::{deep_merge, Card, CardArgs, RegionId};
use crate::config::ComposerConfig;
use crate::context::BuildContext;
use crate::error::CompositionError;
use crate::template::{Template, TemplateError, TemplateRef, TemplateRegistry};

/// Generate a fresh card id
pub fn new_card_id() -> String {
    format!("crd{}", Uuid::new_v4().simple())
}

/// Builds cards against one registry snapshot
///
/// Children are built concurrently through the same factory, so the whole
/// tree sees the same templates and the same media allocator.
#[derive(Debug, Clone)]
pub struct CardFactory {
    registry: Arc<TemplateRegistry>,
    ctx: BuildContext,
    config: ComposerConfig,
}

impl CardFactory {
    pub fn new(registry: Arc<TemplateRegistry>, ctx: BuildContext) -> Self {
        Self {
            registry,
            ctx,
            config: ComposerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ComposerConfig) -> Self {
        self.config = config;
        self
    }

    /// Name reported when a template cannot be found
    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.config.caller = caller.into();
        self
    }

    pub fn registry(&self) -> &Arc<TemplateRegistry> {
        &self.registry
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Build a card and its children
    ///
    /// A request naming no template and matching no default fails right
    /// away with [`CompositionError::MissingTemplate`]. A template id that is
    /// not registered yields a fallback card instead of an error.
    pub fn from_template(&self, args: CardArgs) -> BoxFuture<'_, Result<Card, CompositionError>> {
        self.build(args, None)
    }

    /// Showcase page for a template: its demo cards under a page card
    ///
    /// Templates without demo cards get a single card of their own.
    pub async fn demo_page(&self, template_ref: TemplateRef) -> Result<Card, CompositionError> {
        let resolved = self.registry.resolve_ref(&template_ref, &self.ctx).await?;

        let cards = if resolved.definition.demo_page.is_empty() {
            vec![CardArgs::from_ref(template_ref.clone())]
        } else {
            resolved
                .definition
                .demo_page
                .iter()
                .cloned()
                .map(|card| {
                    if !card.needs_default_template() {
                        return card;
                    }
                    match &template_ref {
                        TemplateRef::Named(id) => CardArgs {
                            template_id: Some(id.clone()),
                            ..card
                        },
                        TemplateRef::Inline(template) => card.with_inline(template.clone()),
                    }
                })
                .collect()
        };

        let title = resolved
            .template
            .title
            .clone()
            .unwrap_or_else(|| resolved.template_id().to_string());
        let page = CardArgs::page(format!("card-{}", resolved.template_id()))
            .with_title(title)
            .with_cards(cards);
        self.from_template(page).await
    }

    fn template_ref(&self, args: &CardArgs) -> Result<TemplateRef, CompositionError> {
        if let Some(template) = &args.inline {
            return Ok(TemplateRef::Inline(template.clone()));
        }

        let template_id = args
            .template_id
            .as_deref()
            .or_else(|| self.config.default_template(args.slug.is_some()))
            .or_else(|| args.el.as_ref().map(|el| el.as_str()))
            .ok_or_else(|| CompositionError::MissingTemplate {
                caller: self.config.caller.clone(),
            })?;

        match &args.el {
            Some(el) => Ok(TemplateRef::from(Template::inline(template_id, el.clone()))),
            None => Ok(TemplateRef::Named(template_id.to_string())),
        }
    }

    fn build(
        &self,
        args: CardArgs,
        inherited: Option<RegionId>,
    ) -> BoxFuture<'_, Result<Card, CompositionError>> {
        let template_ref = match self.template_ref(&args) {
            Ok(template_ref) => template_ref,
            Err(err) => return future::ready(Err(err)).boxed(),
        };

        async move {
            let resolved = match self.registry.resolve_ref(&template_ref, &self.ctx).await {
                Ok(resolved) => resolved,
                Err(TemplateError::NotFound { template_id }) => {
                    tracing::error!(
                        template_id = %template_id,
                        caller = %self.config.caller,
                        known = ?self.registry.ids().collect::<Vec<_>>(),
                        "template not found"
                    );
                    return Ok(self.fallback_card(args, &template_id, inherited));
                }
                Err(err) => return Err(err.into()),
            };
            let template = &resolved.template;

            let CardArgs {
                card_id,
                region_id,
                layout_id,
                slug,
                title,
                description,
                is_home,
                is_404,
                is_system,
                base_config,
                user_config,
                cards,
                ..
            } = args;

            let default_user_config = match user_config {
                Some(_) => None,
                None => template.default_user_config(&self.ctx).await?,
            };

            let mut layers = vec![&template.base_config];
            layers.extend(base_config.as_ref());
            layers.extend(default_user_config.as_ref());
            layers.extend(user_config.as_ref());
            let merged = deep_merge(layers);

            let region_id = region_id.or(inherited).unwrap_or_default();
            let cards = try_join_all(
                cards
                    .into_iter()
                    .map(|child| self.build(child, Some(region_id))),
            )
            .await?;

            let card = Card {
                card_id: card_id.unwrap_or_else(new_card_id),
                template_id: template.template_id.clone(),
                region_id,
                layout_id,
                slug,
                title,
                description,
                is_home,
                is_404,
                is_system,
                user_config: merged,
                cards,
                el: template.el.clone(),
            };
            tracing::debug!(
                card_id = %card.card_id,
                template_id = %card.template_id,
                children = card.cards.len(),
                "card built"
            );
            Ok(card)
        }
        .boxed()
    }

    fn fallback_card(&self, args: CardArgs, missing: &str, inherited: Option<RegionId>) -> Card {
        let template_id = self.config.fallback_template_id.clone();
        let el = self.registry.get(&template_id).and_then(|t| t.el.clone());
        Card {
            card_id: args.card_id.unwrap_or_else(new_card_id),
            template_id,
            region_id: args.region_id.or(inherited).unwrap_or_default(),
            layout_id: args.layout_id,
            slug: args.slug,
            title: args.title,
            description: args.description,
            is_home: args.is_home,
            is_404: args.is_404,
            is_system: args.is_system,
            user_config: json!({ "heading": format!("Template not found ({})", missing) }),
            cards: Vec::new(),
            el,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ConfigLoader, LoadError, RenderHandle, TemplateDefinition};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    struct DefaultsLoader(Value);

    #[async_trait]
    impl ConfigLoader for DefaultsLoader {
        async fn load_definition(&self, _ctx: &BuildContext) -> Result<TemplateDefinition, LoadError> {
            Ok(TemplateDefinition::default())
        }

        async fn default_user_config(&self, _ctx: &BuildContext) -> Result<Option<Value>, LoadError> {
            Ok(Some(self.0.clone()))
        }
    }

    fn factory() -> CardFactory {
        let mut registry = TemplateRegistry::with_builtins();
        registry
            .register(
                Template::new("stat")
                    .with_base_config(json!({"a": 1, "b": 1}))
                    .with_loader(Arc::new(DefaultsLoader(json!({"c": 1})))),
            )
            .unwrap();
        CardFactory::new(Arc::new(registry), BuildContext::empty()).with_caller("factory-tests")
    }

    #[test]
    fn test_card_id_shape() {
        let id = new_card_id();
        assert!(id.starts_with("crd"));
        assert_eq!(id.len(), 35);
    }

    #[tokio::test]
    async fn test_merge_precedence() {
        let card = factory()
            .from_template(
                CardArgs::template("stat")
                    .with_base_config(json!({"b": 2}))
                    .with_user_config(json!({"c": 2, "d": 1})),
            )
            .await
            .unwrap();
        assert_eq!(card.user_config, json!({"a": 1, "b": 2, "c": 2, "d": 1}));
    }

    #[tokio::test]
    async fn test_default_user_config_applies_without_user_config() {
        let card = factory()
            .from_template(CardArgs::template("stat").with_base_config(json!({"b": 2})))
            .await
            .unwrap();
        assert_eq!(card.user_config, json!({"a": 1, "b": 2, "c": 1}));
    }

    #[tokio::test]
    async fn test_explicit_empty_user_config_skips_defaults() {
        let card = factory()
            .from_template(CardArgs::template("stat").with_user_config(json!({})))
            .await
            .unwrap();
        assert_eq!(card.user_config, json!({"a": 1, "b": 1}));
    }

    #[tokio::test]
    async fn test_default_template_selection() {
        let factory = factory();
        let page = factory.from_template(CardArgs::page("about")).await.unwrap();
        assert_eq!(page.template_id, "wrap");
        let area = factory.from_template(CardArgs::new()).await.unwrap();
        assert_eq!(area.template_id, "area");
    }

    #[tokio::test]
    async fn test_missing_template_when_default_disabled() {
        let factory = factory().with_config(ComposerConfig::new().with_area_template(None));
        let err = factory.from_template(CardArgs::new()).await.unwrap_err();
        assert!(matches!(err, CompositionError::MissingTemplate { .. }));
    }

    #[tokio::test]
    async fn test_fallback_card() {
        let card = factory()
            .from_template(
                CardArgs::template("doesNotExist")
                    .with_card_id("crdKeep")
                    .with_title("Kept")
                    .with_cards(vec![CardArgs::template("hero")]),
            )
            .await
            .unwrap();
        assert_eq!(card.template_id, "hero");
        assert_eq!(card.card_id, "crdKeep");
        assert_eq!(card.title.as_deref(), Some("Kept"));
        assert_eq!(
            card.user_config,
            json!({"heading": "Template not found (doesNotExist)"})
        );
        assert!(card.cards.is_empty());
    }

    #[tokio::test]
    async fn test_el_wraps_inline_template() {
        let card = factory()
            .from_template(CardArgs::new().with_el(RenderHandle::new("Spacer")))
            .await
            .unwrap();
        assert_eq!(card.template_id, "area-inline");
        assert_eq!(card.el, Some(RenderHandle::new("Spacer")));
    }

    #[tokio::test]
    async fn test_children_inherit_region() {
        let card = factory()
            .from_template(
                CardArgs::template("area")
                    .with_region(RegionId::Header)
                    .with_cards(vec![
                        CardArgs::template("hero"),
                        CardArgs::template("hero").with_region(RegionId::Hidden),
                    ]),
            )
            .await
            .unwrap();
        let regions: Vec<_> = card.cards.iter().map(|c| c.region_id).collect();
        assert_eq!(regions, vec![RegionId::Header, RegionId::Hidden]);
    }

    #[tokio::test]
    async fn test_demo_page() {
        let page = factory().demo_page(TemplateRef::from("hero")).await.unwrap();
        assert_eq!(page.template_id, "wrap");
        assert_eq!(page.slug.as_deref(), Some("card-hero"));
        assert_eq!(page.cards.len(), 1);
        assert_eq!(page.cards[0].template_id, "hero");
    }
}
