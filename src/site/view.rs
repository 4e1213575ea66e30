//! Routing from view ids to page cards

use std::collections::BTreeMap;

use serde::Serialize;

use crate::card::Card;

/// View id of the home page
pub const HOME_VIEW: &str = "_home";
/// View id of the not-found page
pub const NOT_FOUND_VIEW: &str = "_404";
/// Short alias of the home page, used for item routes like `/_/<item>`
pub const HOME_ALIAS: &str = "_";

/// View id to page card id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ViewMap(BTreeMap<String, String>);

impl ViewMap {
    /// Map every page with a slug, plus the home and 404 aliases
    ///
    /// The aliases follow the page flags, so a home or 404 page without a
    /// slug is still routable.
    pub fn from_pages(pages: &[Card]) -> Self {
        let mut map = BTreeMap::new();
        for page in pages {
            if page.is_home_page() {
                map.insert(HOME_VIEW.to_string(), page.card_id.clone());
            }
            if page.is_404 {
                map.insert(NOT_FOUND_VIEW.to_string(), page.card_id.clone());
            }
            if let Some(slug) = page.slug.as_deref() {
                map.entry(slug.to_string()).or_insert_with(|| page.card_id.clone());
            }
        }
        if let Some(home) = map.get(HOME_VIEW).cloned() {
            map.insert(HOME_ALIAS.to_string(), home);
        }
        Self(map)
    }

    pub fn get(&self, view_id: &str) -> Option<&str> {
        self.0.get(view_id).map(String::as_str)
    }

    /// Card id shown for a view, falling back to the 404 page
    pub fn resolve(&self, view_id: &str) -> Option<&str> {
        let view_id = if view_id.is_empty() { HOME_VIEW } else { view_id };
        self.get(view_id).or_else(|| self.get(NOT_FOUND_VIEW))
    }

    /// View id of a card, `None` when it is not a routed page
    pub fn view_for_card(&self, card_id: &str) -> Option<&str> {
        if self.get(HOME_VIEW) == Some(card_id) {
            return Some(HOME_VIEW);
        }
        self.0
            .iter()
            .find(|(view, id)| id.as_str() == card_id && !view.starts_with('_'))
            .map(|(view, _)| view.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
