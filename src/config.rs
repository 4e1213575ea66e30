//! Configuration for the card factory

use serde::Deserialize;

/// Template ids the factory falls back on and the caller name it logs
///
/// Read from the optional `[composer]` table of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Template used for cards whose template cannot be resolved
    pub fallback_template_id: String,

    /// Default template for requests that carry a slug (pages)
    pub page_template: Option<String>,

    /// Default template for requests without a slug (containers)
    pub area_template: Option<String>,

    /// Name reported in logs and errors
    pub caller: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            fallback_template_id: "hero".to_string(),
            page_template: Some("wrap".to_string()),
            area_template: Some("area".to_string()),
            caller: "unknown".to_string(),
        }
    }
}

impl ComposerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_template(mut self, id: impl Into<String>) -> Self {
        self.fallback_template_id = id.into();
        self
    }

    /// Set or disable the page default
    pub fn with_page_template(mut self, id: Option<&str>) -> Self {
        self.page_template = id.map(str::to_string);
        self
    }

    /// Set or disable the container default
    pub fn with_area_template(mut self, id: Option<&str>) -> Self {
        self.area_template = id.map(str::to_string);
        self
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = caller.into();
        self
    }

    /// Default template for a request, depending on whether it has a slug
    ///
    /// An empty id counts as disabled, which is how a manifest turns a
    /// default off.
    pub fn default_template(&self, has_slug: bool) -> Option<&str> {
        let id = if has_slug {
            self.page_template.as_deref()
        } else {
            self.area_template.as_deref()
        };
        id.filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComposerConfig::default();
        assert_eq!(config.fallback_template_id, "hero");
        assert_eq!(config.page_template.as_deref(), Some("wrap"));
        assert_eq!(config.area_template.as_deref(), Some("area"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ComposerConfig::new()
            .with_fallback_template("notice")
            .with_page_template(None)
            .with_caller("tests");

        assert_eq!(config.fallback_template_id, "notice");
        assert_eq!(config.default_template(true), None);
        assert_eq!(config.default_template(false), Some("area"));
        assert_eq!(config.caller, "tests");
    }

    #[test]
    fn test_partial_toml() {
        let config: ComposerConfig = toml::from_str("fallback_template_id = \"notice\"").unwrap();
        assert_eq!(config.fallback_template_id, "notice");
        assert_eq!(config.page_template.as_deref(), Some("wrap"));
    }

    #[test]
    fn test_empty_id_disables_default() {
        let config: ComposerConfig = toml::from_str("area_template = \"\"").unwrap();
        assert_eq!(config.default_template(false), None);
        assert_eq!(config.default_template(true), Some("wrap"));
    }
}
