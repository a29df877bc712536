//! `[base]` section configuration.
//!
//! Site metadata, exposed to every template as `site`.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in scriv.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "My Blog"
/// description = "Notes on Rust"
/// author = "Alice"
/// url = "https://myblog.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title.
    #[serde(default)]
    pub title: String,

    /// Default author for posts that do not name one.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    #[serde(default)]
    pub description: String,

    /// Public URL of the deployed site.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_config_full() {
        let config = r#"
            [base]
            title = "Scribbles"
            description = "A blog"
            author = "Alice"
            url = "https://example.com"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "Scribbles");
        assert_eq!(config.base.author, "Alice");
        assert_eq!(config.base.url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_base_config_defaults() {
        let config: SiteConfig = toml::from_str("[base]\ntitle = \"T\"").unwrap();

        assert_eq!(config.base.author, "<YOUR_NAME>");
        assert!(config.base.url.is_none());
        assert_eq!(config.base.description, "");
    }

    #[test]
    fn test_base_unknown_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str("[base]\nlanguage = \"en\"");
        assert!(result.is_err());
    }
}
