//! Dashboard configuration, read from TOML.
//!
//! Every field has a default, so an empty document is a valid config.
use crate::error::{CatalogError, Result};
use serde::Deserialize;

const USER_PLACEHOLDER: &str = "{user}";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub layout: DataLayout,
    pub load_strategy: LoadStrategy,
    pub limits: ChartLimits,
}

impl DashboardConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.layout.genre_url_template.contains(USER_PLACEHOLDER) {
            return Err(CatalogError::Config(format!(
                "genre_url_template must contain {}",
                USER_PLACEHOLDER
            )));
        }
        if self.limits.top_artists == 0 || self.limits.genres == 0 || self.limits.search_terms == 0 {
            return Err(CatalogError::Config("chart limits must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Where the index, the per-user exports and the genre files live.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataLayout {
    pub index_url: String,
    /// Per-user files sit under `{data_base_url}/{user}/`.
    pub data_base_url: String,
    pub genre_url_template: String,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            index_url: "https://raw.githubusercontent.com/oumayma-yakoubi/SpotifyDataViz/refs/heads/main/index.json".to_string(),
            data_base_url: "https://raw.githubusercontent.com/oumayma-yakoubi/SpotifyDataViz/refs/heads/main/data".to_string(),
            genre_url_template: "https://raw.githubusercontent.com/oumayma-yakoubi/SpotifyDataViz/refs/heads/main/data/genre/artistGenres_{user}.json".to_string(),
        }
    }
}

impl DataLayout {
    /// Layout rooted at `base`, using the export repository's conventions.
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        let join = |rest: &str| if base.is_empty() { rest.to_string() } else { format!("{}/{}", base, rest) };
        Self {
            index_url: join("index.json"),
            data_base_url: join("data"),
            genre_url_template: join("data/genre/artistGenres_{user}.json"),
        }
    }

    pub fn user_file(&self, user: &str, file_name: &str) -> String {
        let base = self.data_base_url.trim_end_matches('/');
        if base.is_empty() {
            format!("{}/{}", user, file_name)
        } else {
            format!("{}/{}/{}", base, user, file_name)
        }
    }

    pub fn genre_file(&self, user: &str) -> String {
        self.genre_url_template.replace(USER_PLACEHOLDER, user)
    }
}

/// How a user's files are fetched. Merge order is the same either way.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    #[default]
    Sequential,
    Concurrent,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartLimits {
    pub top_artists: usize,
    pub genres: usize,
    pub search_terms: usize,
}

impl Default for ChartLimits {
    fn default() -> Self {
        Self {
            top_artists: 8,
            genres: 10,
            search_terms: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.limits.top_artists, 8);
        assert_eq!(config.load_strategy, LoadStrategy::Sequential);
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let config = DashboardConfig::from_toml_str(
            r#"
            load_strategy = "concurrent"

            [limits]
            genres = 20

            [layout]
            data_base_url = "http://localhost:8080/data/"
            "#,
        )
        .unwrap();
        assert_eq!(config.load_strategy, LoadStrategy::Concurrent);
        assert_eq!(config.limits.genres, 20);
        assert_eq!(config.limits.search_terms, 15);
        assert_eq!(
            config.layout.user_file("alice", "Playlist1.json"),
            "http://localhost:8080/data/alice/Playlist1.json"
        );
    }

    #[test]
    fn genre_template_needs_user_placeholder() {
        let err = DashboardConfig::from_toml_str("[layout]\ngenre_url_template = \"genres.json\"").unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(DashboardConfig::from_toml_str("[limits]\ntop_artists = 0").is_err());
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = DashboardConfig::from_toml_str("load_strategy = [").unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[test]
    fn rooted_layout_builds_locations() {
        let layout = DataLayout::rooted_at("export/");
        assert_eq!(layout.index_url, "export/index.json");
        assert_eq!(layout.user_file("bob", "YourLibrary.json"), "export/data/bob/YourLibrary.json");
        assert_eq!(layout.genre_file("bob"), "export/data/genre/artistGenres_bob.json");

        let bare = DataLayout::rooted_at("");
        assert_eq!(bare.index_url, "index.json");
    }
}
