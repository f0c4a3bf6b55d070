//! Catalog configuration loading from config.toml
//!
//! Articles and their tasks listed in config.toml are used to seed the database on
//! startup. Entries whose title already exists are left alone.

use crate::entities::TaskFrequency;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Articles to seed
    #[serde(default)]
    pub articles: Vec<ArticleConfig>,
}

/// Configuration for a single article
#[derive(Debug, Deserialize, Clone)]
pub struct ArticleConfig {
    /// Project name
    pub title: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Optional project link
    pub url: Option<String>,
    /// Tasks belonging to the article
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

/// Configuration for a single task
#[derive(Debug, Deserialize, Clone)]
pub struct TaskConfig {
    /// What to do
    pub title: String,
    /// `daily`, `weekly` or `once`
    pub frequency: TaskFrequency,
}

/// Loads catalog configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or a frequency is unknown
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_catalog_config() {
        let toml_str = r#"
            [[articles]]
            title = "LayerZero"
            description = "Omnichain messaging"
            url = "https://layerzero.network"

            [[articles.tasks]]
            title = "Bridge to Arbitrum"
            frequency = "weekly"

            [[articles.tasks]]
            title = "Check in"
            frequency = "daily"

            [[articles]]
            title = "Scroll"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.articles.len(), 2);
        assert_eq!(config.articles[0].tasks.len(), 2);
        assert_eq!(config.articles[0].tasks[0].frequency, TaskFrequency::Weekly);
        assert_eq!(config.articles[0].tasks[1].frequency, TaskFrequency::Daily);
        assert!(config.articles[1].tasks.is_empty());
        assert!(config.articles[1].url.is_none());
    }

    #[test]
    fn test_unknown_frequency_is_rejected() {
        let toml_str = r#"
            [[articles]]
            title = "Bad"

            [[articles.tasks]]
            title = "Whenever"
            frequency = "hourly"
        "#;

        assert!(toml::from_str::<Config>(toml_str).is_err());
    }
}
