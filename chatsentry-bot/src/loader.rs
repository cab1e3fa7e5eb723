//! Configuration loading for the bot process.
//!
//! The loader owns the path to the JSON settings file and the defaults
//! table. Loading never aborts the process: a missing file is created
//! from the defaults, and an unreadable or malformed file degrades to the
//! defaults with an error logged, so the bot always comes up with a
//! usable configuration.

use chatsentry_core::config::{ChatConfig, ConfigError, EventDefaults};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub struct ConfigLoader {
    path: PathBuf,
    defaults: EventDefaults,
}

impl ConfigLoader {
    pub fn new(path: impl AsRef<Path>, defaults: EventDefaults) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            defaults,
        }
    }

    /// Parse a configuration from an inline JSON document, then fill any
    /// missing event entries from the defaults. Unlike [`load_or_create`],
    /// a parse failure here is an error: the caller supplied the document
    /// explicitly and should hear about typos.
    ///
    /// [`load_or_create`]: Self::load_or_create
    pub fn from_json(&self, json: &str) -> Result<ChatConfig, ConfigError> {
        let mut config = ChatConfig::from_json(json)?;
        config.merge_defaults(&self.defaults);
        Ok(config)
    }

    /// Load the settings file, creating it from the defaults if absent.
    ///
    /// Any I/O or parse failure degrades to the defaults so a corrupt
    /// settings file never keeps the bot down.
    pub fn load_or_create(&self) -> ChatConfig {
        if !self.path.exists() {
            let config = self.defaults.to_config();
            match self.persist(&config) {
                Ok(()) => info!(path = %self.path.display(), "created default config file"),
                Err(e) => {
                    error!(error = %e, path = %self.path.display(), "failed to create config file; continuing with defaults")
                }
            }
            return config;
        }

        match self.read() {
            Ok(mut config) => {
                config.merge_defaults(&self.defaults);
                config
            }
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "failed to load config file; continuing with defaults");
                self.defaults.to_config()
            }
        }
    }

    fn read(&self) -> Result<ChatConfig, ConfigError> {
        let contents = fs::read_to_string(&self.path)?;
        ChatConfig::from_json(&contents)
    }

    fn persist(&self, config: &ChatConfig) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn loader_at(dir: &tempfile::TempDir) -> ConfigLoader {
        ConfigLoader::new(
            dir.path().join("chatsentry-config.json"),
            EventDefaults::canonical(),
        )
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let loader = loader_at(&dir);

        let config = loader.load_or_create();
        assert_eq!(config.pattern("follow"), Some("{user} just followed!"));
        assert!(dir.path().join("chatsentry-config.json").exists());

        // The created file round-trips.
        let reloaded = loader.load_or_create();
        assert_eq!(reloaded.pattern("follow"), config.pattern("follow"));
    }

    #[test]
    fn existing_file_is_merged_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chatsentry-config.json");
        fs::write(
            &path,
            r#"{ "patterns": { "tip": "{user} donated {amount}" } }"#,
        )
        .unwrap();

        let config = ConfigLoader::new(&path, EventDefaults::canonical()).load_or_create();
        assert_eq!(config.pattern("tip"), Some("{user} donated {amount}"));
        assert_eq!(config.pattern("raid"), Some("{user} raids with {viewers}"));
    }

    #[test]
    fn malformed_file_degrades_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chatsentry-config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = ConfigLoader::new(&path, EventDefaults::canonical()).load_or_create();
        assert_eq!(config.pattern("follow"), Some("{user} just followed!"));
    }

    #[test]
    fn inline_json_overrides_file_and_keeps_defaults() {
        let dir = tempdir().unwrap();
        let loader = loader_at(&dir);

        let config = loader
            .from_json(r#"{ "immediate_reaction": "!alert", "patterns": { "follow": "" } }"#)
            .unwrap();
        assert_eq!(config.immediate_reaction.as_deref(), Some("!alert"));
        assert_eq!(config.pattern("follow"), None);
        assert_eq!(config.pattern("sub"), Some("{user} just subscribed!"));
    }

    #[test]
    fn inline_json_parse_failure_is_an_error() {
        let dir = tempdir().unwrap();
        let loader = loader_at(&dir);
        assert!(matches!(
            loader.from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
