//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::engine::{EngineSettings, ScorerWeights, DEFAULT_HISTORY_LIMIT};
use crate::storage::{default_database_path, DatabaseConfig};

/// Curio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file path. `None` uses the platform config directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name the system answers to when greeted
    pub name: String,
    pub happiness_weight: f64,
    pub knowledge_weight: f64,
    pub flow_weight: f64,
    pub history_limit: usize,
    pub use_scorer: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        let weights = ScorerWeights::default();
        Self {
            storage: StorageConfig {
                path: None,
                max_connections: 5,
            },
            engine: EngineConfig {
                name: "curio".to_string(),
                happiness_weight: weights.happiness,
                knowledge_weight: weights.knowledge,
                flow_weight: weights.flow,
                history_limit: DEFAULT_HISTORY_LIMIT,
                use_scorer: true,
                debug: false,
            },
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("CURIO_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("curio")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            // Return default config without creating file
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.max_connections == 0 {
            return Err(anyhow!("storage.max_connections must be at least 1"));
        }
        if self.engine.name.trim().is_empty() || self.engine.name.contains(char::is_whitespace) {
            return Err(anyhow!("engine.name must be a single non-empty word"));
        }
        for (key, weight) in [
            ("engine.happiness_weight", self.engine.happiness_weight),
            ("engine.knowledge_weight", self.engine.knowledge_weight),
            ("engine.flow_weight", self.engine.flow_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(anyhow!("{} must be a non-negative number", key));
            }
        }
        if self.engine.history_limit == 0 {
            return Err(anyhow!("engine.history_limit must be at least 1"));
        }
        Ok(())
    }

    /// The database configuration this config describes
    pub fn database_config(&self) -> DatabaseConfig {
        let path = self
            .storage
            .path
            .clone()
            .unwrap_or_else(default_database_path);
        DatabaseConfig::with_path(path).max_connections(self.storage.max_connections)
    }

    /// The engine settings this config describes
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            name: self.engine.name.clone(),
            weights: ScorerWeights {
                happiness: self.engine.happiness_weight,
                knowledge: self.engine.knowledge_weight,
                flow: self.engine.flow_weight,
            },
            history_limit: self.engine.history_limit,
            use_scorer: self.engine.use_scorer,
            debug: self.engine.debug,
        }
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // Storage settings
            "storage.path" => Ok(self
                .storage
                .path
                .clone()
                .unwrap_or_else(default_database_path)
                .display()
                .to_string()),
            "storage.max_connections" => Ok(self.storage.max_connections.to_string()),

            // Engine settings
            "engine.name" => Ok(self.engine.name.clone()),
            "engine.happiness_weight" => Ok(self.engine.happiness_weight.to_string()),
            "engine.knowledge_weight" => Ok(self.engine.knowledge_weight.to_string()),
            "engine.flow_weight" => Ok(self.engine.flow_weight.to_string()),
            "engine.history_limit" => Ok(self.engine.history_limit.to_string()),
            "engine.use_scorer" => Ok(self.engine.use_scorer.to_string()),
            "engine.debug" => Ok(self.engine.debug.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `curio config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            // Storage settings
            "storage.path" => {
                self.storage.path = Some(PathBuf::from(value));
            }
            "storage.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_connections must be at least 1"));
                }
                self.storage.max_connections = max;
            }

            // Engine settings
            "engine.name" => {
                if value.trim().is_empty() || value.contains(char::is_whitespace) {
                    return Err(anyhow!("engine.name must be a single non-empty word"));
                }
                self.engine.name = value.to_string();
            }
            "engine.happiness_weight" | "engine.knowledge_weight" | "engine.flow_weight" => {
                let weight: f64 = value
                    .parse()
                    .with_context(|| format!("Invalid weight value: {}", value))?;
                if !weight.is_finite() || weight < 0.0 {
                    return Err(anyhow!("Weights must be non-negative numbers"));
                }
                match key {
                    "engine.happiness_weight" => self.engine.happiness_weight = weight,
                    "engine.knowledge_weight" => self.engine.knowledge_weight = weight,
                    _ => self.engine.flow_weight = weight,
                }
            }
            "engine.history_limit" => {
                let limit: usize = value
                    .parse()
                    .with_context(|| format!("Invalid history_limit value: {}", value))?;
                if limit == 0 {
                    return Err(anyhow!("history_limit must be at least 1"));
                }
                self.engine.history_limit = limit;
            }
            "engine.use_scorer" => {
                self.engine.use_scorer = value
                    .parse()
                    .with_context(|| format!("Invalid use_scorer value: {} (expected true or false)", value))?;
            }
            "engine.debug" => {
                self.engine.debug = value
                    .parse()
                    .with_context(|| format!("Invalid debug value: {} (expected true or false)", value))?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `curio config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "storage.path",
            "storage.max_connections",
            "engine.name",
            "engine.happiness_weight",
            "engine.knowledge_weight",
            "engine.flow_weight",
            "engine.history_limit",
            "engine.use_scorer",
            "engine.debug",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_settings() {
        let config = Config::default();
        let settings = config.engine_settings();

        assert_eq!(settings.name, "curio");
        assert_eq!(settings.weights, ScorerWeights::default());
        assert_eq!(settings.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(settings.use_scorer);
        assert!(!settings.debug);
    }

    #[test]
    fn test_set_and_get_round_trip() {
        let mut config = Config::default();

        config.set("engine.knowledge_weight", "3.5").unwrap();
        assert_eq!(config.get("engine.knowledge_weight").unwrap(), "3.5");

        config.set("engine.use_scorer", "false").unwrap();
        assert_eq!(config.get("engine.use_scorer").unwrap(), "false");

        config.set("storage.path", "/tmp/test.db").unwrap();
        assert_eq!(config.get("storage.path").unwrap(), "/tmp/test.db");
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();

        assert!(config.set("engine.happiness_weight", "-1").is_err());
        assert!(config.set("engine.happiness_weight", "warm").is_err());
        assert!(config.set("engine.history_limit", "0").is_err());
        assert!(config.set("engine.name", "two words").is_err());
        assert!(config.set("storage.max_connections", "0").is_err());
        assert!(config.set("no.such.key", "1").is_err());
    }

    #[test]
    fn test_list_covers_every_key() {
        let config = Config::default();
        let entries = config.list().unwrap();

        assert_eq!(entries.len(), 9);
        assert!(entries.iter().any(|(k, _)| k == "engine.knowledge_weight"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.set("engine.name", "sprout").unwrap();
        config.set("engine.flow_weight", "2.25").unwrap();

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.engine.name, "sprout");
        assert_eq!(parsed.engine.flow_weight, 2.25);
        assert_eq!(parsed.storage.max_connections, 5);
    }

    #[test]
    fn test_validate_catches_bad_fields() {
        let mut config = Config::default();
        config.engine.history_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.engine.knowledge_weight = f64::NAN;
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }
}
