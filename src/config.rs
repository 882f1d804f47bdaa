use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::persona::PersonalityTrait;
use crate::provider::{AIConfig, AIProvider};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub default_provider: String,
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub persona: PersonaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub default_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Seed values for the persona; persisted state takes precedence once a
/// state file exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub name: String,
    pub description: String,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub traits: Vec<PersonalityTrait>,
}

fn default_learning_rate() -> f64 {
    0.1
}

impl Default for PersonaConfig {
    fn default() -> Self {
        PersonaConfig {
            name: "Nigel".to_string(),
            description: "A friendly and knowledgeable AI assistant with a unique personality."
                .to_string(),
            learning_rate: default_learning_rate(),
            traits: vec![
                PersonalityTrait::new(
                    "Friendliness",
                    "Always maintains a warm and approachable demeanor",
                    0.9,
                    0.8,
                ),
                PersonalityTrait::new(
                    "Knowledge",
                    "Possesses extensive knowledge across various domains",
                    0.8,
                    0.7,
                ),
            ],
        }
    }
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("nigel")
        });

        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");

        if config_path.exists() {
            let config_str =
                std::fs::read_to_string(&config_path).context("Failed to read config.json")?;
            let mut config: Config =
                serde_json::from_str(&config_str).context("Failed to parse config.json")?;
            config.data_dir = data_dir;
            config.apply_env_keys();
            return Ok(config);
        }

        let config = Self::default_config(data_dir);
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.data_dir.join("config.json");
        let json_str = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, json_str).context("Failed to write config.json")?;
        Ok(())
    }

    fn default_config(data_dir: PathBuf) -> Self {
        let mut providers = HashMap::new();

        providers.insert(
            "gemini".to_string(),
            ProviderConfig {
                default_model: "gemini-2.0-flash".to_string(),
                host: None,
                api_key: std::env::var("GEMINI_API_KEY").ok(),
            },
        );

        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                default_model: "gpt-4o-mini".to_string(),
                host: None,
                api_key: std::env::var("OPENAI_API_KEY").ok(),
            },
        );

        providers.insert(
            "ollama".to_string(),
            ProviderConfig {
                default_model: "qwen2.5".to_string(),
                host: Some("http://localhost:11434".to_string()),
                api_key: None,
            },
        );

        Config {
            data_dir,
            default_provider: "gemini".to_string(),
            providers,
            persona: PersonaConfig::default(),
        }
    }

    // Environment variables fill in API keys the config file leaves empty.
    fn apply_env_keys(&mut self) {
        for (name, var) in [("gemini", "GEMINI_API_KEY"), ("openai", "OPENAI_API_KEY")] {
            if let Some(provider) = self.providers.get_mut(name) {
                if provider.api_key.as_ref().map_or(true, |key| key.is_empty()) {
                    provider.api_key = std::env::var(var).ok();
                }
            }
        }
    }

    pub fn get_provider(&self, provider_name: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider_name)
    }

    pub fn get_ai_config(&self, provider: Option<String>, model: Option<String>) -> Result<AIConfig> {
        let provider_name = provider.as_deref().unwrap_or(&self.default_provider);
        let provider_config = self
            .get_provider(provider_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown provider: {}", provider_name))?;

        let ai_provider: AIProvider = provider_name.parse()?;
        let model_name = model.unwrap_or_else(|| provider_config.default_model.clone());

        Ok(AIConfig {
            provider: ai_provider,
            model: model_name,
            api_key: provider_config.api_key.clone(),
            base_url: provider_config.host.clone(),
            max_tokens: Some(2048),
            temperature: Some(0.7),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_run_writes_default_config() {
        let dir = tempdir().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();

        assert!(dir.path().join("config.json").exists());
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.persona.name, "Nigel");
        assert_eq!(config.persona.traits.len(), 2);
        assert_eq!(config.persona.learning_rate, 0.1);
    }

    #[test]
    fn test_saved_changes_survive_reload() {
        let dir = tempdir().unwrap();
        let mut config = Config::new(Some(dir.path().to_path_buf())).unwrap();

        config.default_provider = "ollama".to_string();
        config.persona.name = "Marjorie".to_string();
        config.save().unwrap();

        let reloaded = Config::new(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(reloaded.default_provider, "ollama");
        assert_eq!(reloaded.persona.name, "Marjorie");
    }

    #[test]
    fn test_get_ai_config_resolves_defaults_and_overrides() {
        let dir = tempdir().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();

        let ai_config = config.get_ai_config(None, None).unwrap();
        assert_eq!(ai_config.provider, AIProvider::Gemini);
        assert_eq!(ai_config.model, "gemini-2.0-flash");

        let ai_config = config
            .get_ai_config(Some("ollama".to_string()), Some("llama3".to_string()))
            .unwrap();
        assert_eq!(ai_config.provider, AIProvider::Ollama);
        assert_eq!(ai_config.model, "llama3");
        assert_eq!(ai_config.base_url.as_deref(), Some("http://localhost:11434"));

        assert!(config.get_ai_config(Some("mystery".to_string()), None).is_err());
    }
}
