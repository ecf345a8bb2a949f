use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub ai: AIConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AIConfig {
    pub provider: AIProvider,
    pub model: String,
    pub max_tokens: u32,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    #[serde(skip)]
    pub api_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum AIProvider {
    Anthropic,
    OpenAI,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContextConfig {
    pub enabled: bool,
    pub max_history_commands: usize,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            provider: AIProvider::Anthropic,
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 1024,
            anthropic_api_key: None,
            openai_api_key: None,
            api_url: None,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_history_commands: 10,
        }
    }
}

impl AIConfig {
    // Config file first, environment variable as fallback.
    pub fn resolve_api_key(&self) -> Option<String> {
        let (configured, env_var) = match self.provider {
            AIProvider::Anthropic => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
            AIProvider::OpenAI => (&self.openai_api_key, "OPENAI_API_KEY"),
        };

        configured
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| env::var(env_var).ok().filter(|key| !key.is_empty()))
    }
}

impl Config {
    pub fn create_default(path: &Path) -> Result<()> {
        let config = Config {
            ai: AIConfig::default(),
            context: ContextConfig::default(),
        };

        let content = toml::to_string_pretty(&config)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "sigil", "sigil")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
