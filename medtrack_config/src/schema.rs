use medtrack_core::GenerationConfig;
use medtrack_providers::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable that overrides `providers.gemini.api_key`.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const CONFIG_DIR: &str = "medtrack";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub gemini: GeminiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "GeminiConfig::default_model")]
    pub model: String,
    #[serde(default = "GeminiConfig::default_base_url")]
    pub base_url: String,
}

impl GeminiConfig {
    fn default_model() -> String {
        DEFAULT_MODEL.to_string()
    }

    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VisionConfig {
    #[serde(default = "VisionConfig::default_temperature")]
    pub temperature: f32,
    #[serde(default = "VisionConfig::default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "VisionConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            temperature: Self::default_temperature(),
            max_output_tokens: Self::default_max_output_tokens(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl VisionConfig {
    fn default_temperature() -> f32 {
        GenerationConfig::default().temperature
    }

    fn default_max_output_tokens() -> u32 {
        GenerationConfig::default().max_output_tokens
    }

    const fn default_timeout_secs() -> u64 {
        DEFAULT_TIMEOUT.as_secs()
    }

    #[must_use]
    pub const fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
        }
    }
}

impl DatabaseConfig {
    fn default_url() -> String {
        Config::config_dir().map_or_else(
            |_| "sqlite://medtrack.db?mode=rwc".to_string(),
            |dir| sqlite_url(&dir.join("medtrack.db")),
        )
    }
}

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

impl Config {
    fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'medtrack init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config = Self::from_json(&content)?;
        debug!("Loaded config from {}", config_path.display());

        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// API key for the vision service; the environment wins over the file.
    /// Empty when neither is set.
    #[must_use]
    pub fn api_key(&self) -> String {
        Self::resolve_api_key(
            std::env::var(API_KEY_ENV).ok(),
            &self.providers.gemini.api_key,
        )
    }

    fn resolve_api_key(from_env: Option<String>, from_file: &str) -> String {
        from_env
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| from_file.to_string())
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Config file contents with defaults and an empty API key.
    #[must_use]
    pub fn template(database_url: &str) -> String {
        let database_url =
            serde_json::to_string(database_url).unwrap_or_else(|_| "\"\"".to_string());
        let vision = VisionConfig::default();
        format!(
            r#"{{
  "providers": {{
    "gemini": {{
      "api_key": "",
      "model": "{DEFAULT_MODEL}",
      "base_url": "{DEFAULT_BASE_URL}"
    }}
  }},
  "vision": {{
    "temperature": {temperature},
    "max_output_tokens": {max_output_tokens},
    "timeout_secs": {timeout_secs}
  }},
  "database": {{
    "url": {database_url}
  }}
}}
"#,
            temperature = vision.temperature,
            max_output_tokens = vision.max_output_tokens,
            timeout_secs = vision.timeout_secs,
        )
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let database_url = sqlite_url(&config_dir.join("medtrack.db"));
        std::fs::write(&config_path, Self::template(&database_url))?;
        info!("Wrote config template to {}", config_path.display());

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and add your Gemini API key");
        println!("      (or export {API_KEY_ENV})");
        println!("   2. Run 'medtrack user add --email you@example.com'");
        println!("   3. Run 'medtrack scan <label.jpg> --user <id> --save'");
        println!();
        Ok(())
    }
}
