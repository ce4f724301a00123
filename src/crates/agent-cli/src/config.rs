//! Configuration loader with dual-location support
//!
//! Loads configuration from:
//! 1. Default values
//! 2. User-level config: ~/.agentctl/agentctl.toml
//! 3. Project-level config: ./.agentctl/agentctl.toml, or the file passed
//!    with `--config`
//!
//! A section present in a later file replaces that section from an earlier
//! one; sections a file leaves out are kept. String values written as
//! `${VAR}` are read from the environment after merging.
//!
//! ```toml
//! [llm]
//! base_url = "http://localhost:11434"
//! model = "llama3.1"
//! timeout_secs = 120
//! temperature = 0.0
//!
//! [prompts]
//! file = "prompts.yaml"
//! additional_instructions = "Answer in English."
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{bail, Context, Result};
use llm::LocalLlmConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Directory holding the config file, under home or the project root
pub const CONFIG_DIR: &str = ".agentctl";

/// Config file name
pub const CONFIG_FILE: &str = "agentctl.toml";

/// Fully merged configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmSection,

    #[serde(default)]
    pub prompts: PromptsSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[llm]`: the Ollama server and sampling options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: Option<f32>,
    pub json_mode: bool,
}

impl Default for LlmSection {
    fn default() -> Self {
        let defaults = LocalLlmConfig::default();
        Self {
            base_url: defaults.base_url,
            model: defaults.model,
            timeout_secs: defaults.timeout.as_secs(),
            max_retries: defaults.max_retries,
            temperature: defaults.temperature,
            json_mode: defaults.json_mode,
        }
    }
}

/// `[prompts]`: template overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsSection {
    /// YAML file mapping prompt roles to template text
    pub file: Option<String>,

    /// Appended to every agent's system prompt
    pub additional_instructions: String,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// The sections one file sets
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    prompts: Option<PromptsSection>,
    logging: Option<LoggingSection>,
}

impl AppConfig {
    /// Parse a single TOML document over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config = Self::default();
        config.merge(toml::from_str(content)?);
        Ok(config)
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(llm) = file.llm {
            self.llm = llm;
        }
        if let Some(prompts) = file.prompts {
            self.prompts = prompts;
        }
        if let Some(logging) = file.logging {
            self.logging = logging;
        }
    }

    /// Resolve `${VAR}` values from the process environment
    pub fn resolve_env_vars(&mut self) {
        self.resolve_env_vars_with(|name| std::env::var(name).ok());
    }

    /// Resolve `${VAR}` values through `lookup`
    ///
    /// Unknown variables leave the value as written.
    pub fn resolve_env_vars_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.llm.base_url = expand_env_var(&self.llm.base_url, &lookup);
        self.llm.model = expand_env_var(&self.llm.model, &lookup);
        if let Some(ref file) = self.prompts.file {
            self.prompts.file = Some(expand_env_var(file, &lookup));
        }
        self.prompts.additional_instructions =
            expand_env_var(&self.prompts.additional_instructions, &lookup);
    }

    /// Client settings for the `[llm]` section
    pub fn llm_config(&self) -> Result<LocalLlmConfig> {
        let mut config = LocalLlmConfig::new(&self.llm.base_url, &self.llm.model)
            .with_timeout(Duration::from_secs(self.llm.timeout_secs))
            .with_max_retries(self.llm.max_retries)
            .with_json_mode(self.llm.json_mode);
        if let Some(temperature) = self.llm.temperature {
            config = config.with_temperature(temperature);
        }
        config.validate().context("invalid [llm] configuration")?;
        Ok(config)
    }

    /// Like [`llm_config`](Self::llm_config), with JSON replies forced on
    pub fn json_llm_config(&self) -> Result<LocalLlmConfig> {
        Ok(self.llm_config()?.with_json_mode(true))
    }
}

fn expand_env_var<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(name) => lookup(name).unwrap_or_else(|| value.to_string()),
        None => value.to_string(),
    }
}

/// Configuration loader that handles both user and project configs
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    user_config_path: Option<PathBuf>,
    project_config_path: PathBuf,
    explicit: bool,
}

impl ConfigLoader {
    /// Loader for the standard locations
    pub fn new() -> Self {
        Self {
            user_config_path: dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE)),
            project_config_path: PathBuf::from(CONFIG_DIR).join(CONFIG_FILE),
            explicit: false,
        }
    }

    /// Loader reading the given user and project files
    pub fn with_paths(user: Option<PathBuf>, project: impl Into<PathBuf>) -> Self {
        Self {
            user_config_path: user,
            project_config_path: project.into(),
            explicit: false,
        }
    }

    /// Replace the project-level file with `path`, which must exist
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_config_path = path.into();
        self.explicit = true;
        self
    }

    /// User config path, when a home directory is known
    pub fn user_config_path(&self) -> Option<&Path> {
        self.user_config_path.as_deref()
    }

    /// Project (or explicit) config path
    pub fn project_config_path(&self) -> &Path {
        &self.project_config_path
    }

    /// Load configuration with project settings taking precedence
    pub async fn load(&self) -> Result<AppConfig> {
        let mut config = AppConfig::default();

        if let Some(ref user_path) = self.user_config_path {
            match Self::load_from_path(user_path).await? {
                Some(file) => {
                    debug!(path = %user_path.display(), "Loaded user-level config");
                    config.merge(file);
                }
                None => debug!(path = %user_path.display(), "User-level config not found"),
            }
        }

        match Self::load_from_path(&self.project_config_path).await? {
            Some(file) => {
                debug!(path = %self.project_config_path.display(), "Loaded project-level config");
                config.merge(file);
            }
            None if self.explicit => {
                bail!(
                    "Config file not found: {}",
                    self.project_config_path.display()
                );
            }
            None => debug!(
                path = %self.project_config_path.display(),
                "Project-level config not found"
            ),
        }

        config.resolve_env_vars();
        Ok(config)
    }

    async fn load_from_path(path: &Path) -> Result<Option<ConfigFile>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let file = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(Some(file))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_client_defaults() {
        let config = AppConfig::default();
        let llm = config.llm_config().unwrap();

        assert_eq!(llm, LocalLlmConfig::default());
        assert_eq!(config.logging.level, "warn");
        assert!(config.prompts.file.is_none());
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config = AppConfig::from_toml_str("[llm]\nmodel = \"mistral\"\n").unwrap();

        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.base_url, LlmSection::default().base_url);
    }

    #[test]
    fn test_json_llm_config_forces_json_mode() {
        let config = AppConfig::from_toml_str("[llm]\nmodel = \"qwen2\"\njson_mode = false\n").unwrap();

        assert!(!config.llm_config().unwrap().json_mode);
        let json = config.json_llm_config().unwrap();
        assert!(json.json_mode);
        assert_eq!(json.model, "qwen2");
    }

    #[test]
    fn test_out_of_range_retries_rejected() {
        let config = AppConfig::from_toml_str("[llm]\nmax_retries = 4000000000\n").unwrap();
        assert!(config.llm_config().is_err());
    }

    #[test]
    fn test_llm_config_conversion() {
        let config = AppConfig::from_toml_str(
            r#"
[llm]
base_url = "http://gpu-box:11434"
model = "qwen2"
timeout_secs = 30
max_retries = 0
temperature = 0.2
json_mode = true
"#,
        )
        .unwrap();

        let llm = config.llm_config().unwrap();
        assert_eq!(llm.base_url, "http://gpu-box:11434");
        assert_eq!(llm.timeout, Duration::from_secs(30));
        assert_eq!(llm.max_retries, 0);
        assert_eq!(llm.temperature, Some(0.2));
        assert!(llm.json_mode);
    }

    #[test]
    fn test_invalid_llm_section() {
        let config = AppConfig::from_toml_str("[llm]\nbase_url = \"gpu-box\"\n").unwrap();
        assert!(config.llm_config().is_err());
    }

    #[test]
    fn test_env_var_resolution() {
        let vars: HashMap<&str, &str> = [("AGENT_MODEL", "phi3"), ("PROMPTS", "/etc/prompts.yaml")]
            .into_iter()
            .collect();
        let mut config = AppConfig::from_toml_str(
            r#"
[llm]
model = "${AGENT_MODEL}"
base_url = "${UNSET_URL}"

[prompts]
file = "${PROMPTS}"
additional_instructions = "prefix ${AGENT_MODEL}"
"#,
        )
        .unwrap();

        config.resolve_env_vars_with(|name: &str| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.llm.model, "phi3");
        assert_eq!(config.llm.base_url, "${UNSET_URL}");
        assert_eq!(config.prompts.file.as_deref(), Some("/etc/prompts.yaml"));
        assert_eq!(config.prompts.additional_instructions, "prefix ${AGENT_MODEL}");
    }

    #[test]
    fn test_unknown_field_type_is_error() {
        assert!(AppConfig::from_toml_str("[llm]\ntimeout_secs = \"soon\"\n").is_err());
    }
}
