//! Configuration: the global `~/.elm-ui/config.toml`, the per-project
//! `elm-ui.json`, and the per-environment `config/<env>.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use elmui_util::errors::ElmUiError;
use serde::{Deserialize, Serialize};

/// File name of the per-project tool configuration.
pub const ELM_UI_CONFIG_FILE: &str = "elm-ui.json";

/// Environment variable consulted when no token is configured.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Global user configuration loaded from `~/.elm-ui/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

/// Package fetching settings from `[network]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Concurrent fetches during resolution and installation.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
    /// Deadline for one resolver call (a tag listing or a manifest), covering
    /// every retry. Derived from the retry budget when unset.
    #[serde(default, rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: Option<u64>,
    /// Attempts per request before a transient failure is surfaced.
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_url", rename = "api-url")]
    pub api_url: String,
    #[serde(default = "default_raw_url", rename = "raw-url")]
    pub raw_url: String,
    #[serde(default = "default_web_url", rename = "web-url")]
    pub web_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            timeout_secs: default_timeout_secs(),
            fetch_timeout_secs: None,
            retries: default_retries(),
            token: None,
            api_url: default_api_url(),
            raw_url: default_raw_url(),
            web_url: default_web_url(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured token, falling back to `GITHUB_TOKEN`.
    pub fn token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(GITHUB_TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }
}

fn default_jobs() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_raw_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_web_url() -> String {
    "https://github.com".to_string()
}

/// External compilers from `[build]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_elm_make", rename = "elm-make")]
    pub elm_make: String,
    #[serde(default = "default_sass")]
    pub sass: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            elm_make: default_elm_make(),
            sass: default_sass(),
        }
    }
}

fn default_elm_make() -> String {
    "elm-make".to_string()
}

fn default_sass() -> String {
    "sass".to_string()
}

impl GlobalConfig {
    /// Load the global configuration, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ElmUiError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            ElmUiError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        elmui_util::dirs_path().join("config.toml")
    }
}

/// Per-project `elm-ui.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElmUiConfig {
    /// Packages installed straight from a git ref instead of a version tag.
    #[serde(default, rename = "github-dependencies")]
    pub github_dependencies: BTreeMap<String, String>,
}

impl ElmUiConfig {
    /// Load `elm-ui.json` from `project_root`. A missing file means no settings.
    pub fn load(project_root: &Path) -> miette::Result<Self> {
        let path = project_root.join(ELM_UI_CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ElmUiError::Manifest {
            message: format!("Failed to read {ELM_UI_CONFIG_FILE}: {e}"),
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ElmUiError::Manifest {
                message: format!("Failed to parse {ELM_UI_CONFIG_FILE}: {e}"),
            }
            .into()
        })
    }
}

/// Path of the configuration file for `env`.
pub fn env_config_path(project_root: &Path, env: &str) -> PathBuf {
    project_root.join("config").join(format!("{env}.json"))
}

/// Read `config/<env>.json` as a JSON object.
///
/// A missing, unreadable, or non-object file is logged and treated as `{}`.
pub fn load_env_config(project_root: &Path, env: &str) -> serde_json::Value {
    let path = env_config_path(project_root, env);
    let empty = serde_json::Value::Object(serde_json::Map::new());

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Error reading environment configuration {}: {e}", path.display());
            return empty;
        }
    };
    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        Ok(_) => {
            tracing::warn!("{} is not a JSON object, ignoring it", path.display());
            empty
        }
        Err(e) => {
            tracing::warn!("Error reading environment configuration {}: {e}", path.display());
            empty
        }
    }
}
