//! Application configuration for econpub.
//!
//! User config lives at `~/.econpub/econpub.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EconpubError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "econpub.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".econpub";

/// Browser-like User-Agent sent with every request.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:129.0) Gecko/20100101 Firefox/129.0";

// ---------------------------------------------------------------------------
// Config structs (matching econpub.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Session cookie settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Document compiler settings.
    #[serde(default)]
    pub compiler: CompilerConfig,
}

impl AppConfig {
    /// Editions root: the override when given, else `[defaults].editions_dir`.
    pub fn editions_root(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.defaults.editions_dir))
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Root directory holding every edition's artifacts.
    #[serde(default = "default_editions_dir")]
    pub editions_dir: String,

    /// Publication origin.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout. Unset means the HTTP client's defaults apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            editions_dir: default_editions_dir(),
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: None,
        }
    }
}

fn default_editions_dir() -> String {
    "./editions".into()
}
fn default_base_url() -> String {
    "https://www.economist.com".into()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

/// `[session]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the env var holding the session cookie (never store the cookie itself).
    #[serde(default = "default_cookie_env")]
    pub cookie_env: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_env: default_cookie_env(),
        }
    }
}

fn default_cookie_env() -> String {
    "ECONOMIST_COOKIE".into()
}

/// `[compiler]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Document-to-e-book conversion program.
    #[serde(default = "default_program")]
    pub program: String,

    /// Ask the compiler for an auto-generated table of contents.
    #[serde(default = "default_true")]
    pub toc: bool,

    /// Extra arguments appended after the standard ones.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            toc: true,
            extra_args: Vec::new(),
        }
    }
}

fn default_program() -> String {
    "pandoc".into()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration threaded through every pipeline component.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory for all edition artifacts.
    pub editions_root: PathBuf,
    /// Publication origin, e.g. `https://www.economist.com`.
    pub base_url: Url,
    /// User-Agent header value.
    pub user_agent: String,
    /// Session cookie attached to every request.
    pub cookie: String,
    /// Optional per-request timeout.
    pub request_timeout: Option<Duration>,
    /// Document compiler settings.
    pub compiler: CompilerConfig,
}

impl PipelineConfig {
    /// Merge the file config with a resolved cookie and an optional editions dir override.
    pub fn from_app(
        config: &AppConfig,
        cookie: impl Into<String>,
        editions_dir: Option<&Path>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.defaults.base_url).map_err(|e| {
            EconpubError::config(format!(
                "invalid base_url '{}': {e}",
                config.defaults.base_url
            ))
        })?;

        Ok(Self {
            editions_root: config.editions_root(editions_dir),
            base_url,
            user_agent: config.defaults.user_agent.clone(),
            cookie: cookie.into(),
            request_timeout: config.defaults.request_timeout_secs.map(Duration::from_secs),
            compiler: config.compiler.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.econpub/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| EconpubError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.econpub/econpub.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EconpubError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| EconpubError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| EconpubError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| EconpubError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EconpubError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Pick the session cookie: an explicit value wins, otherwise the env var
/// named in `[session].cookie_env`.
pub fn resolve_cookie(config: &AppConfig, explicit: Option<&str>) -> Result<String> {
    if let Some(cookie) = explicit.filter(|c| !c.trim().is_empty()) {
        return Ok(cookie.to_string());
    }

    let var_name = &config.session.cookie_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(EconpubError::config(format!(
            "session cookie not found. Pass --cookie or set the {var_name} environment variable."
        ))),
    }
}
