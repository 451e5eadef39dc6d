//! TOML configuration parsing and validation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use capture_harness_core::Session;

/// Environment variable consulted when `classifier.anon_key` is not set.
pub const ANON_KEY_ENV: &str = "CAPTURE_ANON_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Base URL of the managed functions endpoint. `None` disables classification.
    #[serde(default)]
    pub functions_url: Option<String>,
    #[serde(default = "default_function_name")]
    pub function_name: String,
    /// Fallback URL for the direct HTTP transport. Defaults to the managed URL.
    #[serde(default)]
    pub direct_url: Option<String>,
    /// Public (anon) credential.
    #[serde(default)]
    pub anon_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            functions_url: None,
            function_name: default_function_name(),
            direct_url: None,
            anon_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_function_name() -> String {
    "classify-capture".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl ClassifierConfig {
    pub fn is_enabled(&self) -> bool {
        self.functions_url.is_some()
    }

    /// `{functions_url}/{function_name}`, when a functions URL is configured.
    pub fn managed_url(&self) -> Option<String> {
        self.functions_url.as_ref().map(|base| {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                self.function_name.trim_matches('/')
            )
        })
    }

    pub fn direct_url(&self) -> Option<String> {
        self.direct_url.clone().or_else(|| self.managed_url())
    }

    /// Config value first, then the `CAPTURE_ANON_KEY` environment variable.
    pub fn resolve_anon_key(&self) -> Option<String> {
        self.anon_key
            .clone()
            .or_else(|| std::env::var(ANON_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

/// Default session for CLI commands.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl SessionConfig {
    /// The session for a CLI invocation. `--user` wins over the config file.
    pub fn resolve(&self, user_override: Option<&str>) -> Option<Session> {
        let user_id = user_override
            .map(str::to_string)
            .or_else(|| self.user_id.clone())
            .filter(|u| !u.trim().is_empty())?;
        let session = Session::new(user_id);
        Some(match &self.access_token {
            Some(token) => session.with_access_token(token.clone()),
            None => session,
        })
    }

    /// Like [`resolve`](Self::resolve), but a missing user is an error.
    pub fn require(&self, user_override: Option<&str>) -> Result<Session> {
        self.resolve(user_override).ok_or_else(|| {
            anyhow::anyhow!("no user: pass --user or set [session].user_id in the config")
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let classifier = &config.classifier;

    if classifier.timeout_secs == 0 {
        anyhow::bail!("classifier.timeout_secs must be > 0");
    }

    if classifier.function_name.trim_matches('/').is_empty() {
        anyhow::bail!("classifier.function_name must not be empty");
    }

    for (key, url) in [
        ("classifier.functions_url", &classifier.functions_url),
        ("classifier.direct_url", &classifier.direct_url),
    ] {
        if let Some(url) = url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{} must be an http(s) URL, got '{}'", key, url);
            }
        }
    }

    if classifier.direct_url.is_some() && classifier.functions_url.is_none() {
        anyhow::bail!("classifier.direct_url requires classifier.functions_url");
    }

    Ok(())
}
