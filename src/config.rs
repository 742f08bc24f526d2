//! TOML configuration: server binding, database path, token signing.
//!
//! Lives at `~/.jotter/config.toml` by default. `jotter init` writes a
//! fresh file with a randomly generated signing secret; the
//! `JOTTER_TOKEN_SECRET` environment variable overrides the file value.

use anyhow::{bail, Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured signing secret.
pub const TOKEN_SECRET_ENV: &str = "JOTTER_TOKEN_SECRET";

/// Secret byte length before hex encoding.
const SECRET_BYTES: usize = 32;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. Unset means `~/.jotter/jotter.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret for session tokens. Never committed to source;
    /// written by `jotter init` or supplied via `JOTTER_TOKEN_SECRET`.
    #[serde(default)]
    pub token_secret: String,
    /// Token lifetime in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3000
}

fn default_token_ttl_hours() -> u64 {
    720
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl Config {
    /// `~/.jotter` (parent of the default config and database files).
    pub fn jotter_dir() -> Result<PathBuf> {
        let home = directories::UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Ok(home.join(".jotter"))
    }

    /// Default config file location.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::jotter_dir()?.join("config.toml"))
    }

    /// Load from `path`, or the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            bail!(
                "No config found at {}. Run `jotter init` first.",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Fresh config with a randomly generated signing secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig {
                token_secret: hex::encode(bytes),
                token_ttl_hours: default_token_ttl_hours(),
            },
        }
    }

    /// Resolved SQLite file path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(p) => Ok(p.clone()),
            None => Ok(Self::jotter_dir()?.join("jotter.db")),
        }
    }

    /// Resolved signing secret. Environment takes priority over the file;
    /// the server refuses to start when neither is set.
    pub fn token_secret(&self) -> Result<String> {
        let env_value = std::env::var(TOKEN_SECRET_ENV).ok();
        match resolve_secret(env_value.as_deref(), &self.auth.token_secret) {
            Some(secret) => Ok(secret),
            None => bail!(
                "No token signing secret configured. Run `jotter init` or set {TOKEN_SECRET_ENV}."
            ),
        }
    }

    /// Token lifetime in seconds.
    pub fn token_ttl_secs(&self) -> u64 {
        self.auth.token_ttl_hours * 3600
    }
}

fn resolve_secret(env_value: Option<&str>, file_value: &str) -> Option<String> {
    if let Some(from_env) = env_value.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(from_env.to_string());
    }
    let from_file = file_value.trim();
    (!from_file.is_empty()).then(|| from_file.to_string())
}
