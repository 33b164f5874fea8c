//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/graphshift/config.toml` (XDG) or platform config dir
//! 2. Project config: `.graphshift.toml`
//! 3. Environment variables: `GRAPHSHIFT_*`
//!
//! # Intended Usage
//!
//! **Global config** (`~/.config/graphshift/config.toml`):
//! ```toml
//! [neo4j]
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//! password = "password"
//! ```
//!
//! **Project config** (`.graphshift.toml` next to the migrations):
//! ```toml
//! [neo4j]
//! database = "library"
//!
//! [migrations]
//! batch_size = 500
//! ```
//!
//! Environment variables are split on `_`, so `GRAPHSHIFT_NEO4J_URI` sets
//! `neo4j.uri`.

use std::ops::Deref;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub migrations: MigrationsConfig,
}

/// Neo4j connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Neo4jConfig {
    /// Bolt URI (required). Example: `bolt://localhost:7687`
    pub uri: String,
    /// Username, defaults to `neo4j`.
    #[serde(default = "default_user")]
    pub user: String,
    pub password: Option<String>,
    /// Target database; the server default when unset.
    pub database: Option<String>,
}

/// Settings for the migration helpers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MigrationsConfig {
    /// Maximum number of nodes updated per id-population batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Default number of nodes per id-population batch.
pub const DEFAULT_BATCH_SIZE: usize = 900;

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(Self::user_config_path(), Path::new(".graphshift.toml"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Load config from a single file, still honouring `GRAPHSHIFT_*` overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(MigrationsDefaults::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("GRAPHSHIFT_").split("_"))
            .extract()
            .map_err(ConfigError::from)
    }

    fn figment(user_config: std::path::PathBuf, project_config: &Path) -> Figment {
        Figment::from(Serialized::defaults(MigrationsDefaults::default()))
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(project_config))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("GRAPHSHIFT_").split("_"))
    }

    /// User config path: ~/.config/graphshift/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("graphshift").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("graphshift").join("config.toml"))
            .unwrap_or_default()
    }
}

/// Seed layer so `[migrations]` resolves even when no file mentions it.
#[derive(Debug, Default, Serialize)]
struct MigrationsDefaults {
    migrations: MigrationsConfig,
}
