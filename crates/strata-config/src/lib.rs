//! # strata-config
//!
//! Configuration management for Strata.
//!
//! Loads configuration from:
//! 1. `~/.strata/config.toml` (global)
//! 2. `.strata/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)

pub mod logging;
pub mod testing;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strata_path::{
    ErrorPolicy, OsFileSystem, PathResolver, ResolveError, SearchPathRegistry,
    DEFAULT_MAX_ALIAS_DEPTH, DEFAULT_MAX_SUBSTITUTIONS,
};
use tracing::{debug, warn};

pub use logging::LogLevel;

/// Default chunk size for streamed reads
pub const DEFAULT_READ_CHUNK_SIZE: usize = 16 * 1024;

/// Project-local config location, relative to the working directory
pub const PROJECT_CONFIG_PATH: &str = ".strata/config.toml";

/// Global config instance
static CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::load().unwrap_or_default()));

/// Get global config (read-only)
pub fn config() -> std::sync::RwLockReadGuard<'static, Config> {
    CONFIG.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reload config from disk
pub fn reload() -> Result<(), ConfigError> {
    let new_config = Config::load()?;
    *CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = new_config;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("invalid search paths: {0}")]
    SearchPaths(#[from] ResolveError),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub buffer: BufferConfig,
    pub logging: LoggingConfig,
    /// Alias prefix -> directories searched in order
    pub search_paths: BTreeMap<String, Vec<String>>,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let global = Self::global_config_path();
        Self::load_from(global.as_deref(), Some(Path::new(PROJECT_CONFIG_PATH)))
    }

    /// Load from explicit global/project files; missing files are skipped.
    ///
    /// Layers are merged key by key before deserialization, so a project file
    /// overrides exactly the keys it sets and nothing else.
    pub fn load_from(global: Option<&Path>, project: Option<&Path>) -> Result<Self, ConfigError> {
        let mut layered = toml::Table::new();

        // 1. Global config
        if let Some(global_path) = global.filter(|p| p.exists()) {
            debug!(component = "CONFIG", path = %global_path.display(), "Loading global config");
            layered = Self::read_table(global_path)?;
        }

        // 2. Project config - overrides global
        if let Some(project_path) = project.filter(|p| p.exists()) {
            debug!(component = "CONFIG", path = %project_path.display(), "Loading project config");
            merge_tables(&mut layered, Self::read_table(project_path)?);
        }

        let mut config: Config = toml::Value::Table(layered).try_into()?;

        // 3. Environment variable overrides
        config.apply_env_overrides();

        Ok(config)
    }

    fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(contents.parse::<toml::Table>()?)
    }

    /// Global config path: ~/.strata/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".strata/config.toml"))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(policy) = std::env::var("STRATA_ERROR_POLICY") {
            match policy.parse() {
                Ok(policy) => self.resolver.error_policy = policy,
                Err(e) => warn!(component = "CONFIG", error = %e, "Ignoring STRATA_ERROR_POLICY"),
            }
        }
        if let Ok(size) = std::env::var("STRATA_CHUNK_SIZE") {
            match size.parse::<usize>() {
                Ok(n) if n > 0 => self.buffer.read_chunk_size = n,
                _ => warn!(component = "CONFIG", value = %size, "Ignoring STRATA_CHUNK_SIZE"),
            }
        }
    }

    /// Search path registry described by the `[search_paths]` table.
    pub fn search_path_registry(&self) -> Result<SearchPathRegistry, ConfigError> {
        Ok(SearchPathRegistry::from_map(&self.search_paths)?)
    }

    /// A resolver over the host filesystem with this configuration applied.
    pub fn resolver(&self) -> Result<PathResolver<OsFileSystem>, ConfigError> {
        Ok(PathResolver::new(OsFileSystem)
            .with_search_paths(self.search_path_registry()?)
            .with_policy(self.resolver.error_policy)
            .with_max_substitutions(self.resolver.max_substitutions)
            .with_max_alias_depth(self.resolver.max_alias_depth))
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default config TOML string
    pub fn default_toml() -> String {
        Config::default().to_toml().unwrap_or_default()
    }
}

/// Overlay `overlay` onto `base`. Nested tables merge recursively; any other
/// value, arrays included, replaces what `base` had under that key.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Path resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// `lenient` absorbs stat failures, `strict` reports them
    pub error_policy: ErrorPolicy,
    /// Symlinks followed per path before reporting a loop
    pub max_substitutions: usize,
    /// Nesting limit for aliases that expand to other aliases
    pub max_alias_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::Lenient,
            max_substitutions: DEFAULT_MAX_SUBSTITUTIONS,
            max_alias_depth: DEFAULT_MAX_ALIAS_DEPTH,
        }
    }
}

/// Stream buffering configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Bytes requested per read from a stream
    pub read_chunk_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
        }
    }
}
