//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage:
//! - A throwaway project tree for files and symlinks
//! - An isolated home directory holding the global config
//!
//! # Usage
//!
//! ```ignore
//! use strata_config::testing::TestEnvironment;
//!
//! let env = TestEnvironment::new().unwrap();
//! env.create_dir("store/v2").unwrap();
//! env.symlink("store/v2", "current").unwrap();
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

use crate::{Config, ConfigError, PROJECT_CONFIG_PATH};

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Isolated test environment with its own project root and home directory
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Project root, with symlinks in the temp path already resolved
    pub project_root: PathBuf,
    /// Stand-in for `$HOME`
    pub home_dir: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        // /tmp may itself be a link (macOS), which would leak into resolved paths
        let root = std::fs::canonicalize(temp_dir.path())?;

        let project_root = root.join("project");
        let home_dir = root.join("home");
        std::fs::create_dir_all(&project_root)?;
        std::fs::create_dir_all(&home_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_root,
            home_dir,
            test_id,
        })
    }

    /// Absolute path of `relative_path` under the project root, as a string
    pub fn path(&self, relative_path: &str) -> String {
        self.project_root
            .join(relative_path)
            .to_string_lossy()
            .into_owned()
    }

    /// Create a test file with content
    pub fn create_file(&self, relative_path: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.project_root.join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Create a test directory
    pub fn create_dir(&self, relative_path: &str) -> anyhow::Result<PathBuf> {
        let path = self.project_root.join(relative_path);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Create a symlink at `link` (project-relative) pointing at `target`, stored verbatim
    pub fn symlink(&self, target: impl AsRef<Path>, link: &str) -> anyhow::Result<PathBuf> {
        let path = self.project_root.join(link);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::os::unix::fs::symlink(target, &path)?;
        Ok(path)
    }

    /// Path of the project config file
    pub fn project_config_path(&self) -> PathBuf {
        self.project_root.join(PROJECT_CONFIG_PATH)
    }

    /// Path of the global config file inside the isolated home
    pub fn global_config_path(&self) -> PathBuf {
        self.home_dir.join(".strata/config.toml")
    }

    /// Write `config` as the project config
    pub fn write_project_config(&self, config: &Config) -> Result<PathBuf, ConfigError> {
        write_config(&self.project_config_path(), config)
    }

    /// Write `config` as the global config
    pub fn write_global_config(&self, config: &Config) -> Result<PathBuf, ConfigError> {
        write_config(&self.global_config_path(), config)
    }

    /// Load config the way the CLI would inside this environment
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        Config::load_from(
            Some(&self.global_config_path()),
            Some(&self.project_config_path()),
        )
    }

    /// Environment variables for spawning the CLI against this environment.
    pub fn cli_env(&self) -> Vec<(String, String)> {
        vec![("HOME".to_string(), self.home_dir.to_string_lossy().into_owned())]
    }
}

fn write_config(path: &Path, config: &Config) -> Result<PathBuf, ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, config.to_toml()?)?;
    Ok(path.to_path_buf())
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
