//! Configuration for brew-pkg
//!
//! Values come from, lowest precedence first: built-in defaults, the TOML
//! config file, then `HOMEBREW_PREFIX` / `HOMEBREW_CELLAR` from the
//! environment. Command-line flags are applied on top by the caller.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Identifier prefix used when neither the config nor the CLI sets one.
pub const DEFAULT_IDENTIFIER_PREFIX: &str = "org.homebrew";

/// Name of the packaging tool looked up on `PATH` by default.
pub const DEFAULT_PKGBUILD: &str = "pkgbuild";

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigToml {
    identifier_prefix: Option<String>,
    homebrew_prefix: Option<PathBuf>,
    homebrew_cellar: Option<PathBuf>,
    pkgbuild: Option<PathBuf>,
}

/// Resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default identifier prefix, e.g. `org.homebrew`
    pub identifier_prefix: String,
    /// Homebrew installation prefix, mirrored inside the staging root
    pub homebrew_prefix: PathBuf,
    /// Directory holding installed kegs
    pub homebrew_cellar: PathBuf,
    /// Packaging tool to invoke
    pub pkgbuild: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let prefix = default_homebrew_prefix();
        Self {
            identifier_prefix: DEFAULT_IDENTIFIER_PREFIX.to_string(),
            homebrew_cellar: prefix.join("Cellar"),
            homebrew_prefix: prefix,
            pkgbuild: PathBuf::from(DEFAULT_PKGBUILD),
        }
    }
}

/// Homebrew's default prefix for the current platform.
pub fn default_homebrew_prefix() -> PathBuf {
    if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        PathBuf::from("/opt/homebrew")
    } else {
        PathBuf::from("/usr/local")
    }
}

/// Location of the config file: `$BREW_PKG_CONFIG`, else
/// `<config dir>/brew-pkg/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BREW_PKG_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("brew-pkg").join("config.toml"))
}

impl Config {
    /// Load defaults, the config file (if present) and environment overrides.
    pub fn load() -> Result<Self> {
        let file = match config_path() {
            Some(path) if path.is_file() => Some(read_config_file(&path)?),
            _ => None,
        };

        Ok(Self::resolve(
            file.unwrap_or_default(),
            std::env::var_os("HOMEBREW_PREFIX").map(PathBuf::from),
            std::env::var_os("HOMEBREW_CELLAR").map(PathBuf::from),
        ))
    }

    fn resolve(
        file: ConfigToml,
        env_prefix: Option<PathBuf>,
        env_cellar: Option<PathBuf>,
    ) -> Self {
        let defaults = Config::default();

        let homebrew_prefix = env_prefix
            .or(file.homebrew_prefix)
            .unwrap_or(defaults.homebrew_prefix);
        // The Cellar follows the prefix unless pinned explicitly.
        let homebrew_cellar = env_cellar
            .or(file.homebrew_cellar)
            .unwrap_or_else(|| homebrew_prefix.join("Cellar"));

        Self {
            identifier_prefix: file
                .identifier_prefix
                .map(|p| p.trim_end_matches('.').to_string())
                .unwrap_or(defaults.identifier_prefix),
            homebrew_prefix,
            homebrew_cellar,
            pkgbuild: file.pkgbuild.unwrap_or(defaults.pkgbuild),
        }
    }
}

fn read_config_file(path: &Path) -> Result<ConfigToml> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
