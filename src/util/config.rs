//! Configuration file support for wsbundle.
//!
//! wsbundle reads two configuration files:
//! - Global: `<config dir>/config.toml` - User-wide defaults
//! - Project: `<workspace root>/.wsbundle/config.toml` - Workspace overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ops::{ArchiveFormat, Layout};

/// wsbundle configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Packaging settings
    pub package: PackageConfig,

    /// Resolution settings
    pub resolve: ResolveConfig,
}

/// Packaging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Build directory, relative to the workspace root
    pub build_dir: Option<PathBuf>,

    /// Directory archives are written to, relative to the workspace root
    pub output_dir: Option<PathBuf>,

    /// Archive format (zip, tar-gz)
    pub format: Option<String>,

    /// Bundle layout (flat, layered)
    pub layout: Option<String>,

    /// Run the package's build script (default: true)
    pub build: Option<bool>,

    /// Package manager used to run the build script (e.g. yarn, npm, pnpm)
    pub package_manager: Option<String>,
}

/// Resolution configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Follow optionalDependencies (default: true)
    pub include_optional: Option<bool>,

    /// Fail when resolution reports warnings
    pub deny_warnings: bool,

    /// Extra modules directories searched after the workspace root
    pub extra_search_paths: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Package settings
        if other.package.build_dir.is_some() {
            self.package.build_dir = other.package.build_dir;
        }
        if other.package.output_dir.is_some() {
            self.package.output_dir = other.package.output_dir;
        }
        if other.package.format.is_some() {
            self.package.format = other.package.format;
        }
        if other.package.layout.is_some() {
            self.package.layout = other.package.layout;
        }
        if other.package.build.is_some() {
            self.package.build = other.package.build;
        }
        if other.package.package_manager.is_some() {
            self.package.package_manager = other.package.package_manager;
        }

        // Resolve settings
        if other.resolve.include_optional.is_some() {
            self.resolve.include_optional = other.resolve.include_optional;
        }
        if other.resolve.deny_warnings {
            self.resolve.deny_warnings = true;
        }
        if !other.resolve.extra_search_paths.is_empty() {
            self.resolve.extra_search_paths = other.resolve.extra_search_paths;
        }
    }

    /// Parse the archive format from config string.
    pub fn format(&self) -> Option<ArchiveFormat> {
        self.package.format.as_ref().and_then(|s| s.parse().ok())
    }

    /// Parse the bundle layout from config string.
    pub fn layout(&self) -> Option<Layout> {
        self.package.layout.as_ref().and_then(|s| s.parse().ok())
    }

    /// Whether to run build scripts.
    pub fn build(&self) -> bool {
        self.package.build.unwrap_or(true)
    }

    /// Whether to follow optional dependencies.
    pub fn include_optional(&self) -> bool {
        self.resolve.include_optional.unwrap_or(true)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.wsbundle/config.toml)
/// 2. Global config (<config dir>/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if let Some(global_path) = global_path.filter(|p| p.exists()) {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}
