//! Global context for wsbundle operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::core::workspace::{find_workspace_root, WorkspaceError};
use crate::util::config::{load_config, Config};

/// Project directories for wsbundle
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "wsbundle", "wsbundle"));

/// Name of the project-local configuration directory.
pub const PROJECT_CONFIG_DIR: &str = ".wsbundle";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Directory holding the global config file
    config_dir: Option<PathBuf>,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        Ok(GlobalContext {
            cwd,
            config_dir: PROJECT_DIRS.as_ref().map(|d| d.config_dir().to_path_buf()),
            verbose: false,
            color: true,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Use a different global config directory.
    pub fn with_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config_dir = dir;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config_dir.as_ref().map(|d| d.join("config.toml"))
    }

    /// Get the project configuration file path for a workspace root.
    pub fn project_config_path(&self, root: &Path) -> PathBuf {
        root.join(PROJECT_CONFIG_DIR).join("config.toml")
    }

    /// Load the merged configuration for a workspace root.
    pub fn load_config(&self, root: &Path) -> Config {
        load_config(
            self.config_path().as_deref(),
            &self.project_config_path(root),
        )
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Find the workspace root, starting from cwd and searching upward.
    pub fn find_workspace_root(&self) -> Result<PathBuf, WorkspaceError> {
        find_workspace_root(&self.cwd)
    }

    /// Resolve an explicit `--root`, relative to cwd, or discover the root.
    pub fn workspace_root(&self, explicit: Option<&Path>) -> Result<PathBuf, WorkspaceError> {
        match explicit {
            // Collecting components drops interior `.` segments.
            Some(root) => Ok(self.cwd.join(root).components().collect()),
            None => self.find_workspace_root(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
        assert!(!ctx.is_verbose());
        assert_eq!(
            ctx.project_config_path(Path::new("/ws")),
            Path::new("/ws/.wsbundle/config.toml")
        );
    }

    #[test]
    fn test_find_workspace_root_from_member() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("package.json"),
            r#"{ "private": true, "workspaces": ["packages/*"] }"#,
        )
        .unwrap();
        let member = tmp.path().join("packages").join("api");
        std::fs::create_dir_all(&member).unwrap();
        std::fs::write(member.join("package.json"), r#"{ "name": "api" }"#).unwrap();

        let ctx = GlobalContext::with_cwd(member).unwrap();
        assert_eq!(ctx.find_workspace_root().unwrap(), tmp.path());
        assert_eq!(
            ctx.workspace_root(Some(tmp.path())).unwrap(),
            tmp.path()
        );
    }

    #[test]
    fn test_load_config_from_project() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(PROJECT_CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[resolve]\ndeny_warnings = true\n").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf())
            .unwrap()
            .with_config_dir(None);
        assert!(ctx.load_config(tmp.path()).resolve.deny_warnings);
    }
}
