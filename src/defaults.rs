//! Default values for portage-admin configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Application directory name under the XDG config/state/cache roots.
pub const APP_DIR: &str = "portage-admin";

/// Installed package database.
pub const DEFAULT_VDB: &str = "/var/db/pkg";

/// Package manager log.
pub const DEFAULT_EMERGE_LOG: &str = "/var/log/emerge.log";

/// Download cache shared between hosts.
pub const DEFAULT_DISTDIR: &str = "/var/cache/distfiles";

/// Packages built longer ago than this are rebuild candidates.
pub const DEFAULT_REBUILD_AGE: &str = "180d";

/// Atoms handed to a single package manager invocation.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Returns the default configuration file path.
///
/// Uses the platform-appropriate config directory, e.g.
/// `~/.config/portage-admin/config.yaml` on Linux. Falls back to
/// `portage-admin.yaml` in the current directory if it cannot be determined.
///
/// This can be overridden by the `--config` CLI flag or the
/// `PORTAGE_ADMIN_CONFIG` environment variable.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join("config.yaml"))
        .unwrap_or_else(|| PathBuf::from("portage-admin.yaml"))
}

/// Returns the default location of the persisted rebuild queue.
///
/// Prefers the XDG state directory and falls back to the cache directory,
/// then to the current directory.
pub fn default_queue_file() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("rebuild-queue.yaml")
}

/// Default package manager invocation for rebuilds.
pub fn default_rebuild_command() -> Vec<String> {
    vec!["emerge".to_string(), "--oneshot".to_string()]
}
