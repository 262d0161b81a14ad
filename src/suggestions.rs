//! # Error Suggestions
//!
//! Errors raised by the commands should say what went wrong and how to fix
//! it. These helpers build `anyhow` errors with `hint:` lines attached.
//!
//! ```rust,ignore
//! use portage_admin::suggestions;
//!
//! return Err(suggestions::no_distfiles_hosts());
//! ```

use std::path::Path;

/// The `--config` file does not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Omit --config to use {default} or the built-in defaults\n\
         hint: Check the PORTAGE_ADMIN_CONFIG environment variable",
        path = path.display(),
        default = crate::defaults::default_config_path().display()
    )
}

/// The installed package database is missing.
pub fn vdb_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Installed package database not found: {path}\n\n\
         hint: Set 'vdb:' in the configuration if packages live elsewhere",
        path = path.display()
    )
}

/// The emerge log is missing.
pub fn emerge_log_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Emerge log not found: {path}\n\n\
         hint: Use --log <FILE> or set 'emerge_log:' in the configuration",
        path = path.display()
    )
}

/// An exclude pattern failed to compile.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid exclude pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Patterns match 'category/name', e.g. 'virtual/*' or 'acct-*/*'\n\
         hint: Use [abc] for character classes, [!abc] to negate"
    )
}

/// `distfiles` was run with no hosts configured.
pub fn no_distfiles_hosts() -> anyhow::Error {
    anyhow::anyhow!(
        "No hosts are configured for the shared distfiles directory\n\n\
         hint: Every host using the directory must be listed under 'distfiles.hosts'\n\
         hint: Without every keep-list, files still needed elsewhere would be deleted"
    )
}

/// A duration argument could not be parsed.
pub fn invalid_duration(input: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid duration: '{input}'\n\n\
         hint: Use a number followed by a unit (s, m, h, d, w), e.g. '180d' or '2w'"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_includes_hints() {
        let message = config_not_found(Path::new("/etc/nope.yaml")).to_string();
        assert!(message.contains("Configuration file not found: /etc/nope.yaml"));
        assert!(message.contains("hint:"));
        assert!(message.contains("PORTAGE_ADMIN_CONFIG"));
    }

    #[test]
    fn test_invalid_glob_includes_error() {
        let error = glob::Pattern::new("dev-libs/[").unwrap_err();
        let message = invalid_glob("dev-libs/[", &error).to_string();
        assert!(message.contains("Invalid exclude pattern: dev-libs/["));
        assert!(message.contains("error:"));
        assert!(message.contains("category/name"));
    }

    #[test]
    fn test_no_hosts_explains_risk() {
        let message = no_distfiles_hosts().to_string();
        assert!(message.contains("distfiles.hosts"));
    }

    #[test]
    fn test_invalid_duration_shows_input() {
        let message = invalid_duration("soon").to_string();
        assert!(message.contains("'soon'"));
        assert!(message.contains("180d"));
    }
}
