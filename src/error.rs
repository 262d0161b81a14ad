//! # Error Handling
//!
//! This module defines the error type shared by every part of the
//! `portage-admin` library. It uses `thiserror` to build an `Error` enum
//! whose variants carry enough context to produce a useful message on their
//! own.
//!
//! ## Key Components
//!
//! - **`Error`**: Every failure the library can report, from a malformed
//!   package identifier to a package manager invocation that exited
//!   non-zero.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Note that a package identifier without a recognizable version is *not*
//! an error. [`crate::version::split_package_identifier`] reports it as a
//! `ParsedPackage` with no name or version so callers can skip the entry.

use thiserror::Error;

/// Main error type for portage-admin operations
#[derive(Error, Debug)]
pub enum Error {
    /// A package identifier did not contain exactly one `/` separating the
    /// category from the name and version.
    #[error("Invalid package identifier '{id}': expected exactly one '/' between category and package")]
    InvalidIdentifier { id: String },

    /// The configuration file could not be parsed.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The installed package database could not be read.
    #[error("Package database error: {message}")]
    Vdb { message: String },

    /// An external command could not be started or exited unsuccessfully.
    #[error("Command failed: {command} - {message}")]
    Command { command: String, message: String },

    /// A host's distfile keep-list could not be collected.
    #[error("Distfiles error for host {host}: {message}")]
    Distfiles { host: String, message: String },

    /// A duration string such as `30d` could not be parsed.
    #[error("Invalid duration '{input}': {message}")]
    Duration { input: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
