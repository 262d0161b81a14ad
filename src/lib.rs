//! # Portage Administration Library
//!
//! Building blocks for the `portage-admin` command-line tool, which takes
//! care of chores on Gentoo hosts:
//!
//! - rebuilding installed packages whose last build is old,
//! - purging files from a download cache shared by several hosts once no
//!   host needs them,
//! - reporting how long packages take to build, from the package manager's
//!   log.
//!
//! ## Quick Example
//!
//! ```
//! use portage_admin::version::{is_version, split_package_identifier};
//!
//! assert!(is_version("5.15.30-r1"));
//!
//! let pkg = split_package_identifier("sys-kernel/gentoo-sources-5.15.30").unwrap();
//! assert_eq!(pkg.category, "sys-kernel");
//! assert_eq!(pkg.name.as_deref(), Some("gentoo-sources"));
//! assert_eq!(pkg.version.as_deref(), Some("5.15.30"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Identifiers (`version`)**: `category/name-version` strings are split
//!   at the leftmost hyphen followed by a valid version. Everything read
//!   from disk goes through [`version::split_package_identifier`].
//! - **Installed packages (`vdb`)**: a scan of the package database with
//!   each package's build time.
//! - **Rebuilds (`rebuild`)**: stale package selection, a persisted queue
//!   and batched package manager runs.
//! - **Shared downloads (`distfiles`)**: per-host keep-lists and the purge
//!   of files no host needs.
//! - **Build history (`emerge_log`)**: build durations and progress of
//!   running builds.
//! - **Configuration (`config`, `defaults`)**: the YAML file describing
//!   paths, policies and hosts.

pub mod config;
pub mod defaults;
pub mod distfiles;
pub mod duration;
pub mod emerge_log;
pub mod error;
pub mod output;
pub mod rebuild;
pub mod suggestions;
pub mod vdb;
pub mod version;

#[cfg(test)]
mod version_proptest;
