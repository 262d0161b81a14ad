//! # Installed Package Database
//!
//! Reads the package manager's record of installed packages, laid out as
//! `<root>/<category>/<name>-<version>/` with one metadata file per key.
//! Only `BUILD_TIME` is needed here.
//!
//! Directory names are decomposed with
//! [`split_package_identifier`](crate::version::split_package_identifier).
//! Entries whose version cannot be recognized are skipped with a warning,
//! and in-flight merges (`-MERGING-*`) are skipped silently.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::version::{split_package_identifier, ParsedPackage};

/// Prefix the package manager uses for a package being merged.
const MERGING_PREFIX: &str = "-MERGING-";

/// One installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// `category/name-version` as found on disk.
    pub id: String,
    /// Decomposed identifier; always versioned.
    pub package: ParsedPackage,
    /// The package's vdb directory.
    pub path: PathBuf,
    /// Unix timestamp of the build, if recorded.
    pub build_time: Option<i64>,
}

impl InstalledPackage {
    /// `category/name`.
    pub fn key(&self) -> String {
        self.package.key().unwrap_or_else(|| self.id.clone())
    }

    /// `=category/name-version`.
    pub fn atom(&self) -> String {
        self.package
            .atom()
            .unwrap_or_else(|| format!("={}", self.id))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Scan the installed package database rooted at `root`.
///
/// Packages are returned sorted by identifier.
pub fn scan(root: &Path) -> Result<Vec<InstalledPackage>> {
    if !root.is_dir() {
        return Err(Error::Vdb {
            message: format!("{} is not a directory", root.display()),
        });
    }

    let mut packages = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(|e| Error::Vdb {
            message: e.to_string(),
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let (Some(category), Some(dir_name)) = (
            path.parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str()),
            entry.file_name().to_str(),
        ) else {
            warn!("Skipping non UTF-8 vdb entry {}", path.display());
            continue;
        };

        if dir_name.starts_with(MERGING_PREFIX) {
            debug!("Skipping in-flight merge {}/{}", category, dir_name);
            continue;
        }

        let id = format!("{}/{}", category, dir_name);
        let package = match split_package_identifier(&id) {
            Ok(package) if package.is_versioned() => package,
            Ok(_) => {
                warn!("Skipping {}: no version recognized", id);
                continue;
            }
            Err(e) => {
                warn!("Skipping {}: {}", id, e);
                continue;
            }
        };

        packages.push(InstalledPackage {
            build_time: read_build_time(path),
            path: path.to_path_buf(),
            package,
            id,
        });
    }

    debug!("Found {} installed packages in {}", packages.len(), root.display());
    Ok(packages)
}

/// Read the `BUILD_TIME` file of a vdb entry.
fn read_build_time(dir: &Path) -> Option<i64> {
    let content = fs::read_to_string(dir.join("BUILD_TIME")).ok()?;
    match content.trim().parse() {
        Ok(timestamp) => Some(timestamp),
        Err(_) => {
            warn!("Unparseable BUILD_TIME in {}", dir.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn add_package(root: &Path, id: &str, build_time: Option<&str>) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        if let Some(build_time) = build_time {
            fs::write(dir.join("BUILD_TIME"), build_time).unwrap();
        }
    }

    #[test]
    fn test_scan_reads_packages_and_build_times() {
        let temp = TempDir::new().unwrap();
        add_package(temp.path(), "sys-kernel/gentoo-sources-5.15.30", Some("1650000000\n"));
        add_package(temp.path(), "app-editors/vim-9.0.2167", Some("1700000000"));
        add_package(temp.path(), "x11-libs/gtk+-3.24.30", None);

        let packages = scan(temp.path()).unwrap();
        let ids: Vec<_> = packages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "app-editors/vim-9.0.2167",
                "sys-kernel/gentoo-sources-5.15.30",
                "x11-libs/gtk+-3.24.30",
            ]
        );
        assert_eq!(packages[0].build_time, Some(1700000000));
        assert_eq!(packages[1].build_time, Some(1650000000));
        assert_eq!(packages[1].key(), "sys-kernel/gentoo-sources");
        assert_eq!(packages[1].atom(), "=sys-kernel/gentoo-sources-5.15.30");
        assert_eq!(packages[2].build_time, None);
    }

    #[test]
    fn test_scan_skips_unversioned_merging_and_hidden() {
        let temp = TempDir::new().unwrap();
        add_package(temp.path(), "app-misc/foo", Some("1"));
        add_package(temp.path(), "app-misc/-MERGING-bar-1.0", Some("1"));
        add_package(temp.path(), "app-misc/.keep-1.0", Some("1"));
        add_package(temp.path(), ".cache/pkg-1.0", Some("1"));
        add_package(temp.path(), "app-misc/baz-2.0", Some("1"));
        fs::write(temp.path().join("app-misc/stray-file-1.0"), "").unwrap();

        let packages = scan(temp.path()).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].id, "app-misc/baz-2.0");
    }

    #[test]
    fn test_scan_bad_build_time_is_none() {
        let temp = TempDir::new().unwrap();
        add_package(temp.path(), "dev-libs/libfoo-1.0", Some("yesterday"));

        let packages = scan(temp.path()).unwrap();
        assert_eq!(packages[0].build_time, None);
    }

    #[test]
    fn test_scan_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = scan(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::Vdb { .. }));
    }
}
