//! Shared test utilities for the CLI end-to-end tests.
//!
//! [`TestFixture`] builds a throwaway Gentoo-like layout in a temporary
//! directory (package database, emerge log, shared distfiles directory and
//! host keep-lists) together with a configuration file pointing at it.
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new()
//!     .with_package("app-editors/vim-9.0.2167", Some(1_000))
//!     .with_rebuild_command(&["true"]);
//! fixture.command().args(["rebuild", "list"]).assert().success();
//! ```

use std::path::{Path, PathBuf};

use assert_fs::prelude::*;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::logs;
    pub use super::TestFixture;
}

/// Emerge log excerpts.
#[allow(dead_code)]
pub mod logs {
    /// Two kernel builds, one vim build and a rust build still running.
    pub const MIXED: &str = "\
1650000000: Started emerge on: Apr 15, 2022 05:20:00
1650000010:  >>> emerge (1 of 2) sys-kernel/gentoo-sources-5.15.30 to /
1650000100:  ::: completed emerge (1 of 2) sys-kernel/gentoo-sources-5.15.30 to /
1650000110:  >>> emerge (2 of 2) app-editors/vim-9.0.2167::gentoo to /
1650000410:  ::: completed emerge (2 of 2) app-editors/vim-9.0.2167::gentoo to /
1650000420:  *** exiting successfully.
1660000000:  >>> emerge (1 of 1) sys-kernel/gentoo-sources-5.15.40 to /
1660000030:  ::: completed emerge (1 of 1) sys-kernel/gentoo-sources-5.15.40 to /
1670000000:  >>> emerge (1 of 1) dev-lang/rust-1.75.0 to /
";

    /// A build cut short by an interrupted session.
    pub const TERMINATED: &str = "\
1700000000:  >>> emerge (1 of 1) www-client/firefox-115.0 to /
1700000500:  *** terminating.
";
}

/// A temporary host layout plus a configuration file describing it.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
    hosts: Vec<String>,
    rebuild_command: Vec<String>,
    exclude: Vec<String>,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a fixture with empty vdb and distfiles directories.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("vdb")
            .create_dir_all()
            .expect("Failed to create vdb");
        temp_dir
            .child("distfiles")
            .create_dir_all()
            .expect("Failed to create distdir");
        Self {
            temp_dir,
            hosts: Vec::new(),
            rebuild_command: vec!["true".to_string()],
            exclude: Vec::new(),
        }
    }

    /// Add an installed package, with a `BUILD_TIME` file if given.
    pub fn with_package(self, id: &str, build_time: Option<i64>) -> Self {
        let dir = self.temp_dir.child("vdb").child(id);
        dir.create_dir_all().expect("Failed to create package dir");
        if let Some(build_time) = build_time {
            dir.child("BUILD_TIME")
                .write_str(&format!("{}\n", build_time))
                .expect("Failed to write BUILD_TIME");
        }
        self
    }

    /// Add a file to the shared distfiles directory.
    pub fn with_distfile(self, name: &str, content: &str) -> Self {
        self.temp_dir
            .child("distfiles")
            .child(name)
            .write_str(content)
            .expect("Failed to write distfile");
        self
    }

    /// Add a host whose keep-list is a file with `names`, one per line.
    pub fn with_host(mut self, name: &str, names: &[&str]) -> Self {
        self.temp_dir
            .child("keep")
            .child(format!("{}.txt", name))
            .write_str(&names.join("\n"))
            .expect("Failed to write keep-list");
        self.hosts.push(name.to_string());
        self
    }

    /// Write the emerge log.
    pub fn with_emerge_log(self, content: &str) -> Self {
        self.temp_dir
            .child("emerge.log")
            .write_str(content)
            .expect("Failed to write emerge log");
        self
    }

    /// Package manager command used by `rebuild run`.
    pub fn with_rebuild_command(mut self, command: &[&str]) -> Self {
        self.rebuild_command = command.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Exclude pattern for `rebuild`.
    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.exclude.push(pattern.to_string());
        self
    }

    /// Path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.yaml")
    }

    pub fn queue_path(&self) -> PathBuf {
        self.path().join("state/rebuild-queue.yaml")
    }

    fn quoted(path: &Path) -> String {
        format!("'{}'", path.display())
    }

    fn quoted_list(items: &[String]) -> String {
        let items: Vec<String> = items.iter().map(|s| format!("'{}'", s)).collect();
        format!("[{}]", items.join(", "))
    }

    /// Configuration YAML pointing at this fixture's layout.
    pub fn config_yaml(&self) -> String {
        let mut yaml = format!(
            "vdb: {}\nemerge_log: {}\nrebuild:\n  older_than: 30d\n  batch_size: 2\n  exclude: {}\n  command: {}\n  queue_file: {}\ndistfiles:\n  distdir: {}\n  hosts:",
            Self::quoted(&self.path().join("vdb")),
            Self::quoted(&self.path().join("emerge.log")),
            Self::quoted_list(&self.exclude),
            Self::quoted_list(&self.rebuild_command),
            Self::quoted(&self.queue_path()),
            Self::quoted(&self.path().join("distfiles")),
        );
        if self.hosts.is_empty() {
            yaml.push_str(" []\n");
        } else {
            yaml.push('\n');
            for host in &self.hosts {
                let list = self.path().join("keep").join(format!("{}.txt", host));
                yaml.push_str(&format!(
                    "    - name: {}\n      list: {}\n",
                    host,
                    Self::quoted(&list)
                ));
            }
        }
        yaml
    }

    /// A `portage-admin` command using this fixture's configuration.
    pub fn command(&self) -> assert_cmd::Command {
        std::fs::write(self.config_path(), self.config_yaml()).expect("Failed to write config");
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("portage-admin");
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_layout() {
        let fixture = TestFixture::new()
            .with_package("app-misc/foo-1.0", Some(42))
            .with_distfile("foo-1.0.tar.gz", "data")
            .with_host("local", &["foo-1.0.tar.gz"]);
        assert!(fixture.path().join("vdb/app-misc/foo-1.0/BUILD_TIME").exists());
        assert!(fixture.path().join("distfiles/foo-1.0.tar.gz").exists());
        assert!(fixture.path().join("keep/local.txt").exists());
    }

    #[test]
    fn test_config_yaml_is_valid() {
        let fixture = TestFixture::new().with_host("local", &["a"]);
        let parsed: serde_yaml::Value = serde_yaml::from_str(&fixture.config_yaml()).unwrap();
        assert_eq!(parsed["distfiles"]["hosts"][0]["name"], "local");
        assert_eq!(parsed["rebuild"]["batch_size"], 2);
    }
}
