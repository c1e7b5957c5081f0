//! Common test utilities: a relocated host under a temp dir.

#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use webdeploy::executor::RecordingRunner;
use webdeploy::{Context, InstallConfig, Layout, UninstallConfig};

pub const REPO: &str = "https://example.com/acme/shop.git";

/// A fake host: system files under `root/`, the app under `opt/webapp`.
pub struct TestHost {
    pub dir: TempDir,
    pub runner: RecordingRunner,
}

impl TestHost {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            runner: RecordingRunner::new(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("root")
    }

    pub fn install_dir(&self) -> PathBuf {
        self.dir.path().join("opt/webapp")
    }

    pub fn layout(&self) -> Layout {
        Layout::with_root(self.root())
    }

    pub fn context(&self) -> Context {
        Context::new(self.runner.clone()).layout(self.layout())
    }

    pub fn config(&self) -> InstallConfig {
        InstallConfig::for_repo(REPO).install_dir(self.install_dir())
    }

    pub fn uninstall_config(&self) -> UninstallConfig {
        UninstallConfig::new(self.install_dir(), "webapp")
    }

    /// Pretend a previous run already cloned the application.
    pub fn seed_checkout(&self, config: &InstallConfig) {
        let checkout = config.checkout_dir();
        write(&checkout.join(".git/HEAD"), "ref: refs/heads/main\n");
        write(&config.env_template(), ENV_TEMPLATE);
        write(&config.requirements(), REQUIREMENTS);
        write(&config.frontend_entry(), APP_JS);
        write(&config.frontend_dir().join("index.html"), INDEX_HTML);
    }

    /// Pretend nginx ships its default site enabled.
    pub fn seed_default_site(&self) {
        write(
            &self.layout().site_enabled("default"),
            "server { listen 80 default_server; }\n",
        );
    }

    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }
}

pub fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}
