//! Deployment configuration shared by the installer and the uninstaller.
//!
//! Both binaries agree on the install directory, the service name and the
//! site file name through the defaults in this module. Values are resolved
//! by clap in the order default, environment, flag.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_INSTALL_DIR: &str = "/opt/webapp";
pub const DEFAULT_USER: &str = "webapp";
pub const DEFAULT_SERVICE: &str = "webapp";
pub const DEFAULT_BACKEND_HOST: &str = "127.0.0.1";
pub const DEFAULT_BACKEND_PORT: u16 = 8000;
pub const DEFAULT_APP_MODULE: &str = "app.main:app";

/// Pre-flight errors. Raised before anything on the host is touched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required option: --repo (or REPO_URL)")]
    MissingRepo,

    #[error(
        "unsupported repository URL: {0}\nonly https://, http://, ssh:// and git@ URLs are supported"
    )]
    UnsupportedRepoUrl(String),

    #[error("refusing to use {0} as install directory: must be an absolute path below /")]
    UnsafeInstallDir(PathBuf),

    #[error("invalid {field}: {value:?}")]
    InvalidName { field: &'static str, value: String },
}

/// Where system-owned files live.
///
/// Production uses `/`; tests relocate everything under a temp dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self::system()
    }
}

impl Layout {
    pub fn system() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn unit_path(&self, service: &str) -> PathBuf {
        self.root
            .join("etc/systemd/system")
            .join(format!("{}.service", service))
    }

    pub fn site_available(&self, site: &str) -> PathBuf {
        self.root.join("etc/nginx/sites-available").join(site)
    }

    pub fn site_enabled(&self, site: &str) -> PathBuf {
        self.root.join("etc/nginx/sites-enabled").join(site)
    }
}

/// Everything the provisioner needs to know.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub repo_url: Option<String>,
    pub branch: String,
    pub install_dir: PathBuf,
    pub user: String,
    pub service: String,
    pub domain: Option<String>,
    pub enable_https: bool,
    pub email: Option<String>,
    pub backend_host: String,
    pub backend_port: u16,
    pub app_module: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            branch: DEFAULT_BRANCH.to_string(),
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            user: DEFAULT_USER.to_string(),
            service: DEFAULT_SERVICE.to_string(),
            domain: None,
            enable_https: false,
            email: None,
            backend_host: DEFAULT_BACKEND_HOST.to_string(),
            backend_port: DEFAULT_BACKEND_PORT,
            app_module: DEFAULT_APP_MODULE.to_string(),
        }
    }
}

impl InstallConfig {
    /// Create a config for the given repository with every other value defaulted.
    pub fn for_repo(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: Some(repo_url.into()),
            ..Default::default()
        }
    }

    pub fn install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn enable_https(mut self, enable: bool) -> Self {
        self.enable_https = enable;
        self
    }

    /// Validate the configuration.
    ///
    /// Returns the soft warnings that do not stop the run.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        let repo = self.repo_url().ok_or(ConfigError::MissingRepo)?;
        validate_repo_url(repo)?;
        check_install_dir(&self.install_dir)?;
        check_name("user", &self.user)?;
        check_name("service", &self.service)?;
        check_name("branch", &self.branch)?;
        if let Some(domain) = self.domain_name() {
            check_name("domain", domain)?;
        }

        let mut warnings = Vec::new();
        if self.enable_https && self.tls_target().is_none() {
            warnings.push(
                "--enable-https needs both --domain and --email; skipping certificate issuance"
                    .to_string(),
            );
        }
        Ok(warnings)
    }

    /// Repository URL, if one was given and is not blank.
    pub fn repo_url(&self) -> Option<&str> {
        self.repo_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn domain_name(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Domain and contact email, only when HTTPS is requested and both are set.
    pub fn tls_target(&self) -> Option<(&str, &str)> {
        if !self.enable_https {
            return None;
        }
        let email = self.email.as_deref().map(str::trim).filter(|s| !s.is_empty());
        match (self.domain_name(), email) {
            (Some(domain), Some(email)) => Some((domain, email)),
            _ => None,
        }
    }

    pub fn checkout_dir(&self) -> PathBuf {
        self.install_dir.join("app")
    }

    pub fn venv_dir(&self) -> PathBuf {
        self.install_dir.join("venv")
    }

    pub fn backend_dir(&self) -> PathBuf {
        self.checkout_dir().join("backend")
    }

    pub fn requirements(&self) -> PathBuf {
        self.backend_dir().join("requirements.txt")
    }

    pub fn env_file(&self) -> PathBuf {
        self.backend_dir().join(".env")
    }

    pub fn env_template(&self) -> PathBuf {
        self.backend_dir().join(".env.example")
    }

    pub fn frontend_dir(&self) -> PathBuf {
        self.checkout_dir().join("frontend")
    }

    pub fn frontend_entry(&self) -> PathBuf {
        self.frontend_dir().join("app.js")
    }

    /// Upstream address nginx proxies `/api/` to.
    pub fn backend_addr(&self) -> String {
        format!("{}:{}", self.backend_host, self.backend_port)
    }

    /// Name of the nginx site file; same as the service.
    pub fn site_name(&self) -> &str {
        &self.service
    }
}

/// What the uninstaller needs to know.
#[derive(Debug, Clone)]
pub struct UninstallConfig {
    pub install_dir: PathBuf,
    pub service: String,
}

impl Default for UninstallConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            service: DEFAULT_SERVICE.to_string(),
        }
    }
}

impl UninstallConfig {
    pub fn new(install_dir: impl Into<PathBuf>, service: impl Into<String>) -> Self {
        Self {
            install_dir: install_dir.into(),
            service: service.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_install_dir(&self.install_dir)?;
        check_name("service", &self.service)
    }

    pub fn site_name(&self) -> &str {
        &self.service
    }
}

/// Validate that a URL uses a scheme git can fetch over the network.
pub fn validate_repo_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("https://")
        || url.starts_with("http://")
        || url.starts_with("git@")
        || url.starts_with("ssh://")
    {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedRepoUrl(url.to_string()))
    }
}

/// The install directory is deleted recursively on uninstall, so `/` and
/// relative paths are never accepted.
fn check_install_dir(dir: &Path) -> Result<(), ConfigError> {
    let normal = dir
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    let escapes = dir.components().any(|c| matches!(c, Component::ParentDir));
    if !dir.is_absolute() || normal == 0 || escapes {
        return Err(ConfigError::UnsafeInstallDir(dir.to_path_buf()));
    }
    Ok(())
}

/// Names end up in file paths and command lines.
fn check_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let ok = !value.is_empty()
        && !value.starts_with('-')
        && !value.contains("..")
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '@'));
    // Only branches may contain a slash.
    let slash_ok = field == "branch" || !value.contains('/');
    if ok && slash_ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidName {
            field,
            value: value.to_string(),
        })
    }
}
