//! Single-host provisioner for a Python backend and a static frontend
//! served through nginx.
//!
//! Two binaries share this library:
//!
//! - `webdeploy-install` clones or fast-forwards the application, builds its
//!   virtualenv, writes the backend environment file once, installs a systemd
//!   unit and an nginx site, and optionally requests a certificate.
//! - `webdeploy-uninstall` stops the service and removes the unit, the site
//!   and the install directory.
//!
//! # Layout on the host
//!
//! ```text
//! /opt/webapp/                       install dir (owned by the service user)
//! ├── app/                           git checkout
//! │   ├── backend/.env               secrets, generated once, mode 0600
//! │   ├── backend/requirements.txt
//! │   └── frontend/                  nginx document root
//! └── venv/
//! /etc/systemd/system/webapp.service
//! /etc/nginx/sites-available/webapp  (+ symlink in sites-enabled/)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use webdeploy::{Context, InstallConfig, provision};
//!
//! let config = InstallConfig::for_repo("https://github.com/acme/shop.git")
//!     .domain("shop.example.com");
//! let outcome = provision::provision(&Context::default(), &config)?;
//! assert!(outcome.report.warnings().is_empty());
//! # Ok::<(), webdeploy::provision::ProvisionError>(())
//! ```

pub mod config;
pub mod core;
pub mod decommission;
pub mod executor;
pub mod provision;

pub use config::{InstallConfig, Layout, UninstallConfig};
pub use crate::core::output;
pub use executor::{Context, ExecuteError, Report};
