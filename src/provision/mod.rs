//! Provisioner - installs or updates the application on this host.
//!
//! Steps run in a fixed order. Each one either aborts the run with a
//! [`ProvisionError`] or records warnings in the returned [`Report`]:
//!
//! | Step | On failure |
//! |---|---|
//! | validate configuration | fatal, nothing touched yet |
//! | install packages | fatal (index refresh only warns) |
//! | service account + ownership | fatal |
//! | sync source | fatal, including a refused fast-forward |
//! | build backend venv | fatal (pip self-upgrade only warns) |
//! | environment file | fatal on write errors, never regenerated |
//! | frontend endpoint patch | warning |
//! | systemd unit | fatal on write / daemon-reload, enable + restart warn |
//! | nginx site | fatal if `nginx -t` rejects it, reload warns |
//! | certificate | warning |

pub mod account;
pub mod backend;
pub mod frontend;
pub mod packages;
pub mod proxy;
pub mod secrets;
pub mod source;
pub mod tls;
pub mod unit;

use thiserror::Error;

use crate::config::{ConfigError, InstallConfig};
use crate::core::output;
use crate::executor::{Context, ExecuteError, Report};

pub use secrets::SecretsOutcome;
pub use source::SyncOutcome;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: ExecuteError,
    },
}

impl ProvisionError {
    /// The underlying executor error, if a step failed.
    pub fn execute_error(&self) -> Option<&ExecuteError> {
        match self {
            Self::Step { source, .. } => Some(source),
            Self::Config(_) => None,
        }
    }
}

/// What a successful run did.
#[derive(Debug)]
pub struct Outcome {
    pub source: SyncOutcome,
    pub secrets: SecretsOutcome,
    pub certificate: bool,
    pub report: Report,
}

const STEPS: usize = 10;

struct Steps<'a> {
    ctx: &'a Context,
    current: usize,
}

impl Steps<'_> {
    fn run<T>(
        &mut self,
        name: &'static str,
        f: impl FnOnce(&Context) -> Result<T, ExecuteError>,
    ) -> Result<T, ProvisionError> {
        self.current += 1;
        output::step(self.current, STEPS, name);
        f(self.ctx).map_err(|source| ProvisionError::Step { step: name, source })
    }
}

/// Install or update the application.
///
/// Validation happens before any command runs or file is written.
pub fn provision(ctx: &Context, config: &InstallConfig) -> Result<Outcome, ProvisionError> {
    let mut report = Report::new();
    for warning in config.validate()? {
        report.warn(warning);
    }
    let repo_url = config.repo_url().ok_or(ConfigError::MissingRepo)?;

    output::header(&format!(
        "Provisioning {} from {} ({})",
        config.service, repo_url, config.branch
    ));
    let mut steps = Steps { ctx, current: 0 };

    steps.run("Installing packages", |ctx| {
        packages::install(ctx, packages::BASE_PACKAGES, &mut report)
    })?;
    steps.run("Provisioning service account", |ctx| account::provision(ctx, config))?;
    let synced = steps.run("Syncing source", |ctx| source::sync(ctx, config, repo_url))?;
    steps.run("Building backend environment", |ctx| {
        backend::build(ctx, config, &mut report)
    })?;
    let env_file = steps.run("Materializing secrets", |ctx| {
        secrets::materialize(ctx, config, &mut report)
    })?;
    steps.run("Patching frontend API endpoint", |ctx| {
        frontend::patch(ctx, config, &mut report)
    })?;
    steps.run("Fixing ownership", |ctx| account::fix_ownership(ctx, config))?;
    steps.run("Installing service unit", |ctx| {
        unit::install(ctx, config, &mut report)
    })?;
    steps.run("Configuring nginx", |ctx| proxy::install(ctx, config, &mut report))?;
    let certificate = steps.run("Requesting TLS certificate", |ctx| {
        Ok(tls::request_certificate(ctx, config, &mut report))
    })?;

    Ok(Outcome {
        source: synced,
        secrets: env_file,
        certificate,
        report,
    })
}

/// Print the end-of-run summary.
pub fn print_summary(config: &InstallConfig, outcome: &Outcome) {
    output::success(&format!("{} deployed", config.service));
    let host = config.domain_name().unwrap_or("<server-ip>");
    output::summary(&format!("http://{}/", host));
    if outcome.certificate {
        output::summary(&format!("https://{}/", host));
    }
    output::summary(&format!("service: systemctl status {}", config.service));
    if outcome.secrets == SecretsOutcome::Created {
        output::summary(&format!("secrets: {}", config.env_file().display()));
    }
    if !outcome.report.is_clean() {
        output::warning(&format!(
            "finished with {} warning(s):",
            outcome.report.warnings().len()
        ));
        for warning in outcome.report.warnings() {
            output::detail(warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingRunner;

    #[test]
    fn test_missing_repo_runs_nothing() {
        let runner = RecordingRunner::new();
        let ctx = Context::new(runner.clone());
        let err = provision(&ctx, &InstallConfig::default()).unwrap_err();
        assert!(matches!(err, ProvisionError::Config(ConfigError::MissingRepo)));
        assert!(err.execute_error().is_none());
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_bad_url_runs_nothing() {
        let runner = RecordingRunner::new();
        let ctx = Context::new(runner.clone());
        let config = InstallConfig::for_repo("file:///srv/repo");
        assert!(matches!(
            provision(&ctx, &config),
            Err(ProvisionError::Config(ConfigError::UnsupportedRepoUrl(_)))
        ));
        assert!(runner.commands().is_empty());
    }
}
