//! webdeploy-uninstall - remove the deployed application
//!
//! Stops and removes the systemd unit, removes the nginx site and deletes
//! the install directory. The service account and any TLS certificate are
//! kept. Always exits 0 unless the install directory is unsafe to delete.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;
use webdeploy::config::{DEFAULT_INSTALL_DIR, DEFAULT_SERVICE};
use webdeploy::core::privilege;
use webdeploy::decommission::decommission;
use webdeploy::{Context, UninstallConfig, output};

#[derive(Parser)]
#[command(name = "webdeploy-uninstall")]
#[command(about = "Remove the web application installed by webdeploy-install")]
#[command(version)]
struct Cli {
    /// Installation directory to delete
    #[arg(long, env = "INSTALL_DIR", default_value = DEFAULT_INSTALL_DIR)]
    install_dir: PathBuf,

    /// systemd service and nginx site name
    #[arg(long, env = "SERVICE_NAME", default_value = DEFAULT_SERVICE)]
    service: String,

    /// Print what would be done without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Print every command as it runs
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(e) = run(cli) {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = UninstallConfig::new(cli.install_dir, cli.service);
    config.validate()?;
    if !cli.dry_run && !privilege::is_root() {
        bail!("webdeploy-uninstall must run as root (or pass --dry-run)");
    }

    let ctx = (if cli.dry_run {
        Context::dry_run_context()
    } else {
        Context::default()
    })
    .verbose(cli.verbose);

    let report = decommission(&ctx, &config)?;
    if report.is_clean() {
        output::success(&format!("{} removed", config.service));
    } else {
        output::warning(&format!(
            "{} removed with {} warning(s)",
            config.service,
            report.warnings().len()
        ));
    }
    Ok(())
}
