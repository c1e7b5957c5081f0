//! webdeploy-install - deploy or update the application on this host
//!
//! Usage:
//!   webdeploy-install --repo <url> [--branch main] [--install-dir /opt/webapp]
//!                     [--user webapp] [--domain example.com]
//!                     [--enable-https --email ops@example.com]
//!
//! Every flag can also be given through the environment variable shown in
//! `--help`; flags win over the environment.

use anyhow::{Result, bail};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use webdeploy::config::{
    DEFAULT_APP_MODULE, DEFAULT_BACKEND_HOST, DEFAULT_BACKEND_PORT, DEFAULT_BRANCH,
    DEFAULT_INSTALL_DIR, DEFAULT_SERVICE, DEFAULT_USER,
};
use webdeploy::core::privilege;
use webdeploy::{Context, InstallConfig, output, provision};

#[derive(Parser)]
#[command(name = "webdeploy-install")]
#[command(about = "Deploy the web application: backend service behind nginx")]
#[command(version)]
struct Cli {
    /// Git repository to deploy (required)
    #[arg(long, env = "REPO_URL")]
    repo: Option<String>,

    /// Branch to check out
    #[arg(long, env = "BRANCH", default_value = DEFAULT_BRANCH)]
    branch: String,

    /// Installation directory
    #[arg(long, env = "INSTALL_DIR", default_value = DEFAULT_INSTALL_DIR)]
    install_dir: PathBuf,

    /// System user that runs the backend
    #[arg(long, env = "APP_USER", default_value = DEFAULT_USER)]
    user: String,

    /// Public domain name for nginx and CORS
    #[arg(long, env = "DOMAIN")]
    domain: Option<String>,

    /// Request a Let's Encrypt certificate (needs --domain and --email)
    #[arg(
        long,
        env = "ENABLE_HTTPS",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    enable_https: bool,

    /// Contact email for certificate registration
    #[arg(long, env = "EMAIL")]
    email: Option<String>,

    /// systemd service and nginx site name
    #[arg(long, env = "SERVICE_NAME", default_value = DEFAULT_SERVICE)]
    service: String,

    /// Port the backend listens on (loopback only)
    #[arg(long, env = "BACKEND_PORT", default_value_t = DEFAULT_BACKEND_PORT)]
    backend_port: u16,

    /// ASGI application passed to uvicorn
    #[arg(long, env = "APP_MODULE", default_value = DEFAULT_APP_MODULE)]
    app_module: String,

    /// Print what would be done without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Print every command as it runs
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> InstallConfig {
        InstallConfig {
            repo_url: self.repo,
            branch: self.branch,
            install_dir: self.install_dir,
            user: self.user,
            service: self.service,
            domain: self.domain,
            enable_https: self.enable_https,
            email: self.email,
            backend_host: DEFAULT_BACKEND_HOST.to_string(),
            backend_port: self.backend_port,
            app_module: self.app_module,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors; everything else exits 1.
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(e) = run(cli) {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let dry_run = cli.dry_run;
    let verbose = cli.verbose;
    let config = cli.into_config();

    // Reject bad input before the privilege check so usage errors read clearly.
    config.validate()?;
    if !dry_run && !privilege::is_root() {
        bail!("webdeploy-install must run as root (or pass --dry-run)");
    }

    let ctx = (if dry_run {
        Context::dry_run_context()
    } else {
        Context::default()
    })
    .verbose(verbose);

    let outcome = provision::provision(&ctx, &config)?;
    provision::print_summary(&config, &outcome);
    Ok(())
}
