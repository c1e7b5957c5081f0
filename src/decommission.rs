//! Decommissioner - removes what the provisioner installed.
//!
//! Every step is best effort and absence is never an error, so running it
//! twice is harmless. The service account and any issued certificate are
//! left in place.

use crate::config::{ConfigError, UninstallConfig};
use crate::core::output;
use crate::executor::{Cmd, Context, Report};
use crate::provision::proxy;

fn systemctl(args: &[&str]) -> Cmd {
    Cmd::new("systemctl").args(args)
}

/// True if systemd has a unit file for `service` on disk or loaded.
fn unit_known(ctx: &Context, service: &str, unit_path: &std::path::Path) -> bool {
    unit_path.exists() || ctx.probe(&systemctl(&["cat", &format!("{}.service", service)]))
}

/// Stop the service, remove the unit and site, delete the install tree.
pub fn decommission(ctx: &Context, config: &UninstallConfig) -> Result<Report, ConfigError> {
    config.validate()?;
    let mut report = Report::new();
    let service = config.service.as_str();

    output::header(&format!("Removing {} from {}", service, config.install_dir.display()));

    output::section("service");
    let unit_path = ctx.layout.unit_path(service);
    if unit_known(ctx, service, &unit_path) {
        report.best_effort(
            &format!("systemctl stop {}", service),
            ctx.run(&systemctl(&["stop", service])),
        );
        report.best_effort(
            &format!("systemctl disable {}", service),
            ctx.run(&systemctl(&["disable", service])),
        );
    } else {
        output::skip(&format!("{}.service not installed", service));
    }

    let removed = report.best_effort("removing unit file", ctx.remove_file(&unit_path));
    if removed == Some(true) {
        output::detail(&format!("removed {}", unit_path.display()));
        report.best_effort(
            "systemctl daemon-reload",
            ctx.run(&systemctl(&["daemon-reload"])),
        );
    }
    // Clears a lingering failed state. A non-zero exit only means there was
    // none; failing to run systemctl at all is reported.
    report.best_effort(
        "systemctl reset-failed",
        ctx.run_unchecked(&systemctl(&["reset-failed", &format!("{}.service", service)])),
    );

    output::section("nginx site");
    let site = config.site_name();
    let mut site_removed = false;
    for path in [ctx.layout.site_enabled(site), ctx.layout.site_available(site)] {
        if let Some(true) = report.best_effort("removing site file", ctx.remove_file(&path)) {
            output::detail(&format!("removed {}", path.display()));
            site_removed = true;
        }
    }
    if site_removed {
        if ctx.probe(&systemctl(&["is-active", "--quiet", "nginx"])) {
            proxy::reload(ctx, &mut report);
        } else {
            output::skip("nginx not running, skipping reload");
        }
    }

    output::section("install directory");
    match report.best_effort("removing install directory", ctx.remove_dir_all(&config.install_dir)) {
        Some(true) => output::detail(&format!("removed {}", config.install_dir.display())),
        Some(false) => output::skip(&format!("{} already gone", config.install_dir.display())),
        None => {}
    }

    Ok(report)
}
