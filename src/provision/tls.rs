//! Optional certificate issuance through certbot's nginx plugin.

use crate::config::InstallConfig;
use crate::core::output;
use crate::executor::{Cmd, Context, Report};

use super::packages;

/// Request a certificate when HTTPS is enabled and configured.
///
/// Returns true if certbot succeeded. Failures only warn: the site stays
/// reachable over plain HTTP.
pub fn request_certificate(ctx: &Context, config: &InstallConfig, report: &mut Report) -> bool {
    let Some((domain, email)) = config.tls_target() else {
        output::skip("HTTPS not configured, skipping certificate");
        return false;
    };

    if let Err(e) = packages::install(ctx, packages::TLS_PACKAGES, report) {
        report.warn(format!("could not install certbot, site remains HTTP only: {}", e));
        return false;
    }

    let issued = ctx.run_long(
        &Cmd::new("certbot")
            .args(["--nginx", "-d", domain])
            .args(["--non-interactive", "--agree-tos", "-m", email])
            .arg("--redirect"),
        &format!("requesting certificate for {}", domain),
    );
    let issued = report.best_effort("certbot", issued).is_some();
    if issued {
        output::detail(&format!("certificate issued for {}", domain));
    }
    issued
}
