//! OS package installation through apt-get.

use crate::executor::{Cmd, Context, ExecuteError, Report};

/// Packages the backend, the checkout and the proxy need.
pub const BASE_PACKAGES: &[&str] = &["git", "python3", "python3-venv", "python3-pip", "nginx"];

/// Packages needed to request a certificate through the nginx plugin.
pub const TLS_PACKAGES: &[&str] = &["certbot", "python3-certbot-nginx"];

fn apt(args: &[&str]) -> Cmd {
    Cmd::new("apt-get")
        .args(args)
        .env("DEBIAN_FRONTEND", "noninteractive")
}

/// Refresh the package index (best effort) and install `packages`.
///
/// apt-get is a no-op for packages already present.
pub fn install(ctx: &Context, packages: &[&str], report: &mut Report) -> Result<(), ExecuteError> {
    report.best_effort(
        "apt-get update",
        ctx.run_long(&apt(&["update"]), "refreshing package index"),
    );

    let mut args = vec!["install", "-y", "--no-install-recommends"];
    args.extend_from_slice(packages);
    ctx.run_long(&apt(&args), &format!("installing {}", packages.join(" ")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingRunner;

    #[test]
    fn test_install_is_noninteractive() {
        let runner = RecordingRunner::new();
        let ctx = Context::new(runner.clone());
        let mut report = Report::new();
        install(&ctx, BASE_PACKAGES, &mut report).unwrap();

        let cmds = runner.commands();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0], "DEBIAN_FRONTEND=noninteractive apt-get update");
        assert!(cmds[1].ends_with("apt-get install -y --no-install-recommends git python3 python3-venv python3-pip nginx"));
    }

    #[test]
    fn test_update_failure_only_warns() {
        let runner = RecordingRunner::new();
        runner.fail_when("apt-get update", "Temporary failure resolving");
        let ctx = Context::new(runner.clone());
        let mut report = Report::new();
        install(&ctx, BASE_PACKAGES, &mut report).unwrap();
        assert_eq!(report.warnings().len(), 1);
    }

    #[test]
    fn test_install_failure_is_fatal() {
        let runner = RecordingRunner::new();
        runner.fail_when("apt-get install", "E: Unable to locate package");
        let ctx = Context::new(runner);
        let mut report = Report::new();
        assert!(install(&ctx, BASE_PACKAGES, &mut report).is_err());
    }
}
