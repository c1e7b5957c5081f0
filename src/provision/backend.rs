//! Backend virtual environment.

use crate::config::InstallConfig;
use crate::core::output;
use crate::executor::{Cmd, Context, ExecuteError, Report};

/// Create the venv if needed and (re)install the pinned dependencies.
///
/// Dependencies are reinstalled on every run so manifest changes land.
pub fn build(ctx: &Context, config: &InstallConfig, report: &mut Report) -> Result<(), ExecuteError> {
    let venv = config.venv_dir();
    let python = venv.join("bin/python");
    let pip = venv.join("bin/pip");

    if python.exists() {
        output::detail(&format!("reusing virtualenv {}", venv.display()));
    } else {
        ctx.run(&Cmd::new("python3").args(["-m", "venv"]).arg(&venv))?;
    }

    report.best_effort(
        "upgrading pip",
        ctx.run_long(
            &Cmd::new(pip.display().to_string()).args(["install", "--upgrade", "pip"]),
            "upgrading pip",
        ),
    );

    let requirements = config.requirements();
    if !requirements.exists() && !ctx.dry_run {
        report.warn(format!(
            "{} not found, skipping dependency install",
            requirements.display()
        ));
        return Ok(());
    }

    ctx.run_long(
        &Cmd::new(pip.display().to_string())
            .args(["install", "-r"])
            .arg(&requirements)
            .current_dir(config.backend_dir()),
        "installing backend dependencies",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingRunner;
    use tempfile::TempDir;

    fn setup() -> (TempDir, InstallConfig, Context, RecordingRunner) {
        let dir = TempDir::new().unwrap();
        let config =
            InstallConfig::for_repo("https://example.com/app.git").install_dir(dir.path().join("webapp"));
        let runner = RecordingRunner::new();
        let ctx = Context::new(runner.clone());
        (dir, config, ctx, runner)
    }

    #[test]
    fn test_installs_requirements_every_run() {
        let (_dir, config, ctx, runner) = setup();
        std::fs::create_dir_all(config.backend_dir()).unwrap();
        std::fs::write(config.requirements(), "fastapi==0.110.0\n").unwrap();
        std::fs::create_dir_all(config.venv_dir().join("bin")).unwrap();
        std::fs::write(config.venv_dir().join("bin/python"), "").unwrap();

        let mut report = Report::new();
        build(&ctx, &config, &mut report).unwrap();
        build(&ctx, &config, &mut report).unwrap();

        assert!(!runner.ran("python3 -m venv"));
        let installs = runner
            .commands()
            .into_iter()
            .filter(|c| c.contains("install -r"))
            .count();
        assert_eq!(installs, 2);
        assert!(report.is_clean());
    }

    #[test]
    fn test_missing_manifest_warns() {
        let (_dir, config, ctx, runner) = setup();
        let mut report = Report::new();
        build(&ctx, &config, &mut report).unwrap();

        assert!(runner.ran("python3 -m venv"));
        assert!(!runner.ran("install -r"));
        assert_eq!(report.warnings().len(), 1);
    }

    #[test]
    fn test_dependency_failure_is_fatal() {
        let (_dir, config, ctx, runner) = setup();
        std::fs::create_dir_all(config.backend_dir()).unwrap();
        std::fs::write(config.requirements(), "nonexistent-pkg==9.9\n").unwrap();
        runner.fail_when("install -r", "ERROR: No matching distribution");

        let mut report = Report::new();
        assert!(build(&ctx, &config, &mut report).is_err());
    }
}
