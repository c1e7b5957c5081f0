//! Service account and install directory ownership.

use crate::config::InstallConfig;
use crate::core::output;
use crate::executor::{Cmd, Context, ExecuteError};

/// Shell for accounts that must never log in.
pub const NOLOGIN_SHELL: &str = "/usr/sbin/nologin";

pub fn user_exists(ctx: &Context, user: &str) -> bool {
    ctx.probe(&Cmd::new("id").args(["-u", user]))
}

/// Create the service account if missing. Returns true if it was created.
pub fn ensure_user(ctx: &Context, config: &InstallConfig) -> Result<bool, ExecuteError> {
    if user_exists(ctx, &config.user) {
        output::detail(&format!("user {} already exists", config.user));
        return Ok(false);
    }

    ctx.run(
        &Cmd::new("useradd")
            .args(["--system", "--user-group", "--home-dir"])
            .arg(&config.install_dir)
            .args(["--shell", NOLOGIN_SHELL])
            .arg(&config.user),
    )?;
    output::detail(&format!("created system user {}", config.user));
    Ok(true)
}

/// Recursively hand the install directory to the service account.
pub fn fix_ownership(ctx: &Context, config: &InstallConfig) -> Result<(), ExecuteError> {
    ctx.run(
        &Cmd::new("chown")
            .arg("-R")
            .arg(format!("{0}:{0}", config.user))
            .arg(&config.install_dir),
    )?;
    Ok(())
}

/// Account provisioning: user if absent, directory, ownership every time.
pub fn provision(ctx: &Context, config: &InstallConfig) -> Result<(), ExecuteError> {
    ensure_user(ctx, config)?;
    ctx.create_dir_all(&config.install_dir)?;
    fix_ownership(ctx, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingRunner;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> InstallConfig {
        InstallConfig::for_repo("https://example.com/app.git").install_dir(dir.path().join("webapp"))
    }

    #[test]
    fn test_existing_user_not_recreated() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let ctx = Context::new(runner.clone());
        provision(&ctx, &config(&dir)).unwrap();

        assert!(!runner.ran("useradd"));
        assert!(runner.ran("chown -R webapp:webapp"));
        assert!(dir.path().join("webapp").is_dir());
    }

    #[test]
    fn test_missing_user_created_with_nologin() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        runner.fail_when("id -u webapp", "id: 'webapp': no such user");
        let ctx = Context::new(runner.clone());

        assert!(ensure_user(&ctx, &config(&dir)).unwrap());
        let cmds = runner.commands();
        let useradd = cmds.iter().find(|c| c.starts_with("useradd")).unwrap();
        assert!(useradd.contains("--system"));
        assert!(useradd.contains("--shell /usr/sbin/nologin webapp"));
    }
}
