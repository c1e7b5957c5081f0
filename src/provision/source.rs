//! Source checkout: shallow clone on first run, fast-forward afterwards.
//!
//! The checkout is owned by the service account while git runs as root, so
//! every command on an existing checkout marks it as a safe directory.

use std::path::Path;

use crate::config::InstallConfig;
use crate::core::output;
use crate::executor::{Cmd, Context, ExecuteError};

/// What happened to the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Updated,
}

fn git_in(dir: &Path) -> Cmd {
    Cmd::new("git")
        .arg("-c")
        .arg(format!("safe.directory={}", dir.display()))
        .arg("-C")
        .arg(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
}

/// Bring the checkout to the tip of the configured branch.
///
/// An existing checkout is only ever fast-forwarded; diverged history is an
/// error rather than a merge.
pub fn sync(ctx: &Context, config: &InstallConfig, repo_url: &str) -> Result<SyncOutcome, ExecuteError> {
    let dest = config.checkout_dir();
    if dest.join(".git").exists() {
        update(ctx, &dest, &config.branch)?;
        Ok(SyncOutcome::Updated)
    } else {
        clone(ctx, &dest, repo_url, &config.branch)?;
        Ok(SyncOutcome::Cloned)
    }
}

fn clone(ctx: &Context, dest: &Path, url: &str, branch: &str) -> Result<(), ExecuteError> {
    output::detail(&format!("git clone --depth 1 --branch {} {}", branch, url));
    ctx.run_long(
        &Cmd::new("git")
            .args(["clone", "--depth", "1", "--single-branch", "--branch", branch])
            .arg(url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0"),
        &format!("cloning {}", url),
    )?;
    output::detail(&format!("cloned {} to {}", branch, dest.display()));
    Ok(())
}

fn update(ctx: &Context, dest: &Path, branch: &str) -> Result<(), ExecuteError> {
    if !ctx.probe(&git_in(dest).args(["rev-parse", "HEAD"])) {
        return Err(ExecuteError::CorruptCheckout(dest.to_path_buf()));
    }

    let remote_ref = format!("refs/remotes/origin/{}", branch);
    ctx.run_long(
        &git_in(dest)
            .args(["fetch", "origin"])
            .arg(format!("+refs/heads/{}:{}", branch, remote_ref)),
        &format!("fetching origin/{}", branch),
    )?;

    let local_ref = format!("refs/heads/{}", branch);
    if ctx.probe(&git_in(dest).args(["rev-parse", "--verify", "--quiet"]).arg(&local_ref)) {
        ctx.run(&git_in(dest).args(["checkout", branch]))?;
    } else {
        ctx.run(
            &git_in(dest)
                .args(["checkout", "-b", branch, "--track"])
                .arg(format!("origin/{}", branch)),
        )?;
    }

    ctx.run(
        &git_in(dest)
            .args(["merge", "--ff-only"])
            .arg(format!("origin/{}", branch)),
    )
    .map_err(|e| ExecuteError::FastForward {
        path: dest.to_path_buf(),
        branch: branch.to_string(),
        details: e.stderr().unwrap_or_default().to_string(),
    })?;

    output::detail(&format!("fast-forwarded to origin/{}", branch));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingRunner;
    use tempfile::TempDir;

    const REPO: &str = "https://example.com/app.git";

    fn setup(with_git: bool) -> (TempDir, InstallConfig, Context, RecordingRunner) {
        let dir = TempDir::new().unwrap();
        let config = InstallConfig::for_repo(REPO).install_dir(dir.path().join("webapp"));
        if with_git {
            std::fs::create_dir_all(config.checkout_dir().join(".git")).unwrap();
        }
        let runner = RecordingRunner::new();
        let ctx = Context::new(runner.clone());
        (dir, config, ctx, runner)
    }

    #[test]
    fn test_fresh_install_shallow_clones_branch() {
        let (_dir, config, ctx, runner) = setup(false);
        let outcome = sync(&ctx, &config.clone().branch("develop"), REPO).unwrap();
        assert_eq!(outcome, SyncOutcome::Cloned);

        let cmds = runner.commands();
        assert_eq!(cmds.len(), 1);
        assert!(cmds[0].contains("git clone --depth 1 --single-branch --branch develop https://example.com/app.git"));
    }

    #[test]
    fn test_existing_checkout_fast_forwards() {
        let (_dir, config, ctx, runner) = setup(true);
        assert_eq!(sync(&ctx, &config, REPO).unwrap(), SyncOutcome::Updated);

        assert!(!runner.ran("git clone"));
        assert!(runner.ran("fetch origin +refs/heads/main:refs/remotes/origin/main"));
        assert!(runner.ran("checkout main"));
        assert!(runner.ran("merge --ff-only origin/main"));
    }

    #[test]
    fn test_missing_local_branch_is_created_tracking() {
        let (_dir, config, ctx, runner) = setup(true);
        runner.fail_when("rev-parse --verify --quiet refs/heads/main", "");
        sync(&ctx, &config, REPO).unwrap();
        assert!(runner.ran("checkout -b main --track origin/main"));
    }

    #[test]
    fn test_diverged_history_is_fatal() {
        let (_dir, config, ctx, runner) = setup(true);
        runner.fail_when("merge --ff-only", "fatal: Not possible to fast-forward, aborting.");
        let err = sync(&ctx, &config, REPO).unwrap_err();
        match err {
            ExecuteError::FastForward { branch, details, .. } => {
                assert_eq!(branch, "main");
                assert!(details.contains("Not possible to fast-forward"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrupt_checkout_is_fatal() {
        let (_dir, config, ctx, runner) = setup(true);
        runner.fail_when("rev-parse HEAD", "fatal: not a git repository");
        assert!(matches!(
            sync(&ctx, &config, REPO),
            Err(ExecuteError::CorruptCheckout(_))
        ));
        assert!(!runner.ran("fetch"));
    }
}
