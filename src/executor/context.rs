//! Execution context: where files go and how commands run.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::config::Layout;
use crate::core::output;

use super::error::ExecuteError;
use super::runner::{Cmd, CmdOutput, CommandRunner, RecordingRunner, SystemRunner};

/// Execution context shared by every provisioning and removal step.
pub struct Context {
    /// Where system files (units, nginx sites) live
    pub layout: Layout,
    /// If true, log commands and writes without performing them
    pub dry_run: bool,
    /// If true, print commands as they execute
    pub verbose: bool,
    runner: Box<dyn CommandRunner>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("layout", &self.layout)
            .field("dry_run", &self.dry_run)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(SystemRunner)
    }
}

impl Context {
    /// Create a context that runs commands through `runner`.
    pub fn new(runner: impl CommandRunner + 'static) -> Self {
        Self {
            layout: Layout::system(),
            dry_run: false,
            verbose: false,
            runner: Box::new(runner),
        }
    }

    /// Context that only prints what it would do.
    pub fn dry_run_context() -> Self {
        Self {
            dry_run: true,
            ..Self::new(RecordingRunner::new())
        }
    }

    /// Set the filesystem layout.
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Set verbose mode.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn echo(&self, line: &str) {
        if self.verbose || self.dry_run {
            output::command(if self.dry_run { "dry-run" } else { "exec" }, line);
        }
    }

    /// Run a command that must succeed.
    pub fn run(&self, cmd: &Cmd) -> Result<CmdOutput, ExecuteError> {
        let out = self.run_unchecked(cmd)?;
        if !out.success() {
            return Err(ExecuteError::CommandFailed {
                cmd: cmd.to_string(),
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out)
    }

    /// Run a command that must succeed, with a spinner while it works.
    pub fn run_long(&self, cmd: &Cmd, message: &str) -> Result<CmdOutput, ExecuteError> {
        if self.verbose || self.dry_run {
            return self.run(cmd);
        }
        let _spinner = output::SpinnerGuard::new(message);
        self.run(cmd)
    }

    /// Run a command and return its output whatever the exit status.
    pub fn run_unchecked(&self, cmd: &Cmd) -> Result<CmdOutput, ExecuteError> {
        self.echo(&cmd.to_string());
        self.runner.run(cmd)
    }

    /// Run a query command; true only if it ran and exited 0.
    pub fn probe(&self, cmd: &Cmd) -> bool {
        self.run_unchecked(cmd)
            .map(|out| out.success())
            .unwrap_or(false)
    }

    /// Create a directory and all its parents.
    pub fn create_dir_all(&self, path: &Path) -> Result<(), ExecuteError> {
        self.echo(&format!("mkdir -p {}", path.display()));
        if self.dry_run {
            return Ok(());
        }
        fs::create_dir_all(path).map_err(|e| ExecuteError::io("cannot create", path, e))
    }

    /// Write a file, creating parent directories.
    ///
    /// On unix a new file is created with `mode` already set, so its contents
    /// are never readable under a looser mode; an existing file is chmodded
    /// before it is truncated.
    pub fn write_file(
        &self,
        path: &Path,
        contents: &str,
        mode: Option<u32>,
    ) -> Result<(), ExecuteError> {
        self.echo(&format!("write {} ({} bytes)", path.display(), contents.len()));
        if self.dry_run {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ExecuteError::io("cannot create", parent, e))?;
        }
        if let Some(mode) = mode {
            if fs::symlink_metadata(path).is_ok() {
                set_mode(path, mode)?;
            }
        }
        let mut file = create_file(path, mode).map_err(|e| ExecuteError::io("cannot write", path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| ExecuteError::io("cannot write", path, e))?;
        // The creation mode is filtered through the umask.
        if let Some(mode) = mode {
            set_mode(path, mode)?;
        }
        Ok(())
    }

    /// Remove a file or symlink. Returns false if it was already gone.
    pub fn remove_file(&self, path: &Path) -> Result<bool, ExecuteError> {
        if fs::symlink_metadata(path).is_err() {
            return Ok(false);
        }
        self.echo(&format!("rm -f {}", path.display()));
        if self.dry_run {
            return Ok(true);
        }
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ExecuteError::io("cannot remove", path, e)),
        }
    }

    /// Remove a directory tree. Returns false if it was already gone.
    pub fn remove_dir_all(&self, path: &Path) -> Result<bool, ExecuteError> {
        if fs::symlink_metadata(path).is_err() {
            return Ok(false);
        }
        self.echo(&format!("rm -rf {}", path.display()));
        if self.dry_run {
            return Ok(true);
        }
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ExecuteError::io("cannot remove", path, e)),
        }
    }

    /// Point `link` at `target`, replacing whatever is at `link`.
    pub fn symlink(&self, target: &Path, link: &Path) -> Result<(), ExecuteError> {
        self.echo(&format!("ln -sf {} {}", target.display(), link.display()));
        if self.dry_run {
            return Ok(());
        }
        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent).map_err(|e| ExecuteError::io("cannot create", parent, e))?;
        }
        match fs::remove_file(link) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ExecuteError::io("cannot replace", link, e)),
        }
        make_symlink(target, link).map_err(|e| ExecuteError::io("cannot link", link, e))
    }
}

#[cfg(unix)]
fn create_file(path: &Path, mode: Option<u32>) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if let Some(mode) = mode {
        options.mode(mode);
    }
    options.open(path)
}

#[cfg(not(unix))]
fn create_file(path: &Path, _mode: Option<u32>) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), ExecuteError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| ExecuteError::io("cannot chmod", path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), ExecuteError> {
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        ErrorKind::Unsupported,
        "symlinks not supported on this platform",
    ))
}
