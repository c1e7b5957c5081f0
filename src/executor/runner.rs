//! Process execution.
//!
//! Every external tool goes through a [`CommandRunner`]. [`SystemRunner`]
//! spawns real processes; [`RecordingRunner`] only records what would have
//! run and answers with scripted exit codes. Dry runs and tests use the latter.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use super::error::ExecuteError;
use super::util::shell_quote;

/// A program invocation. Arguments are passed without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string_lossy().into_owned()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dir) = &self.cwd {
            write!(f, "cd {} && ", shell_quote(dir.display()))?;
        }
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, shell_quote(value))?;
        }
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs commands to completion.
///
/// A non-zero exit is not an error at this level; callers decide.
pub trait CommandRunner {
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput, ExecuteError>;
}

/// Spawns real processes with stdin closed and output captured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput, ExecuteError> {
        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }
        for (key, value) in &cmd.env {
            command.env(key, value);
        }

        let output = command.output().map_err(|source| ExecuteError::Spawn {
            cmd: cmd.to_string(),
            source,
        })?;

        Ok(CmdOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Default)]
struct Recording {
    commands: Vec<Cmd>,
    /// (substring of the rendered command, scripted output)
    scripted: Vec<(String, CmdOutput)>,
}

/// Records commands instead of running them.
///
/// Clones share the same recording, so a test can keep one handle and give
/// another to a [`Context`](super::Context).
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose rendered form contains `pattern` with `output`.
    /// The most recently added match wins.
    pub fn respond(&self, pattern: impl Into<String>, output: CmdOutput) -> &Self {
        self.lock().scripted.push((pattern.into(), output));
        self
    }

    /// Make commands containing `pattern` exit with status 1.
    pub fn fail_when(&self, pattern: impl Into<String>, stderr: impl Into<String>) -> &Self {
        self.respond(pattern, CmdOutput::failed(1, stderr))
    }

    /// Rendered command lines, in order.
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.iter().map(Cmd::to_string).collect()
    }

    /// True if any recorded command contains `needle`.
    pub fn ran(&self, needle: &str) -> bool {
        self.commands().iter().any(|c| c.contains(needle))
    }

    pub fn clear(&self) {
        self.lock().commands.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recording> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput, ExecuteError> {
        let rendered = cmd.to_string();
        let mut rec = self.lock();
        rec.commands.push(cmd.clone());
        let output = rec
            .scripted
            .iter()
            .rev()
            .find(|(pattern, _)| rendered.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(CmdOutput::ok);
        Ok(output)
    }
}
