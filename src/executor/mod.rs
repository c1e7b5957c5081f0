//! Step executor - runs commands and file operations against the host.
//!
//! Errors come in two tiers here: [`ExecuteError`] aborts the run, while a
//! [`Report`] turns the failures of best-effort steps into warnings.

mod context;
mod error;
mod report;
mod runner;
mod util;

pub use context::Context;
pub use error::ExecuteError;
pub use report::Report;
pub use runner::{Cmd, CmdOutput, CommandRunner, RecordingRunner, SystemRunner};
pub use util::shell_quote;
