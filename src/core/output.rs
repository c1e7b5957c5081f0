//! Terminal output for provisioning runs.
//!
//! Progress goes to stdout; warnings, errors and echoed commands go to
//! stderr so they survive `> deploy.log`. Uses owo-colors for color and
//! indicatif for spinners around long commands.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// `[ 3/10]`, padded so step titles line up.
fn step_counter(current: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("[{:>width$}/{}]", current, total, width = width)
}

/// Run header: `==> Deploying webapp into /opt/webapp`
pub fn header(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Numbered provisioning step: `[ 3/10] Syncing source`
pub fn step(current: usize, total: usize, message: &str) {
    println!("{} {}", step_counter(current, total).cyan(), message.bold());
}

/// Unnumbered group of work within a run (the decommissioner's phases).
pub fn section(message: &str) {
    println!("  {} {}", "->".cyan(), message);
}

/// What a step just did.
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Something already in the desired state.
pub fn skip(message: &str) {
    println!("     {} {}", "=".dimmed(), message.dimmed());
}

pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Indented line of the final summary.
pub fn summary(message: &str) {
    println!("    {}", message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Echo a command line before it runs, tagged `exec` or `dry-run`.
pub fn command(tag: &str, line: &str) {
    eprintln!("[{}] {}", tag, line);
}

/// Spinner shown while a long command (clone, pip, apt) runs.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("     {spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Clears its spinner on every exit path, including `?`.
pub struct SpinnerGuard(ProgressBar);

impl SpinnerGuard {
    pub fn new(message: &str) -> Self {
        Self(spinner(message))
    }
}

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_counter_pads_to_total() {
        assert_eq!(step_counter(3, 10), "[ 3/10]");
        assert_eq!(step_counter(10, 10), "[10/10]");
        assert_eq!(step_counter(1, 9), "[1/9]");
    }

    #[test]
    fn test_spinner_guard_drops_cleanly() {
        let guard = SpinnerGuard::new("pip install");
        drop(guard);
    }
}
