//! Points the static frontend at the reverse-proxy path.

use crate::config::InstallConfig;
use crate::core::output;
use crate::executor::{Context, ExecuteError, Report};

pub const API_BASE: &str = "API_BASE";

/// Path the frontend should call; nginx forwards it to the backend.
pub const PROXY_API_PATH: &str = "/api";

/// The declaring keyword if `line` declares `API_BASE`.
fn api_base_keyword(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    ["const", "let", "var"].into_iter().find(|&kw| {
        trimmed
            .strip_prefix(kw)
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix(API_BASE))
            .is_some_and(|rest| rest.trim_start().starts_with('='))
    })
}

/// Rewrite the value of the first `API_BASE` declaration to the proxy path.
///
/// The declaring keyword is kept, so a `let` the app reassigns stays a `let`.
/// Returns `None` when no declaration is found.
pub fn patch_api_base(source: &str) -> Option<String> {
    let mut patched = false;
    let mut out = String::with_capacity(source.len());

    for line in source.split_inclusive('\n') {
        let (body, ending) = match line.strip_suffix("\r\n") {
            Some(b) => (b, "\r\n"),
            None => match line.strip_suffix('\n') {
                Some(b) => (b, "\n"),
                None => (line, ""),
            },
        };
        match api_base_keyword(body).filter(|_| !patched) {
            Some(keyword) => {
                let indent = &body[..body.len() - body.trim_start().len()];
                out.push_str(&format!(
                    "{}{} {} = \"{}\";{}",
                    indent, keyword, API_BASE, PROXY_API_PATH, ending
                ));
                patched = true;
            }
            None => out.push_str(line),
        }
    }

    patched.then_some(out)
}

/// Best effort: a missing file or declaration only warns.
pub fn patch(ctx: &Context, config: &InstallConfig, report: &mut Report) -> Result<(), ExecuteError> {
    let entry = config.frontend_entry();
    let source = match std::fs::read_to_string(&entry) {
        Ok(s) => s,
        Err(e) => {
            if !ctx.dry_run {
                report.warn(format!("cannot read {}: {}; API endpoint not patched", entry.display(), e));
            }
            return Ok(());
        }
    };

    match patch_api_base(&source) {
        Some(patched) if patched == source => {
            output::detail(&format!("{} already targets {}", API_BASE, PROXY_API_PATH));
        }
        Some(patched) => {
            if let Err(e) = ctx.write_file(&entry, &patched, None) {
                report.warn(format!("API endpoint not patched: {}", e));
            } else {
                output::detail(&format!("{} -> {}", API_BASE, PROXY_API_PATH));
            }
        }
        None => report.warn(format!(
            "no {} declaration in {}; API endpoint not patched",
            API_BASE,
            entry.display()
        )),
    }
    Ok(())
}
