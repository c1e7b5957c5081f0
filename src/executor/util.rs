//! Utility functions for the executor.

/// Shell-quote a value for display.
pub fn shell_quote(s: impl std::fmt::Display) -> String {
    let s = s.to_string();
    if !s.is_empty()
        && s.chars().all(|c| {
            c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '@' | '+' | ',')
        })
    {
        s
    } else {
        format!("'{}'", s.replace('\'', "'\"'\"'"))
    }
}

/// Last non-empty line of a command's stderr, for one-line warnings.
pub fn last_line(s: &str) -> &str {
    s.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("simple"), "simple");
        assert_eq!(shell_quote("/path/to/file"), "/path/to/file");
        assert_eq!(shell_quote("webapp:webapp"), "webapp:webapp");
        assert_eq!(shell_quote("has space"), "'has space'");
        assert_eq!(shell_quote("has'quote"), "'has'\"'\"'quote'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line("first\nsecond\n\n"), "second");
        assert_eq!(last_line(""), "");
    }
}
