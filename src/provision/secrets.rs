//! Backend environment file and its secrets.
//!
//! The file is written once per install directory. Issued tokens and
//! sessions are signed with these secrets, so an existing file is never
//! regenerated.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::InstallConfig;
use crate::core::output;
use crate::executor::{Context, ExecuteError, Report};

/// Random bytes per secret, before encoding.
pub const SECRET_BYTES: usize = 32;

pub const SECRET_KEY: &str = "SECRET_KEY";
pub const JWT_SECRET: &str = "JWT_SECRET";
pub const CORS_ORIGINS: &str = "CORS_ORIGINS";

/// Environment file permissions: readable by the service account only.
pub const ENV_FILE_MODE: u32 = 0o600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretsOutcome {
    Created,
    Preserved,
}

/// 32 random bytes from the OS-seeded generator, base64 with padding.
pub fn generate_secret() -> String {
    let bytes: [u8; SECRET_BYTES] = rand::random();
    STANDARD.encode(bytes)
}

/// Set `key` in dotenv-style `contents`.
///
/// The first `KEY=` line (optionally prefixed with `export`) is replaced;
/// the key is appended when absent.
pub fn set_env_value(contents: &str, key: &str, value: &str) -> String {
    let mut replaced = false;
    let mut out = String::with_capacity(contents.len() + key.len() + value.len() + 2);

    for line in contents.lines() {
        let body = line.trim_start();
        let body = body.strip_prefix("export ").unwrap_or(body);
        let matches = body
            .split_once('=')
            .is_some_and(|(k, _)| k.trim() == key);
        if matches && !replaced {
            out.push_str(&format!("{}={}", key, value));
            replaced = true;
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    if !replaced {
        out.push_str(&format!("{}={}\n", key, value));
    }
    out
}

/// Look up `key` in dotenv-style `contents`.
pub fn get_env_value<'a>(contents: &'a str, key: &str) -> Option<&'a str> {
    contents.lines().find_map(|line| {
        let body = line.trim_start();
        let body = body.strip_prefix("export ").unwrap_or(body);
        let (k, v) = body.split_once('=')?;
        (k.trim() == key).then_some(v.trim())
    })
}

/// Fill a template with fresh secrets and, given a domain, its origins.
pub fn render_env(template: &str, domain: Option<&str>) -> String {
    let mut contents = set_env_value(template, SECRET_KEY, &generate_secret());
    contents = set_env_value(&contents, JWT_SECRET, &generate_secret());
    if let Some(domain) = domain {
        let origins = format!("http://{0},https://{0}", domain);
        contents = set_env_value(&contents, CORS_ORIGINS, &origins);
    }
    contents
}

/// Write the environment file unless it already exists.
pub fn materialize(
    ctx: &Context,
    config: &InstallConfig,
    report: &mut Report,
) -> Result<SecretsOutcome, ExecuteError> {
    let env_file = config.env_file();
    if env_file.exists() {
        output::skip(&format!("{} exists, keeping its secrets", env_file.display()));
        return Ok(SecretsOutcome::Preserved);
    }

    let template_path = config.env_template();
    let template = match std::fs::read_to_string(&template_path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if !ctx.dry_run {
                report.warn(format!(
                    "{} not found, writing secrets to an empty environment file",
                    template_path.display()
                ));
            }
            String::new()
        }
        Err(e) => return Err(ExecuteError::io("cannot read", template_path, e)),
    };

    let contents = render_env(&template, config.domain_name());
    ctx.write_file(&env_file, &contents, Some(ENV_FILE_MODE))?;
    output::detail(&format!("generated secrets in {}", env_file.display()));
    Ok(SecretsOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingRunner;
    use tempfile::TempDir;

    const TEMPLATE: &str = "\
# backend settings
SECRET_KEY=change-me
JWT_SECRET=change-me
CORS_ORIGINS=http://localhost:5173
DATABASE_URL=sqlite:///./app.db
";

    #[test]
    fn test_secret_is_32_bytes_base64() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 44);
        assert!(secret.ends_with('='));
        assert_eq!(STANDARD.decode(&secret).unwrap().len(), SECRET_BYTES);
        assert_ne!(secret, generate_secret());
    }

    #[test]
    fn test_set_env_value_replaces_and_appends() {
        let out = set_env_value("A=1\nB=2\n", "B", "3");
        assert_eq!(out, "A=1\nB=3\n");
        let out = set_env_value("A=1", "C", "x=y");
        assert_eq!(out, "A=1\nC=x=y\n");
        let out = set_env_value("export A=1\n", "A", "2");
        assert_eq!(out, "A=2\n");
    }

    #[test]
    fn test_set_env_value_ignores_prefix_keys() {
        let out = set_env_value("SECRET_KEY_OLD=1\n", "SECRET_KEY", "2");
        assert_eq!(out, "SECRET_KEY_OLD=1\nSECRET_KEY=2\n");
    }

    #[test]
    fn test_render_env_with_domain() {
        let out = render_env(TEMPLATE, Some("example.com"));
        let secret = get_env_value(&out, SECRET_KEY).unwrap();
        let jwt = get_env_value(&out, JWT_SECRET).unwrap();
        assert_ne!(secret, "change-me");
        assert_ne!(secret, jwt);
        assert_eq!(
            get_env_value(&out, CORS_ORIGINS),
            Some("http://example.com,https://example.com")
        );
        assert_eq!(get_env_value(&out, "DATABASE_URL"), Some("sqlite:///./app.db"));
        assert!(out.starts_with("# backend settings\n"));
    }

    #[test]
    fn test_render_env_without_domain_keeps_origins() {
        let out = render_env(TEMPLATE, None);
        assert_eq!(get_env_value(&out, CORS_ORIGINS), Some("http://localhost:5173"));
    }

    #[test]
    fn test_existing_file_preserved() {
        let dir = TempDir::new().unwrap();
        let config = InstallConfig::for_repo("https://example.com/app.git")
            .install_dir(dir.path().join("webapp"))
            .domain("example.com");
        std::fs::create_dir_all(config.backend_dir()).unwrap();
        std::fs::write(config.env_template(), TEMPLATE).unwrap();
        let ctx = Context::new(RecordingRunner::new());
        let mut report = Report::new();

        assert_eq!(materialize(&ctx, &config, &mut report).unwrap(), SecretsOutcome::Created);
        let first = std::fs::read_to_string(config.env_file()).unwrap();
        assert_eq!(materialize(&ctx, &config, &mut report).unwrap(), SecretsOutcome::Preserved);
        let second = std::fs::read_to_string(config.env_file()).unwrap();
        assert_eq!(first, second);
        assert!(report.is_clean());
    }

    #[test]
    fn test_missing_template_warns() {
        let dir = TempDir::new().unwrap();
        let config =
            InstallConfig::for_repo("https://example.com/app.git").install_dir(dir.path().join("webapp"));
        let ctx = Context::new(RecordingRunner::new());
        let mut report = Report::new();

        materialize(&ctx, &config, &mut report).unwrap();
        let out = std::fs::read_to_string(config.env_file()).unwrap();
        assert!(get_env_value(&out, SECRET_KEY).is_some());
        assert!(get_env_value(&out, JWT_SECRET).is_some());
        assert_eq!(report.warnings().len(), 1);
    }
}
