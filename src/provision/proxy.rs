//! nginx site: `/api/` to the backend, everything else to the static
//! frontend with single-page-app fallback.

use crate::config::InstallConfig;
use crate::core::output;
use crate::executor::{Cmd, Context, ExecuteError, Report};

/// Name of the site Debian's nginx package enables out of the box.
pub const DEFAULT_SITE: &str = "default";

/// Render the site. Output depends only on `config`.
pub fn render_site(config: &InstallConfig) -> String {
    let server_name = config.domain_name().unwrap_or("_");
    format!(
        r#"server {{
    listen 80;
    listen [::]:80;
    server_name {server_name};

    root {root};
    index index.html;

    location /api/ {{
        proxy_pass http://{upstream};
        proxy_http_version 1.1;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
    }}

    location / {{
        try_files $uri $uri/ /index.html;
    }}
}}
"#,
        server_name = server_name,
        root = config.frontend_dir().display(),
        upstream = config.backend_addr(),
    )
}

/// Write and enable the site, validate, then reload nginx.
///
/// A configuration nginx rejects is an error: the site is disabled again,
/// the default site stays enabled and nginx is not reloaded.
pub fn install(ctx: &Context, config: &InstallConfig, report: &mut Report) -> Result<(), ExecuteError> {
    let site = config.site_name();
    let available = ctx.layout.site_available(site);
    let enabled = ctx.layout.site_enabled(site);

    ctx.write_file(&available, &render_site(config), Some(0o644))?;
    ctx.symlink(&available, &enabled)?;

    let check = ctx.run_unchecked(&Cmd::new("nginx").arg("-t"))?;
    if !check.success() {
        report.best_effort("disabling rejected site", ctx.remove_file(&enabled));
        return Err(ExecuteError::ProxyConfigInvalid {
            details: check.stderr.trim().to_string(),
        });
    }

    if ctx.remove_file(&ctx.layout.site_enabled(DEFAULT_SITE))? {
        output::detail("disabled the default nginx site");
    }

    reload(ctx, report);
    Ok(())
}

/// Reload nginx if it is running, start it otherwise. Never fatal.
pub fn reload(ctx: &Context, report: &mut Report) {
    let active = ctx.probe(&Cmd::new("systemctl").args(["is-active", "--quiet", "nginx"]));
    let action = if active { "reload" } else { "restart" };
    report.best_effort(
        &format!("systemctl {} nginx", action),
        ctx.run(&Cmd::new("systemctl").args([action, "nginx"])),
    );
}
