//! systemd unit for the backend.

use crate::config::InstallConfig;
use crate::executor::{Cmd, Context, ExecuteError, Report};

/// Seconds systemd waits before restarting a crashed backend.
pub const RESTART_DELAY_SECS: u32 = 5;

/// Render the unit. Output depends only on `config`.
pub fn render_unit(config: &InstallConfig) -> String {
    format!(
        r#"[Unit]
Description={service} backend
After=network.target

[Service]
Type=simple
User={user}
Group={user}
WorkingDirectory={workdir}
EnvironmentFile={env_file}
ExecStart={venv}/bin/uvicorn {module} --host {host} --port {port}
Restart=on-failure
RestartSec={delay}

[Install]
WantedBy=multi-user.target
"#,
        service = config.service,
        user = config.user,
        workdir = config.backend_dir().display(),
        env_file = config.env_file().display(),
        venv = config.venv_dir().display(),
        module = config.app_module,
        host = config.backend_host,
        port = config.backend_port,
        delay = RESTART_DELAY_SECS,
    )
}

fn systemctl(args: &[&str]) -> Cmd {
    Cmd::new("systemctl").args(args)
}

/// Write the unit, reload systemd, then enable and restart the service.
///
/// The file is rewritten on every run so manual drift is undone.
pub fn install(ctx: &Context, config: &InstallConfig, report: &mut Report) -> Result<(), ExecuteError> {
    let path = ctx.layout.unit_path(&config.service);
    ctx.write_file(&path, &render_unit(config), Some(0o644))?;
    ctx.run(&systemctl(&["daemon-reload"]))?;

    report.best_effort(
        &format!("systemctl enable {}", config.service),
        ctx.run(&systemctl(&["enable", &config.service])),
    );
    report.best_effort(
        &format!("systemctl restart {}", config.service),
        ctx.run(&systemctl(&["restart", &config.service])),
    );
    Ok(())
}
