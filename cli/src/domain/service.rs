//! Launch descriptions for the processes started during bootstrap.
//!
//! Pure builders: each turns the configuration into a `ServiceSpec` (or a
//! list of setup invocations) without touching the system.

use std::path::PathBuf;

use crate::domain::config::BootConfig;

/// A process to start detached, with output redirected to `log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub log: PathBuf,
}

impl ServiceSpec {
    /// `program arg1 arg2 …` for log lines.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}

// ── File browser ─────────────────────────────────────────────────────────────

/// One-time configuration invocations of the file browser, in order.
#[must_use]
pub fn filebrowser_setup(config: &BootConfig) -> Vec<Vec<String>> {
    let fb = &config.services.filebrowser;
    let db = config.filebrowser_db().display().to_string();
    let root = config.paths.workspace_root.display().to_string();
    let port = fb.port.to_string();
    vec![
        owned(&["config", "init", "--database", &db]),
        owned(&[
            "config",
            "set",
            "--database",
            &db,
            "--address",
            "0.0.0.0",
            "--port",
            &port,
            "--root",
            &root,
            "--auth.method=json",
        ]),
        owned(&[
            "users",
            "add",
            &fb.admin_user,
            &fb.admin_password,
            "--perm.admin",
            "--database",
            &db,
        ]),
    ]
}

#[must_use]
pub fn filebrowser_service(config: &BootConfig) -> ServiceSpec {
    ServiceSpec {
        name: "filebrowser".to_string(),
        program: config.services.filebrowser.program.clone(),
        args: owned(&[
            "--database",
            &config.filebrowser_db().display().to_string(),
        ]),
        cwd: None,
        env: Vec::new(),
        log: config.paths.log_dir.join("filebrowser.log"),
    }
}

// ── Notebook ─────────────────────────────────────────────────────────────────

/// Notebook server bound to all interfaces; an empty token is permitted.
#[must_use]
pub fn notebook_service(config: &BootConfig, token: &str) -> ServiceSpec {
    let nb = &config.services.notebook;
    let root = config.paths.workspace_root.display().to_string();
    ServiceSpec {
        name: "notebook".to_string(),
        program: nb.program.clone(),
        args: vec![
            "lab".to_string(),
            "--allow-root".to_string(),
            "--no-browser".to_string(),
            format!("--port={}", nb.port),
            "--ip=0.0.0.0".to_string(),
            "--FileContentsManager.delete_to_trash=False".to_string(),
            r#"--ServerApp.terminado_settings={"shell_command":["/bin/bash"]}"#.to_string(),
            format!("--IdentityProvider.token={token}"),
            "--ServerApp.allow_origin=*".to_string(),
            format!("--notebook-dir={root}"),
        ],
        cwd: Some(config.paths.workspace_root.clone()),
        env: Vec::new(),
        log: config.paths.log_dir.join("notebook.log"),
    }
}

// ── Main application ─────────────────────────────────────────────────────────

/// The main application run through the isolated environment's interpreter.
#[must_use]
pub fn main_service(config: &BootConfig, args: Vec<String>, inherited_path: &str) -> ServiceSpec {
    let venv = config.venv_dir();
    let bin = venv.join("bin");
    let path = if inherited_path.is_empty() {
        bin.display().to_string()
    } else {
        format!("{}:{inherited_path}", bin.display())
    };

    let mut full_args = vec![config.app.entry.clone()];
    full_args.extend(args);

    ServiceSpec {
        name: config.app.name.clone(),
        program: config.venv_python().display().to_string(),
        args: full_args,
        cwd: Some(config.app_dir()),
        env: vec![
            ("VIRTUAL_ENV".to_string(), venv.display().to_string()),
            ("PATH".to_string(), path),
        ],
        log: config.app_log(),
    }
}
