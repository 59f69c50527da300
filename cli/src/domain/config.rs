//! Domain types and validators for the bootstrap configuration.
//!
//! Pure functions only, with no I/O or async. Every field
//! carries a default so an absent or partial `config.yaml` is always usable.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::env::EnvFilter;
use crate::domain::error::ConfigError;
use crate::domain::plugin::PluginSource;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `/etc/ignite/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BootConfig {
    /// Filesystem layout of the persistent volume.
    pub paths: PathsConfig,
    /// Remote shell settings.
    pub ssh: SshConfig,
    /// Environment propagation settings.
    pub env: EnvConfig,
    /// Auxiliary services.
    pub services: ServicesConfig,
    /// Main application.
    pub app: AppConfig,
    /// Plugins fetched on first run.
    pub plugins: PluginsConfig,
    /// Corrective version pins applied after every plugin reconciliation.
    pub pins: PinsConfig,
    /// External command timeouts.
    pub timeouts: TimeoutsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the persistent volume (notebook and file-browser root).
    pub workspace_root: PathBuf,
    /// Directory holding the application, its args file, and its log.
    pub install_root: PathBuf,
    /// Directory for auxiliary service logs.
    pub log_dir: PathBuf,
    /// Home directory of the administrative user. Resolved at load time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("/workspace"),
            install_root: PathBuf::from("/workspace/ignite"),
            log_dir: PathBuf::from("/var/log/ignite"),
            home: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Directory containing `ssh_host_<type>_key` files.
    pub host_key_dir: PathBuf,
    /// Host key types generated when missing.
    pub key_types: Vec<String>,
    /// Path to the daemon binary.
    pub daemon: PathBuf,
    /// Daemon configuration file.
    pub daemon_config: PathBuf,
    /// Account receiving the generated password.
    pub user: String,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host_key_dir: PathBuf::from("/etc/ssh"),
            key_types: vec!["rsa".into(), "ecdsa".into(), "ed25519".into()],
            daemon: PathBuf::from("/usr/sbin/sshd"),
            daemon_config: PathBuf::from("/etc/ssh/sshd_config"),
            user: "root".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Regex patterns; a variable is captured when its name matches any.
    pub include: Vec<String>,
    /// System-wide environment file.
    pub system_file: PathBuf,
    /// PAM environment file.
    pub pam_file: PathBuf,
    /// Script sourced by interactive shells.
    pub shell_script: PathBuf,
    /// System-wide interactive shell startup file.
    pub global_rc: PathBuf,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            include: [
                "^RUNPOD_",
                "^PATH$",
                "^_$",
                "^CUDA",
                "^LD_LIBRARY_PATH$",
                "^PYTHONPATH$",
                "^NVIDIA_",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            system_file: PathBuf::from("/etc/environment"),
            pam_file: PathBuf::from("/etc/security/pam_env.conf"),
            shell_script: PathBuf::from("/etc/container_environment.sh"),
            global_rc: PathBuf::from("/etc/bash.bashrc"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServicesConfig {
    pub filebrowser: FileBrowserConfig,
    pub notebook: NotebookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBrowserConfig {
    pub enabled: bool,
    pub program: String,
    pub port: u16,
    pub admin_user: String,
    /// Well-known default credential; change it through the UI after boot.
    pub admin_password: String,
}

impl Default for FileBrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "filebrowser".to_string(),
            port: 8080,
            admin_user: "admin".to_string(),
            admin_password: "adminadmin12".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookConfig {
    pub enabled: bool,
    pub program: String,
    pub port: u16,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "jupyter".to_string(),
            port: 8888,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory name of the application under `install_root`.
    pub name: String,
    /// Git URL the application is cloned from.
    pub repo: String,
    /// Entry script relative to the application directory.
    pub entry: String,
    /// Bind address passed as `--listen`.
    pub listen: String,
    /// Port passed as `--port`.
    pub port: u16,
    /// Interpreter used to create the isolated environment.
    pub python: String,
    /// Name of the isolated environment directory inside the application.
    pub venv: String,
    /// Plugin directory inside the application.
    pub plugin_dir: String,
    /// User-editable argument file name under `install_root`.
    pub args_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "ComfyUI".to_string(),
            repo: "https://github.com/comfyanonymous/ComfyUI.git".to_string(),
            entry: "main.py".to_string(),
            listen: "0.0.0.0".to_string(),
            port: 8188,
            python: "python3".to_string(),
            venv: ".venv".to_string(),
            plugin_dir: "custom_nodes".to_string(),
            args_file: "comfyui_args.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Base URL for `owner/repo` shorthand.
    pub source_base: String,
    /// Plugins every installation receives.
    pub baseline: Vec<String>,
    /// Additional plugins declared by the operator.
    pub extra: Vec<String>,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            source_base: "https://github.com".to_string(),
            baseline: vec![
                "ltdrdata/ComfyUI-Manager".to_string(),
                "kijai/ComfyUI-KJNodes".to_string(),
                "crystian/ComfyUI-Crystools".to_string(),
            ],
            extra: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinsConfig {
    /// Reinstalled with `--force-reinstall --no-deps`.
    pub force_no_deps: Vec<String>,
    /// Installed normally after the forced set.
    pub normal: Vec<String>,
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            force_no_deps: vec!["numpy==1.26.4".to_string()],
            normal: vec!["opencv-python-headless==4.10.0.84".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Timeout for short commands (key generation, service setup).
    pub command_secs: u64,
    /// Timeout for fetches and package installs.
    pub install_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            command_secs: 120,
            install_secs: 3600,
        }
    }
}

// ── Derived paths ────────────────────────────────────────────────────────────

impl BootConfig {
    /// Home directory of the administrative user (`/root` when unresolved).
    #[must_use]
    pub fn home_dir(&self) -> PathBuf {
        self.paths
            .home
            .clone()
            .unwrap_or_else(|| PathBuf::from("/root"))
    }

    #[must_use]
    pub fn app_dir(&self) -> PathBuf {
        self.paths.install_root.join(&self.app.name)
    }

    #[must_use]
    pub fn venv_dir(&self) -> PathBuf {
        self.app_dir().join(&self.app.venv)
    }

    /// Interpreter inside the isolated environment.
    #[must_use]
    pub fn venv_python(&self) -> PathBuf {
        self.venv_dir().join("bin").join("python")
    }

    #[must_use]
    pub fn plugin_root(&self) -> PathBuf {
        self.app_dir().join(&self.app.plugin_dir)
    }

    #[must_use]
    pub fn args_file(&self) -> PathBuf {
        self.paths.install_root.join(&self.app.args_file)
    }

    #[must_use]
    pub fn app_log(&self) -> PathBuf {
        self.paths
            .install_root
            .join(format!("{}.log", self.app.name.to_lowercase()))
    }

    /// Directory holding completion markers.
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.paths.install_root.join(".ignite")
    }

    #[must_use]
    pub fn filebrowser_db(&self) -> PathBuf {
        self.paths.install_root.join("filebrowser.db")
    }

    #[must_use]
    pub fn ssh_dir(&self) -> PathBuf {
        self.home_dir().join(".ssh")
    }

    /// Per-session environment file read by the remote-shell daemon.
    #[must_use]
    pub fn session_env_file(&self) -> PathBuf {
        self.ssh_dir().join("environment")
    }

    /// Interactive shell startup files that source the propagated script.
    #[must_use]
    pub fn shell_rc_files(&self) -> Vec<PathBuf> {
        vec![self.home_dir().join(".bashrc"), self.env.global_rc.clone()]
    }

    /// Validates ports, patterns, and plugin sources.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ports = [
            ("remote shell", 22),
            ("file browser", self.services.filebrowser.port),
            ("notebook", self.services.notebook.port),
            (self.app.name.as_str(), self.app.port),
        ];
        for (i, (service, port)) in ports.iter().enumerate() {
            if *port == 0 {
                return Err(ConfigError::InvalidPort {
                    service: (*service).to_string(),
                    port: *port,
                });
            }
            if let Some((first, _)) = ports[..i].iter().find(|(_, p)| p == port) {
                return Err(ConfigError::PortConflict {
                    port: *port,
                    first: (*first).to_string(),
                    second: (*service).to_string(),
                });
            }
        }

        for (key, value) in [
            ("app.name", &self.app.name),
            ("app.repo", &self.app.repo),
            ("app.entry", &self.app.entry),
            ("app.python", &self.app.python),
            ("app.venv", &self.app.venv),
            ("app.plugin_dir", &self.app.plugin_dir),
            ("app.args_file", &self.app.args_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty {
                    key: key.to_string(),
                });
            }
        }

        EnvFilter::new(&self.env.include)?;
        for spec in self.plugins.baseline.iter().chain(&self.plugins.extra) {
            PluginSource::parse(spec, &self.plugins.source_base)?;
        }
        Ok(())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
