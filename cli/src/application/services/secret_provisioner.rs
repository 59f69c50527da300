//! Application service: remote shell access.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Every failure here is fatal: the container must not come up without a
//! way in.

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, LocalFs, ProgressReporter};
use crate::application::services::{append_line_once, check_output};
use crate::domain::config::BootConfig;
use crate::domain::ssh::{
    enable_user_environment, generate_password, host_key_path, validate_public_key,
};

/// How the administrative account can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessMode {
    /// The supplied public key is authorized.
    PublicKey,
    /// A random password was set and reported once.
    Password,
}

/// Outcome of `provision_remote_access`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReport {
    /// Host key types generated on this start (empty when all existed).
    pub generated_keys: Vec<String>,
    pub mode: AccessMode,
}

/// Ensure host keys, install the access credential, and start the daemon.
///
/// # Errors
///
/// Returns an error if key generation fails (including a missing
/// `ssh-keygen`), the public key is malformed, the password cannot be set,
/// or the daemon fails to start.
pub async fn provision_remote_access(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
    public_key: Option<&str>,
) -> Result<AccessReport> {
    reporter.step("ensuring remote shell host keys...");
    let generated_keys = ensure_host_keys(runner, fs, config).await?;

    let mode = match public_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            authorize_key(fs, config, key)?;
            reporter.success("public key authorized");
            AccessMode::PublicKey
        }
        None => {
            set_random_password(runner, config).await?;
            AccessMode::Password
        }
    };

    permit_user_environment(fs, config)
        .context("enabling per-session environment in daemon config")?;

    reporter.step("starting remote shell daemon...");
    let daemon = config.ssh.daemon.display().to_string();
    let output = runner
        .run(&daemon, &[])
        .await
        .context("starting remote shell daemon")?;
    check_output(&output, &daemon)?;
    reporter.success("remote shell daemon started");

    Ok(AccessReport {
        generated_keys,
        mode,
    })
}

/// Generate each missing host key exactly once; existing keys are kept.
async fn ensure_host_keys(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    config: &BootConfig,
) -> Result<Vec<String>> {
    let mut generated = Vec::new();
    for key_type in &config.ssh.key_types {
        let path = host_key_path(&config.ssh.host_key_dir, key_type)?;
        if fs.exists(&path) {
            continue;
        }
        let path_str = path.display().to_string();
        let output = runner
            .run(
                "ssh-keygen",
                &["-t", key_type, "-f", &path_str, "-q", "-N", ""],
            )
            .await
            .with_context(|| format!("generating {key_type} host key"))?;
        check_output(&output, "ssh-keygen")?;

        let public = format!("{path_str}.pub");
        let fingerprint = runner
            .run("ssh-keygen", &["-lf", &public])
            .await
            .with_context(|| format!("fingerprinting {public}"))?;
        check_output(&fingerprint, "ssh-keygen")?;
        tracing::info!(
            key_type = %key_type,
            fingerprint = %String::from_utf8_lossy(&fingerprint.stdout).trim(),
            "generated host key"
        );
        generated.push(key_type.clone());
    }
    Ok(generated)
}

/// Append the key to `authorized_keys` once and restrict the directory.
fn authorize_key(fs: &impl LocalFs, config: &BootConfig, key: &str) -> Result<()> {
    validate_public_key(key)?;
    let ssh_dir = config.ssh_dir();
    fs.create_dir_all(&ssh_dir)?;
    let authorized = ssh_dir.join("authorized_keys");
    append_line_once(fs, &authorized, key).context("installing authorized key")?;
    fs.set_permissions(&ssh_dir, 0o700)?;
    fs.set_permissions(&authorized, 0o600)?;
    Ok(())
}

/// Set a random password for the administrative account and report it once.
async fn set_random_password(runner: &impl CommandRunner, config: &BootConfig) -> Result<()> {
    let password = generate_password();
    let input = format!("{}:{password}\n", config.ssh.user);
    let output = runner
        .run_with_stdin("chpasswd", &[], input.as_bytes())
        .await
        .context("setting remote shell password")?;
    check_output(&output, "chpasswd")?;
    tracing::warn!(
        user = %config.ssh.user,
        password = %password,
        "no public key supplied; generated a one-time password (not stored anywhere)"
    );
    Ok(())
}

fn permit_user_environment(fs: &impl LocalFs, config: &BootConfig) -> Result<()> {
    let path = &config.ssh.daemon_config;
    let current = if fs.exists(path) {
        fs.read_to_string(path)?
    } else {
        String::new()
    };
    if let Some(updated) = enable_user_environment(&current) {
        fs.write_atomic(path, &updated, 0o644)?;
        tracing::info!(path = %path.display(), "enabled PermitUserEnvironment");
    }
    Ok(())
}
