//! Remote shell identity helpers: host key paths, public key validation,
//! and password generation.

use std::path::{Path, PathBuf};

use rand::distr::{Alphanumeric, SampleString};

use crate::domain::error::SecretError;

/// Host key types the daemon understands.
pub const SUPPORTED_KEY_TYPES: &[&str] = &["rsa", "dsa", "ecdsa", "ed25519"];

/// Daemon option that makes it read the per-session environment file.
pub const PERMIT_USER_ENVIRONMENT: &str = "PermitUserEnvironment yes";

/// Rewrite an `sshd_config` so the global section enables per-session
/// environment files. Returns `None` when it already does.
///
/// sshd honours the first occurrence of a keyword, and everything after the
/// first `Match` line is conditional, so an existing global directive is
/// replaced in place and a missing one is inserted before the first `Match`.
#[must_use]
pub fn enable_user_environment(config: &str) -> Option<String> {
    let keyword = |line: &str| line.split_whitespace().next().map(str::to_ascii_lowercase);
    let mut lines: Vec<String> = config.lines().map(str::to_string).collect();
    let match_at = lines
        .iter()
        .position(|l| keyword(l).as_deref() == Some("match"))
        .unwrap_or(lines.len());

    let existing = lines[..match_at]
        .iter()
        .position(|l| keyword(l).as_deref() == Some("permituserenvironment"));
    match existing {
        Some(i) => {
            let value = lines[i].split_whitespace().nth(1).unwrap_or_default();
            if value.eq_ignore_ascii_case("yes") {
                return None;
            }
            lines[i] = PERMIT_USER_ENVIRONMENT.to_string();
        }
        None => lines.insert(match_at, PERMIT_USER_ENVIRONMENT.to_string()),
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Some(out)
}

/// Path of the private host key for `key_type` inside `dir`.
///
/// # Errors
///
/// Returns `SecretError::UnsupportedKeyType` for unknown types.
pub fn host_key_path(dir: &Path, key_type: &str) -> Result<PathBuf, SecretError> {
    if !SUPPORTED_KEY_TYPES.contains(&key_type) {
        return Err(SecretError::UnsupportedKeyType(key_type.to_string()));
    }
    Ok(dir.join(format!("ssh_host_{key_type}_key")))
}

/// Validates that `key` looks like an authorized-keys entry: a known key
/// type followed by non-empty base64 material (an optional comment may follow).
///
/// # Errors
///
/// Returns `SecretError::InvalidPublicKey` otherwise.
pub fn validate_public_key(key: &str) -> Result<(), SecretError> {
    let invalid = || SecretError::InvalidPublicKey(key.to_string());
    let mut parts = key.split_whitespace();
    let key_type = parts.next().ok_or_else(invalid)?;
    let material = parts.next().ok_or_else(invalid)?;

    let known_type = key_type.starts_with("ssh-")
        || key_type.starts_with("ecdsa-sha2-")
        || key_type.starts_with("sk-");
    let base64 = material
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='));
    if known_type && base64 {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Length of generated root passwords.
pub const PASSWORD_LEN: usize = 32;

/// Generate a random alphanumeric password from the thread-local CSPRNG
/// (seeded from the operating system).
#[must_use]
pub fn generate_password() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), PASSWORD_LEN)
}
