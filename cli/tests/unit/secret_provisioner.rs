//! Unit tests for `provision_remote_access`.

#![allow(clippy::expect_used)]

use ignite_cli::application::services::secret_provisioner::{AccessMode, provision_remote_access};
use ignite_cli::domain::ssh::PASSWORD_LEN;

use crate::helpers::{err_output, test_config};
use crate::mocks::{MemFs, MissingBinaryRunner, RecordingReporter, RecordingRunner};

const KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIOperatorKey op@laptop";

fn with_host_keys(fs: MemFs) -> MemFs {
    ["rsa", "ecdsa", "ed25519"].iter().fold(fs, |fs, t| {
        fs.with_file(format!("/etc/ssh/ssh_host_{t}_key"), "private")
    })
}

#[tokio::test]
async fn test_missing_host_keys_are_generated_once_each() {
    let fs = MemFs::new();
    let runner = RecordingRunner::new();
    let report = provision_remote_access(&runner, &fs, &RecordingReporter::new(), &test_config(), Some(KEY))
        .await
        .expect("provision");

    assert_eq!(report.generated_keys, ["rsa", "ecdsa", "ed25519"]);
    let lines = runner.lines();
    for t in ["rsa", "ecdsa", "ed25519"] {
        let generate = format!("ssh-keygen -t {t} -f /etc/ssh/ssh_host_{t}_key -q -N ");
        assert_eq!(
            lines.iter().filter(|l| l.starts_with(&generate)).count(),
            1,
            "{t} must be generated exactly once: {lines:?}"
        );
        let fingerprint = format!("ssh-keygen -lf /etc/ssh/ssh_host_{t}_key.pub");
        assert!(lines.contains(&fingerprint), "missing {fingerprint}");
    }
    let keygen = runner.calls().into_iter().find(|c| c.args.contains(&"-N".to_string())).expect("keygen");
    assert_eq!(keygen.args.last().map(String::as_str), Some(""), "empty passphrase");
}

#[tokio::test]
async fn test_existing_host_keys_are_never_regenerated() {
    let fs = with_host_keys(MemFs::new());
    let runner = RecordingRunner::new();
    let report = provision_remote_access(&runner, &fs, &RecordingReporter::new(), &test_config(), Some(KEY))
        .await
        .expect("provision");

    assert!(report.generated_keys.is_empty());
    assert!(runner.lines().iter().all(|l| !l.starts_with("ssh-keygen")));
    assert_eq!(fs.file("/etc/ssh/ssh_host_rsa_key").as_deref(), Some("private"));
}

#[tokio::test]
async fn test_public_key_is_authorized_once_with_restricted_modes() {
    let fs = with_host_keys(MemFs::new());
    let cfg = test_config();
    for _ in 0..2 {
        let report = provision_remote_access(&RecordingRunner::new(), &fs, &RecordingReporter::new(), &cfg, Some(KEY))
            .await
            .expect("provision");
        assert_eq!(report.mode, AccessMode::PublicKey);
    }

    let authorized = fs.file("/home/op/.ssh/authorized_keys").expect("authorized_keys");
    assert_eq!(authorized.matches(KEY).count(), 1, "key appended twice: {authorized}");
    assert_eq!(fs.mode("/home/op/.ssh"), Some(0o700));
    assert_eq!(fs.mode("/home/op/.ssh/authorized_keys"), Some(0o600));
}

#[tokio::test]
async fn test_public_key_path_sets_no_password() {
    let fs = with_host_keys(MemFs::new());
    let runner = RecordingRunner::new();
    provision_remote_access(&runner, &fs, &RecordingReporter::new(), &test_config(), Some(KEY))
        .await
        .expect("provision");
    assert!(runner.calls().iter().all(|c| c.program != "chpasswd"));
}

#[tokio::test]
async fn test_without_key_a_random_password_is_set() {
    let fs = with_host_keys(MemFs::new());
    let runner = RecordingRunner::new();
    let report = provision_remote_access(&runner, &fs, &RecordingReporter::new(), &test_config(), None)
        .await
        .expect("provision");
    assert_eq!(report.mode, AccessMode::Password);

    let call = runner
        .calls()
        .into_iter()
        .find(|c| c.program == "chpasswd")
        .expect("chpasswd call");
    let stdin = call.stdin.expect("password on stdin");
    let password = stdin
        .strip_prefix("root:")
        .and_then(|s| s.strip_suffix('\n'))
        .expect("root:<password>\\n");
    assert_eq!(password.len(), PASSWORD_LEN);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    assert!(fs.file("/home/op/.ssh/authorized_keys").is_none());
}

#[tokio::test]
async fn test_blank_public_key_falls_back_to_password() {
    let fs = with_host_keys(MemFs::new());
    let runner = RecordingRunner::new();
    let report = provision_remote_access(&runner, &fs, &RecordingReporter::new(), &test_config(), Some("   "))
        .await
        .expect("provision");
    assert_eq!(report.mode, AccessMode::Password);
}

#[tokio::test]
async fn test_malformed_public_key_is_fatal_before_daemon_start() {
    let fs = with_host_keys(MemFs::new());
    let runner = RecordingRunner::new();
    let err = provision_remote_access(&runner, &fs, &RecordingReporter::new(), &test_config(), Some("not-a-key"))
        .await
        .expect_err("must fail");
    assert!(format!("{err:#}").contains("Public key"), "got: {err:#}");
    assert!(runner.calls().iter().all(|c| c.program != "/usr/sbin/sshd"));
}

#[tokio::test]
async fn test_daemon_config_permits_user_environment_once() {
    let fs = with_host_keys(MemFs::new()).with_file("/etc/ssh/sshd_config", "Port 22");
    let cfg = test_config();
    for _ in 0..2 {
        provision_remote_access(&RecordingRunner::new(), &fs, &RecordingReporter::new(), &cfg, Some(KEY))
            .await
            .expect("provision");
    }
    let sshd_config = fs.file("/etc/ssh/sshd_config").expect("config");
    assert_eq!(sshd_config, "Port 22\nPermitUserEnvironment yes\n");
}

#[tokio::test]
async fn test_daemon_config_directive_is_replaced_and_kept_out_of_match_blocks() {
    let original = "Port 22\nPermitUserEnvironment no\nMatch User guest\n    X11Forwarding no\n";
    let fs = with_host_keys(MemFs::new()).with_file("/etc/ssh/sshd_config", original);
    provision_remote_access(&RecordingRunner::new(), &fs, &RecordingReporter::new(), &test_config(), Some(KEY))
        .await
        .expect("provision");
    assert_eq!(
        fs.file("/etc/ssh/sshd_config").expect("config"),
        "Port 22\nPermitUserEnvironment yes\nMatch User guest\n    X11Forwarding no\n"
    );
    assert!(fs.atomic_writes().contains(&"/etc/ssh/sshd_config".into()));
}

#[tokio::test]
async fn test_daemon_is_started_last() {
    let fs = MemFs::new();
    let runner = RecordingRunner::new();
    provision_remote_access(&runner, &fs, &RecordingReporter::new(), &test_config(), None)
        .await
        .expect("provision");
    let last = runner.calls().pop().expect("calls");
    assert_eq!(last.program, "/usr/sbin/sshd");
}

#[tokio::test]
async fn test_key_generation_failure_is_fatal() {
    let fs = MemFs::new();
    let runner = RecordingRunner::new().failing("-t rsa", err_output(1, b"permission denied"));
    let err = provision_remote_access(&runner, &fs, &RecordingReporter::new(), &test_config(), Some(KEY))
        .await
        .expect_err("must fail");
    let msg = format!("{err:#}");
    assert!(msg.contains("permission denied"), "got: {msg}");
    assert!(runner.lines().iter().all(|l| !l.contains("-t ecdsa")));
}

#[tokio::test]
async fn test_missing_keygen_binary_is_fatal() {
    let err = provision_remote_access(&MissingBinaryRunner, &MemFs::new(), &RecordingReporter::new(), &test_config(), Some(KEY))
        .await
        .expect_err("must fail");
    assert!(format!("{err:#}").contains("ssh-keygen"), "got: {err:#}");
}

#[tokio::test]
async fn test_daemon_start_failure_is_fatal() {
    let fs = with_host_keys(MemFs::new());
    let runner = RecordingRunner::new().failing("sshd", err_output(255, b"Missing privilege separation directory"));
    let err = provision_remote_access(&runner, &fs, &RecordingReporter::new(), &test_config(), Some(KEY))
        .await
        .expect_err("must fail");
    assert!(format!("{err:#}").contains("privilege separation"), "got: {err:#}");
}
