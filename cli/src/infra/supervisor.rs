//! Infrastructure implementation of the `ServiceLauncher` port.
//!
//! Auxiliary services are spawned in their own process group with output
//! appended to their log file and are never waited on. The anchor shares
//! the entrypoint's process group; its log is copied to stdout until it
//! exits.

use std::fs::{File, OpenOptions};
use std::io::SeekFrom;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::application::ports::ServiceLauncher;
use crate::domain::ServiceSpec;

/// How often the anchor log is polled for new output.
const FOLLOW_INTERVAL: Duration = Duration::from_millis(250);

/// Production `ServiceLauncher` backed by `tokio::process`.
pub struct TokioServiceLauncher;

fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log {}", path.display()))
}

/// Ask the anchor to stop. Returns false (and logs) if the signal failed.
fn signal_stop(child: &mut Child, service: &str) -> bool {
    match child.start_kill() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(%service, error = %e, "failed to signal anchor");
            false
        }
    }
}

fn command(spec: &ServiceSpec, log: &File) -> Result<Command> {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(log.try_clone().context("duplicating log handle")?)
        .stderr(log.try_clone().context("duplicating log handle")?)
        .kill_on_drop(false);
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    Ok(cmd)
}

/// Copy everything currently readable from `reader` to `out`.
async fn drain<R, W>(reader: &mut R, out: &mut W, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let n = reader.read(buf).await.context("reading anchor log")?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).await.context("writing anchor log")?;
    }
    out.flush().await.context("flushing anchor log")
}

impl ServiceLauncher for TokioServiceLauncher {
    fn launch(&self, spec: &ServiceSpec) -> Result<u32> {
        let log = open_log(&spec.log)?;
        let mut cmd = command(spec, &log)?;
        cmd.process_group(0);
        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {}", spec.program))?;
        child
            .id()
            .with_context(|| format!("{} exited before its pid was read", spec.name))
    }

    async fn run_anchor(&self, spec: &ServiceSpec) -> Result<ExitStatus> {
        let log = open_log(&spec.log)?;
        let start = log
            .metadata()
            .with_context(|| format!("reading {}", spec.log.display()))?
            .len();
        let mut child = command(spec, &log)?
            .spawn()
            .with_context(|| format!("failed to spawn {}", spec.program))?;
        tracing::info!(service = %spec.name, pid = ?child.id(), log = %spec.log.display(), "anchor started");

        let mut reader = tokio::fs::File::open(&spec.log)
            .await
            .with_context(|| format!("opening {} for follow", spec.log.display()))?;
        reader
            .seek(SeekFrom::Start(start))
            .await
            .context("seeking anchor log")?;
        let mut stdout = tokio::io::stdout();
        let mut buf = vec![0u8; 8192];

        let status = loop {
            drain(&mut reader, &mut stdout, &mut buf).await?;
            tokio::select! {
                status = child.wait() => {
                    break status.with_context(|| format!("waiting for {}", spec.name))?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(service = %spec.name, "interrupt received, stopping anchor");
                    signal_stop(&mut child, &spec.name);
                }
                () = tokio::time::sleep(FOLLOW_INTERVAL) => {}
            }
        };
        drain(&mut reader, &mut stdout, &mut buf).await?;
        tracing::info!(service = %spec.name, %status, "anchor exited");
        Ok(status)
    }
}
