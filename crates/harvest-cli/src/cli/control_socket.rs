//! Control socket: server (during `harvest run`) and client (`harvest status`, `harvest stop`).
//! Protocol: one command per line. "status" is answered with one JSON line,
//! "stop" stops all workers and is answered with "ok".

use anyhow::{bail, Result};
use harvest_core::scheduler::Scheduler;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Reply to one command line.
fn respond(sched: &Scheduler, line: &str) -> String {
    match line.trim() {
        "status" => {
            let mut reply = serde_json::to_value(sched.snapshot()).unwrap_or_default();
            reply["workers"] = serde_json::to_value(sched.worker_rows()).unwrap_or_default();
            reply.to_string()
        }
        "stop" => {
            sched.stop_all();
            "ok".to_string()
        }
        other => format!("error: unknown command {:?}", other),
    }
}

/// A bound control socket. Closing it unlinks the path only if it still
/// refers to the socket this process bound.
pub struct ControlSocket {
    path: PathBuf,
    ino: u64,
    task: tokio::task::JoinHandle<()>,
}

impl ControlSocket {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(self) {
        self.task.abort();
        let ours = std::fs::metadata(&self.path).map(|m| m.ino()).ok() == Some(self.ino);
        if ours {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// True if a harvest is answering on `socket_path`.
pub async fn harvest_is_live(socket_path: &Path) -> Result<bool> {
    Ok(request_status(socket_path).await?.is_some())
}

/// Binds `path` and spawns a task answering commands for `sched`.
///
/// A socket file nobody listens on is replaced; a live one is an error.
pub async fn spawn_control_listener(
    sched: Arc<Scheduler>,
    path: impl AsRef<Path>,
) -> Result<ControlSocket> {
    let path = path.as_ref().to_path_buf();
    if path.exists() {
        match UnixStream::connect(&path).await {
            Ok(_) => bail!("a harvest is already running on {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                tracing::debug!(path = %path.display(), "removing stale control socket");
                std::fs::remove_file(&path)?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    let listener = UnixListener::bind(&path)?;
    let ino = std::fs::metadata(&path)?.ino();

    let task = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let sched = Arc::clone(&sched);
                    tokio::spawn(async move {
                        let (read, mut write) = stream.into_split();
                        let mut lines = BufReader::new(read).lines();
                        while let Ok(Some(line)) = lines.next_line().await {
                            let mut reply = respond(&sched, &line);
                            reply.push('\n');
                            if write.write_all(reply.as_bytes()).await.is_err() {
                                break;
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(ControlSocket { path, ino, task })
}

/// Sends one command and returns the reply line, or None if nothing is listening.
async fn request(socket_path: &Path, command: &str) -> Result<Option<String>> {
    if !socket_path.exists() {
        return Ok(None);
    }
    let stream = match UnixStream::connect(socket_path).await {
        Ok(s) => s,
        // Stale socket file left by a run that did not exit cleanly.
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let (read, mut write) = stream.into_split();
    write.write_all(format!("{}\n", command).as_bytes()).await?;
    let reply = BufReader::new(read).lines().next_line().await?;
    Ok(reply)
}

/// Current snapshot and worker rows of the running harvest.
pub async fn request_status(socket_path: &Path) -> Result<Option<serde_json::Value>> {
    match request(socket_path, "status").await? {
        Some(line) => Ok(Some(serde_json::from_str(&line)?)),
        None => Ok(None),
    }
}

/// Asks the running harvest to stop. Returns false if none is running.
pub async fn send_stop(socket_path: &Path) -> Result<bool> {
    Ok(matches!(request(socket_path, "stop").await?.as_deref(), Some("ok")))
}
