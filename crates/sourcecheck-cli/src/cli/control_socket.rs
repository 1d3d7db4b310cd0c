//! Control socket: server (during `sourcecheck check`) and client (for `sourcecheck stop`).
//! Protocol: one line per command; only "stop" is understood.

use anyhow::Result;
use sourcecheck_core::control::RunControl;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;

/// Spawns a task that listens on `path` and requests a stop for each "stop"
/// line. Ignores anything else.
pub fn spawn_control_listener(
    control: RunControl,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)?;
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let control = control.clone();
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            if line.trim() == "stop" {
                                control.request_stop();
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends "stop\n" to the control socket. Returns false if no check is listening.
pub async fn send_stop(socket_path: &Path) -> Result<bool> {
    if !socket_path.exists() {
        return Ok(false);
    }
    let mut stream = match tokio::net::UnixStream::connect(socket_path).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!(path = %socket_path.display(), "control socket connect: {}", e);
            return Ok(false);
        }
    };
    tokio::io::AsyncWriteExt::write_all(&mut stream, b"stop\n").await?;
    Ok(true)
}
