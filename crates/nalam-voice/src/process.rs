//! Runs a speech engine subprocess to completion under one deadline.

use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub(crate) enum EngineError {
    #[error("failed to spawn {engine}: {source}")]
    Spawn { engine: String, source: io::Error },

    #[error("failed to open stdin of {engine}")]
    NoStdin { engine: String },

    #[error("{engine} timed out after {} seconds", .limit.as_secs())]
    TimedOut { engine: String, limit: Duration },

    #[error("failed to wait for {engine}: {source}")]
    Wait { engine: String, source: io::Error },

    #[error("failed to write to {engine} stdin: {detail}")]
    Write { engine: String, detail: String },

    #[error("{engine} failed: {stderr}")]
    Failed { engine: String, stderr: String },
}

/// Spawns `command`, feeds it `input` (if any) and collects its output.
///
/// Stdin is written from its own task while stdout and stderr are drained,
/// so an engine that talks before it reads cannot stall the exchange. The
/// whole exchange, including the write, shares `limit`; on expiry the
/// child is killed. A non-zero exit is reported with the engine's stderr.
/// An engine that exits successfully without reading all of its input is
/// not an error.
pub(crate) async fn run_engine(
    engine: &str,
    command: &mut Command,
    input: Option<Vec<u8>>,
    limit: Duration,
) -> Result<Output, EngineError> {
    let engine_name = || engine.to_string();

    command.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    command.kill_on_drop(true);
    let mut child = command.spawn().map_err(|source| EngineError::Spawn {
        engine: engine_name(),
        source,
    })?;

    let writer = match input {
        Some(bytes) => {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| EngineError::NoStdin {
                    engine: engine_name(),
                })?;
            Some(tokio::spawn(async move {
                let written = stdin.write_all(&bytes).await;
                drop(stdin);
                written
            }))
        }
        None => None,
    };

    let exchange = async {
        let output = child.wait_with_output().await;
        let written = match writer {
            Some(task) => match task.await {
                Ok(result) => result.map_err(|e| (e.kind(), e.to_string())),
                Err(join) => Err((io::ErrorKind::Other, join.to_string())),
            },
            None => Ok(()),
        };
        (output, written)
    };

    let (output, written) = tokio::time::timeout(limit, exchange)
        .await
        .map_err(|_| EngineError::TimedOut {
            engine: engine_name(),
            limit,
        })?;
    let output = output.map_err(|source| EngineError::Wait {
        engine: engine_name(),
        source,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EngineError::Failed {
            engine: engine_name(),
            stderr: stderr.trim().to_string(),
        });
    }

    match written {
        Ok(()) => {}
        Err((io::ErrorKind::BrokenPipe, _)) => {
            tracing::debug!(engine, "engine exited before reading all input");
        }
        Err((_, detail)) => {
            return Err(EngineError::Write {
                engine: engine_name(),
                detail,
            })
        }
    }

    Ok(output)
}
