//! Child-process helpers for the external collaborators (ffprobe, whisper-cli)

use crate::error::{AudiometaError, Result};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// Resolve `program` on PATH (or as a path to an executable)
pub fn resolve_command(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

#[must_use]
pub fn command_exists(program: &str) -> bool {
    resolve_command(program).is_some()
}

/// Run `program` to completion, killing it once `timeout` elapses
///
/// Non-zero exit is an error carrying the child's stderr.
pub fn run_command_with_timeout(
    program: &str,
    args: &[OsString],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<Output> {
    let resolved = resolve_command(program).ok_or_else(|| AudiometaError::CommandMissing {
        command: program.to_owned(),
    })?;

    let rendered = render(program, args);
    debug!("Running `{}` (timeout {:?})", rendered, timeout);

    let mut command = Command::new(&resolved);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn()?;
    let started_at = Instant::now();

    let stdout_rx = drain(child.stdout.take());
    let stderr_rx = drain(child.stderr.take());

    loop {
        if let Some(status) = child.try_wait()? {
            let stdout = stdout_rx.recv_timeout(PIPE_DRAIN_TIMEOUT).unwrap_or_default();
            let stderr = stderr_rx.recv_timeout(PIPE_DRAIN_TIMEOUT).unwrap_or_default();
            trace!(
                "`{}` exited with {} after {:?}",
                rendered,
                status,
                started_at.elapsed()
            );
            return validate_command_output(
                rendered,
                Output {
                    status,
                    stdout,
                    stderr,
                },
            );
        }

        if started_at.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            let stderr = stderr_rx.recv_timeout(PIPE_DRAIN_TIMEOUT).unwrap_or_default();
            return Err(AudiometaError::from_command_timeout(
                rendered,
                saturating_duration_ms(timeout),
                &String::from_utf8_lossy(&stderr),
            ));
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Read a pipe to its end on a helper thread so the child never blocks on a
/// full pipe buffer
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

fn validate_command_output(rendered: String, output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    Err(AudiometaError::from_command_failure(
        rendered,
        output.status.code().unwrap_or(-1),
        &String::from_utf8_lossy(&output.stderr),
    ))
}

fn render(program: &str, args: &[OsString]) -> String {
    let mut rendered = program.to_owned();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.to_string_lossy());
    }
    rendered
}

fn saturating_duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
