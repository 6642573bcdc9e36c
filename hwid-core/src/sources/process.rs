//! External helper process collector
//!
//! Runs a command, waits for it up to a fixed timeout and treats every
//! whitespace-separated token after the header line as a candidate. This is
//! how serial numbers are queried on platforms without pseudo-files.

use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use super::{CandidateSource, SourceTag};
use crate::constants::process::{MAX_OUTPUT, POLL_INTERVAL};
use crate::error::{HwidError, Result};

/// Collector running helper commands
#[derive(Debug, Clone)]
pub struct ProcessSource {
    commands: Vec<String>,
    timeout: Duration,
}

impl ProcessSource {
    pub fn new(commands: Vec<String>, timeout: Duration) -> Self {
        Self { commands, timeout }
    }

    /// Tokens from all configured commands; failing commands contribute nothing
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();

        for command in &self.commands {
            match run_helper(command, self.timeout) {
                Ok(output) => tokens.extend(output_tokens(&output)),
                Err(e) => trace!(command = %command, error = %e, "Helper produced no candidates"),
            }
        }

        tokens
    }
}

impl CandidateSource for ProcessSource {
    fn list_candidates(&self, tag: SourceTag) -> Result<Vec<String>> {
        match tag {
            SourceTag::ProcessOutput => Ok(self.tokens()),
            _ => Ok(Vec::new()),
        }
    }
}

/// Tokens of helper output, skipping the header token
fn output_tokens(output: &str) -> impl Iterator<Item = String> + '_ {
    output.split_whitespace().skip(1).map(str::to_string)
}

/// Run a whitespace-separated command line and capture its stdout
///
/// The call never blocks longer than `timeout`. A helper still running then
/// is killed; one that exited but left a descendant holding stdout open is
/// abandoned. Both fail with [`HwidError::Timeout`]. Output beyond a few
/// kilobytes is dropped.
pub fn run_helper(command_line: &str, timeout: Duration) -> Result<String> {
    let mut parts = command_line.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| HwidError::config("empty helper command"))?;

    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| HwidError::Spawn {
            command: command_line.to_string(),
            source,
        })?;

    // Drain stdout on a separate thread so a chatty helper cannot block on a
    // full pipe while we wait for it to exit.
    let (tx, rx) = mpsc::channel();
    if let Some(stdout) = child.stdout.take() {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let mut limited = stdout.take(MAX_OUTPUT as u64);
            let _ = limited.read_to_end(&mut buf);
            let _ = io::copy(&mut limited.into_inner(), &mut io::sink());
            let _ = tx.send(buf);
        });
    }

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(HwidError::Timeout(format!(
                "{} did not exit within {:?}",
                command_line, timeout
            )));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let output = match rx.recv_timeout(timeout.saturating_sub(started.elapsed())) {
        Ok(buf) => buf,
        Err(RecvTimeoutError::Timeout) => {
            return Err(HwidError::Timeout(format!(
                "{} kept its output open past {:?}",
                command_line, timeout
            )));
        }
        Err(RecvTimeoutError::Disconnected) => Vec::new(),
    };

    if !status.success() {
        return Err(HwidError::unavailable(format!(
            "{} exited with {}",
            command_line, status
        )));
    }

    Ok(String::from_utf8_lossy(&output).into_owned())
}
