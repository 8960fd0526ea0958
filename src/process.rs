//! Subprocess execution with testable command runners.
//!
//! Every external tool (ffmpeg, the transcriber, the OCR engine, the local
//! labeling model) is invoked through the `CommandRunner` trait so stages can
//! be exercised without the tools installed.

use crate::error::{ChapterizeError, Result};
use crossbeam_channel::{RecvTimeoutError, bounded};
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Trait for executing external commands.
///
/// Object-safe, Send + Sync so one runner can be shared by concurrent workers.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, feeding `stdin` when given.
    ///
    /// Returns `ToolNotFound` when the binary is missing, `BackendTimeout` when
    /// `timeout` elapses (the child is killed), and `Collaborator` on a
    /// non-zero exit status.
    fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput>;
}

/// Production runner using `std::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ChapterizeError::ToolNotFound {
                        tool: program.to_string(),
                    }
                } else {
                    ChapterizeError::collaborator(program, format!("failed to start: {e}"))
                }
            })?;

        let input = stdin.map(str::to_string);
        let mut stdin_pipe = child.stdin.take();
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let (tx, rx) = bounded(1);
        let tool = program.to_string();

        // stdin, stdout and stderr each get their own thread so a child that
        // writes while it still reads never stalls on a full pipe.
        let writer = thread::spawn(move || {
            if let (Some(input), Some(pipe)) = (input, stdin_pipe.as_mut())
                && let Err(e) = pipe.write_all(input.as_bytes())
            {
                tracing::debug!(program = %tool, error = %e, "child closed stdin early");
            }
            // Closing stdin lets the child see EOF.
            drop(stdin_pipe);
        });

        thread::spawn(move || {
            let stderr_reader = thread::spawn(move || {
                let mut stderr = Vec::new();
                stderr_pipe
                    .as_mut()
                    .map_or(Ok(0), |p| p.read_to_end(&mut stderr))
                    .map(|_| stderr)
            });
            let mut stdout = Vec::new();
            let out_result = stdout_pipe
                .as_mut()
                .map_or(Ok(0), |p| p.read_to_end(&mut stdout));
            let err_result = stderr_reader
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stderr reader panicked")));
            if writer.join().is_err() {
                tracing::warn!("stdin writer panicked");
            }
            let read = out_result.and(err_result).map(|stderr| (stdout, stderr));
            if tx.send(read).is_err() {
                // Receiver gave up after a timeout
            }
        });

        let received = match timeout {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        let (stdout, stderr) = match received {
            Ok(Ok(buffers)) => buffers,
            Ok(Err(e)) => {
                kill_child(&mut child, program);
                return Err(ChapterizeError::collaborator(
                    program,
                    format!("failed to read output: {e}"),
                ));
            }
            Err(RecvTimeoutError::Timeout) => {
                kill_child(&mut child, program);
                return Err(ChapterizeError::BackendTimeout {
                    timeout_secs: timeout.map_or(0, |t| t.as_secs()),
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                kill_child(&mut child, program);
                return Err(ChapterizeError::collaborator(
                    program,
                    "output reader exited unexpectedly",
                ));
            }
        };

        let status = child.wait()?;
        let output = CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        };

        if !status.success() {
            return Err(ChapterizeError::collaborator(
                program,
                format!("exited with {status}: {}", output.stderr.trim()),
            ));
        }

        Ok(output)
    }
}

fn kill_child(child: &mut Child, program: &str) {
    if let Err(e) = child.kill() {
        tracing::warn!(program, error = %e, "failed to kill child process");
    }
    if let Err(e) = child.wait() {
        tracing::warn!(program, error = %e, "failed to reap child process");
    }
}

/// Replace `placeholder` in every argument with `value`.
pub fn substitute(args: &[String], placeholder: &str, value: &str) -> Vec<String> {
    args.iter()
        .map(|arg| arg.replace(placeholder, value))
        .collect()
}
