use crate::config::{Config, DEFAULT_RUNNER};
use crate::error::{AppError, Result};
use log;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Text produced for one chunk, tagged with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResponse {
    /// Trimmed model output followed by a newline.
    Answer(String),
    /// Runner missing, failed to launch or missed its deadline.
    Unavailable(String),
    /// Runner exited without printing anything.
    Empty(String),
}

impl ModelResponse {
    pub fn text(&self) -> &str {
        match self {
            ModelResponse::Answer(t)
            | ModelResponse::Unavailable(t)
            | ModelResponse::Empty(t) => t,
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, ModelResponse::Answer(_))
    }
}

/// Sends one prompt to a model and returns its answer or a placeholder.
///
/// Implementations must not fail: problems are folded into
/// [`ModelResponse::Unavailable`] or [`ModelResponse::Empty`] so a report is
/// always produced.
pub trait ModelInvoker: Sync {
    fn invoke(&self, prompt: &str, file_path: &str) -> ModelResponse;
}

pub fn unavailable_message(runner: &str) -> String {
    let display = if runner == DEFAULT_RUNNER {
        "Ollama"
    } else {
        runner
    };
    format!("{} is not installed or not found in PATH.\n", display)
}

pub fn empty_response_message(file_path: &str) -> String {
    format!("No response from model for {}\n", file_path)
}

#[derive(Debug)]
pub struct RunnerOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

/// Runs `<runner> <args...> <model>` once per prompt, prompt on stdin.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    runner: String,
    args: Vec<String>,
    model: String,
    timeout: Option<Duration>,
}

impl CommandInvoker {
    pub fn new(runner: impl Into<String>, args: Vec<String>, model: impl Into<String>) -> Self {
        Self {
            runner: runner.into(),
            args,
            model: model.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.model.runner.clone(),
            config.model.args.clone(),
            config.model.name.clone(),
        )
        .with_timeout(config.get_timeout()?))
    }

    pub fn command_line(&self) -> Vec<&str> {
        std::iter::once(self.runner.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(std::iter::once(self.model.as_str()))
            .collect()
    }

    /// Spawns the runner, feeds `prompt` and collects its output.
    ///
    /// stdin is written from a helper thread and stdout/stderr are drained by
    /// two more, so large prompts and large answers cannot deadlock on full
    /// pipes. On timeout the child is killed and the drain threads are left to
    /// finish on their own.
    pub fn execute(&self, prompt: &str) -> Result<RunnerOutput> {
        log::debug!("Launching model runner: {:?}", self.command_line());
        let mut child = Command::new(&self.runner)
            .args(&self.args)
            .arg(&self.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::RunnerUnavailable {
                runner: self.runner.clone(),
                source: e,
            })?;

        let writer = child.stdin.take().map(|mut stdin| {
            let payload = prompt.to_owned();
            thread::spawn(move || stdin.write_all(payload.as_bytes()))
        });
        let stdout_reader = child.stdout.take().map(spawn_drain);
        let stderr_reader = child.stderr.take().map(spawn_drain);

        let status = match self.timeout {
            None => child.wait().map_err(|e| self.io_error(e))?,
            Some(limit) => {
                let finished =
                    wait_with_deadline(&mut child, limit).map_err(|e| self.io_error(e))?;
                finished.ok_or_else(|| AppError::RunnerTimeout {
                    runner: self.runner.clone(),
                    seconds: limit.as_secs_f64(),
                })?
            }
        };

        if let Some(Ok(Err(e))) = writer.map(JoinHandle::join) {
            // The runner may exit before consuming all of stdin.
            log::debug!("Model runner closed stdin early: {}", e);
        }
        let stdout = join_drain(stdout_reader).map_err(|e| self.io_error(e))?;
        let stderr = join_drain(stderr_reader).unwrap_or_default();

        Ok(RunnerOutput {
            stdout,
            stderr,
            status,
        })
    }

    fn io_error(&self, source: std::io::Error) -> AppError {
        AppError::RunnerIo {
            runner: self.runner.clone(),
            source,
        }
    }
}

impl ModelInvoker for CommandInvoker {
    fn invoke(&self, prompt: &str, file_path: &str) -> ModelResponse {
        match self.execute(prompt) {
            Ok(output) => {
                if !output.status.success() {
                    log::warn!(
                        "Model runner exited with {} while analyzing {}",
                        output.status,
                        file_path
                    );
                }
                if !output.stderr.trim().is_empty() {
                    log::debug!("Model runner stderr: {}", output.stderr.trim());
                }
                let answer = output.stdout.trim();
                if answer.is_empty() {
                    ModelResponse::Empty(empty_response_message(file_path))
                } else {
                    ModelResponse::Answer(format!("{}\n", answer))
                }
            }
            Err(e) => {
                log::warn!("{} (while analyzing {})", e, file_path);
                ModelResponse::Unavailable(unavailable_message(&self.runner))
            }
        }
    }
}

fn spawn_drain<R: Read + Send + 'static>(mut source: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_drain(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> std::io::Result<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::other("output reader thread panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> std::io::Result<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let elapsed = started.elapsed();
        if elapsed >= limit {
            log::debug!("Killing model runner after {:?}", elapsed);
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(limit - elapsed));
    }
}
