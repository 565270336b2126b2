use crate::core::config::ToolsConfig;
use crate::tools::types::Tool;
use crate::{FidoError, Result};
use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Number of stderr lines kept for error messages
const STDERR_TAIL_LINES: usize = 50;

/// A single external command plus the files it is expected to produce.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool: Tool,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub outputs: Vec<PathBuf>,
}

impl ToolInvocation {
    pub fn new(tool: Tool, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Declare a file the command must leave behind on success
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Log each line of a child stream, optionally keeping the last few.
fn drain_lines<R: Read + Send + 'static>(
    reader: R,
    label: String,
    tail: Option<Arc<Mutex<VecDeque<String>>>>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for line in BufReader::new(reader).lines() {
            let Ok(line) = line else { break };
            tracing::debug!("{}: {}", label, line);
            if let Some(tail) = &tail {
                if let Ok(mut tail) = tail.lock() {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
        }
    })
}

/// Runs external tools as blocking subprocesses.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ToolRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(100),
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(config.timeout_secs.map(Duration::from_secs))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check that `program` resolves to an executable.
    pub fn verify(&self, tool: Tool, program: &Path) -> Result<PathBuf> {
        which::which(program).map_err(|e| FidoError::ToolInvocation {
            tool: tool.to_string(),
            message: format!("{} is not available: {}", program.display(), e),
        })
    }

    /// Run the invocation to completion.
    ///
    /// On any failure the declared outputs are deleted so that a later stage
    /// can never pick up a half-written file.
    pub fn run(&self, invocation: &ToolInvocation) -> Result<()> {
        tracing::info!("Running {}: {}", invocation.tool, invocation.command_line());
        let started = Instant::now();

        let result = self.execute(invocation);
        match &result {
            Ok(()) => tracing::info!(
                "{} finished in {:.1}s",
                invocation.tool,
                started.elapsed().as_secs_f64()
            ),
            Err(e) => {
                tracing::warn!("{} failed: {}", invocation.tool, e);
                remove_outputs(&invocation.outputs);
            }
        }
        result
    }

    fn execute(&self, invocation: &ToolInvocation) -> Result<()> {
        let tool_error = |message: String| FidoError::ToolInvocation {
            tool: invocation.tool.to_string(),
            message,
        };

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                tool_error(format!(
                    "could not start {}: {}",
                    invocation.program.display(),
                    e
                ))
            })?;

        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let stderr_tail = Arc::new(Mutex::new(VecDeque::new()));
        let label = invocation.tool.binary_name();
        let stdout_handle = child
            .stdout
            .take()
            .map(|out| drain_lines(out, format!("{} [stdout]", label), None));
        let stderr_handle = child
            .stderr
            .take()
            .map(|err| drain_lines(err, format!("{} [stderr]", label), Some(stderr_tail.clone())));

        let status = self.wait(&mut child, invocation.tool)?;

        for handle in [stdout_handle, stderr_handle].into_iter().flatten() {
            self.join_reader(handle, deadline, invocation.tool);
        }

        if !status.success() {
            let tail = stderr_tail
                .lock()
                .map(|lines| lines.iter().cloned().collect::<Vec<_>>().join("\n"))
                .unwrap_or_default();
            let mut message = match status.code() {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by a signal".to_string(),
            };
            if !tail.is_empty() {
                message.push_str(":\n");
                message.push_str(&tail);
            }
            return Err(tool_error(message));
        }

        for output in &invocation.outputs {
            if !output.exists() {
                return Err(tool_error(format!(
                    "produced no output file at {}",
                    output.display()
                )));
            }
        }
        Ok(())
    }

    /// Join a pipe reader, giving up at `deadline`.
    ///
    /// A background process left behind by the tool can keep the pipe open
    /// after the tool itself has exited; past the deadline the reader thread
    /// is detached instead of blocking the stage.
    fn join_reader(&self, handle: JoinHandle<()>, deadline: Option<Instant>, tool: Tool) {
        let Some(deadline) = deadline else {
            handle.join().ok();
            return;
        };
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                tracing::warn!(
                    "{} exited but its output pipe is still held open; not waiting for it",
                    tool
                );
                return;
            }
            std::thread::sleep(self.poll_interval);
        }
        handle.join().ok();
    }

    fn wait(&self, child: &mut std::process::Child, tool: Tool) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() > timeout {
                tracing::warn!("Killing {} (PID {}) after {:?}", tool, child.id(), timeout);
                child.kill().ok();
                let _ = child.wait();
                return Err(FidoError::ToolTimeout {
                    tool: tool.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

fn remove_outputs(outputs: &[PathBuf]) {
    for output in outputs {
        if output.is_file() {
            match std::fs::remove_file(output) {
                Ok(()) => tracing::debug!("Removed partial output {}", output.display()),
                Err(e) => tracing::warn!("Could not remove {}: {}", output.display(), e),
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn shell(script: &str) -> ToolInvocation {
        ToolInvocation::new(Tool::Mmseqs, "sh").arg("-c").arg(script)
    }

    #[test]
    fn test_command_line() {
        let invocation = ToolInvocation::new(Tool::ClustalOmega, "./clustalo")
            .arg("-i")
            .arg("in.fasta")
            .arg("--dealign");
        assert_eq!(invocation.command_line(), "./clustalo -i in.fasta --dealign");
    }

    #[test]
    fn test_successful_run_with_output() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.txt");
        let invocation = shell(&format!("echo done > {}", out.display())).output(&out);

        ToolRunner::default().run(&invocation).unwrap();

        assert!(out.exists());
    }

    #[test]
    fn test_non_zero_exit_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.txt");
        let invocation =
            shell(&format!("echo partial > {}; echo broken >&2; exit 3", out.display())).output(&out);

        let err = ToolRunner::default().run(&invocation).unwrap_err();

        match err {
            FidoError::ToolInvocation { message, .. } => {
                assert!(message.contains("code 3"), "{}", message);
                assert!(message.contains("broken"), "{}", message);
            }
            other => panic!("expected ToolInvocation, got {:?}", other),
        }
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_output_is_an_error() {
        let dir = TempDir::new().unwrap();
        let invocation = shell("true").output(dir.path().join("never.txt"));

        let err = ToolRunner::default().run(&invocation).unwrap_err();
        assert!(err.to_string().contains("produced no output file"));
    }

    #[test]
    fn test_timeout_kills_process() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("slow.txt");
        let invocation = shell(&format!("echo x > {}; sleep 10", out.display())).output(&out);
        let runner = ToolRunner::new(Some(Duration::from_millis(300)));

        let started = Instant::now();
        let err = runner.run(&invocation).unwrap_err();

        assert!(matches!(err, FidoError::ToolTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!out.exists());
    }

    #[test]
    fn test_lingering_background_process_does_not_block() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.txt");
        // the backgrounded sleep inherits stdout and stderr
        let invocation = shell(&format!("echo done > {}; sleep 30 &", out.display())).output(&out);
        let runner = ToolRunner::new(Some(Duration::from_millis(500)));

        let started = Instant::now();
        runner.run(&invocation).unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(out.exists());
    }

    #[test]
    fn test_missing_program() {
        let invocation = ToolInvocation::new(Tool::HmmBuild, "/nonexistent/hmmbuild");
        let err = ToolRunner::default().run(&invocation).unwrap_err();
        assert!(matches!(err, FidoError::ToolInvocation { .. }));
    }

    #[test]
    fn test_verify_finds_shell() {
        let runner = ToolRunner::default();
        assert!(runner.verify(Tool::Mmseqs, Path::new("sh")).is_ok());
        assert!(runner
            .verify(Tool::Mmseqs, Path::new("definitely-not-a-real-binary-fido"))
            .is_err());
    }
}
