use crate::error::{AssistantError, Result};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// None when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs operator command lines through the platform shell in the project root.
pub struct CommandExecutor {
    root: PathBuf,
}

impl CommandExecutor {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn shell(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }

    /// Run `command`, handing each stdout line to `on_line` as it arrives.
    /// Blocks until the process exits; there is no timeout.
    pub fn execute<F>(&self, command: &str, mut on_line: F) -> Result<ExecutionOutcome>
    where
        F: FnMut(&str),
    {
        if command.trim().is_empty() {
            return Err(AssistantError::validation("Command cannot be empty"));
        }
        tracing::debug!("executing `{}` in {}", command, self.root.display());

        let mut child = Self::shell(command)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AssistantError::io(&self.root, e))?;

        // Drained on its own thread so a full stderr pipe cannot stall stdout.
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buffer = String::new();
                let _ = stderr.read_to_string(&mut buffer);
                buffer
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut buffer = Vec::new();
            loop {
                buffer.clear();
                match reader.read_until(b'\n', &mut buffer) {
                    Ok(0) => break,
                    Ok(_) => on_line(String::from_utf8_lossy(&buffer).trim_end()),
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        // Keep the pipe open until exit so the child is not
                        // killed by SIGPIPE.
                        tracing::warn!("stopped reading command output: {}", err);
                        let _ = io::copy(&mut reader, &mut io::sink());
                        break;
                    }
                }
            }
        }

        let status = child.wait().map_err(|e| AssistantError::io(&self.root, e))?;
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        Ok(ExecutionOutcome {
            exit_code: status.code(),
            stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_streams_stdout_lines() {
        let temp = TempDir::new().unwrap();
        let executor = CommandExecutor::new(temp.path());
        let mut lines = Vec::new();

        let outcome = executor
            .execute("echo first; echo second", |line| lines.push(line.to_string()))
            .unwrap();

        assert!(outcome.success());
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_non_utf8_output_keeps_streaming() {
        let temp = TempDir::new().unwrap();
        let executor = CommandExecutor::new(temp.path());
        let mut lines = Vec::new();

        let outcome = executor
            .execute(
                "printf 'caf\\351\\n'; for i in 1 2 3; do echo after$i; done; exit 0",
                |line| lines.push(line.to_string()),
            )
            .unwrap();

        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(lines, vec!["caf\u{FFFD}", "after1", "after2", "after3"]);
    }

    #[test]
    fn test_runs_in_project_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();
        let executor = CommandExecutor::new(temp.path());
        let mut lines = Vec::new();

        executor
            .execute("ls", |line| lines.push(line.to_string()))
            .unwrap();
        assert!(lines.contains(&"marker.txt".to_string()));
    }

    #[test]
    fn test_reports_failure_and_stderr() {
        let temp = TempDir::new().unwrap();
        let executor = CommandExecutor::new(temp.path());

        let outcome = executor
            .execute("echo oops 1>&2; exit 3", |_| {})
            .unwrap();
        assert_eq!(outcome.exit_code, Some(3));
        assert!(!outcome.success());
        assert_eq!(outcome.stderr.trim(), "oops");
    }

    #[test]
    fn test_empty_command_rejected() {
        let temp = TempDir::new().unwrap();
        let executor = CommandExecutor::new(temp.path());
        assert!(matches!(
            executor.execute("   ", |_| {}),
            Err(AssistantError::Validation(_))
        ));
    }
}
