//! Subprocess execution: a synchronous executor plus a bounded
//! timeout-and-retry wrapper for commands that are allowed to hang.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::CommandResult;

/// Default per-attempt deadline for retried commands.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default attempt budget for retried commands.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Runs one external command synchronously and captures its outcome.
///
/// A non-zero exit is a successful execution; only a failure to spawn or a
/// deadline expiry is an `Err`.
pub trait Executor: Send + Sync {
    fn execute(&self, command: &str) -> Result<CommandResult>;

    fn execute_with_timeout(&self, command: &str, timeout: Duration) -> Result<CommandResult>;
}

/// Executor backed by the platform shell, so callers can use pipes and
/// redirection the way the external tools expect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    fn spawn(&self, command: &str) -> Result<Child> {
        let mut builder = if cfg!(windows) {
            let mut builder = Command::new("cmd.exe");
            builder.arg("/C").arg(command);
            builder
        } else {
            let mut builder = Command::new("sh");
            builder.arg("-c").arg(command);
            builder
        };
        builder
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })
    }
}

impl Executor for SystemExecutor {
    fn execute(&self, command: &str) -> Result<CommandResult> {
        self.execute_with_timeout(command, Duration::MAX)
    }

    fn execute_with_timeout(&self, command: &str, timeout: Duration) -> Result<CommandResult> {
        debug!(command, "executing");
        let mut child = self.spawn(command)?;

        // Drain stdout/stderr in parallel; otherwise, a chatty child process
        // can block once the pipe buffer fills, and we will incorrectly hit
        // the timeout.
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::UnexpectedOutput {
                command: command.to_string(),
                reason: "failed to capture stdout".to_string(),
            })?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::UnexpectedOutput {
                command: command.to_string(),
                reason: "failed to capture stderr".to_string(),
            })?;

        let stdout_handle = std::thread::spawn(move || drain(stdout));
        let stderr_handle = std::thread::spawn(move || drain(stderr));

        let start = Instant::now();
        let exit_code = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status.code(),
                Ok(None) => {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = stdout_handle.join();
                        let _ = stderr_handle.join();
                        return Err(Error::CommandTimeout {
                            command: command.to_string(),
                            attempts: 1,
                        });
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(source) => {
                    let _ = stdout_handle.join();
                    let _ = stderr_handle.join();
                    return Err(Error::Io(source));
                }
            }
        };

        let stdout_bytes = stdout_handle.join().unwrap_or_default();
        let stderr_bytes = stderr_handle.join().unwrap_or_default();

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&stdout_bytes).to_string(),
            stderr: String::from_utf8_lossy(&stderr_bytes).to_string(),
            exit_code,
        })
    }
}

fn drain(mut reader: impl Read) -> Vec<u8> {
    let mut buffer = Vec::<u8>::new();
    let mut temp = [0u8; 4096];
    loop {
        match reader.read(&mut temp) {
            Ok(0) => break,
            Ok(count) => buffer.extend_from_slice(&temp[..count]),
            Err(_) => break,
        }
    }
    buffer
}

/// Per-attempt deadline and attempt budget for [`execute_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Receives retry diagnostics from [`execute_with_retry`]. Injected so the
/// retry loop carries no implicit global state.
pub trait RetryObserver: Send + Sync {
    fn attempt_timed_out(&self, command: &str, attempt: u32, max_attempts: u32);
}

/// Default observer; discards diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {
    fn attempt_timed_out(&self, _command: &str, _attempt: u32, _max_attempts: u32) {}
}

/// Observer that reports each timed-out attempt as a tracing warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn attempt_timed_out(&self, command: &str, attempt: u32, max_attempts: u32) {
        warn!(command, attempt, max_attempts, "command attempt timed out");
    }
}

/// Runs `command` under a per-attempt deadline, retrying on timeout only.
///
/// Any non-timeout completion, including a non-zero exit, ends the loop.
/// Retries exist solely for hangs, never for logical command failure. When
/// every attempt times out the error carries the command and the attempt
/// count, bounding worst-case blocking to `max_attempts * timeout`.
pub fn execute_with_retry(
    executor: &dyn Executor,
    command: &str,
    policy: &RetryPolicy,
    observer: &dyn RetryObserver,
) -> Result<CommandResult> {
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match executor.execute_with_timeout(command, policy.timeout) {
            Err(Error::CommandTimeout { .. }) => {
                observer.attempt_timed_out(command, attempt, max_attempts);
            }
            other => return other,
        }
    }
    Err(Error::CommandTimeout {
        command: command.to_string(),
        attempts: max_attempts,
    })
}


#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::testutil::{ok, HangingExecutor, ScriptedExecutor};
    use super::*;

    #[test]
    fn captures_exit_code_stdout_and_stderr() {
        let result = SystemExecutor.execute("echo boo").expect("echo");
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "boo\n");
        assert_eq!(result.stderr, "");
    }

    #[test]
    fn non_zero_exit_is_not_an_error() {
        let result = SystemExecutor.execute("exit 3").expect("exit 3 should run");
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn timeout_kills_hanging_command() {
        let err = SystemExecutor
            .execute_with_timeout("sleep 30", Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, Error::CommandTimeout { .. }));
    }

    #[test]
    fn does_not_deadlock_on_large_stdout() {
        // Regression guard: if stdout is piped but not drained, the child can
        // block once the pipe buffer fills and an otherwise-fast command
        // "hangs" until the deadline.
        let command = "i=0; while [ $i -lt 100000 ]; do echo 1234567890; i=$((i+1)); done";
        let result = SystemExecutor
            .execute_with_timeout(command, Duration::from_secs(10))
            .expect("large-output command should complete");
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.len() >= 1_000_000);
    }

    #[test]
    fn retry_exhausts_exactly_max_attempts() {
        let executor = HangingExecutor::new();
        let policy = RetryPolicy {
            timeout: Duration::from_millis(1),
            max_attempts: 5,
        };
        let err = execute_with_retry(&executor, "adb devices", &policy, &NoopObserver)
            .unwrap_err();
        assert_eq!(*executor.attempts.lock().unwrap(), 5);
        match err {
            Error::CommandTimeout { command, attempts } => {
                assert_eq!(command, "adb devices");
                assert_eq!(attempts, 5);
            }
            other => panic!("expected CommandTimeout, got {other:?}"),
        }
    }

    #[test]
    fn retry_returns_first_non_timeout_completion() {
        let executor = ScriptedExecutor::new(|_| super::testutil::failed(1, "boom"));
        let result = execute_with_retry(
            &executor,
            "adb devices",
            &RetryPolicy::default(),
            &NoopObserver,
        )
        .expect("non-timeout completion ends the loop");
        assert_eq!(result.exit_code, Some(1));
        assert_eq!(executor.calls().len(), 1);
    }

    #[test]
    fn retry_stops_on_success_mid_budget() {
        let remaining = Mutex::new(2u32);
        let executor = ScriptedExecutor::new(move |command| {
            let mut left = remaining.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                Err(Error::CommandTimeout {
                    command: command.to_string(),
                    attempts: 1,
                })
            } else {
                ok("done\n")
            }
        });
        let policy = RetryPolicy {
            timeout: Duration::from_millis(1),
            max_attempts: 5,
        };
        let result =
            execute_with_retry(&executor, "adb devices", &policy, &NoopObserver).expect("ok");
        assert_eq!(result.stdout, "done\n");
        // Two timeouts, one success; no fourth attempt.
        assert_eq!(executor.calls().len(), 3);
    }

    #[test]
    fn observer_sees_each_timed_out_attempt() {
        struct Recording(Mutex<Vec<u32>>);
        impl RetryObserver for Recording {
            fn attempt_timed_out(&self, _command: &str, attempt: u32, _max: u32) {
                self.0.lock().unwrap().push(attempt);
            }
        }

        let executor = HangingExecutor::new();
        let observer = Recording(Mutex::new(Vec::new()));
        let policy = RetryPolicy {
            timeout: Duration::from_millis(1),
            max_attempts: 3,
        };
        let _ = execute_with_retry(&executor, "adb devices", &policy, &observer);
        assert_eq!(*observer.0.lock().unwrap(), vec![1, 2, 3]);
    }
}
