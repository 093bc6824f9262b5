use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::BenchError;

/// Captured output of a finished external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run an external command, killing it if it outlives `timeout`.
///
/// Both pipes are drained on background threads so a chatty child cannot
/// block on a full pipe while we poll its exit status.
pub fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
) -> Result<CommandOutput, BenchError> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(BenchError::ToolTimeout(timeout));
        }
        thread::sleep(Duration::from_millis(25));
    };

    Ok(CommandOutput {
        success: status.success(),
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
    })
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = String::new();
            let _ = pipe.read_to_string(&mut buffer);
            buffer
        })
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Check whether an external tool answers `--version` successfully. Used
/// by the setup check before the dynamic tools are activated; a tool that
/// spawns but exits nonzero counts as unavailable.
pub fn tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Format a flagged function for the written report, falling back to the
/// raw token text when it does not parse as a standalone file.
pub fn beautify_snippet(snippet: &str) -> String {
    match syn::parse_str::<syn::File>(snippet) {
        Ok(parsed) => prettyplease::unparse(&parsed),
        Err(_) => snippet.to_string(),
    }
}

/// Bounds-checked counterpart of the overflow fixture's unchecked copy:
/// copies at most `dst.len() - 1` bytes of `src` and terminates with NUL,
/// the way `strlcpy` would. Returns the number of payload bytes copied.
pub fn copy_into_bounded(dst: &mut [u8], src: &[u8]) -> Result<usize, BenchError> {
    if dst.is_empty() {
        return Err(BenchError::ZeroCapacity);
    }
    let copied = src.len().min(dst.len() - 1);
    dst[..copied].copy_from_slice(&src[..copied]);
    dst[copied] = 0;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_with_timeout_captures_output() {
        let mut command = Command::new("sh");
        command.args(["-c", "printf hello; printf world >&2"]);

        let output = run_with_timeout(command, Duration::from_secs(5)).unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "hello");
        assert_eq!(output.stderr, "world");
    }

    #[test]
    fn run_with_timeout_kills_slow_commands() {
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 10"]);

        let result = run_with_timeout(command, Duration::from_millis(100));
        assert!(matches!(result, Err(BenchError::ToolTimeout(_))));
    }

    #[test]
    fn missing_tools_are_reported_unavailable() {
        assert!(!tool_available("definitely-not-a-real-tool-name"));
    }

    #[cfg(unix)]
    #[test]
    fn tools_that_fail_their_version_check_are_unavailable() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("broken-tool");
        fs::write(&tool, "#!/bin/sh\nexit 7\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(!tool_available(tool.to_str().unwrap()));
    }

    #[test]
    fn beautify_snippet_formats_parseable_functions() {
        let formatted = beautify_snippet("fn demo () { let x = 1 ; }");
        assert!(formatted.contains("fn demo()"));
    }

    #[test]
    fn beautify_snippet_keeps_unparseable_text() {
        assert_eq!(beautify_snippet("not rust at all {{{"), "not rust at all {{{");
    }

    #[test]
    fn bounded_copy_truncates_the_fixture_payload() {
        // Same inputs as the overflow fixture: 29 bytes into 10 of capacity.
        let mut buffer = [0xffu8; 10];
        let payload = b"ThisStringIsTooLongForBuffer\0";

        let copied = copy_into_bounded(&mut buffer, payload).unwrap();
        assert_eq!(copied, 9);
        assert_eq!(&buffer[..9], b"ThisStrin");
        assert_eq!(buffer[9], 0);
    }

    #[test]
    fn bounded_copy_rejects_empty_destinations() {
        let mut empty: [u8; 0] = [];
        assert!(matches!(
            copy_into_bounded(&mut empty, b"x"),
            Err(BenchError::ZeroCapacity)
        ));
    }
}
