//! Shared utility functions for Ongaku
//!
//! Helpers used by both the bridge and the tray: bounded child processes
//! (`osascript`, `sw_vers`) and display-safe string truncation.

use anyhow::{Context, Result};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

/// Default timeout for external commands (osascript, sw_vers, etc.)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Unicode-safe string truncation
// ---------------------------------------------------------------------------

/// Truncate a string to at most `max_chars` Unicode characters.
///
/// If truncated, appends "..." so the total character count is ≤ `max_chars`.
/// Never panics on multi-byte characters (unlike byte-index slicing).
pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

// ---------------------------------------------------------------------------
// Command execution with timeout
// ---------------------------------------------------------------------------

/// Run a command with a timeout. Kills the child if it exceeds the deadline.
///
/// Drains stdout/stderr in background threads to avoid pipe-buffer deadlocks
/// (a common issue when the child's output exceeds the OS pipe capacity).
pub fn run_command_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output> {
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to spawn command")?;

    // Take ownership of pipes and drain them in background threads
    // to prevent the child from blocking on a full pipe buffer.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_handle {
            std::io::Read::read_to_end(&mut out, &mut buf).ok();
        }
        buf
    });
    let stderr_thread = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_handle {
            std::io::Read::read_to_end(&mut err, &mut buf).ok();
        }
        buf
    });

    // Poll for exit with timeout
    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if Instant::now() >= deadline {
                    child.kill().ok();
                    child.wait().ok();
                    anyhow::bail!("Command timed out after {timeout:?}");
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- truncate --

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("Hi", 10), "Hi");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate("Hello", 5), "Hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("Hello, World!", 10), "Hello, ...");
    }

    #[test]
    fn test_truncate_empty() {
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn test_truncate_unicode() {
        // "音楽を聴いてる" is 7 chars, 3 bytes each
        let result = truncate("音楽を聴いてる", 5);
        assert_eq!(result, "音楽...");
        assert!(result.is_char_boundary(result.len()));
    }

    // -- run_command_with_timeout --

    #[test]
    fn test_command_with_timeout_success() {
        let output =
            run_command_with_timeout(Command::new("echo").arg("hello"), Duration::from_secs(5))
                .unwrap();
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("hello"));
    }

    #[test]
    fn test_command_with_timeout_times_out() {
        let result =
            run_command_with_timeout(Command::new("sleep").arg("10"), Duration::from_secs(1));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("timed out"));
    }

    #[test]
    fn test_command_missing_binary() {
        let result = run_command_with_timeout(
            &mut Command::new("definitely-not-a-real-binary-ongaku"),
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
