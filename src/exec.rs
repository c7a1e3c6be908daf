use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use crate::error::{Error, Result};

const OUTPUT_TAIL_LINES: usize = 40;
const OUTPUT_TAIL_BYTES: usize = 64 * 1024;

pub fn find_tool(tool: &str) -> Result<PathBuf> {
	which::which(tool).map_err(|e| Error::MissingTool {
		tool: tool.to_string(),
		reason: e.to_string()
	})
}

/// Runs `cmd` with its output on the terminal, failing with the tail of its stderr.
pub fn run(cmd: &mut Command, tool: &str) -> Result<()> {
	let mut child = cmd
		.env("LC_ALL", "C")
		.stdin(Stdio::null())
		.stdout(Stdio::inherit())
		.stderr(Stdio::piped())
		.spawn()
		.map_err(|e| Error::io(format!("failed to spawn {}", tool), e))?;

	let mut captured = Vec::new();
	if let Some(mut stderr) = child.stderr.take() {
		let mut buf = [0u8; 8192];
		loop {
			let n = match stderr.read(&mut buf) {
				Ok(0) => break,
				Ok(n) => n,
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) => return Err(Error::io(format!("failed to read output of {}", tool), e))
			};

			// progress output goes through unchanged, only the end is kept
			let _ = std::io::stderr().write_all(&buf[..n]);
			captured.extend_from_slice(&buf[..n]);
			if captured.len() > OUTPUT_TAIL_BYTES {
				captured.drain(..captured.len() - OUTPUT_TAIL_BYTES / 2);
			}
		}
	}

	let status = child.wait()
		.map_err(|e| Error::io(format!("failed to wait for {}", tool), e))?;

	if status.success() {
		return Ok(());
	}

	Err(Error::BuildFailed {
		tool: tool.to_string(),
		status,
		output: tail(&String::from_utf8_lossy(&captured), OUTPUT_TAIL_LINES)
	})
}

fn tail(text: &str, lines: usize) -> String {
	let all: Vec<&str> = text.trim_end().lines().collect();
	all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn failure_carries_status_and_stderr() {
		let mut cmd = Command::new("/bin/sh");
		cmd.args(["-c", "echo first >&2; echo broken >&2; exit 3"]);
		match run(&mut cmd, "sh") {
			Err(Error::BuildFailed { tool, status, output }) => {
				assert_eq!(tool, "sh");
				assert_eq!(status.code(), Some(3));
				assert_eq!(output, "first\nbroken");
			}
			other => panic!("unexpected {:?}", other)
		}
	}

	#[test]
	fn success_and_spawn_failure() {
		let mut cmd = Command::new("/bin/sh");
		cmd.args(["-c", "true"]);
		assert!(run(&mut cmd, "sh").is_ok());

		let mut cmd = Command::new("/nonexistent/qtpkg-tool");
		assert!(matches!(run(&mut cmd, "qtpkg-tool"), Err(Error::Io { .. })));
	}

	#[test]
	fn long_output_keeps_only_the_last_lines() {
		let mut cmd = Command::new("/bin/sh");
		cmd.args(["-c", "i=0; while [ $i -lt 20000 ]; do i=$((i+1)); echo line $i >&2; done; exit 1"]);
		match run(&mut cmd, "sh") {
			Err(Error::BuildFailed { output, .. }) => {
				let lines: Vec<&str> = output.lines().collect();
				assert_eq!(lines.len(), OUTPUT_TAIL_LINES);
				assert_eq!(lines[0], "line 19961");
				assert_eq!(lines[OUTPUT_TAIL_LINES - 1], "line 20000");
			}
			other => panic!("unexpected {:?}", other)
		}
	}

	#[test]
	fn tail_keeps_last_lines() {
		assert_eq!(tail("a\nb\nc\n", 2), "b\nc");
		assert_eq!(tail("a\n", 5), "a");
		assert_eq!(tail("", 5), "");
	}

	#[test]
	fn missing_tool_is_reported() {
		assert!(matches!(find_tool("qtpkg-definitely-missing"), Err(Error::MissingTool { .. })));
	}
}
