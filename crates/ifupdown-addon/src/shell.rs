//! Running external commands.
//!
//! Everything goes through `/bin/sh -c`, so values taken from interface
//! configuration must be wrapped with [`shellquote`] before being spliced
//! into a command line.
//!
//! ```ignore
//! use ifupdown_addon::defaults::IP_CMD;
//! use ifupdown_addon::shell::{self, shellquote};
//!
//! shell::exec_or_fail(&format!("{} link set dev {} up", IP_CMD, shellquote(ifname)))?;
//! ```

use std::io::Write;
use std::process::{Command, Output, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace, warn};

use crate::error::{AddonError, AddonResult};

/// Characters still special inside double quotes.
static DQUOTE_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Double-quotes `s` for `/bin/sh`, backslash-escaping `$`, backtick,
/// `"`, `\` and newline.
///
/// ```
/// use ifupdown_addon::shell::shellquote;
///
/// assert_eq!(shellquote("swp1"), "\"swp1\"");
/// assert_eq!(shellquote("a$b"), "\"a\\$b\"");
/// ```
pub fn shellquote(s: &str) -> String {
    format!("\"{}\"", DQUOTE_SPECIAL.replace_all(s, r"\$1"))
}

/// What a finished command left behind. Output is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, `-1` when killed by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    fn from_process(cmd: &str, output: Output) -> Self {
        let result = Self {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        if result.success() {
            trace!(command = %cmd, "Command finished");
        } else {
            warn!(command = %cmd, status = result.status, stderr = %result.stderr, "Command failed");
        }
        result
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// stdout and stderr joined by a newline, skipping whichever is empty.
    pub fn combined_output(&self) -> String {
        [self.stdout.as_str(), self.stderr.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// stdout on success, [`AddonError::CommandFailed`] otherwise.
    pub fn into_stdout(self, cmd: &str) -> AddonResult<String> {
        if self.success() {
            return Ok(self.stdout);
        }
        Err(AddonError::CommandFailed {
            command: cmd.to_string(),
            status: self.status,
            output: self.combined_output(),
        })
    }
}

fn sh(cmd: &str) -> Command {
    let mut command = Command::new("/bin/sh");
    command
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}

fn spawn_error(cmd: &str) -> impl Fn(std::io::Error) -> AddonError + '_ {
    move |source| AddonError::CommandSpawn {
        command: cmd.to_string(),
        source,
    }
}

/// Runs `cmd` to completion. A non-zero exit is not an error here; check
/// [`CommandOutput::success`].
pub fn exec(cmd: &str) -> AddonResult<CommandOutput> {
    debug!(command = %cmd, "Running command");
    let output = sh(cmd).output().map_err(spawn_error(cmd))?;
    Ok(CommandOutput::from_process(cmd, output))
}

/// Runs `cmd` and returns its trimmed stdout, failing on non-zero exit.
pub fn exec_or_fail(cmd: &str) -> AddonResult<String> {
    exec(cmd)?.into_stdout(cmd)
}

/// Like [`exec_or_fail`], feeding `input` to the command's stdin.
pub fn exec_with_input(cmd: &str, input: &str) -> AddonResult<String> {
    debug!(command = %cmd, bytes = input.len(), "Running command with input");

    let mut child = sh(cmd)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(spawn_error(cmd))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(spawn_error(cmd))?;
    }

    let output = child.wait_with_output().map_err(spawn_error(cmd))?;
    CommandOutput::from_process(cmd, output).into_stdout(cmd)
}
