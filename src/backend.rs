//! tmux session backend.
//!
//! Wraps the tmux CLI behind the [`SessionBackend`] capability trait so the
//! wait loop and idle detector can be exercised against scripted snapshot
//! sequences instead of a live terminal multiplexer. `TmuxBackend` is the
//! production implementation: every operation is a single tmux command run
//! directly (no shell in between), with a non-zero exit mapped to
//! [`ExecError`].

use std::path::Path;
use std::process::{Command, Output};

use thiserror::Error;
use tracing::{debug, info};

/// Failure of an external tmux command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to run tmux — is tmux installed?: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("tmux {command} failed: {stderr}")]
    Command { command: String, stderr: String },
}

/// Capability interface over the terminal multiplexer.
///
/// `Send + Sync` so a parallel wait can fan out over sessions on scoped
/// threads sharing one backend reference.
pub trait SessionBackend: Send + Sync {
    /// Whether a session with this id currently exists. Any failure
    /// (including an unreachable tmux server) reads as `false`.
    fn exists(&self, id: &str) -> bool;

    /// Create a detached session rooted at `cwd`, running its default shell.
    fn create(&self, id: &str, cwd: &Path) -> Result<(), ExecError>;

    /// Capture the visible pane text, keeping at most the trailing
    /// `last_lines` lines.
    fn capture(&self, id: &str, last_lines: u32) -> Result<String, ExecError>;

    /// Send `text` as literal keystrokes (no key-name interpretation).
    fn send_literal(&self, id: &str, text: &str) -> Result<(), ExecError>;

    /// Send the submit keypress (Enter) as a distinct action.
    fn send_submit(&self, id: &str) -> Result<(), ExecError>;

    /// Kill the session. Killing an absent session is success.
    fn kill(&self, id: &str) -> Result<(), ExecError>;

    /// All current session ids. Empty when the tmux server is not running.
    fn list(&self) -> Result<Vec<String>, ExecError>;
}

/// The real tmux-backed implementation.
#[derive(Debug, Default)]
pub struct TmuxBackend;

fn run_tmux<I, S>(label: &str, args: I) -> Result<Output, ExecError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = Command::new("tmux").args(args).output()?;
    if !output.status.success() {
        return Err(ExecError::Command {
            command: label.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

impl SessionBackend for TmuxBackend {
    fn exists(&self, id: &str) -> bool {
        Command::new("tmux")
            .args(["has-session", "-t", id])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn create(&self, id: &str, cwd: &Path) -> Result<(), ExecError> {
        let cwd_str = cwd.to_string_lossy();
        // Generous size so the agent's TUI isn't rendered into a tiny PTY.
        run_tmux(
            "new-session",
            [
                "new-session",
                "-d",
                "-s",
                id,
                "-c",
                cwd_str.as_ref(),
                "-x",
                "220",
                "-y",
                "50",
            ],
        )?;
        info!(session = id, cwd = %cwd.display(), "tmux session created");
        Ok(())
    }

    fn capture(&self, id: &str, last_lines: u32) -> Result<String, ExecError> {
        let output = run_tmux("capture-pane", ["capture-pane", "-p", "-t", id])?;
        let text = String::from_utf8_lossy(&output.stdout).to_string();
        let lines: Vec<&str> = text.lines().collect();
        let skip = lines.len().saturating_sub(last_lines as usize);
        Ok(lines[skip..].join("\n"))
    }

    fn send_literal(&self, id: &str, text: &str) -> Result<(), ExecError> {
        if text.is_empty() {
            return Ok(());
        }
        // `-l` sends text literally so punctuation is not interpreted as tmux
        // key names; `--` stops a leading '-' from parsing as a flag.
        run_tmux("send-keys", ["send-keys", "-t", id, "-l", "--", text])?;
        debug!(session = id, bytes = text.len(), "sent literal keys");
        Ok(())
    }

    fn send_submit(&self, id: &str) -> Result<(), ExecError> {
        run_tmux("send-keys Enter", ["send-keys", "-t", id, "C-m"])?;
        debug!(session = id, "sent submit");
        Ok(())
    }

    fn kill(&self, id: &str) -> Result<(), ExecError> {
        if !self.exists(id) {
            return Ok(()); // already gone
        }
        run_tmux("kill-session", ["kill-session", "-t", id])?;
        info!(session = id, "tmux session killed");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, ExecError> {
        let output = Command::new("tmux")
            .args(["list-sessions", "-F", "#{session_name}"])
            .output()?;
        if !output.status.success() {
            // tmux exits non-zero when no server is running; that simply
            // means there are no sessions.
            debug!("tmux list-sessions reported no server");
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|s| s.to_string())
            .collect())
    }
}
