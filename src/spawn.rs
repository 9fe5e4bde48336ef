//! Session spawning — idempotent (re)creation of an agent session.
//!
//! The initial prompt is never inlined into a shell command line: it is
//! staged into a temp file and the session's shell is told to read it from
//! there. The composite start line the session runs deletes the staged file
//! after the agent exits — ownership of the artifact crosses the process
//! boundary on purpose, so a long-running agent keeps its prompt available
//! and the orchestrator does not have to outlive it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::backend::SessionBackend;
use crate::config::AgentSettings;
use crate::sender::escape_literal;
use crate::session::{SessionIdentity, canonicalize};

static STAGE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique staging path for a session's initial prompt.
fn staged_prompt_path(id: &str) -> PathBuf {
    let seq = STAGE_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("corral-prompt-{id}-{}-{seq}.txt", std::process::id()))
}

/// Compose the start line the fresh session's shell will run: read the
/// staged prompt, launch the agent with it, remove the artifact when the
/// agent exits. The staged path is the only orchestrator-controlled text on
/// the line, escaped for the double-quoted shell context it sits in.
fn start_command(agent: &AgentSettings, staged: &Path, skip_permissions: bool) -> String {
    let path = escape_literal(&staged.to_string_lossy());
    let flag = if skip_permissions {
        format!("{} ", agent.skip_permissions_flag)
    } else {
        String::new()
    };
    format!(
        "{program} {flag}\"$(cat \"{path}\")\"; rm -f \"{path}\"",
        program = agent.program,
    )
}

/// Create (or recreate) a session and seed its initial instruction.
///
/// Any pre-existing session with the same canonical id is killed first, so
/// spawning the same name twice leaves exactly one live session.
pub fn spawn(
    backend: &dyn SessionBackend,
    name: &str,
    workdir: &Path,
    prompt: &str,
    skip_permissions: bool,
    agent: &AgentSettings,
) -> Result<SessionIdentity> {
    let identity = canonicalize(name)?;
    let id = identity.id();

    // Absent sessions kill as success, so this is safe unconditionally.
    backend
        .kill(id)
        .with_context(|| format!("failed to replace existing session '{id}'"))?;

    backend
        .create(id, workdir)
        .with_context(|| format!("failed to create session '{id}'"))?;

    let staged = staged_prompt_path(id);
    std::fs::write(&staged, prompt)
        .with_context(|| format!("failed to stage prompt at {}", staged.display()))?;
    debug!(session = id, staged = %staged.display(), "prompt staged");

    let start = start_command(agent, &staged, skip_permissions);
    backend
        .send_literal(id, &start)
        .with_context(|| format!("failed to send start command to '{id}'"))?;
    backend
        .send_submit(id)
        .with_context(|| format!("failed to submit start command to '{id}'"))?;

    info!(
        session = id,
        workdir = %workdir.display(),
        skip_permissions,
        "agent session started"
    );
    Ok(identity)
}
