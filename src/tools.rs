//! Upward tool surface — textual results for every operation.
//!
//! Callers above this layer (the CLI today, any tool-invocation transport
//! tomorrow) get plain text back, never an error: failures render as
//! `Error: ...` lines, a missing session as a descriptive sentence, and a
//! timed-out wait as the partial output plus an explicit still-running note.
//! Nothing here terminates the process.

use std::path::Path;

use tracing::warn;

use crate::backend::SessionBackend;
use crate::config::ProjectConfig;
use crate::sender;
use crate::session::{canonicalize, short_name_of};
use crate::spawn;
use crate::waiter::{self, WaitResult};

/// The orchestrator's caller-facing operations.
pub struct Tools<'a> {
    backend: &'a dyn SessionBackend,
    config: &'a ProjectConfig,
}

impl<'a> Tools<'a> {
    pub fn new(backend: &'a dyn SessionBackend, config: &'a ProjectConfig) -> Self {
        Self { backend, config }
    }

    /// Start (or restart) a named agent session with an initial prompt.
    pub fn spawn(
        &self,
        name: &str,
        prompt: &str,
        workdir: &Path,
        skip_permissions: bool,
    ) -> String {
        match spawn::spawn(
            self.backend,
            name,
            workdir,
            prompt,
            skip_permissions,
            &self.config.agent,
        ) {
            Ok(identity) => format!("Started {}", identity.id()),
            Err(err) => render_error(&err),
        }
    }

    /// Wait for one or more sessions to go idle and return their output.
    ///
    /// A single name returns the bare sanitized text; several names return
    /// each session's text under its own header, in the requested order.
    pub fn read(&self, names: &[String]) -> String {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            match canonicalize(name) {
                Ok(identity) => ids.push(identity.id().to_string()),
                Err(err) => return format!("Error: {err}"),
            }
        }

        let wait_config = self.config.wait_config();
        let results = waiter::wait_many(self.backend, &ids, &wait_config);

        if let [(id, result)] = &results[..] {
            return render_wait_result(short_name(id), result, &wait_config);
        }

        results
            .iter()
            .map(|(id, result)| {
                let name = short_name(id);
                format!(
                    "=== {name} ===\n{}",
                    render_wait_result(name, result, &wait_config)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Deliver a follow-up instruction to a running session.
    pub fn send(&self, name: &str, text: &str) -> String {
        let identity = match canonicalize(name) {
            Ok(identity) => identity,
            Err(err) => return format!("Error: {err}"),
        };
        if !self.backend.exists(identity.id()) {
            return not_found(name);
        }
        match sender::send(self.backend, identity.id(), text) {
            Ok(()) => format!("Sent to {}", identity.id()),
            Err(err) => format!("Error: {err}"),
        }
    }

    /// Terminate a session.
    pub fn kill(&self, name: &str) -> String {
        let identity = match canonicalize(name) {
            Ok(identity) => identity,
            Err(err) => return format!("Error: {err}"),
        };
        if !self.backend.exists(identity.id()) {
            return not_found(name);
        }
        match self.backend.kill(identity.id()) {
            Ok(()) => format!("Killed {}", identity.id()),
            Err(err) => format!("Error: {err}"),
        }
    }

    /// List the short names of all live corral sessions.
    pub fn list(&self) -> String {
        let sessions = match self.backend.list() {
            Ok(sessions) => sessions,
            Err(err) => return format!("Error: {err}"),
        };
        let names: Vec<&str> = sessions
            .iter()
            .filter_map(|id| short_name_of(id))
            .collect();
        if names.is_empty() {
            "No active sessions".to_string()
        } else {
            names.join("\n")
        }
    }
}

fn short_name(id: &str) -> &str {
    short_name_of(id).unwrap_or(id)
}

fn not_found(name: &str) -> String {
    format!("Session '{name}' does not exist")
}

fn render_error(err: &anyhow::Error) -> String {
    warn!(error = %err, "operation failed");
    format!("Error: {err:#}")
}

fn render_wait_result(name: &str, result: &WaitResult, config: &crate::waiter::WaitConfig) -> String {
    match result {
        WaitResult::Ready(text) => text.clone(),
        WaitResult::TimedOut { partial } => format!(
            "{partial}\n\n[wait timed out after {}s — session '{name}' is still running]",
            config.ceiling.as_secs()
        ),
        WaitResult::Failed(err) => format!("Error: {err}"),
        WaitResult::Missing => not_found(name),
    }
}
