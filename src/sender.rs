//! Follow-up message delivery.
//!
//! A follow-up instruction goes into the agent's input box as literal
//! keystrokes, then a *separate* submit keypress. Splitting the two actions
//! guarantees the Enter is never absorbed into a multi-line or
//! special-character payload as part of the text itself.

use tracing::info;

use crate::backend::{ExecError, SessionBackend};

/// Escape text for embedding inside a double-quoted POSIX shell string.
///
/// Backslash, double-quote, dollar-sign and backtick are the four characters
/// a double-quoted shell context interprets. Used wherever orchestrator text
/// crosses a shell boundary — notably the composite start line a spawned
/// session's shell executes. The follow-up payload below does not need it:
/// it travels as a single exec argument straight into `send-keys -l`.
pub fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Deliver `text` to the session and submit it.
pub fn send(backend: &dyn SessionBackend, id: &str, text: &str) -> Result<(), ExecError> {
    backend.send_literal(id, text)?;
    backend.send_submit(id)?;
    info!(session = id, bytes = text.len(), "message sent");
    Ok(())
}
