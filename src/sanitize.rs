//! Output sanitization — strip agent TUI chrome from captured pane text.
//!
//! A raw `capture-pane` snapshot of a Claude Code session carries decorative
//! box rules, the example-prompt hint, the permission-bypass banner, and
//! keybinding hints alongside the actual task output. Callers reading a
//! session want the content, not the chrome, so these lines are dropped
//! before any text leaves the tool surface.
//!
//! Sanitization only ever removes whole lines, which makes it idempotent:
//! re-sanitizing sanitized output is a no-op.

use std::sync::LazyLock;

use regex::Regex;

/// A decorative horizontal rule: a run of at least ten box-drawing or
/// hyphen characters, as drawn around the agent's input box.
static RULE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[─━═│┃╭╮╰╯┌┐└┘├┤-]{10,}").unwrap()
});

/// The quoted example-prompt hint shown in an empty input box, e.g.
/// `> Try "fix lint errors"`.
static EXAMPLE_PROMPT_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*(?:[>›]\s*)?Try ""#).unwrap());

/// Permission-bypass banner text (always shown when the agent was started
/// with confirmation prompts disabled).
const BYPASS_BANNER: &str = "bypass permissions";

/// Keybinding hint for submitting the input box.
const SUBMIT_HINT: &str = "to submit";

/// Keybinding hint for cycling the agent's input mode.
const CYCLE_MODE_HINT: &str = "shift+tab to cycle";

fn is_chrome(line: &str) -> bool {
    if RULE_RUN.is_match(line) {
        return true;
    }
    if EXAMPLE_PROMPT_HINT.is_match(line) {
        return true;
    }
    let lower = line.to_ascii_lowercase();
    lower.contains(BYPASS_BANNER) || lower.contains(SUBMIT_HINT) || lower.contains(CYCLE_MODE_HINT)
}

/// Remove UI chrome lines from a pane snapshot.
///
/// Keeps the relative order of surviving lines and trims leading/trailing
/// blank lines from the result.
pub fn sanitize(text: &str) -> String {
    let kept: Vec<&str> = text.lines().filter(|line| !is_chrome(line)).collect();

    let start = kept
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(kept.len());
    let end = kept
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(start, |i| i + 1);

    kept[start..end].join("\n")
}
