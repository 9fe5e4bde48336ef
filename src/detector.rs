//! Idle detection state machine.
//!
//! Decides, from nothing but the visible pane text, whether the agent is
//! still working on its current turn. Two signals are scanned per snapshot,
//! recording the *last* line index that matches each:
//!
//! - the working indicator: the `esc to interrupt` hint the agent's TUI
//!   shows only while it is actively producing output;
//! - the completion marker: the summary line printed when a turn finishes
//!   (a leading glyph, one word, the literal `for`, and a duration — e.g.
//!   `✻ Baked for 2m 14s`).
//!
//! The marker is authoritative only when it appears *below* the last working
//! indicator: a stale marker from a previous turn can remain visible above a
//! fresh working indicator and must not read as completion.
//!
//! Short turns may finish and clear the working indicator without ever
//! rendering a marker, so a stability fallback declares idle once the
//! snapshot has stopped changing for a configured number of consecutive
//! polls. Without it, such sessions would always run into the wait ceiling.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Busy/interrupt hint shown while the agent is producing output.
const WORKING_INDICATOR: &str = "esc to interrupt";

/// Turn-completion marker: leading glyph, one word, `for`, duration token.
/// Matches `✻ Baked for 2m 14s`, `· Done for 8s`, `* Worked for 3 minutes`.
static COMPLETION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\sA-Za-z0-9]\s*\w+ for (?:\d+m(?: \d+s)?|\d+s|\d+ (?:minute|second)s?)\b")
        .unwrap()
});

/// What the latest snapshot says about the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    /// The working indicator is current — the agent is mid-turn.
    Busy,
    /// A completion marker sits below the last working indicator.
    Done,
    /// No signal, but the snapshot has been byte-identical for the
    /// configured number of consecutive polls.
    StableIdle,
    /// No conclusive signal yet — keep polling.
    Unknown,
}

/// Marker-only classification of a single snapshot.
///
/// Returns `Some(Done)` or `Some(Busy)` when either signal is present,
/// `None` when the snapshot is inconclusive and the stability path applies.
/// Pure: no history involved.
pub fn classify_markers(snapshot: &str) -> Option<DetectionState> {
    let mut working_idx: Option<usize> = None;
    let mut done_idx: Option<usize> = None;

    for (idx, line) in snapshot.lines().enumerate() {
        if line.contains(WORKING_INDICATOR) {
            working_idx = Some(idx);
        }
        if COMPLETION_MARKER.is_match(line.trim_start()) {
            done_idx = Some(idx);
        }
    }

    // Absent indices compare as -1 so a marker with no working indicator
    // above it still wins.
    let working = working_idx.map_or(-1, |i| i as i64);
    let done = done_idx.map_or(-1, |i| i as i64);

    if done_idx.is_some() && done > working {
        Some(DetectionState::Done)
    } else if working_idx.is_some() {
        Some(DetectionState::Busy)
    } else {
        None
    }
}

/// Stateful detector: marker classification plus the stability fallback.
///
/// One instance lives for the duration of a single wait; feed it every
/// captured snapshot in order via [`IdleDetector::observe`].
pub struct IdleDetector {
    stability_threshold: u32,
    previous: Option<String>,
    stable_polls: u32,
}

impl IdleDetector {
    pub fn new(stability_threshold: u32) -> Self {
        Self {
            stability_threshold,
            previous: None,
            stable_polls: 0,
        }
    }

    /// Evaluate the next snapshot.
    ///
    /// `stable_polls` is the length of the current run of byte-identical
    /// inconclusive snapshots; the first snapshot of a run counts as 1, so
    /// with the default threshold of 5 the fifth identical snapshot (≈10s of
    /// no visible change at a 2s poll interval) reads as stable.
    pub fn observe(&mut self, snapshot: &str) -> DetectionState {
        if let Some(state) = classify_markers(snapshot) {
            // A definite signal ends any stability run.
            self.stable_polls = 0;
            self.previous = None;
            return state;
        }

        match &self.previous {
            Some(prev) if prev == snapshot => {
                self.stable_polls += 1;
                debug!(stable_polls = self.stable_polls, "snapshot unchanged");
            }
            _ => {
                self.stable_polls = 1;
                self.previous = Some(snapshot.to_string());
            }
        }

        if self.stable_polls >= self.stability_threshold {
            DetectionState::StableIdle
        } else {
            DetectionState::Unknown
        }
    }
}
