//! Wait loop — polls a session until its agent goes idle, times out, or the
//! capture fails.
//!
//! One wait owns one [`IdleDetector`] and issues strictly sequential
//! captures: never more than one outstanding capture per session. Several
//! sessions can be awaited at once via [`wait_many`], which runs one wait
//! per session on scoped threads and joins them all.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::backend::{ExecError, SessionBackend};
use crate::detector::{DetectionState, IdleDetector, classify_markers};
use crate::sanitize::sanitize;

/// Tunables for a single wait. Defaults match the `[wait]` config table.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay before the poll loop starts, so a session whose agent is still
    /// launching is not read as idle.
    pub warm_up: Duration,
    /// Interval between captures.
    pub poll_interval: Duration,
    /// Consecutive identical snapshots required for the stability fallback.
    pub stability_threshold: u32,
    /// Overall ceiling; past it the wait returns a timeout result.
    pub ceiling: Duration,
    /// How many trailing pane lines each capture keeps.
    pub capture_lines: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            warm_up: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            stability_threshold: 5,
            ceiling: Duration::from_secs(600),
            capture_lines: 80,
        }
    }
}

/// Outcome of one wait. Timeouts are results, not errors: the session keeps
/// running and the caller gets the best-effort partial output.
#[derive(Debug)]
pub enum WaitResult {
    /// The agent finished its turn; sanitized pane text.
    Ready(String),
    /// The ceiling elapsed first. The session is still running.
    TimedOut { partial: String },
    /// A capture failed; the wait aborted without retrying.
    Failed(ExecError),
    /// The session does not exist (parallel waits short-circuit here).
    Missing,
}

/// Poll `id` until the agent is idle or the ceiling elapses.
pub fn wait(backend: &dyn SessionBackend, id: &str, config: &WaitConfig) -> WaitResult {
    let started = Instant::now();
    let mut detector = IdleDetector::new(config.stability_threshold);

    // One capture before the warm-up: a session that already shows a
    // correctly-ordered completion marker should not cost a warm-up delay.
    // Only the marker path can fire here — stability needs history.
    match backend.capture(id, config.capture_lines) {
        Ok(snapshot) => {
            if classify_markers(&snapshot) == Some(DetectionState::Done) {
                info!(session = id, "already done before warm-up");
                return WaitResult::Ready(sanitize(&snapshot));
            }
            detector.observe(&snapshot);
        }
        Err(err) => return WaitResult::Failed(err),
    }

    thread::sleep(config.warm_up);

    loop {
        thread::sleep(config.poll_interval);

        let snapshot = match backend.capture(id, config.capture_lines) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(session = id, error = %err, "capture failed, aborting wait");
                return WaitResult::Failed(err);
            }
        };

        let state = detector.observe(&snapshot);
        debug!(session = id, ?state, elapsed = ?started.elapsed(), "poll");

        match state {
            DetectionState::Done | DetectionState::StableIdle => {
                info!(session = id, ?state, "agent idle");
                return WaitResult::Ready(sanitize(&snapshot));
            }
            DetectionState::Busy | DetectionState::Unknown => {
                if started.elapsed() >= config.ceiling {
                    warn!(session = id, ceiling = ?config.ceiling, "wait ceiling reached");
                    return WaitResult::TimedOut {
                        partial: sanitize(&snapshot),
                    };
                }
            }
        }
    }
}

/// Wait on several sessions concurrently.
///
/// Sessions that do not exist short-circuit to [`WaitResult::Missing`]
/// without a poll loop and without blocking the others. Results come back
/// in the caller's requested order; a slow or timed-out session never
/// delays a sibling's completion, only the final join.
pub fn wait_many(
    backend: &dyn SessionBackend,
    ids: &[String],
    config: &WaitConfig,
) -> Vec<(String, WaitResult)> {
    thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                if !backend.exists(id) {
                    debug!(session = %id, "skipping wait, session missing");
                    return (id.clone(), None);
                }
                (
                    id.clone(),
                    Some(scope.spawn(move || wait(backend, id, config))),
                )
            })
            .collect();

        handles
            .into_iter()
            .map(|(id, handle)| match handle {
                Some(handle) => {
                    let result = handle
                        .join()
                        .unwrap_or_else(|_| panic!("wait thread for '{id}' panicked"));
                    (id, result)
                }
                None => (id, WaitResult::Missing),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    /// Scripted backend: each capture pops the next snapshot; the last one
    /// repeats forever.
    struct ScriptedBackend {
        snapshots: Mutex<Vec<String>>,
        exists: bool,
    }

    impl ScriptedBackend {
        fn new(snapshots: &[&str]) -> Self {
            Self {
                snapshots: Mutex::new(snapshots.iter().rev().map(|s| s.to_string()).collect()),
                exists: true,
            }
        }
    }

    impl SessionBackend for ScriptedBackend {
        fn exists(&self, _id: &str) -> bool {
            self.exists
        }
        fn create(&self, _id: &str, _cwd: &Path) -> Result<(), ExecError> {
            Ok(())
        }
        fn capture(&self, _id: &str, _last_lines: u32) -> Result<String, ExecError> {
            let mut snapshots = self.snapshots.lock().unwrap();
            if snapshots.len() > 1 {
                Ok(snapshots.pop().unwrap())
            } else {
                snapshots
                    .last()
                    .cloned()
                    .ok_or_else(|| ExecError::Command {
                        command: "capture-pane".to_string(),
                        stderr: "can't find session".to_string(),
                    })
            }
        }
        fn send_literal(&self, _id: &str, _text: &str) -> Result<(), ExecError> {
            Ok(())
        }
        fn send_submit(&self, _id: &str) -> Result<(), ExecError> {
            Ok(())
        }
        fn kill(&self, _id: &str) -> Result<(), ExecError> {
            Ok(())
        }
        fn list(&self) -> Result<Vec<String>, ExecError> {
            Ok(Vec::new())
        }
    }

    fn fast_config() -> WaitConfig {
        WaitConfig {
            warm_up: Duration::from_millis(1),
            poll_interval: Duration::from_millis(1),
            stability_threshold: 3,
            ceiling: Duration::from_millis(200),
            capture_lines: 80,
        }
    }

    #[test]
    fn pre_warm_up_done_short_circuits() {
        let backend = ScriptedBackend::new(&["work finished\n✻ Baked for 2m 14s"]);
        let result = wait(&backend, "corral-x", &fast_config());
        match result {
            WaitResult::Ready(text) => assert!(text.contains("work finished")),
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn busy_then_done_returns_sanitized_output() {
        let rule = "─".repeat(20);
        let done = format!("answer line\n{rule}\n✻ Churned for 12s");
        let backend = ScriptedBackend::new(&[
            "✻ Thinking… (esc to interrupt)",
            "✻ Thinking… (esc to interrupt)",
            &done,
        ]);
        match wait(&backend, "corral-x", &fast_config()) {
            WaitResult::Ready(text) => {
                assert!(text.contains("answer line"));
                assert!(!text.contains(&rule));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn stability_path_returns_ready() {
        // No marker ever appears; the unchanged prompt must count as idle.
        let backend = ScriptedBackend::new(&["$ done\n$ "]);
        match wait(&backend, "corral-x", &fast_config()) {
            WaitResult::Ready(text) => assert!(text.contains("$ done")),
            other => panic!("expected Ready via stability, got {other:?}"),
        }
    }

    #[test]
    fn capture_error_fails_immediately() {
        let backend = ScriptedBackend {
            snapshots: Mutex::new(Vec::new()),
            exists: true,
        };
        match wait(&backend, "corral-x", &fast_config()) {
            WaitResult::Failed(_) => {}
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn ceiling_produces_timeout_with_partial_output() {
        // Busy forever: the indicator never clears, the snapshot never
        // stabilizes into StableIdle because it classifies as Busy.
        let backend = ScriptedBackend::new(&["partial work\n✻ Grinding… (esc to interrupt)"]);
        let config = WaitConfig {
            ceiling: Duration::from_millis(20),
            ..fast_config()
        };
        match wait(&backend, "corral-x", &config) {
            WaitResult::TimedOut { partial } => assert!(partial.contains("partial work")),
            other => panic!("expected TimedOut, got {other:?}"),
        }
    }

    #[test]
    fn wait_many_short_circuits_missing_sessions() {
        struct MixedBackend;
        impl SessionBackend for MixedBackend {
            fn exists(&self, id: &str) -> bool {
                id != "corral-b"
            }
            fn create(&self, _id: &str, _cwd: &Path) -> Result<(), ExecError> {
                Ok(())
            }
            fn capture(&self, _id: &str, _last_lines: u32) -> Result<String, ExecError> {
                Ok("✻ Baked for 3s".to_string())
            }
            fn send_literal(&self, _id: &str, _text: &str) -> Result<(), ExecError> {
                Ok(())
            }
            fn send_submit(&self, _id: &str) -> Result<(), ExecError> {
                Ok(())
            }
            fn kill(&self, _id: &str) -> Result<(), ExecError> {
                Ok(())
            }
            fn list(&self) -> Result<Vec<String>, ExecError> {
                Ok(Vec::new())
            }
        }

        let ids = vec![
            "corral-a".to_string(),
            "corral-b".to_string(),
            "corral-c".to_string(),
        ];
        let results = wait_many(&MixedBackend, &ids, &fast_config());

        assert_eq!(results.len(), 3);
        // Caller order preserved.
        assert_eq!(results[0].0, "corral-a");
        assert_eq!(results[1].0, "corral-b");
        assert_eq!(results[2].0, "corral-c");
        assert!(matches!(results[0].1, WaitResult::Ready(_)));
        assert!(matches!(results[1].1, WaitResult::Missing));
        assert!(matches!(results[2].1, WaitResult::Ready(_)));
    }

    #[test]
    fn default_config_values() {
        let config = WaitConfig::default();
        assert_eq!(config.warm_up, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.stability_threshold, 5);
        assert_eq!(config.ceiling, Duration::from_secs(600));
        assert_eq!(config.capture_lines, 80);
    }
}
