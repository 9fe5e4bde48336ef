//! corral — orchestrate coding-agent sessions inside tmux.
//!
//! Each session hosts an autonomous coding agent in a detached tmux session.
//! The library spawns sessions with an initial instruction, detects when the
//! agent has finished a turn from nothing but the visible pane text, waits
//! on several sessions concurrently, delivers follow-ups, and tears sessions
//! down. The tmux dependency sits behind [`backend::SessionBackend`] so the
//! detection and wait logic is testable with scripted snapshots.

pub mod backend;
pub mod cli;
pub mod config;
pub mod detector;
pub mod sanitize;
pub mod sender;
pub mod session;
pub mod shell_completion;
pub mod spawn;
pub mod tools;
pub mod waiter;
