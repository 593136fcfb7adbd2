//! repodeck library crate.
//!
//! This library provides the core functionality for repodeck, including:
//! - The curated entry tree and its editing operations
//! - Synchronous git status probes with a persisted cache
//! - Launching entries with an ide, a shell, or a claude session
//! - Terminal UI state machine and rendering

pub mod app;
pub mod entries;
pub mod git;
pub mod handlers;
pub mod launch;
pub mod scan;
pub mod shortcut;
pub mod store;
pub mod ui;
