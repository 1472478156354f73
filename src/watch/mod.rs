// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `[[watch]]` subscriptions (`patterns.rs`).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Content hashing, so that saving a file without changing it does not
//!   re-run anything.
//!
//! It does **not** know about pipelines; it only turns filesystem changes
//! into task-level triggers.

pub mod cache;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{ChangeDetector, process_file_change};
pub use hash::{HashStore, MemoryHashStore, compute_aggregate_hash, compute_file_hash};
pub use patterns::{WatchProfile, build_watch_profiles};
pub use watcher::{WatcherHandle, spawn_watcher};
