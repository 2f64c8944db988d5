// src/watch/mod.rs

//! Watch mode.
//!
//! This module is responsible for:
//! - Compiling `[[watch]]` rules into glob matchers.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Turning each filesystem event into task runs, one task at a time.
//!
//! It does **not** know how tasks work; it only dispatches names through the
//! [`TaskRegistry`](crate::tasks::TaskRegistry).

pub mod controller;
pub mod path_utils;
pub mod rules;
pub mod watcher;

pub use controller::{ControllerEvent, WatchController, WatchState};
pub use rules::{build_rules, WatchRule};
pub use watcher::{spawn_watcher, WatcherHandle};
