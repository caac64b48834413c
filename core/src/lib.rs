//! Core of jobq: task model, configuration, and the dispatch/retry engine.

pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod template;
pub mod util;
