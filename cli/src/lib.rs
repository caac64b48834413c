//! jobq command line: argument parsing, config assembly and the run/shell flows.

pub mod app;
pub mod commands;
pub mod flow;
