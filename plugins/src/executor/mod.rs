pub mod process;
pub mod renderers;
pub mod strategies;

pub use process::ProcessExecutor;
pub use renderers::{JsonlRendererPlugin, TextRendererPlugin};
pub use strategies::{ExponentialBackoffPlugin, LinearRetryPlugin};
