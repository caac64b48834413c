pub mod flow_batch;
pub mod flow_shell;

pub use flow_batch::run_batch_flow;
pub use flow_shell::{run_shell_flow, Shell};
