pub mod result;
pub mod task;

pub use result::*;
pub use task::*;
