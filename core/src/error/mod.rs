#[allow(clippy::module_inception)]
pub mod error;
pub mod submit;

pub use error::{CliError, ConfigError};
pub use submit::{SubmitError, TemplateError};
