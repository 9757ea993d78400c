pub mod error;
pub mod logging;
pub mod types;

pub use error::{KubecheckError, Result};
pub use types::{ExecMode, ExecOptions, OutputFormat};
