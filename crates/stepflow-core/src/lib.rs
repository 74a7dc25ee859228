pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{GraphExecutionError, GraphValidationError, Result, StepflowError};
pub use traits::SandboxClient;
pub use types::*;
