pub mod config;
pub mod error;
pub mod types;

pub use config::{ExtractConfig, ExtractConfigBuilder, DEFAULT_MAX_DEPTH, DEFAULT_ROOT};
pub use error::{GqlError, Result};
pub use types::*;
