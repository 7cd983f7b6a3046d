use thiserror::Error;

#[derive(Debug, Error)]
pub enum GqlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Variables nested {depth} levels deep, limit is {limit}")]
    DepthLimitExceeded { depth: usize, limit: usize },

    #[error("Path {path} does not start with root {root}")]
    RootMismatch { path: String, root: String },

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Path names more than one slot: {0}")]
    PathCollision(String),

    #[error("File-like value left in variables: {0}")]
    UnextractedFile(String),
}

impl From<toml::de::Error> for GqlError {
    fn from(err: toml::de::Error) -> Self {
        GqlError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for GqlError {
    fn from(err: toml::ser::Error) -> Self {
        GqlError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GqlError>;
