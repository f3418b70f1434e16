use thiserror::Error;

#[derive(Debug, Error)]
pub enum LitefetchError {
    #[error("transfer: {message}")]
    Transfer { message: String },

    #[error("initialization: {message}")]
    Initialization { message: String },

    #[error("not ready: no database is loaded")]
    NotReady,

    #[error("query: {message}")]
    Query { message: String },

    #[error("timeout: load timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("config: {message}")]
    Config { message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("format: {message}")]
    Format { message: String },
}
