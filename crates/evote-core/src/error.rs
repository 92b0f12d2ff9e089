use thiserror::Error;

pub type EvoteResult<T> = Result<T, EvoteError>;

#[derive(Debug, Error)]
pub enum EvoteError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
