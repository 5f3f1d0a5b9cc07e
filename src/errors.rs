use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parsing(String),
}

pub type ScreenerResult<T> = Result<T, ScreenerError>;

impl ScreenerError {
    /// Transport and upstream errors are worth retrying on the next
    /// externally-triggered fetch; parse errors usually are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ScreenerError::Network(_) => true,
            ScreenerError::Api(_) => true,
            ScreenerError::Parsing(_) => false,
        }
    }
}
