use thiserror::Error;

pub type DineResult<T> = Result<T, DineError>;

#[derive(Error, Debug)]
pub enum DineError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),
}
