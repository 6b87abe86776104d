use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    #[error("Order store fetch timed out after {0} ms")]
    Timeout(u64),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Malformed order data: {0}")]
    Malformed(String),
}
