// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid batch size: {0} (must be positive)")]
    InvalidBatchSize(i64),

    #[error("Invalid capacity: {0} (must be positive)")]
    InvalidCapacity(i64),

    #[error("Invalid lease timeout: {0} ms (must be positive)")]
    InvalidLeaseTimeout(i64),

    #[error("Empty token")]
    EmptyToken,
}

pub type Result<T> = std::result::Result<T, DomainError>;
