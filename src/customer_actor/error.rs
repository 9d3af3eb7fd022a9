//! Error types for the Customer actor and everything that reads or writes customers.

use crate::model::CustomerId;
use thiserror::Error;

/// Errors that can occur during customer operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CustomerError {
    /// The referenced customer does not exist. Retrying will not create it.
    #[error("Customer not found: {0}")]
    NotFound(CustomerId),

    /// The customer exists but has been deactivated.
    #[error("Customer is inactive: {0}")]
    Inactive(CustomerId),

    /// Malformed payload or an order count out of range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The store could not be reached or dropped the request.
    #[error("Customer store unavailable: {0}")]
    StoreUnavailable(String),

    /// Anything not covered above.
    #[error("Unexpected customer error: {0}")]
    Unexpected(String),
}

impl CustomerError {
    /// Whether repeating the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CustomerError::StoreUnavailable(_) | CustomerError::Unexpected(_)
        )
    }
}
