//! Error types for the matching core
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("System error: {message}")]
    System { message: String },
}

impl EngineError {
    /// Malformed input rejected before any book mutation
    pub fn is_invalid_order(&self) -> bool {
        matches!(self, EngineError::Order(e) if e.is_invalid_order())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Order(OrderError::NotFound { .. }))
    }

    pub fn is_not_cancellable(&self) -> bool {
        matches!(self, EngineError::Order(OrderError::NotCancellable { .. }))
    }
}

/// Order-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid order type: {0}")]
    InvalidOrderType(String),

    #[error("Order not found: {order_id}")]
    NotFound { order_id: String },

    #[error("Order {order_id} cannot be cancelled in state {status}")]
    NotCancellable { order_id: String, status: String },

    #[error("Order {order_id} cannot be filled in state {status}")]
    NotFillable { order_id: String, status: String },

    #[error("Fill of {fill} exceeds remaining quantity {remaining} of order {order_id}")]
    Overfill {
        order_id: String,
        fill: u64,
        remaining: u64,
    },
}

impl OrderError {
    /// True for the malformed-input class of errors
    pub fn is_invalid_order(&self) -> bool {
        matches!(
            self,
            OrderError::InvalidQuantity(_)
                | OrderError::InvalidPrice(_)
                | OrderError::InvalidOrderType(_)
        )
    }
}

/// Storage adapter failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted storage: {0}")]
    Corrupted(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_error_display() {
        let err = OrderError::InvalidPrice("0".to_string());
        assert_eq!(err.to_string(), "Invalid price: 0");
    }

    #[test]
    fn test_not_cancellable_display() {
        let err = OrderError::NotCancellable {
            order_id: "abc".to_string(),
            status: "FILLED".to_string(),
        };
        assert!(err.to_string().contains("abc"));
        assert!(err.to_string().contains("FILLED"));
    }

    #[test]
    fn test_engine_error_from_order_error() {
        let engine_err: EngineError = OrderError::InvalidQuantity("0".into()).into();
        assert!(matches!(engine_err, EngineError::Order(_)));
        assert!(engine_err.is_invalid_order());
        assert!(!engine_err.is_not_found());
    }

    #[test]
    fn test_engine_error_from_storage_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let engine_err: EngineError = StorageError::from(io).into();
        assert!(matches!(engine_err, EngineError::Storage(StorageError::Io(_))));
        assert!(!engine_err.is_invalid_order());
    }
}
