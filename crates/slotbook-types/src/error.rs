//! Error types for the SlotBook order book.
//!
//! All errors use the `SB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Transition validator errors (fatal for the transaction)
//! - 2xx: Codec errors
//! - 3xx: Transaction / ledger errors
//! - 4xx: Client-side errors (retryable, never reach the validator)
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{OrderSide, Outpoint, Txid};

/// Central error enum for all SlotBook operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotbookError {
    // =================================================================
    // Validator Errors (1xx)
    // =================================================================
    /// The target slot already holds an open order.
    #[error("SB_ERR_100: Slot {slot} not available")]
    SlotOccupied { slot: usize },

    /// Order quantity must be positive.
    #[error("SB_ERR_101: Order quantity must be positive")]
    InvalidQuantity,

    /// Order price must be positive.
    #[error("SB_ERR_102: Order price must be positive")]
    InvalidPrice,

    /// The slot does not hold an order of the expected side.
    #[error("SB_ERR_103: Slot {slot} is not a {expected} order")]
    OrderTypeMismatch { slot: usize, expected: OrderSide },

    /// Buy and sell orders trade different instruments.
    #[error("SB_ERR_104: Ticker mismatch: buy {buy}, sell {sell}")]
    TickerMismatch { buy: String, sell: String },

    /// Buy limit is below the sell limit.
    #[error("SB_ERR_105: Prices do not cross: buy {buy_price} < sell {sell_price}")]
    PriceCross { buy_price: u64, sell_price: u64 },

    /// The recomputed next state failed a sanity check.
    #[error("SB_ERR_106: Postcondition failed: {reason}")]
    PostconditionFailed { reason: String },

    /// The transaction's real outputs differ from the recomputed outputs.
    #[error("SB_ERR_107: Output commitment mismatch: expected {expected}, got {actual}")]
    OutputCommitmentMismatch { expected: String, actual: String },

    /// Slot index outside `[0, ORDER_SLOTS)`.
    #[error("SB_ERR_108: Slot index {index} out of range")]
    SlotIndexOutOfRange { index: usize },

    /// A settlement amount does not fit in 64 bits.
    #[error("SB_ERR_109: Settlement amount overflow: {price} * {quantity}")]
    AmountOverflow { price: u64, quantity: u64 },

    // =================================================================
    // Codec Errors (2xx)
    // =================================================================
    /// Ticker is too long or uses characters outside `A-Z 0-9 .`.
    #[error("SB_ERR_200: Invalid ticker: {reason}")]
    InvalidTicker { reason: String },

    /// An order-book state must hold exactly `ORDER_SLOTS` slots.
    #[error("SB_ERR_201: Invalid state length: expected {expected}, got {actual}")]
    InvalidStateLength { expected: usize, actual: usize },

    /// Malformed bytes.
    #[error("SB_ERR_202: Decode error: {0}")]
    Decode(String),

    // =================================================================
    // Transaction / Ledger Errors (3xx)
    // =================================================================
    /// The verifier rejected a submitted transaction.
    #[error("SB_ERR_300: Transaction {txid} invalid, reason={reason}")]
    TransactionRejected {
        txid: Txid,
        reason: Box<SlotbookError>,
    },

    /// Input 0 does not spend the contract output.
    #[error("SB_ERR_301: Input 0 does not spend contract output {0}")]
    MissingContractInput(Outpoint),

    /// Unlocking data of the contract input is malformed.
    #[error("SB_ERR_302: Malformed call: {reason}")]
    MalformedCall { reason: String },

    /// No entry in the dispatch table for this selector or name.
    #[error("SB_ERR_303: Unknown operation: {0}")]
    UnknownOperation(String),

    /// An input references an output the ledger never saw.
    #[error("SB_ERR_304: Unknown input: {0}")]
    UnknownInput(Outpoint),

    /// An input references an output that is already spent.
    #[error("SB_ERR_305: Input already spent: {0}")]
    InputAlreadySpent(Outpoint),

    /// Outputs are worth more than inputs.
    #[error("SB_ERR_306: Insufficient input value: inputs {inputs}, outputs {outputs}")]
    InsufficientInputValue { inputs: u64, outputs: u64 },

    /// A transaction with this id is already confirmed.
    #[error("SB_ERR_307: Duplicate transaction: {0}")]
    DuplicateTransaction(Txid),

    /// No order-book object with this id.
    #[error("SB_ERR_308: State not found: {0}")]
    StateNotFound(Outpoint),

    // =================================================================
    // Client Errors (4xx)
    // =================================================================
    /// Every slot holds an open order.
    #[error("SB_ERR_400: No free slot available")]
    NoFreeSlot,

    /// The order-entry form produced an unusable order.
    #[error("SB_ERR_401: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// Funding inputs do not cover payments and fee.
    #[error("SB_ERR_402: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("SB_ERR_900: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk).
    #[error("SB_ERR_901: I/O error: {0}")]
    Io(String),

    /// Serialization / deserialization error.
    #[error("SB_ERR_902: Serialization error: {0}")]
    Serialization(String),
}

impl SlotbookError {
    /// Client-side failures the caller may fix and retry. Validator and
    /// ledger rejections are final for the transaction that caused them.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoFreeSlot | Self::InvalidOrder { .. } | Self::InsufficientFunds { .. }
        )
    }

    /// Unwrap a `TransactionRejected` to the underlying validator reason.
    #[must_use]
    pub fn root_cause(&self) -> &SlotbookError {
        match self {
            Self::TransactionRejected { reason, .. } => reason.root_cause(),
            other => other,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SlotbookError>;

impl From<std::io::Error> for SlotbookError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SlotbookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = SlotbookError::SlotOccupied { slot: 3 };
        let msg = format!("{err}");
        assert!(msg.starts_with("SB_ERR_100"), "Got: {msg}");
        assert!(msg.contains('3'));
    }

    #[test]
    fn price_cross_display() {
        let err = SlotbookError::PriceCross {
            buy_price: 80,
            sell_price: 90,
        };
        let msg = format!("{err}");
        assert!(msg.contains("SB_ERR_105"));
        assert!(msg.contains("80"));
        assert!(msg.contains("90"));
    }

    #[test]
    fn rejection_surfaces_reason() {
        let err = SlotbookError::TransactionRejected {
            txid: Txid([0xAB; 32]),
            reason: Box::new(SlotbookError::InvalidPrice),
        };
        let msg = format!("{err}");
        assert!(msg.contains("invalid, reason=SB_ERR_102"), "Got: {msg}");
        assert_eq!(err.root_cause(), &SlotbookError::InvalidPrice);
    }

    #[test]
    fn retryable_split() {
        assert!(SlotbookError::NoFreeSlot.is_retryable());
        assert!(
            SlotbookError::InsufficientFunds {
                needed: 10,
                available: 1
            }
            .is_retryable()
        );
        assert!(!SlotbookError::InvalidQuantity.is_retryable());
        assert!(!SlotbookError::SlotOccupied { slot: 0 }.is_retryable());
    }

    #[test]
    fn all_errors_have_sb_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(SlotbookError::InvalidQuantity),
            Box::new(SlotbookError::NoFreeSlot),
            Box::new(SlotbookError::Decode("short".into())),
            Box::new(SlotbookError::UnknownOperation("cancel".into())),
            Box::new(SlotbookError::OrderTypeMismatch {
                slot: 1,
                expected: OrderSide::Sell,
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("SB_ERR_"),
                "Error missing SB_ERR_ prefix: {msg}"
            );
        }
    }
}
