//! Output commitment: the single enforcement mechanism for transitions.
//!
//! The validator rebuilds the exact outputs a transition requires and
//! compares `hash256` of their serialization with the spending
//! transaction's `hash_outputs`. Output order is fixed:
//!
//! ```text
//! [ next-state contract output, payment*, change? ]
//! ```
//!
//! Payments appear only for `matchOrders`: seller first, then buyer.

use slotbook_types::{OrderBookState, Result, SlotbookError, TxOutput, hash_outputs};

use crate::{call::ChangeOutput, validator::Payment};

/// The outputs a transition requires, in commitment order.
#[must_use]
pub fn required_outputs(
    next_state: &OrderBookState,
    next_balance: u64,
    payments: &[Payment],
    change: Option<&ChangeOutput>,
) -> Vec<TxOutput> {
    let mut outputs = Vec::with_capacity(2 + payments.len());
    outputs.push(TxOutput::contract(next_state, next_balance));
    for payment in payments {
        outputs.push(TxOutput::pay_to_addr(&payment.addr, payment.amount));
    }
    if let Some(change) = change {
        outputs.push(TxOutput::pay_to_addr(&change.addr, change.amount));
    }
    outputs
}

/// Compare the commitment of `required` against the transaction's actual
/// `hash_outputs`. Returns the matching hash.
pub fn check_commitment(required: &[TxOutput], actual: &[u8; 32]) -> Result<[u8; 32]> {
    let expected = hash_outputs(required);
    if expected == *actual {
        Ok(expected)
    } else {
        Err(SlotbookError::OutputCommitmentMismatch {
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        })
    }
}
