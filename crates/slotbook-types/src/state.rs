//! The persisted order-book aggregate.
//!
//! An [`OrderBookState`] is an arena of exactly [`ORDER_SLOTS`] orders
//! addressed by index. It is never mutated in place: every transition
//! builds a new value with at most two slots replaced, and the encoded
//! form is always [`STATE_SIZE`] bytes.

use serde::{Deserialize, Serialize};

use crate::{
    Order, Result, SlotbookError,
    codec::{ByteReader, decode_order, encode_order, hash256},
    constants::{ORDER_SLOTS, STATE_SIZE},
};

/// Fixed-capacity order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Order>", into = "Vec<Order>")]
pub struct OrderBookState {
    slots: Vec<Order>,
}

impl OrderBookState {
    /// The deployment state: every slot holds the empty sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Order::EMPTY; ORDER_SLOTS],
        }
    }

    /// Read one slot.
    pub fn slot(&self, index: usize) -> Result<&Order> {
        self.slots
            .get(index)
            .ok_or(SlotbookError::SlotIndexOutOfRange { index })
    }

    #[must_use]
    pub fn slots(&self) -> &[Order] {
        &self.slots
    }

    /// A copy of this state with `slots[index]` replaced.
    pub fn with_slot(&self, index: usize, order: Order) -> Result<Self> {
        if index >= ORDER_SLOTS {
            return Err(SlotbookError::SlotIndexOutOfRange { index });
        }
        let mut slots = self.slots.clone();
        slots[index] = order;
        Ok(Self { slots })
    }

    /// Lowest-indexed slot whose `closed` flag allows reuse.
    #[must_use]
    pub fn first_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|o| o.closed)
    }

    /// Open orders with their slot indices, in slot order.
    pub fn open_orders(&self) -> impl Iterator<Item = (usize, &Order)> {
        self.slots.iter().enumerate().filter(|(_, o)| o.is_open())
    }

    /// Number of slots currently holding an open order.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|o| o.is_open()).count()
    }

    /// Persisted layout: `ORDER_SLOTS` fixed-width records.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(STATE_SIZE);
        for order in &self.slots {
            encode_order(order, &mut out);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != STATE_SIZE {
            return Err(SlotbookError::Decode(format!(
                "state is {} bytes, expected {STATE_SIZE}",
                bytes.len()
            )));
        }
        let mut reader = ByteReader::new(bytes);
        let mut slots = Vec::with_capacity(ORDER_SLOTS);
        for _ in 0..ORDER_SLOTS {
            slots.push(decode_order(&mut reader)?);
        }
        reader.finish()?;
        Ok(Self { slots })
    }

    /// `hash256` of the encoded state, for logs and snapshots.
    #[must_use]
    pub fn state_hash(&self) -> [u8; 32] {
        hash256(&self.encode())
    }
}

impl Default for OrderBookState {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<Order>> for OrderBookState {
    type Error = SlotbookError;

    fn try_from(slots: Vec<Order>) -> Result<Self> {
        if slots.len() != ORDER_SLOTS {
            return Err(SlotbookError::InvalidStateLength {
                expected: ORDER_SLOTS,
                actual: slots.len(),
            });
        }
        Ok(Self { slots })
    }
}

impl From<OrderBookState> for Vec<Order> {
    fn from(state: OrderBookState) -> Self {
        state.slots
    }
}
