//! Operation calls carried in the contract input's unlocking data.
//!
//! ```text
//! call = selector:u8 | args | next_balance:u64 | has_change:u8 [ | change_addr:20 | change_amount:u64 ]
//! placeOrder args  = order_record:47 | slot:u32
//! matchOrders args = buy:u32 | sell:u32
//! ```
//!
//! The selector is resolved through [`crate::schema::OPERATIONS`].

use slotbook_types::{
    Order, Result, SettlementAddr, SlotbookError,
    codec::{ByteReader, encode_order},
};

use crate::schema;

/// A state-transition operation and its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    PlaceOrder { order: Order, slot: usize },
    MatchOrders { buy: usize, sell: usize },
}

impl Operation {
    /// ABI name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlaceOrder { .. } => schema::PLACE_ORDER,
            Self::MatchOrders { .. } => schema::MATCH_ORDERS,
        }
    }

    fn write_args(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::PlaceOrder { order, slot } => {
                encode_order(order, out);
                out.extend_from_slice(&index_to_u32(*slot)?.to_le_bytes());
            }
            Self::MatchOrders { buy, sell } => {
                out.extend_from_slice(&index_to_u32(*buy)?.to_le_bytes());
                out.extend_from_slice(&index_to_u32(*sell)?.to_le_bytes());
            }
        }
        Ok(())
    }
}

fn index_to_u32(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| SlotbookError::SlotIndexOutOfRange { index })
}

/// Leftover funding returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeOutput {
    pub addr: SettlementAddr,
    pub amount: u64,
}

/// Everything the verifier needs to recompute the required outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractCall {
    pub operation: Operation,
    /// Satoshis the next contract output must carry.
    pub next_balance: u64,
    pub change: Option<ChangeOutput>,
}

impl ContractCall {
    #[must_use]
    pub fn new(operation: Operation, next_balance: u64) -> Self {
        Self {
            operation,
            next_balance,
            change: None,
        }
    }

    #[must_use]
    pub fn with_change(mut self, change: Option<ChangeOutput>) -> Self {
        self.change = change;
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let descriptor = schema::operation_by_name(self.operation.name())?;
        let mut out = vec![descriptor.selector];
        self.operation.write_args(&mut out)?;
        out.extend_from_slice(&self.next_balance.to_le_bytes());
        match &self.change {
            Some(change) => {
                out.push(1);
                out.extend_from_slice(change.addr.as_bytes());
                out.extend_from_slice(&change.amount.to_le_bytes());
            }
            None => out.push(0),
        }
        Ok(out)
    }

    /// Strict decode; any malformation is a [`SlotbookError::MalformedCall`]
    /// except an unknown selector, which is [`SlotbookError::UnknownOperation`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let selector = reader.u8().map_err(malformed)?;
        let descriptor = schema::operation_by_selector(selector)?;
        let operation = (descriptor.decode_args)(&mut reader).map_err(malformed)?;
        let next_balance = reader.u64_le().map_err(malformed)?;
        let change = if reader.flag().map_err(malformed)? {
            Some(ChangeOutput {
                addr: SettlementAddr(reader.array().map_err(malformed)?),
                amount: reader.u64_le().map_err(malformed)?,
            })
        } else {
            None
        };
        reader.finish().map_err(malformed)?;
        Ok(Self {
            operation,
            next_balance,
            change,
        })
    }
}

fn malformed(err: SlotbookError) -> SlotbookError {
    match err {
        SlotbookError::Decode(reason) => SlotbookError::MalformedCall { reason },
        SlotbookError::InvalidTicker { reason } => SlotbookError::MalformedCall {
            reason: format!("ticker: {reason}"),
        },
        other => other,
    }
}
