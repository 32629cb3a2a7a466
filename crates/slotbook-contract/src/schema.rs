//! Explicit contract schema: which fields persist in each order record, and
//! which operations are callable with how their arguments decode.

use slotbook_types::{
    Result, SlotbookError,
    codec::{ByteReader, decode_order},
    constants::{ADDR_LEN, TICKER_MAX_LEN},
};

use crate::call::Operation;

pub const PLACE_ORDER: &str = "placeOrder";
pub const MATCH_ORDERS: &str = "matchOrders";

/// One persisted field of an order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Encoded width in bytes.
    pub width: usize,
}

/// Persisted order-record fields, in encoding order.
pub const ORDER_FIELDS: [FieldDescriptor; 6] = [
    FieldDescriptor {
        name: "ticker",
        width: 1 + TICKER_MAX_LEN,
    },
    FieldDescriptor {
        name: "quantity",
        width: 8,
    },
    FieldDescriptor {
        name: "price",
        width: 8,
    },
    FieldDescriptor {
        name: "side",
        width: 1,
    },
    FieldDescriptor {
        name: "settlementAddr",
        width: ADDR_LEN,
    },
    FieldDescriptor {
        name: "closed",
        width: 1,
    },
];

/// Sum of [`ORDER_FIELDS`] widths.
#[must_use]
pub fn record_width() -> usize {
    ORDER_FIELDS.iter().map(|f| f.width).sum()
}

/// Argument decoder for one operation.
pub type ArgDecoder = fn(&mut ByteReader<'_>) -> Result<Operation>;

/// Dispatch-table entry.
#[derive(Clone, Copy)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub selector: u8,
    pub decode_args: ArgDecoder,
}

impl std::fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Every callable operation.
pub static OPERATIONS: [OperationDescriptor; 2] = [
    OperationDescriptor {
        name: PLACE_ORDER,
        selector: 0,
        decode_args: decode_place_order,
    },
    OperationDescriptor {
        name: MATCH_ORDERS,
        selector: 1,
        decode_args: decode_match_orders,
    },
];

pub fn operation_by_selector(selector: u8) -> Result<&'static OperationDescriptor> {
    OPERATIONS
        .iter()
        .find(|d| d.selector == selector)
        .ok_or_else(|| SlotbookError::UnknownOperation(format!("selector {selector}")))
}

pub fn operation_by_name(name: &str) -> Result<&'static OperationDescriptor> {
    OPERATIONS
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| SlotbookError::UnknownOperation(name.to_string()))
}

fn read_index(reader: &mut ByteReader<'_>) -> Result<usize> {
    let raw = reader.u32_le()?;
    usize::try_from(raw).map_err(|_| SlotbookError::Decode(format!("index {raw}")))
}

fn decode_place_order(reader: &mut ByteReader<'_>) -> Result<Operation> {
    let order = decode_order(reader)?;
    let slot = read_index(reader)?;
    Ok(Operation::PlaceOrder { order, slot })
}

fn decode_match_orders(reader: &mut ByteReader<'_>) -> Result<Operation> {
    let buy = read_index(reader)?;
    let sell = read_index(reader)?;
    Ok(Operation::MatchOrders { buy, sell })
}
