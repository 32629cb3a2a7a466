//! Order types held in order-book slots.
//!
//! An [`Order`] is a plain value: it is copied into a slot when placed and
//! replaced wholesale when matched. The `closed` flag is the only reuse
//! signal: it covers both the never-used sentinel and a fully matched order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, SettlementAddr, SlotbookError, constants::TICKER_MAX_LEN};

/// Which side of the book this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Persisted flag: `true` = buy.
    #[must_use]
    pub fn as_flag(self) -> bool {
        matches!(self, Self::Buy)
    }

    #[must_use]
    pub fn from_flag(flag: bool) -> Self {
        if flag { Self::Buy } else { Self::Sell }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Instrument identifier over the alphabet `A-Z 0-9 .`, at most
/// [`TICKER_MAX_LEN`] bytes. The empty ticker marks an empty slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker {
    bytes: [u8; TICKER_MAX_LEN],
    len: u8,
}

impl Ticker {
    /// The empty ticker.
    pub const EMPTY: Self = Self {
        bytes: [0u8; TICKER_MAX_LEN],
        len: 0,
    };

    pub fn new(symbol: &str) -> Result<Self> {
        Self::from_bytes(symbol.as_bytes())
    }

    /// Build from raw bytes, enforcing length and alphabet.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() > TICKER_MAX_LEN {
            return Err(SlotbookError::InvalidTicker {
                reason: format!("{} bytes exceeds {TICKER_MAX_LEN}", raw.len()),
            });
        }
        if let Some(bad) = raw
            .iter()
            .find(|b| !(b.is_ascii_uppercase() || b.is_ascii_digit() || **b == b'.'))
        {
            return Err(SlotbookError::InvalidTicker {
                reason: format!("byte 0x{bad:02x} outside A-Z 0-9 ."),
            });
        }
        let mut bytes = [0u8; TICKER_MAX_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        #[allow(clippy::cast_possible_truncation)]
        let len = raw.len() as u8;
        Ok(Self { bytes, len })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII.
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticker({:?})", self.as_str())
    }
}

impl FromStr for Ticker {
    type Err = SlotbookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = SlotbookError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// One order-book slot's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub ticker: Ticker,
    /// Remaining unmatched lot size.
    pub quantity: u64,
    /// Limit price in satoshis.
    pub price: u64,
    pub side: OrderSide,
    pub settlement_addr: SettlementAddr,
    /// `true` when the slot holds no live order.
    pub closed: bool,
}

impl Order {
    /// The sentinel every slot holds at deployment.
    pub const EMPTY: Self = Self {
        ticker: Ticker::EMPTY,
        quantity: 0,
        price: 0,
        side: OrderSide::Buy,
        settlement_addr: SettlementAddr::ZERO,
        closed: true,
    };

    /// A fresh open order.
    #[must_use]
    pub fn open(
        ticker: Ticker,
        quantity: u64,
        price: u64,
        side: OrderSide,
        settlement_addr: SettlementAddr,
    ) -> Self {
        Self {
            ticker,
            quantity,
            price,
            side,
            settlement_addr,
            closed: false,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    #[must_use]
    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(ticker: &str, side: OrderSide, quantity: u64, price: u64) -> Self {
        let addr_byte = if side == OrderSide::Buy { 0xB0 } else { 0x5E };
        Self::open(
            Ticker::new(ticker).expect("valid test ticker"),
            quantity,
            price,
            side,
            SettlementAddr([addr_byte; crate::constants::ADDR_LEN]),
        )
    }

    pub fn dummy_for(
        ticker: &str,
        side: OrderSide,
        quantity: u64,
        price: u64,
        settlement_addr: SettlementAddr,
    ) -> Self {
        Self::open(
            Ticker::new(ticker).expect("valid test ticker"),
            quantity,
            price,
            side,
            settlement_addr,
        )
    }
}
