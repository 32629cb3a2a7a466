//! Identifiers used throughout SlotBook.
//!
//! Everything here is content-derived: transaction ids are hashes of the
//! serialized transaction, an order-book object is named by the outpoint
//! that first created it, and settlement addresses are opaque public key
//! hashes handed over by the wallet.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{SlotbookError, constants::ADDR_LEN};

// ---------------------------------------------------------------------------
// Txid
// ---------------------------------------------------------------------------

/// Transaction identifier: `hash256` of the serialized transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Txid(pub [u8; 32]);

impl Txid {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Outpoint
// ---------------------------------------------------------------------------

/// Reference to one output of a confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Outpoint {
    pub txid: Txid,
    pub vout: u32,
}

impl Outpoint {
    #[must_use]
    pub fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Stable identity of one order-book object: the outpoint of its
/// deployment output. Later instances live at other outpoints.
pub type ObjectId = Outpoint;

// ---------------------------------------------------------------------------
// SettlementAddr
// ---------------------------------------------------------------------------

/// Where matched proceeds are paid: a 20-byte public key hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct SettlementAddr(pub [u8; ADDR_LEN]);

impl SettlementAddr {
    /// The all-zero address held by empty slots.
    pub const ZERO: Self = Self([0u8; ADDR_LEN]);

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ADDR_LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for SettlementAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for SettlementAddr {
    type Err = SlotbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| SlotbookError::Decode(format!("settlement address: {e}")))?;
        let arr: [u8; ADDR_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            SlotbookError::Decode(format!(
                "settlement address: expected {ADDR_LEN} bytes, got {}",
                b.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
