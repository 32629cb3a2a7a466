//! # slotbook-types
//!
//! Shared types, errors, and configuration for the **SlotBook** order book.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Txid`], [`Outpoint`], [`ObjectId`], [`SettlementAddr`]
//! - **Order model**: [`Order`], [`OrderSide`], [`Ticker`]
//! - **State**: [`OrderBookState`], the fixed-capacity slot arena
//! - **Wire model**: [`Transaction`], [`TxInput`], [`TxOutput`], [`LockingScript`]
//! - **Client views**: [`ContractUtxo`], [`FundingUtxo`]
//! - **Configuration**: [`SlotbookConfig`], [`BuilderConfig`], [`DeployConfig`], [`LogConfig`]
//! - **Errors**: [`SlotbookError`] with `SB_ERR_` prefix codes
//! - **Codec**: fixed-width record layout and `hash256`
//! - **Constants**: slot count, record width and defaults

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod order;
pub mod state;
pub mod tx;

pub use config::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use state::*;
pub use tx::*;

// Codec helpers and constants are accessed by path
// (`slotbook_types::codec::hash256`, `slotbook_types::constants::ORDER_SLOTS`).
