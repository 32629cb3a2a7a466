//! # slotbook-builder
//!
//! **Client side of a SlotBook transition.**
//!
//! A client reads the latest [`slotbook_types::ContractUtxo`], turns form
//! input into an [`slotbook_types::Order`] via [`OrderRequest`], and asks the
//! [`TransactionBuilder`] for a transaction whose outputs commit to exactly
//! the transition the network will recompute.
//!
//! Errors raised here before anything is broadcast (`NoFreeSlot`,
//! `InvalidOrder`, `InsufficientFunds`) are retryable client errors.

pub mod builder;
pub mod entry;

pub use builder::{BuiltTransaction, TransactionBuilder};
pub use entry::{OrderRequest, coins_to_sats};
