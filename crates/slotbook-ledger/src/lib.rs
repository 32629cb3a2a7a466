//! # slotbook-ledger
//!
//! **Consensus verification and an in-memory UTXO ledger for SlotBook.**
//!
//! - [`ConsensusVerifier`]: recomputes a transition from the spent state and
//!   the declared call, then checks the spending transaction's outputs
//! - [`Ledger`]: unspent output set, single-spend rule, state queries and
//!   subscriptions for deployed order-book objects
//! - [`deploy`]: deployment record and script-hash artifact

pub mod deploy;
pub mod ledger;
pub mod verifier;

pub use deploy::{Deployment, script_hash, write_script_hash};
pub use ledger::{Ledger, StateSubscription, StateUpdate};
pub use verifier::ConsensusVerifier;
