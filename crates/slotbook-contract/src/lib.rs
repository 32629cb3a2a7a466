//! # slotbook-contract
//!
//! **Pure deterministic transition validator for the SlotBook order book.**
//!
//! This crate is what every network participant runs. It has:
//!
//! - **Zero side effects**: prior state in, next state and required outputs out
//! - **Deterministic output**: same prior state and call -> same bytes everywhere
//! - **Commitment enforcement**: a transition is valid only if the spending
//!   transaction's outputs hash to exactly what the validator rebuilt
//! - **Explicit schema**: persisted field list plus an operation dispatch table

pub mod call;
pub mod commitment;
pub mod contract;
pub mod schema;
pub mod validator;

pub use call::{ChangeOutput, ContractCall, Operation};
pub use commitment::{check_commitment, required_outputs};
pub use contract::{StatefulContract, Transition, TransitionValidator};
pub use schema::{OPERATIONS, ORDER_FIELDS};
pub use validator::{MatchOutcome, Payment, match_orders, place_order};
