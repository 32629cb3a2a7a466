//! The contract interface and the order-book implementation of it.
//!
//! ```text
//! derive(prior, call)                 -> Transition      (client + verifier)
//! validate(prior, call, hash_outputs) -> Transition      (verifier only)
//! ```
//!
//! The builder and the verifier both go through [`StatefulContract::derive`],
//! so the outputs a client builds are the outputs every verifier expects.

use slotbook_types::{OrderBookState, Result, TxOutput};

use crate::{
    call::{ContractCall, Operation},
    commitment::{check_commitment, required_outputs},
    validator::{Payment, match_orders, place_order},
};

/// A runtime-agnostic stateful contract.
pub trait StatefulContract {
    type State;
    type Call;
    type Transition;

    /// State written by the deployment.
    fn initial_state(&self) -> Self::State;

    /// Recompute the transition a call implies, without a commitment check.
    fn derive(&self, prior: &Self::State, call: &Self::Call) -> Result<Self::Transition>;

    /// [`Self::derive`] plus the output commitment check against the
    /// spending transaction's `hash_outputs`.
    fn validate(
        &self,
        prior: &Self::State,
        call: &Self::Call,
        hash_outputs: &[u8; 32],
    ) -> Result<Self::Transition>;
}

/// Everything a verified transition implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub operation: Operation,
    pub next_state: OrderBookState,
    pub next_balance: u64,
    /// `Some` for matches.
    pub matched_qty: Option<u64>,
    pub payments: Vec<Payment>,
    /// Outputs the spending transaction must carry, in order.
    pub required_outputs: Vec<TxOutput>,
}

/// The order-book contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionValidator;

impl TransitionValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StatefulContract for TransitionValidator {
    type State = OrderBookState;
    type Call = ContractCall;
    type Transition = Transition;

    fn initial_state(&self) -> OrderBookState {
        OrderBookState::new()
    }

    fn derive(&self, prior: &OrderBookState, call: &ContractCall) -> Result<Transition> {
        let (next_state, matched_qty, payments) = match call.operation {
            Operation::PlaceOrder { order, slot } => {
                (place_order(prior, &order, slot)?, None, Vec::new())
            }
            Operation::MatchOrders { buy, sell } => {
                let outcome = match_orders(prior, buy, sell)?;
                let payments = outcome.payments().to_vec();
                (outcome.next_state, Some(outcome.matched_qty), payments)
            }
        };

        let required_outputs = required_outputs(
            &next_state,
            call.next_balance,
            &payments,
            call.change.as_ref(),
        );

        Ok(Transition {
            operation: call.operation,
            next_state,
            next_balance: call.next_balance,
            matched_qty,
            payments,
            required_outputs,
        })
    }

    fn validate(
        &self,
        prior: &OrderBookState,
        call: &ContractCall,
        hash_outputs: &[u8; 32],
    ) -> Result<Transition> {
        let transition = self.derive(prior, call)?;
        let commitment = check_commitment(&transition.required_outputs, hash_outputs)?;

        tracing::debug!(
            operation = call.operation.name(),
            matched_qty = ?transition.matched_qty,
            outputs = transition.required_outputs.len(),
            commitment = hex::encode(commitment),
            "Transition validated"
        );

        Ok(transition)
    }
}
