//! Consensus verifier.
//!
//! Runs at every network node when a transaction spends a contract output.
//! It trusts nothing from the transaction except the declared call: the next
//! state and every required output are recomputed from the spent state, then
//! compared against the transaction's real outputs through `hash_outputs`.
//!
//! Checks, in order:
//! 1. Input 0 spends the contract output
//! 2. The unlocking data decodes to a known operation
//! 3. The transition validator accepts (preconditions, postconditions,
//!    output commitment)
//! 4. Output 0 carries the recomputed state at the declared balance

use slotbook_contract::{ContractCall, StatefulContract, Transition, TransitionValidator};
use slotbook_types::{ContractUtxo, OrderBookState, Result, SlotbookError, Transaction};

/// Verifies transitions of one contract type.
#[derive(Debug, Clone, Default)]
pub struct ConsensusVerifier<C = TransitionValidator> {
    contract: C,
}

impl ConsensusVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::with_contract(TransitionValidator::new())
    }
}

impl<C> ConsensusVerifier<C>
where
    C: StatefulContract<State = OrderBookState, Call = ContractCall, Transition = Transition>,
{
    #[must_use]
    pub fn with_contract(contract: C) -> Self {
        Self { contract }
    }

    /// Verify `tx` as the spender of `spent`.
    ///
    /// # Errors
    /// [`SlotbookError::TransactionRejected`] carrying the first failed check.
    pub fn verify(&self, spent: &ContractUtxo, tx: &Transaction) -> Result<Transition> {
        self.check(spent, tx).map_err(|reason| {
            let txid = tx.txid();
            tracing::warn!(
                txid = %txid.short(),
                contract = %spent.outpoint,
                reason = %reason,
                "Transition rejected"
            );
            SlotbookError::TransactionRejected {
                txid,
                reason: Box::new(reason),
            }
        })
    }

    /// [`Self::verify`] without the rejection wrapper.
    pub fn check(&self, spent: &ContractUtxo, tx: &Transaction) -> Result<Transition> {
        let input = tx
            .inputs
            .first()
            .filter(|input| input.prev_out == spent.outpoint)
            .ok_or(SlotbookError::MissingContractInput(spent.outpoint))?;

        let call = ContractCall::decode(&input.unlocking_data)?;
        let transition = self
            .contract
            .validate(&spent.state, &call, &tx.hash_outputs())?;

        let successor = tx
            .outputs
            .first()
            .ok_or_else(|| postcondition("transaction has no outputs"))?;
        if successor.value != transition.next_balance {
            return Err(postcondition("output 0 balance differs from declared balance"));
        }
        if successor.locking_script.contract_state()? != transition.next_state {
            return Err(postcondition("output 0 state differs from recomputed state"));
        }

        Ok(transition)
    }
}

fn postcondition(reason: &str) -> SlotbookError {
    SlotbookError::PostconditionFailed {
        reason: reason.to_string(),
    }
}
