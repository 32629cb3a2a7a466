//! In-memory UTXO ledger.
//!
//! Stands in for the network: it holds the unspent output set, confirms
//! transactions one at a time, and tracks the single live output of every
//! deployed order-book object.
//!
//! Concurrency control is the UTXO rule itself: every outpoint is spendable
//! once. Two transitions built against the same state both spend the same
//! contract output; whichever is submitted first is confirmed, the other is
//! rejected with [`SlotbookError::InputAlreadySpent`] and changes nothing.
//!
//! Accepted transitions are published on a `tokio::sync::broadcast`
//! channel. A lagging subscriber skips ahead rather than blocking
//! submission.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use slotbook_contract::{StatefulContract, TransitionValidator};
use slotbook_types::{
    ContractUtxo, FundingUtxo, ObjectId, Outpoint, Result, SettlementAddr, SlotbookError,
    Transaction, TxOutput, Txid,
    constants::{SUBSCRIPTION_CAPACITY, TX_VERSION},
};
use tokio::sync::broadcast;

use crate::{
    deploy::{Deployment, script_hash},
    verifier::ConsensusVerifier,
};

/// A confirmed transition of one order-book object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub object_id: ObjectId,
    pub txid: Txid,
    pub utxo: ContractUtxo,
}

/// Single-owner UTXO ledger.
pub struct Ledger {
    /// Unspent outputs.
    utxos: HashMap<Outpoint, TxOutput>,
    /// Outpoints consumed by a confirmed transaction.
    spent: HashSet<Outpoint>,
    confirmed: HashSet<Txid>,
    /// Object id -> live contract outpoint.
    heads: HashMap<ObjectId, Outpoint>,
    /// Live contract outpoint -> object id.
    objects: HashMap<Outpoint, ObjectId>,
    verifier: ConsensusVerifier,
    updates: broadcast::Sender<StateUpdate>,
    /// Distinguishes otherwise identical genesis transactions.
    mint_nonce: u32,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(SUBSCRIPTION_CAPACITY);
        Self {
            utxos: HashMap::new(),
            spent: HashSet::new(),
            confirmed: HashSet::new(),
            heads: HashMap::new(),
            objects: HashMap::new(),
            verifier: ConsensusVerifier::new(),
            updates,
            mint_nonce: 0,
        }
    }

    // -----------------------------------------------------------------
    // Genesis
    // -----------------------------------------------------------------

    /// Publish a fresh, empty order book holding `initial_balance` satoshis.
    pub fn deploy(&mut self, initial_balance: u64) -> Deployment {
        let state = TransitionValidator::new().initial_state();
        let output = TxOutput::contract(&state, initial_balance);
        let hash = script_hash(&output.locking_script);
        let txid = self.mint(output);
        let object_id = Outpoint::new(txid, 0);
        self.heads.insert(object_id, object_id);
        self.objects.insert(object_id, object_id);

        tracing::info!(
            object_id = %object_id,
            balance = initial_balance,
            script_hash = %hash,
            "Order book deployed"
        );

        Deployment {
            object_id,
            txid,
            script_hash: hash,
        }
    }

    /// Mint a plain output paying `amount` to `addr`.
    pub fn fund(&mut self, addr: &SettlementAddr, amount: u64) -> FundingUtxo {
        let txid = self.mint(TxOutput::pay_to_addr(addr, amount));
        tracing::debug!(addr = %addr, amount, "Funding output minted");
        FundingUtxo {
            outpoint: Outpoint::new(txid, 0),
            value: amount,
        }
    }

    fn mint(&mut self, output: TxOutput) -> Txid {
        let tx = Transaction {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs: vec![output],
            lock_time: self.mint_nonce,
        };
        self.mint_nonce = self.mint_nonce.wrapping_add(1);
        let txid = tx.txid();
        self.apply(txid, &tx);
        txid
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The live instance of `object_id`.
    pub fn get_latest_state(&self, object_id: &ObjectId) -> Result<ContractUtxo> {
        let outpoint = self
            .heads
            .get(object_id)
            .copied()
            .ok_or(SlotbookError::StateNotFound(*object_id))?;
        self.contract_utxo(outpoint)
    }

    /// Unspent plain outputs paying `addr`, in outpoint order.
    #[must_use]
    pub fn funding_utxos(&self, addr: &SettlementAddr) -> Vec<FundingUtxo> {
        let mut found: Vec<FundingUtxo> = self
            .utxos
            .iter()
            .filter(|(_, out)| out.locking_script.pay_to_addr_target() == Some(*addr))
            .map(|(outpoint, out)| FundingUtxo {
                outpoint: *outpoint,
                value: out.value,
            })
            .collect();
        found.sort_by_key(|f| f.outpoint);
        found
    }

    /// Total value of unspent outputs paying `addr`.
    #[must_use]
    pub fn balance_of(&self, addr: &SettlementAddr) -> u64 {
        self.funding_utxos(addr).iter().map(|f| f.value).sum()
    }

    #[must_use]
    pub fn is_confirmed(&self, txid: &Txid) -> bool {
        self.confirmed.contains(txid)
    }

    /// Receive every confirmed transition of `object_id` from now on.
    #[must_use]
    pub fn subscribe(&self, object_id: ObjectId) -> StateSubscription {
        StateSubscription {
            object_id,
            rx: self.updates.subscribe(),
        }
    }

    fn contract_utxo(&self, outpoint: Outpoint) -> Result<ContractUtxo> {
        let output = self
            .utxos
            .get(&outpoint)
            .ok_or(SlotbookError::StateNotFound(outpoint))?;
        Ok(ContractUtxo {
            outpoint,
            balance: output.value,
            state: output.locking_script.contract_state()?,
        })
    }

    // -----------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------

    /// Confirm `tx` or reject it with no effect.
    ///
    /// # Errors
    /// [`SlotbookError::TransactionRejected`] wrapping the first failed check.
    pub fn submit(&mut self, tx: &Transaction) -> Result<Txid> {
        let txid = tx.txid();
        let transition = match self.check(txid, tx) {
            Ok(t) => t,
            Err(reason) => {
                tracing::warn!(txid = %txid.short(), reason = %reason, "Transaction rejected");
                return Err(SlotbookError::TransactionRejected {
                    txid,
                    reason: Box::new(reason),
                });
            }
        };

        self.apply(txid, tx);

        if let Some(object_id) = transition {
            let successor = Outpoint::new(txid, 0);
            self.heads.insert(object_id, successor);
            self.objects.insert(successor, object_id);
            let utxo = self.contract_utxo(successor)?;

            tracing::info!(
                object_id = %object_id,
                txid = %txid.short(),
                open_orders = utxo.state.open_count(),
                "State transition confirmed"
            );
            // no receivers is fine
            let _ = self.updates.send(StateUpdate {
                object_id,
                txid,
                utxo,
            });
        } else {
            tracing::debug!(txid = %txid.short(), "Transaction confirmed");
        }

        Ok(txid)
    }

    /// All checks, no mutation. Returns the object advanced by `tx`, if any.
    fn check(&self, txid: Txid, tx: &Transaction) -> Result<Option<ObjectId>> {
        if self.confirmed.contains(&txid) {
            return Err(SlotbookError::DuplicateTransaction(txid));
        }

        let mut seen = HashSet::with_capacity(tx.inputs.len());
        let mut input_value = 0u64;
        for input in &tx.inputs {
            let outpoint = input.prev_out;
            if !seen.insert(outpoint) || self.spent.contains(&outpoint) {
                return Err(SlotbookError::InputAlreadySpent(outpoint));
            }
            let output = self
                .utxos
                .get(&outpoint)
                .ok_or(SlotbookError::UnknownInput(outpoint))?;
            input_value = input_value.saturating_add(output.value);
        }

        let output_value = tx.output_value().unwrap_or(u64::MAX);
        if output_value > input_value {
            return Err(SlotbookError::InsufficientInputValue {
                inputs: input_value,
                outputs: output_value,
            });
        }

        // a contract output may only be spent as input 0
        if let Some(misplaced) = tx
            .inputs
            .iter()
            .skip(1)
            .find(|input| self.objects.contains_key(&input.prev_out))
        {
            return Err(SlotbookError::MissingContractInput(misplaced.prev_out));
        }

        let Some(first) = tx.inputs.first() else {
            return Ok(None);
        };
        let Some(object_id) = self.objects.get(&first.prev_out).copied() else {
            return Ok(None);
        };

        let spent = self.contract_utxo(first.prev_out)?;
        self.verifier.check(&spent, tx)?;
        Ok(Some(object_id))
    }

    /// Move `tx` into the UTXO set. Callers have already checked it.
    fn apply(&mut self, txid: Txid, tx: &Transaction) {
        for input in &tx.inputs {
            self.utxos.remove(&input.prev_out);
            self.spent.insert(input.prev_out);
            if let Some(object_id) = self.objects.remove(&input.prev_out) {
                self.heads.remove(&object_id);
            }
        }
        for (vout, output) in (0u32..).zip(&tx.outputs) {
            self.utxos.insert(Outpoint::new(txid, vout), output.clone());
        }
        self.confirmed.insert(txid);
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("utxos", &self.utxos.len())
            .field("confirmed", &self.confirmed.len())
            .field("objects", &self.heads.len())
            .finish_non_exhaustive()
    }
}

/// Confirmed transitions of one object, in confirmation order.
#[derive(Debug)]
pub struct StateSubscription {
    object_id: ObjectId,
    rx: broadcast::Receiver<StateUpdate>,
}

impl StateSubscription {
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Wait for the next update. `None` once the ledger is dropped.
    pub async fn next(&mut self) -> Option<StateUpdate> {
        loop {
            match self.rx.recv().await {
                Ok(update) if update.object_id == self.object_id => return Some(update),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(object_id = %self.object_id, skipped, "Subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-delivered update, without waiting.
    pub fn try_next(&mut self) -> Option<StateUpdate> {
        loop {
            match self.rx.try_recv() {
                Ok(update) if update.object_id == self.object_id => return Some(update),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(object_id = %self.object_id, skipped, "Subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use slotbook_types::{OrderBookState, TxInput, constants::ADDR_LEN};

    use super::*;

    const ALICE: SettlementAddr = SettlementAddr([0xA1; ADDR_LEN]);
    const BOB: SettlementAddr = SettlementAddr([0xB0; ADDR_LEN]);

    fn spend(from: FundingUtxo, to: &SettlementAddr, value: u64) -> Transaction {
        Transaction {
            version: TX_VERSION,
            inputs: vec![TxInput {
                prev_out: from.outpoint,
                unlocking_data: Vec::new(),
                sequence: u32::MAX,
            }],
            outputs: vec![TxOutput::pay_to_addr(to, value)],
            lock_time: 0,
        }
    }

    #[test]
    fn deploy_publishes_empty_book() {
        let mut ledger = Ledger::new();
        let d = ledger.deploy(1);
        let utxo = ledger.get_latest_state(&d.object_id).unwrap();
        assert_eq!(utxo.state, OrderBookState::new());
        assert_eq!(utxo.balance, 1);
        assert_eq!(utxo.outpoint, d.object_id);
        assert!(ledger.is_confirmed(&d.txid));
        assert_eq!(d.script_hash.len(), 64);
    }

    #[test]
    fn deployments_are_distinct() {
        let mut ledger = Ledger::new();
        let a = ledger.deploy(1);
        let b = ledger.deploy(1);
        assert_ne!(a.object_id, b.object_id);
        assert_eq!(a.script_hash, b.script_hash);
    }

    #[test]
    fn unknown_object() {
        let ledger = Ledger::new();
        let id = Outpoint::new(Txid([3; 32]), 0);
        assert_eq!(
            ledger.get_latest_state(&id).unwrap_err(),
            SlotbookError::StateNotFound(id)
        );
    }

    #[test]
    fn plain_spend_and_double_spend() {
        let mut ledger = Ledger::new();
        let coin = ledger.fund(&ALICE, 1_000);
        assert_eq!(ledger.balance_of(&ALICE), 1_000);

        let tx = spend(coin, &BOB, 900);
        ledger.submit(&tx).unwrap();
        assert_eq!(ledger.balance_of(&ALICE), 0);
        assert_eq!(ledger.balance_of(&BOB), 900);

        let err = ledger.submit(&tx).unwrap_err();
        assert_eq!(
            err.root_cause(),
            &SlotbookError::DuplicateTransaction(tx.txid())
        );

        let err = ledger.submit(&spend(coin, &BOB, 800)).unwrap_err();
        assert_eq!(
            err.root_cause(),
            &SlotbookError::InputAlreadySpent(coin.outpoint)
        );
    }

    #[test]
    fn rejects_unknown_and_overspending_inputs() {
        let mut ledger = Ledger::new();
        let coin = ledger.fund(&ALICE, 100);

        let err = ledger.submit(&spend(coin, &BOB, 101)).unwrap_err();
        assert_eq!(
            err.root_cause(),
            &SlotbookError::InsufficientInputValue {
                inputs: 100,
                outputs: 101
            }
        );

        let ghost = FundingUtxo {
            outpoint: Outpoint::new(Txid([0x66; 32]), 0),
            value: 5,
        };
        let err = ledger.submit(&spend(ghost, &BOB, 1)).unwrap_err();
        assert_eq!(
            err.root_cause(),
            &SlotbookError::UnknownInput(ghost.outpoint)
        );
        // nothing moved
        assert_eq!(ledger.balance_of(&ALICE), 100);
    }

    #[test]
    fn same_input_twice_in_one_tx() {
        let mut ledger = Ledger::new();
        let coin = ledger.fund(&ALICE, 100);
        let mut tx = spend(coin, &BOB, 150);
        tx.inputs.push(tx.inputs[0].clone());
        let err = ledger.submit(&tx).unwrap_err();
        assert_eq!(
            err.root_cause(),
            &SlotbookError::InputAlreadySpent(coin.outpoint)
        );
    }

    #[test]
    fn contract_output_only_spendable_as_first_input() {
        let mut ledger = Ledger::new();
        let d = ledger.deploy(1);
        let coin = ledger.fund(&ALICE, 100);
        let mut tx = spend(coin, &BOB, 50);
        tx.inputs.push(TxInput {
            prev_out: d.object_id,
            unlocking_data: Vec::new(),
            sequence: u32::MAX,
        });
        let err = ledger.submit(&tx).unwrap_err();
        assert_eq!(
            err.root_cause(),
            &SlotbookError::MissingContractInput(d.object_id)
        );
        assert!(ledger.get_latest_state(&d.object_id).is_ok());
    }
}
