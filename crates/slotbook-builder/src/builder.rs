//! Transaction builder.
//!
//! Assembles the spending transaction for one transition:
//!
//! 1. Run the same derivation the verifier runs (fails early on any
//!    precondition, exactly as the network would)
//! 2. Select funding inputs to cover the settlement payments and fee
//! 3. Declare the change output, if any, inside the call
//! 4. Emit input 0 (contract, carrying the encoded call), funding inputs,
//!    and the required outputs verbatim
//!
//! The outputs are taken straight from [`Transition::required_outputs`],
//! so they are bit-identical to what every verifier recomputes.

use slotbook_contract::{
    ChangeOutput, ContractCall, Operation, StatefulContract, Transition, TransitionValidator,
};
use slotbook_types::{
    BuilderConfig, ContractUtxo, FundingUtxo, Order, Outpoint, Result, SlotbookError, Transaction,
    TxInput,
    constants::{DEFAULT_INPUT_SEQUENCE, TX_VERSION},
};

/// A transaction ready to broadcast, plus what it will produce.
#[derive(Debug, Clone)]
pub struct BuiltTransaction {
    pub tx: Transaction,
    /// Index of the input spending the contract output.
    pub at_input_index: usize,
    pub transition: Transition,
    /// The contract instance at output 0 once confirmed.
    pub next: ContractUtxo,
}

/// Client-side builder for order-book transitions.
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    config: BuilderConfig,
    contract: TransitionValidator,
}

impl TransactionBuilder {
    #[must_use]
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            contract: TransitionValidator::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// `placeOrder(order, slot)` against `current`.
    pub fn place_order(
        &self,
        current: &ContractUtxo,
        order: Order,
        slot: usize,
        funding: &[FundingUtxo],
    ) -> Result<BuiltTransaction> {
        self.build(current, Operation::PlaceOrder { order, slot }, funding)
    }

    /// `placeOrder` into the lowest free slot.
    ///
    /// # Errors
    /// [`SlotbookError::NoFreeSlot`] when every slot is open; nothing is built.
    pub fn place_in_free_slot(
        &self,
        current: &ContractUtxo,
        order: Order,
        funding: &[FundingUtxo],
    ) -> Result<BuiltTransaction> {
        let slot = current
            .state
            .first_free_slot()
            .ok_or(SlotbookError::NoFreeSlot)?;
        self.place_order(current, order, slot, funding)
    }

    /// `matchOrders(buy, sell)` against `current`.
    pub fn match_orders(
        &self,
        current: &ContractUtxo,
        buy: usize,
        sell: usize,
        funding: &[FundingUtxo],
    ) -> Result<BuiltTransaction> {
        self.build(current, Operation::MatchOrders { buy, sell }, funding)
    }

    fn build(
        &self,
        current: &ContractUtxo,
        operation: Operation,
        funding: &[FundingUtxo],
    ) -> Result<BuiltTransaction> {
        // 1. Derive once without change to learn the payments
        let bare = ContractCall::new(operation, current.balance);
        let preview = self.contract.derive(&current.state, &bare)?;

        // 2. Fund payments + fee
        let payments = preview
            .payments
            .iter()
            .try_fold(0u64, |acc, p| acc.checked_add(p.amount));
        let needed = payments
            .and_then(|p| p.checked_add(self.config.fee))
            .ok_or(SlotbookError::InsufficientFunds {
                needed: u64::MAX,
                available: 0,
            })?;
        let (selected, available) = select_funding(funding, needed)?;

        // 3. Declare change
        let leftover = available - needed;
        let change = self
            .config
            .change_address
            .filter(|_| leftover > 0)
            .map(|addr| ChangeOutput {
                addr,
                amount: leftover,
            });
        let call = bare.with_change(change);
        let transition = if change.is_some() {
            self.contract.derive(&current.state, &call)?
        } else {
            preview
        };

        // 4. Assemble
        let mut inputs = Vec::with_capacity(1 + selected.len());
        inputs.push(TxInput {
            prev_out: current.outpoint,
            unlocking_data: call.encode()?,
            sequence: DEFAULT_INPUT_SEQUENCE,
        });
        inputs.extend(selected.iter().map(|f| TxInput {
            prev_out: f.outpoint,
            unlocking_data: Vec::new(),
            sequence: DEFAULT_INPUT_SEQUENCE,
        }));

        let tx = Transaction {
            version: TX_VERSION,
            inputs,
            outputs: transition.required_outputs.clone(),
            lock_time: 0,
        };
        let txid = tx.txid();
        let next = ContractUtxo {
            outpoint: Outpoint::new(txid, 0),
            balance: transition.next_balance,
            state: transition.next_state.clone(),
        };

        tracing::debug!(
            operation = operation.name(),
            txid = %txid.short(),
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            change = leftover,
            "Transaction built"
        );

        Ok(BuiltTransaction {
            tx,
            at_input_index: 0,
            transition,
            next,
        })
    }
}

/// Take funding outputs in order until `needed` is covered.
fn select_funding(funding: &[FundingUtxo], needed: u64) -> Result<(Vec<FundingUtxo>, u64)> {
    let mut selected = Vec::new();
    let mut total = 0u64;
    for utxo in funding {
        if total >= needed {
            break;
        }
        total = total.saturating_add(utxo.value);
        selected.push(*utxo);
    }
    if total < needed {
        return Err(SlotbookError::InsufficientFunds {
            needed,
            available: total,
        });
    }
    Ok((selected, total))
}

#[cfg(test)]
mod tests {
    use slotbook_contract::ContractCall;
    use slotbook_types::{
        OrderBookState, OrderSide, SettlementAddr, Txid, constants::{ADDR_LEN, ORDER_SLOTS},
        hash_outputs,
    };

    use super::*;

    const CHANGE: SettlementAddr = SettlementAddr([0xCC; ADDR_LEN]);

    fn builder(fee: u64, change: bool) -> TransactionBuilder {
        TransactionBuilder::new(BuilderConfig {
            change_address: change.then_some(CHANGE),
            fee,
        })
    }

    fn utxo(state: OrderBookState) -> ContractUtxo {
        ContractUtxo {
            outpoint: Outpoint::new(Txid([1; 32]), 0),
            balance: 1,
            state,
        }
    }

    fn funding(values: &[u64]) -> Vec<FundingUtxo> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| FundingUtxo {
                outpoint: Outpoint::new(Txid([0xF0; 32]), u32::try_from(i).unwrap()),
                value: *v,
            })
            .collect()
    }

    fn crossed() -> OrderBookState {
        OrderBookState::new()
            .with_slot(0, Order::dummy("AAPL", OrderSide::Buy, 10, 100))
            .unwrap()
            .with_slot(1, Order::dummy("AAPL", OrderSide::Sell, 4, 90))
            .unwrap()
    }

    #[test]
    fn place_order_layout() {
        let order = Order::dummy("AAPL", OrderSide::Buy, 10, 100);
        let built = builder(0, false)
            .place_order(&utxo(OrderBookState::new()), order, 0, &[])
            .unwrap();

        assert_eq!(built.at_input_index, 0);
        assert_eq!(built.tx.inputs.len(), 1);
        assert_eq!(built.tx.inputs[0].prev_out, Outpoint::new(Txid([1; 32]), 0));
        assert_eq!(built.tx.outputs.len(), 1);
        assert_eq!(built.tx.outputs[0].value, 1);
        assert_eq!(built.next.state.slot(0).unwrap(), &order);
        assert_eq!(built.next.outpoint, Outpoint::new(built.tx.txid(), 0));
    }

    #[test]
    fn call_is_carried_in_contract_input() {
        let built = builder(0, false)
            .match_orders(&utxo(crossed()), 0, 1, &funding(&[1_000]))
            .unwrap();
        let call = ContractCall::decode(&built.tx.inputs[0].unlocking_data).unwrap();
        assert_eq!(call.operation, Operation::MatchOrders { buy: 0, sell: 1 });
        assert_eq!(call.next_balance, 1);
        assert!(call.change.is_none());
        assert!(built.tx.inputs[1].unlocking_data.is_empty());
    }

    #[test]
    fn match_outputs_in_commitment_order() {
        let built = builder(100, true)
            .match_orders(&utxo(crossed()), 0, 1, &funding(&[500, 500, 500]))
            .unwrap();
        let outs = &built.tx.outputs;
        assert_eq!(outs.len(), 4);
        assert_eq!(outs[1].value, 360);
        assert_eq!(outs[2].value, 400);
        // 1000 selected, 760 paid, 100 fee
        assert_eq!(outs[3].value, 140);
        assert_eq!(outs[3].locking_script.pay_to_addr_target(), Some(CHANGE));
        assert_eq!(built.tx.inputs.len(), 3);
        assert_eq!(
            hash_outputs(outs),
            hash_outputs(&built.transition.required_outputs)
        );
    }

    #[test]
    fn no_change_output_when_nothing_left() {
        let built = builder(0, true)
            .match_orders(&utxo(crossed()), 0, 1, &funding(&[760]))
            .unwrap();
        assert_eq!(built.tx.outputs.len(), 3);
    }

    #[test]
    fn insufficient_funds() {
        let err = builder(0, false)
            .match_orders(&utxo(crossed()), 0, 1, &funding(&[700]))
            .unwrap_err();
        assert_eq!(
            err,
            SlotbookError::InsufficientFunds {
                needed: 760,
                available: 700
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn preconditions_fail_before_building() {
        let err = builder(0, false)
            .match_orders(&utxo(crossed()), 1, 0, &funding(&[10_000]))
            .unwrap_err();
        assert!(matches!(err, SlotbookError::OrderTypeMismatch { .. }));

        let err = builder(0, false)
            .place_order(
                &utxo(crossed()),
                Order::dummy("AAPL", OrderSide::Buy, 1, 1),
                0,
                &[],
            )
            .unwrap_err();
        assert_eq!(err, SlotbookError::SlotOccupied { slot: 0 });
    }

    #[test]
    fn free_slot_selection() {
        let built = builder(0, false)
            .place_in_free_slot(
                &utxo(crossed()),
                Order::dummy("MSFT", OrderSide::Sell, 1, 1),
                &[],
            )
            .unwrap();
        assert_eq!(built.next.state.slot(2).unwrap().ticker.as_str(), "MSFT");
    }

    #[test]
    fn full_book_reports_no_free_slot() {
        let full = OrderBookState::try_from(vec![
            Order::dummy("AAPL", OrderSide::Buy, 1, 1);
            ORDER_SLOTS
        ])
        .unwrap();
        let err = builder(0, false)
            .place_in_free_slot(&utxo(full), Order::dummy("AAPL", OrderSide::Buy, 1, 1), &[])
            .unwrap_err();
        assert_eq!(err, SlotbookError::NoFreeSlot);
        assert!(err.is_retryable());
    }

    #[test]
    fn fee_requires_funding() {
        let err = builder(500, false)
            .place_order(
                &utxo(OrderBookState::new()),
                Order::dummy("AAPL", OrderSide::Buy, 1, 1),
                0,
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, SlotbookError::InsufficientFunds { .. }));
    }

    #[test]
    fn build_is_deterministic() {
        let b = builder(10, true);
        let f = funding(&[2_000]);
        let one = b.match_orders(&utxo(crossed()), 0, 1, &f).unwrap();
        let two = b.match_orders(&utxo(crossed()), 0, 1, &f).unwrap();
        assert_eq!(one.tx.serialize(), two.tx.serialize());
    }
}
