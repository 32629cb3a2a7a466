//! Transaction wire model.
//!
//! The byte layout here is the contract between the builder and every
//! verifier: `hash_outputs` is computed over [`TxOutput::serialize`] and a
//! single differing byte makes the commitment check fail.
//!
//! ```text
//! tx     = version:u32 | varint(#in) | input* | varint(#out) | output* | lock_time:u32
//! input  = txid:32 | vout:u32 | varint(len) | unlocking | sequence:u32
//! output = value:u64 | varint(len) | locking_script
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    OrderBookState, Outpoint, Result, SettlementAddr, SlotbookError, Txid,
    codec::{ByteReader, hash256, write_varint},
    constants::{ADDR_LEN, CONTRACT_SCRIPT_TAG},
};

const P2PKH_PREFIX: [u8; 3] = [0x76, 0xA9, 0x14];
const P2PKH_SUFFIX: [u8; 2] = [0x88, 0xAC];

// ---------------------------------------------------------------------------
// LockingScript
// ---------------------------------------------------------------------------

/// Raw locking script bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockingScript(pub Vec<u8>);

impl LockingScript {
    /// `OP_DUP OP_HASH160 <addr> OP_EQUALVERIFY OP_CHECKSIG`.
    #[must_use]
    pub fn pay_to_addr(addr: &SettlementAddr) -> Self {
        let mut script = Vec::with_capacity(P2PKH_PREFIX.len() + ADDR_LEN + P2PKH_SUFFIX.len());
        script.extend_from_slice(&P2PKH_PREFIX);
        script.extend_from_slice(addr.as_bytes());
        script.extend_from_slice(&P2PKH_SUFFIX);
        Self(script)
    }

    /// Contract script embedding the full encoded state.
    #[must_use]
    pub fn contract(state: &OrderBookState) -> Self {
        let mut script = CONTRACT_SCRIPT_TAG.to_vec();
        script.extend_from_slice(&state.encode());
        Self(script)
    }

    #[must_use]
    pub fn is_contract(&self) -> bool {
        self.0.starts_with(CONTRACT_SCRIPT_TAG)
    }

    /// The paid address, if this is a pay-to-address script.
    #[must_use]
    pub fn pay_to_addr_target(&self) -> Option<SettlementAddr> {
        let body = self.0.strip_prefix(&P2PKH_PREFIX[..])?;
        let addr = body.strip_suffix(&P2PKH_SUFFIX[..])?;
        let addr: [u8; ADDR_LEN] = addr.try_into().ok()?;
        Some(SettlementAddr(addr))
    }

    /// Decode the embedded state of a contract script.
    pub fn contract_state(&self) -> Result<OrderBookState> {
        let body = self
            .0
            .strip_prefix(CONTRACT_SCRIPT_TAG)
            .ok_or_else(|| SlotbookError::Decode("not a contract script".into()))?;
        OrderBookState::decode(body)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// TxInput / TxOutput
// ---------------------------------------------------------------------------

/// One transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_out: Outpoint,
    /// For the contract input: the encoded operation call.
    pub unlocking_data: Vec<u8>,
    pub sequence: u32,
}

impl TxInput {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.prev_out.txid.as_bytes());
        out.extend_from_slice(&self.prev_out.vout.to_le_bytes());
        write_varint(out, self.unlocking_data.len() as u64);
        out.extend_from_slice(&self.unlocking_data);
        out.extend_from_slice(&self.sequence.to_le_bytes());
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let txid = Txid(reader.array()?);
        let vout = reader.u32_le()?;
        let unlocking_data = reader.var_bytes()?.to_vec();
        let sequence = reader.u32_le()?;
        Ok(Self {
            prev_out: Outpoint::new(txid, vout),
            unlocking_data,
            sequence,
        })
    }
}

/// One transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Satoshis locked by this output.
    pub value: u64,
    pub locking_script: LockingScript,
}

impl TxOutput {
    #[must_use]
    pub fn pay_to_addr(addr: &SettlementAddr, value: u64) -> Self {
        Self {
            value,
            locking_script: LockingScript::pay_to_addr(addr),
        }
    }

    #[must_use]
    pub fn contract(state: &OrderBookState, balance: u64) -> Self {
        Self {
            value: balance,
            locking_script: LockingScript::contract(state),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        write_varint(out, self.locking_script.0.len() as u64);
        out.extend_from_slice(&self.locking_script.0);
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let value = reader.u64_le()?;
        let script = reader.var_bytes()?.to_vec();
        Ok(Self {
            value,
            locking_script: LockingScript(script),
        })
    }
}

/// `hash256` over the concatenated serialized outputs.
#[must_use]
pub fn hash_outputs(outputs: &[TxOutput]) -> [u8; 32] {
    let mut buf = Vec::new();
    for output in outputs {
        output.write(&mut buf);
    }
    hash256(&buf)
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A complete transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Transaction {
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            input.write(&mut out);
        }
        write_varint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            output.write(&mut out);
        }
        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let version = reader.u32_le()?;
        let n_in = reader.varint()?;
        let mut inputs = Vec::new();
        for _ in 0..n_in {
            inputs.push(TxInput::read(&mut reader)?);
        }
        let n_out = reader.varint()?;
        let mut outputs = Vec::new();
        for _ in 0..n_out {
            outputs.push(TxOutput::read(&mut reader)?);
        }
        let lock_time = reader.u32_le()?;
        reader.finish()?;
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    #[must_use]
    pub fn txid(&self) -> Txid {
        Txid(hash256(&self.serialize()))
    }

    #[must_use]
    pub fn hash_outputs(&self) -> [u8; 32] {
        hash_outputs(&self.outputs)
    }

    /// Sum of output values, `None` on overflow.
    #[must_use]
    pub fn output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.value))
    }
}

// ---------------------------------------------------------------------------
// Unspent outputs as seen by clients
// ---------------------------------------------------------------------------

/// The live instance of an order-book object: where it sits, what it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractUtxo {
    pub outpoint: Outpoint,
    pub balance: u64,
    pub state: OrderBookState,
}

/// A plain unspent output a client can spend to fund payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingUtxo {
    pub outpoint: Outpoint,
    pub value: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Order, OrderSide};

    fn sample_tx() -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput {
                prev_out: Outpoint::new(Txid([7; 32]), 0),
                unlocking_data: vec![1, 2, 3],
                sequence: u32::MAX,
            }],
            outputs: vec![
                TxOutput::contract(&OrderBookState::new(), 1),
                TxOutput::pay_to_addr(&SettlementAddr([9; ADDR_LEN]), 360),
            ],
            lock_time: 0,
        }
    }

    #[test]
    fn p2pkh_layout() {
        let addr = SettlementAddr([0x11; ADDR_LEN]);
        let script = LockingScript::pay_to_addr(&addr);
        assert_eq!(script.0.len(), 25);
        assert_eq!(&script.0[..3], &[0x76, 0xA9, 0x14]);
        assert_eq!(&script.0[23..], &[0x88, 0xAC]);
        assert_eq!(script.pay_to_addr_target(), Some(addr));
        assert!(!script.is_contract());
    }

    #[test]
    fn contract_script_carries_state() {
        let state = OrderBookState::new()
            .with_slot(4, Order::dummy("AMZN", OrderSide::Buy, 2, 270))
            .unwrap();
        let script = LockingScript::contract(&state);
        assert!(script.is_contract());
        assert_eq!(script.contract_state().unwrap(), state);
        assert!(script.pay_to_addr_target().is_none());
    }

    #[test]
    fn p2pkh_is_not_contract_state() {
        let script = LockingScript::pay_to_addr(&SettlementAddr::ZERO);
        assert!(script.contract_state().is_err());
    }

    #[test]
    fn transaction_bytes_decode() {
        let tx = sample_tx();
        let bytes = tx.serialize();
        assert_eq!(Transaction::deserialize(&bytes).unwrap(), tx);
    }

    #[test]
    fn txid_changes_with_any_byte() {
        let tx = sample_tx();
        let mut other = tx.clone();
        other.outputs[1].value += 1;
        assert_ne!(tx.txid(), other.txid());
        assert_ne!(tx.hash_outputs(), other.hash_outputs());

        let mut other = tx.clone();
        other.inputs[0].unlocking_data.push(0);
        assert_ne!(tx.txid(), other.txid());
        assert_eq!(tx.hash_outputs(), other.hash_outputs());
    }

    #[test]
    fn output_order_matters() {
        let tx = sample_tx();
        let mut swapped = tx.outputs.clone();
        swapped.swap(0, 1);
        assert_ne!(hash_outputs(&tx.outputs), hash_outputs(&swapped));
    }

    #[test]
    fn output_value_overflow() {
        let mut tx = sample_tx();
        assert_eq!(tx.output_value(), Some(361));
        tx.outputs[0].value = u64::MAX;
        assert_eq!(tx.output_value(), None);
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = sample_tx().serialize();
        bytes.push(0);
        assert!(Transaction::deserialize(&bytes).is_err());
    }
}
