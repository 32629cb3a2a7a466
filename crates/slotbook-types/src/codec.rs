//! Byte-level codec shared by the state layout, the call encoding and the
//! transaction wire format.
//!
//! Integers are little-endian. Variable-length fields carry a compact-size
//! (`varint`) prefix. Every decoder is strict: short input, trailing bytes
//! and out-of-domain flag bytes are all errors.

use sha2::{Digest, Sha256};

use crate::{
    Order, OrderSide, Result, SettlementAddr, SlotbookError, Ticker,
    constants::{ADDR_LEN, RECORD_SIZE, TICKER_MAX_LEN},
};

/// Double SHA-256.
#[must_use]
pub fn hash256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

/// Append a compact-size length prefix.
#[allow(clippy::cast_possible_truncation)]
pub fn write_varint(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xFC => out.push(n as u8),
        0xFD..=0xFFFF => {
            out.push(0xFD);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xFFFF_FFFF => {
            out.push(0xFE);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xFF);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Cursor over a byte slice.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.buf.len());
        let Some(end) = end else {
            return Err(SlotbookError::Decode(format!(
                "need {n} bytes at offset {}, have {}",
                self.pos,
                self.buf.len() - self.pos
            )));
        };
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    /// A `0`/`1` byte.
    pub fn flag(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SlotbookError::Decode(format!(
                "flag byte 0x{other:02x} at offset {}",
                self.pos - 1
            ))),
        }
    }

    pub fn varint(&mut self) -> Result<u64> {
        match self.u8()? {
            0xFD => Ok(u64::from(u16::from_le_bytes(self.array()?))),
            0xFE => Ok(u64::from(self.u32_le()?)),
            0xFF => self.u64_le(),
            n => Ok(u64::from(n)),
        }
    }

    /// A varint length followed by that many bytes.
    pub fn var_bytes(&mut self) -> Result<&'a [u8]> {
        let len = usize::try_from(self.varint()?)
            .map_err(|_| SlotbookError::Decode("length exceeds usize".into()))?;
        self.take(len)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fail if anything is left unread.
    pub fn finish(self) -> Result<()> {
        if self.pos == self.buf.len() {
            Ok(())
        } else {
            Err(SlotbookError::Decode(format!(
                "{} trailing bytes",
                self.buf.len() - self.pos
            )))
        }
    }
}

/// Append one fixed-width order record.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_order(order: &Order, out: &mut Vec<u8>) {
    let ticker = order.ticker.as_bytes();
    let mut padded = [0u8; TICKER_MAX_LEN];
    padded[..ticker.len()].copy_from_slice(ticker);

    out.push(ticker.len() as u8);
    out.extend_from_slice(&padded);
    out.extend_from_slice(&order.quantity.to_le_bytes());
    out.extend_from_slice(&order.price.to_le_bytes());
    out.push(u8::from(order.side.as_flag()));
    out.extend_from_slice(order.settlement_addr.as_bytes());
    out.push(u8::from(order.closed));
}

/// Read one fixed-width order record.
pub fn decode_order(reader: &mut ByteReader<'_>) -> Result<Order> {
    let start = reader.remaining();
    let len = reader.u8()? as usize;
    let padded: [u8; TICKER_MAX_LEN] = reader.array()?;
    if len > TICKER_MAX_LEN {
        return Err(SlotbookError::Decode(format!("ticker length {len}")));
    }
    if padded[len..].iter().any(|b| *b != 0) {
        return Err(SlotbookError::Decode("ticker padding not zero".into()));
    }
    let ticker = Ticker::from_bytes(&padded[..len])?;
    let quantity = reader.u64_le()?;
    let price = reader.u64_le()?;
    let side = OrderSide::from_flag(reader.flag()?);
    let settlement_addr = SettlementAddr(reader.array::<ADDR_LEN>()?);
    let closed = reader.flag()?;
    debug_assert_eq!(start - reader.remaining(), RECORD_SIZE);

    Ok(Order {
        ticker,
        quantity,
        price,
        side,
        settlement_addr,
        closed,
    })
}
