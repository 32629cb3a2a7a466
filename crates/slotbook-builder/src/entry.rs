//! Order entry: turn form values into a validated [`Order`].
//!
//! Failures here are ordinary client errors ([`SlotbookError::InvalidOrder`])
//! and are reported before any transaction is built.

use serde::{Deserialize, Serialize};
use slotbook_types::{
    Order, OrderSide, Result, SettlementAddr, SlotbookError, Ticker, constants::SATS_PER_COIN,
};

/// Values captured by an order-entry form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub ticker: String,
    pub quantity: u64,
    /// Limit price in satoshis.
    pub price: u64,
    pub side: OrderSide,
}

impl OrderRequest {
    /// Build a request from a price typed in whole coins, e.g. `"1.25"`.
    pub fn with_coin_price(
        ticker: impl Into<String>,
        quantity: u64,
        coins: &str,
        side: OrderSide,
    ) -> Result<Self> {
        Ok(Self {
            ticker: ticker.into(),
            quantity,
            price: coins_to_sats(coins)?,
            side,
        })
    }

    /// Validate and attach the trader's settlement address.
    pub fn into_order(self, settlement_addr: SettlementAddr) -> Result<Order> {
        let symbol = self.ticker.trim();
        if symbol.is_empty() {
            return Err(invalid("ticker cannot be empty"));
        }
        let ticker = Ticker::new(symbol).map_err(|e| invalid(&e.to_string()))?;
        if self.quantity == 0 {
            return Err(invalid("quantity must be a positive number"));
        }
        if self.price == 0 {
            return Err(invalid("price must be a positive number"));
        }
        if settlement_addr.is_zero() {
            return Err(invalid("settlement address missing"));
        }
        Ok(Order::open(
            ticker,
            self.quantity,
            self.price,
            self.side,
            settlement_addr,
        ))
    }
}

fn invalid(reason: &str) -> SlotbookError {
    SlotbookError::InvalidOrder {
        reason: reason.to_string(),
    }
}

/// Parse a decimal coin amount into satoshis, exact to eight places.
pub fn coins_to_sats(coins: &str) -> Result<u64> {
    let coins = coins.trim();
    let (whole, frac) = coins.split_once('.').unwrap_or((coins, ""));
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !(frac.is_empty() || digits(frac)) || frac.len() > 8 {
        return Err(invalid(&format!("price {coins:?} is not a coin amount")));
    }

    let overflow = || invalid(&format!("price {coins:?} too large"));
    let whole: u64 = whole.parse().map_err(|_| overflow())?;
    let frac_sats: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<8}");
        padded.parse().map_err(|_| overflow())?
    };
    whole
        .checked_mul(SATS_PER_COIN)
        .and_then(|s| s.checked_add(frac_sats))
        .ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use slotbook_types::constants::ADDR_LEN;

    use super::*;

    const ADDR: SettlementAddr = SettlementAddr([7; ADDR_LEN]);

    fn request() -> OrderRequest {
        OrderRequest {
            ticker: "AAPL".into(),
            quantity: 10,
            price: 100,
            side: OrderSide::Buy,
        }
    }

    #[test]
    fn valid_request() {
        let order = request().into_order(ADDR).unwrap();
        assert!(order.is_open());
        assert_eq!(order.ticker.as_str(), "AAPL");
        assert_eq!(order.settlement_addr, ADDR);
    }

    #[test]
    fn form_checks() {
        let mut r = request();
        r.ticker = "  ".into();
        assert!(matches!(
            r.into_order(ADDR),
            Err(SlotbookError::InvalidOrder { .. })
        ));

        let mut r = request();
        r.quantity = 0;
        assert!(r.into_order(ADDR).unwrap_err().is_retryable());

        let mut r = request();
        r.price = 0;
        assert!(r.into_order(ADDR).is_err());

        let mut r = request();
        r.ticker = "apple inc".into();
        assert!(r.into_order(ADDR).is_err());

        assert!(request().into_order(SettlementAddr::ZERO).is_err());
    }

    #[test]
    fn coin_prices() {
        assert_eq!(coins_to_sats("1").unwrap(), 100_000_000);
        assert_eq!(coins_to_sats("0.5").unwrap(), 50_000_000);
        assert_eq!(coins_to_sats("2.00000001").unwrap(), 200_000_001);
        assert_eq!(coins_to_sats(" 0.00000001 ").unwrap(), 1);
        assert!(coins_to_sats("0.000000001").is_err());
        assert!(coins_to_sats("-1").is_err());
        assert!(coins_to_sats("1.").is_ok());
        assert!(coins_to_sats(".5").is_err());
        assert!(coins_to_sats("abc").is_err());
        assert!(coins_to_sats("999999999999").is_err());
    }

    #[test]
    fn with_coin_price_builds_sats() {
        let r = OrderRequest::with_coin_price("BRK.B", 3, "0.25", OrderSide::Sell).unwrap();
        assert_eq!(r.price, 25_000_000);
        assert_eq!(r.into_order(ADDR).unwrap().side, OrderSide::Sell);
    }

    #[test]
    fn request_from_json() {
        let r: OrderRequest = serde_json::from_str(
            r#"{ "ticker": "TSLA", "quantity": 2, "price": 500, "side": "Sell" }"#,
        )
        .unwrap();
        assert_eq!(r.side, OrderSide::Sell);
        assert_eq!(r.quantity, 2);
    }
}
