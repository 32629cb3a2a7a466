//! Pure transition rules for the two operations.
//!
//! Both functions take the prior state by reference and return a brand-new
//! state; nothing is mutated in place. Any failed check aborts the whole
//! transition with a named error.

use slotbook_types::{Order, OrderBookState, OrderSide, Result, SettlementAddr, SlotbookError};

/// One settlement payment a match requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    pub addr: SettlementAddr,
    pub amount: u64,
}

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub next_state: OrderBookState,
    pub matched_qty: u64,
    /// `sell.price * matched_qty` to the seller's address.
    pub seller_payment: Payment,
    /// `buy.price * matched_qty` to the buyer's address.
    pub buyer_payment: Payment,
}

impl MatchOutcome {
    /// Payments in output order: seller first, then buyer.
    #[must_use]
    pub fn payments(&self) -> [Payment; 2] {
        [self.seller_payment, self.buyer_payment]
    }
}

/// Place `order` into `slot`.
///
/// # Errors
/// - `SlotIndexOutOfRange` if `slot >= ORDER_SLOTS`
/// - `SlotOccupied` if the slot holds an open order
/// - `InvalidQuantity` / `InvalidPrice` for zero values
/// - `PostconditionFailed` if the slot does not read back the order's ticker
pub fn place_order(prior: &OrderBookState, order: &Order, slot: usize) -> Result<OrderBookState> {
    if !prior.slot(slot)?.closed {
        return Err(SlotbookError::SlotOccupied { slot });
    }
    if order.quantity == 0 {
        return Err(SlotbookError::InvalidQuantity);
    }
    if order.price == 0 {
        return Err(SlotbookError::InvalidPrice);
    }

    let placed = Order {
        closed: false,
        ..*order
    };
    let next = prior.with_slot(slot, placed)?;

    if next.slot(slot)?.ticker != order.ticker {
        return Err(SlotbookError::PostconditionFailed {
            reason: format!("slot {slot} does not hold ticker {}", order.ticker),
        });
    }
    Ok(next)
}

/// Match the buy order in `buy` against the sell order in `sell`.
///
/// The matched quantity is the smaller of the two remaining quantities.
/// A side reduced to zero is closed and its slot becomes reusable.
///
/// # Errors
/// - `SlotIndexOutOfRange` for a bad index
/// - `OrderTypeMismatch` if `buy` is not a buy or `sell` is not a sell
/// - `TickerMismatch` if the instruments differ
/// - `PriceCross` if `buy.price < sell.price`
/// - `AmountOverflow` if a payment does not fit in `u64`
/// - `PostconditionFailed` if a side ends up open with zero quantity
pub fn match_orders(prior: &OrderBookState, buy: usize, sell: usize) -> Result<MatchOutcome> {
    let buy_order = *prior.slot(buy)?;
    let sell_order = *prior.slot(sell)?;

    if buy_order.side != OrderSide::Buy {
        return Err(SlotbookError::OrderTypeMismatch {
            slot: buy,
            expected: OrderSide::Buy,
        });
    }
    if sell_order.side != OrderSide::Sell {
        return Err(SlotbookError::OrderTypeMismatch {
            slot: sell,
            expected: OrderSide::Sell,
        });
    }
    if buy_order.ticker != sell_order.ticker {
        return Err(SlotbookError::TickerMismatch {
            buy: buy_order.ticker.to_string(),
            sell: sell_order.ticker.to_string(),
        });
    }
    if buy_order.price < sell_order.price {
        return Err(SlotbookError::PriceCross {
            buy_price: buy_order.price,
            sell_price: sell_order.price,
        });
    }

    let matched_qty = buy_order.quantity.min(sell_order.quantity);
    let next_buy = reduce(buy_order, matched_qty);
    let next_sell = reduce(sell_order, matched_qty);

    let seller_payment = Payment {
        addr: sell_order.settlement_addr,
        amount: settlement_amount(sell_order.price, matched_qty)?,
    };
    let buyer_payment = Payment {
        addr: buy_order.settlement_addr,
        amount: settlement_amount(buy_order.price, matched_qty)?,
    };

    for (slot, order) in [(buy, &next_buy), (sell, &next_sell)] {
        if !(order.closed || order.quantity > 0) {
            return Err(SlotbookError::PostconditionFailed {
                reason: format!("order matching failed: slot {slot} open with zero quantity"),
            });
        }
    }

    let next_state = prior.with_slot(buy, next_buy)?.with_slot(sell, next_sell)?;

    Ok(MatchOutcome {
        next_state,
        matched_qty,
        seller_payment,
        buyer_payment,
    })
}

fn reduce(order: Order, matched_qty: u64) -> Order {
    let quantity = order.quantity - matched_qty;
    Order {
        quantity,
        closed: order.closed || quantity == 0,
        ..order
    }
}

fn settlement_amount(price: u64, quantity: u64) -> Result<u64> {
    price
        .checked_mul(quantity)
        .ok_or(SlotbookError::AmountOverflow { price, quantity })
}
