//! Per-item order book
//!
//! Combines both sides of the book with an index from order id to the
//! side and price it rests at, so orders can be removed by id alone.

use std::collections::HashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use types::errors::OrderError;
use types::ids::{ItemId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType};

use super::{AskBook, BidBook};

/// Resting buy and sell orders for one item
#[derive(Debug, Clone)]
pub struct OrderBook {
    item_id: ItemId,
    bids: BidBook,
    asks: AskBook,
    /// Side and price of every resting order
    locations: HashMap<OrderId, (OrderType, Price)>,
}

impl OrderBook {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            bids: BidBook::new(),
            asks: AskBook::new(),
            locations: HashMap::new(),
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Add a live order to its side of the book.
    ///
    /// Returns `Ok(false)` (and leaves the book alone) for filled or
    /// cancelled orders. An order already resting is replaced. Fails without
    /// touching the book if the price level total would overflow.
    pub fn insert(&mut self, order: Order) -> Result<bool, OrderError> {
        if !order.is_live() || order.remaining_quantity.is_zero() {
            return Ok(false);
        }

        self.check_level_capacity(&order)?;

        self.remove(&order.order_id);
        let (order_id, order_type, price) = (order.order_id, order.order_type, order.price);
        match order_type {
            OrderType::Buy => self.bids.insert(order)?,
            OrderType::Sell => self.asks.insert(order)?,
        }
        self.locations.insert(order_id, (order_type, price));
        Ok(true)
    }

    /// Level total after `order` lands, net of any copy it replaces
    fn check_level_capacity(&self, order: &Order) -> Result<(), OrderError> {
        let level_total = match order.order_type {
            OrderType::Buy => self.bids.level_quantity(order.price),
            OrderType::Sell => self.asks.level_quantity(order.price),
        };
        let replaced = match self.locations.get(&order.order_id) {
            Some(&(order_type, price)) if order_type == order.order_type && price == order.price => {
                self.resting_quantity(&order.order_id, order_type, price)
            }
            _ => Quantity::zero(),
        };

        level_total
            .checked_sub(replaced)
            .and_then(|rest| rest.checked_add(order.remaining_quantity))
            .map(|_| ())
            .ok_or_else(|| {
                OrderError::InvalidQuantity(format!(
                    "resting quantity at price {} would exceed {}",
                    order.price,
                    u64::MAX
                ))
            })
    }

    fn resting_quantity(&self, order_id: &OrderId, order_type: OrderType, price: Price) -> Quantity {
        let resting = match order_type {
            OrderType::Buy => self.bids.get(order_id, price),
            OrderType::Sell => self.asks.get(order_id, price),
        };
        resting.map_or_else(Quantity::zero, |order| order.remaining_quantity)
    }

    /// Highest priority order on the side an order of `order_type` trades against
    pub fn best_opposite(&self, order_type: OrderType) -> Option<&Order> {
        match order_type {
            OrderType::Buy => self.asks.best_order(),
            OrderType::Sell => self.bids.best_order(),
        }
    }

    /// Remove a resting order; no-op if absent
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let (order_type, price) = self.locations.remove(order_id)?;
        match order_type {
            OrderType::Buy => self.bids.remove(order_id, price),
            OrderType::Sell => self.asks.remove(order_id, price),
        }
    }

    /// Fill a resting order, dropping it from the book once exhausted.
    pub fn fill_resting(
        &mut self,
        order_id: &OrderId,
        quantity: Quantity,
        timestamp: i64,
    ) -> Result<Order, OrderError> {
        let (order_type, price) = self
            .locations
            .get(order_id)
            .copied()
            .ok_or_else(|| OrderError::NotFound {
                order_id: order_id.to_string(),
            })?;

        let updated = match order_type {
            OrderType::Buy => self.bids.fill(order_id, price, quantity, timestamp)?,
            OrderType::Sell => self.asks.fill(order_id, price, quantity, timestamp)?,
        };

        if updated.is_filled() {
            self.locations.remove(order_id);
        }
        Ok(updated)
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.locations.contains_key(order_id)
    }

    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.best_bid()
    }

    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.best_ask()
    }

    /// Best ask minus best bid, when both sides are quoted
    pub fn spread(&self) -> Option<Decimal> {
        let bid = self.bids.best_bid_price()?;
        let ask = self.asks.best_ask_price()?;
        Some(ask.as_decimal() - bid.as_decimal())
    }

    pub fn order_count(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Aggregated top-of-book view
    pub fn depth_snapshot(&self, depth: usize) -> OrderBookSnapshot {
        OrderBookSnapshot {
            item_id: self.item_id,
            bids: self.bids.depth_snapshot(depth),
            asks: self.asks.depth_snapshot(depth),
        }
    }
}

/// Order book snapshot for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBookSnapshot {
    pub item_id: ItemId,
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
}
