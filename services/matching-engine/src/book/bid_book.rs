//! Bid (buy-side) order book
//!
//! Maintains buy orders sorted by price descending (best bid first).
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use types::errors::OrderError;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;

/// Bid (buy) side order book
///
/// Orders are sorted by price descending, so the highest bid is first.
/// At each price level, orders are maintained in time order.
#[derive(Debug, Clone)]
pub struct BidBook {
    /// Price levels; iterated from the back for highest price first
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    /// Create a new empty bid book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert an order into the bid book
    pub fn insert(&mut self, order: Order) -> Result<(), OrderError> {
        self.levels.entry(order.price).or_default().insert(order)
    }

    /// Remove an order from the bid book
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(order_id)?;
        // Remove empty price levels to keep book clean
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(removed)
    }

    pub fn get(&self, order_id: &OrderId, price: Price) -> Option<&Order> {
        self.levels.get(&price)?.get(order_id)
    }

    /// Aggregate remaining quantity resting at `price`
    pub fn level_quantity(&self, price: Price) -> Quantity {
        self.levels
            .get(&price)
            .map_or_else(Quantity::zero, PriceLevel::total_quantity)
    }

    /// Fill a resting order at the given price
    pub fn fill(
        &mut self,
        order_id: &OrderId,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    ) -> Result<Order, OrderError> {
        let level = self.levels.get_mut(&price).ok_or_else(|| OrderError::NotFound {
            order_id: order_id.to_string(),
        })?;
        let updated = level.fill(order_id, quantity, timestamp)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Ok(updated)
    }

    /// Highest priority buy order: highest price, then earliest
    pub fn best_order(&self) -> Option<&Order> {
        self.levels.values().next_back().and_then(PriceLevel::front)
    }

    /// Get the best bid (highest price) with its aggregate quantity
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        // BTreeMap iter is ascending, so we need the last entry
        self.levels
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Get the best bid price
    pub fn best_bid_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Get depth snapshot (top N price levels)
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .rev() // Reverse to get highest prices first
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    /// Check if the bid book is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Get the total number of resting orders
    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::order_count).sum()
    }
}

impl Default for BidBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{ItemId, UserId};
    use types::order::OrderType;

    fn create_test_order(price_val: u64, qty: u64, created_at: i64) -> Order {
        Order::new(
            UserId::new(1),
            ItemId::new(1001),
            OrderType::Buy,
            Price::from_u64(price_val),
            Quantity::new(qty),
            created_at,
        )
    }

    #[test]
    fn test_bid_book_insert() {
        let mut book = BidBook::new();
        book.insert(create_test_order(150, 10, 1)).unwrap();

        assert_eq!(book.depth_snapshot(usize::MAX).len(), 1);
        assert!(!book.is_empty());
    }

    #[test]
    fn test_bid_book_best_bid() {
        let mut book = BidBook::new();

        book.insert(create_test_order(150, 10, 1)).unwrap();
        book.insert(create_test_order(160, 20, 2)).unwrap(); // Higher price
        book.insert(create_test_order(140, 15, 3)).unwrap(); // Lower price

        let (best_price, best_qty) = book.best_bid().unwrap();
        assert_eq!(best_price, Price::from_u64(160)); // Highest price
        assert_eq!(best_qty, Quantity::new(20));
        assert_eq!(book.best_order().unwrap().created_at, 2);
    }

    #[test]
    fn test_bid_book_remove() {
        let mut book = BidBook::new();
        let order = create_test_order(150, 10, 1);
        let order_id = order.order_id;
        let price = order.price;

        book.insert(order).unwrap();
        assert_eq!(book.depth_snapshot(usize::MAX).len(), 1);

        assert!(book.remove(&order_id, price).is_some());
        assert!(book.is_empty());
    }

    #[test]
    fn test_bid_book_depth_snapshot() {
        let mut book = BidBook::new();

        book.insert(create_test_order(150, 10, 1)).unwrap();
        book.insert(create_test_order(160, 20, 2)).unwrap();
        book.insert(create_test_order(140, 15, 3)).unwrap();
        book.insert(create_test_order(170, 5, 4)).unwrap();

        let depth = book.depth_snapshot(2);

        // Should return top 2 levels (highest prices first)
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].0, Price::from_u64(170));
        assert_eq!(depth[1].0, Price::from_u64(160));
    }

    #[test]
    fn test_bid_book_orders_in_priority() {
        let mut book = BidBook::new();

        book.insert(create_test_order(150, 1, 1)).unwrap();
        book.insert(create_test_order(160, 1, 2)).unwrap();
        book.insert(create_test_order(150, 1, 3)).unwrap();

        let drained: Vec<i64> = std::iter::from_fn(|| {
            let best = book.best_order()?.clone();
            book.remove(&best.order_id, best.price).map(|o| o.created_at)
        })
        .collect();
        assert_eq!(drained, vec![2, 1, 3]);
    }

    #[test]
    fn test_bid_book_partial_fill_keeps_order() {
        let mut book = BidBook::new();
        let order = create_test_order(150, 10, 1);
        let order_id = order.order_id;
        book.insert(order).unwrap();

        let updated = book.fill(&order_id, Price::from_u64(150), Quantity::new(4), 2).unwrap();
        assert_eq!(updated.remaining_quantity, Quantity::new(6));
        assert_eq!(book.best_bid(), Some((Price::from_u64(150), Quantity::new(6))));
    }
}
