//! Ask (sell-side) order book
//!
//! Maintains sell orders sorted by price ascending (best ask first).
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use types::errors::OrderError;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;

/// Ask (sell) side order book
///
/// Orders are sorted by price ascending, so the lowest ask is first.
/// At each price level, orders are maintained in time order.
#[derive(Debug, Clone)]
pub struct AskBook {
    /// Price levels sorted ascending (lowest price first)
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    /// Create a new empty ask book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert an order into the ask book
    pub fn insert(&mut self, order: Order) -> Result<(), OrderError> {
        self.levels.entry(order.price).or_default().insert(order)
    }

    /// Remove an order from the ask book
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

    /// Highest priority sell order: lowest price, then earliest
    pub fn best_order(&self) -> Option<&Order> {
        self.levels.values().next().and_then(PriceLevel::front)
    }

    /// Get the best ask (lowest price) with its aggregate quantity
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Get the best ask price
    pub fn best_ask_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Get depth snapshot (top N price levels)
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    /// Check if the ask book is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Get the total number of resting orders
    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::order_count).sum()
    }
}

impl Default for AskBook {
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
            OrderType::Sell,
            Price::from_u64(price_val),
            Quantity::new(qty),
            created_at,
        )
    }

    #[test]
    fn test_ask_book_insert() {
        let mut book = AskBook::new();
        book.insert(create_test_order(100, 10, 1)).unwrap();

        assert_eq!(book.depth_snapshot(usize::MAX).len(), 1);
        assert_eq!(book.order_count(), 1);
        assert!(!book.is_empty());
    }

    #[test]
    fn test_ask_book_best_ask() {
        let mut book = AskBook::new();

        book.insert(create_test_order(100, 10, 1)).unwrap();
        book.insert(create_test_order(110, 20, 2)).unwrap(); // Higher price
        book.insert(create_test_order(90, 15, 3)).unwrap(); // Lower price (best ask)

        let (best_price, best_qty) = book.best_ask().unwrap();
        assert_eq!(best_price, Price::from_u64(90));
        assert_eq!(best_qty, Quantity::new(15));
        assert_eq!(book.best_order().unwrap().created_at, 3);
    }

    #[test]
    fn test_ask_book_remove() {
        let mut book = AskBook::new();
        let order = create_test_order(100, 10, 1);
        let order_id = order.order_id;
        let price = order.price;

        book.insert(order).unwrap();
        assert!(book.remove(&order_id, price).is_some());
        assert!(book.is_empty());
        assert!(book.remove(&order_id, price).is_none());
    }

    #[test]
    fn test_ask_book_fill_drops_empty_level() {
        let mut book = AskBook::new();
        let order = create_test_order(100, 10, 1);
        let order_id = order.order_id;
        book.insert(order).unwrap();

        let filled = book.fill(&order_id, Price::from_u64(100), Quantity::new(10), 2).unwrap();
        assert!(filled.is_filled());
        assert!(book.is_empty());
    }

    #[test]
    fn test_ask_book_depth_snapshot() {
        let mut book = AskBook::new();

        book.insert(create_test_order(100, 10, 1)).unwrap();
        book.insert(create_test_order(110, 20, 2)).unwrap();
        book.insert(create_test_order(90, 15, 3)).unwrap();
        book.insert(create_test_order(120, 5, 4)).unwrap();

        let depth = book.depth_snapshot(2);

        // Should return top 2 levels (lowest prices first)
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].0, Price::from_u64(90));
        assert_eq!(depth[1].0, Price::from_u64(100));
    }

    #[test]
    fn test_ask_book_price_time_priority() {
        let mut book = AskBook::new();

        let first = create_test_order(100, 10, 1);
        let first_id = first.order_id;
        book.insert(first).unwrap();
        book.insert(create_test_order(100, 20, 2)).unwrap(); // Same price, later

        assert_eq!(book.depth_snapshot(usize::MAX).len(), 1);
        assert_eq!(book.best_order().unwrap().order_id, first_id);

        let (price, total_qty) = book.best_ask().unwrap();
        assert_eq!(price, Price::from_u64(100));
        assert_eq!(total_qty, Quantity::new(30));
    }
}
