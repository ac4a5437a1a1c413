//! Price level implementation with FIFO queue
//!
//! A price level contains all resting orders at a specific price point.
//! Orders are kept sorted by `created_at`, which gives time priority within
//! the level.

use std::collections::VecDeque;
use types::errors::OrderError;
use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::Order;

/// A price level containing orders at a specific price
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Resting orders, earliest `created_at` at the front
    orders: VecDeque<Order>,
    /// Total remaining quantity available at this level
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Insert an order in time priority.
    ///
    /// New orders carry the latest timestamp and go to the back. An order
    /// restored after a rollback is put back where its `created_at` belongs.
    /// Fails without touching the level if the total would overflow.
    pub fn insert(&mut self, order: Order) -> Result<(), OrderError> {
        self.total_quantity = self
            .total_quantity
            .checked_add(order.remaining_quantity)
            .ok_or_else(|| {
                OrderError::InvalidQuantity(format!(
                    "resting quantity at price {} would exceed {}",
                    order.price,
                    u64::MAX
                ))
            })?;

        let appends = self
            .orders
            .back()
            .map_or(true, |last| last.created_at <= order.created_at);
        if appends {
            self.orders.push_back(order);
        } else {
            let position = self
                .orders
                .partition_point(|resting| resting.created_at <= order.created_at);
            self.orders.insert(position, order);
        }
        Ok(())
    }

    /// Remove an order from the queue by OrderId
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| &o.order_id == order_id)?;
        let order = self.orders.remove(position)?;

        self.total_quantity = self
            .total_quantity
            .checked_sub(order.remaining_quantity)
            .unwrap_or_else(Quantity::zero);

        Some(order)
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.order_id == order_id)
    }

    /// Peek at the front order without removing it
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Apply a fill to a resting order.
    ///
    /// Returns the order's state after the fill. A fully filled order is
    /// dropped from the level.
    pub fn fill(
        &mut self,
        order_id: &OrderId,
        quantity: Quantity,
        timestamp: i64,
    ) -> Result<Order, OrderError> {
        let position = self
            .orders
            .iter()
            .position(|o| &o.order_id == order_id)
            .ok_or_else(|| OrderError::NotFound {
                order_id: order_id.to_string(),
            })?;

        let entry = &mut self.orders[position];
        entry.apply_fill(quantity, timestamp)?;
        let updated = entry.clone();

        self.total_quantity = self
            .total_quantity
            .checked_sub(quantity)
            .unwrap_or_else(Quantity::zero);

        if updated.is_filled() {
            self.orders.remove(position);
        }

        Ok(updated)
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the total quantity at this price level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Get the number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
