//! Storage adapter contract
//!
//! The matching engine reads and writes durable state only through this
//! trait. Implementations live outside the engine.

use crate::errors::StorageError;
use crate::fill::Fill;
use crate::filter::OrderFilter;
use crate::ids::OrderId;
use crate::numeric::Quantity;
use crate::order::Order;

/// Durable store for orders and fills
///
/// `list_orders` returns orders in the order they were first saved.
pub trait StorageAdapter: Send + Sync {
    /// Persist a newly created or updated order
    fn save_order(&self, order: &Order) -> Result<(), StorageError>;

    /// Persist a fill
    fn save_fill(&self, fill: &Fill) -> Result<(), StorageError>;

    /// Persist every order and fill touched by one engine call.
    ///
    /// The default saves records one at a time and is not atomic. Adapters
    /// that can write the batch as a unit should override it.
    fn commit(&self, orders: &[Order], fills: &[Fill]) -> Result<(), StorageError> {
        for order in orders {
            self.save_order(order)?;
        }
        for fill in fills {
            self.save_fill(fill)?;
        }
        Ok(())
    }

    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, StorageError>;

    fn list_orders(&self) -> Result<Vec<Order>, StorageError>;

    fn list_fills(&self) -> Result<Vec<Fill>, StorageError>;

    /// Convenience accessor for the remaining quantity of a stored order
    fn get_order_remaining_quantity(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Quantity>, StorageError> {
        Ok(self.get_order(order_id)?.map(|order| order.remaining_quantity))
    }

    /// Stored orders matching `filter`, in save order
    fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
        let mut orders = self.list_orders()?;
        orders.retain(|order| filter.matches(order));
        Ok(orders)
    }

    /// Fills in which the order took part, on either side
    fn list_fills_for_order(&self, order_id: &OrderId) -> Result<Vec<Fill>, StorageError> {
        let mut fills = self.list_fills()?;
        fills.retain(|fill| fill.involves(order_id));
        Ok(fills)
    }
}
