//! Order registry
//!
//! Authoritative record of every order the engine has accepted, whether or
//! not it still rests in a book. Each write replaces a whole order snapshot
//! under the write lock, so readers always see a consistent order.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use types::errors::OrderError;
use types::filter::OrderFilter;
use types::ids::{ItemId, OrderId};
use types::numeric::Quantity;
use types::order::Order;

#[derive(Debug, Default)]
struct RegistryInner {
    /// Orders in first-insertion order
    orders: Vec<Order>,
    index: HashMap<OrderId, usize>,
}

impl RegistryInner {
    fn upsert(&mut self, order: Order) {
        match self.index.get(&order.order_id) {
            Some(&slot) => self.orders[slot] = order,
            None => {
                self.index.insert(order.order_id, self.orders.len());
                self.orders.push(order);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct OrderRegistry {
    inner: RwLock<RegistryInner>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot of an order
    pub fn get(&self, order_id: &OrderId) -> Result<Order, OrderError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .index
            .get(order_id)
            .map(|&slot| inner.orders[slot].clone())
            .ok_or_else(|| OrderError::NotFound {
                order_id: order_id.to_string(),
            })
    }

    pub fn remaining_quantity(&self, order_id: &OrderId) -> Result<Quantity, OrderError> {
        self.get(order_id).map(|order| order.remaining_quantity)
    }

    /// Record creation or mutation of an order
    pub fn upsert(&self, order: Order) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .upsert(order);
    }

    /// Record several orders under one write lock
    pub fn upsert_all(&self, orders: impl IntoIterator<Item = Order>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for order in orders {
            inner.upsert(order);
        }
    }

    pub fn list_for_item(&self, item_id: ItemId) -> Vec<Order> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .orders
            .iter()
            .filter(|order| order.item_id == item_id)
            .cloned()
            .collect()
    }

    /// Orders matching `filter`, in insertion order
    pub fn query(&self, filter: &OrderFilter) -> Vec<Order> {
        if let Some(order_id) = filter.order_id {
            return self
                .get(&order_id)
                .ok()
                .filter(|order| filter.matches(order))
                .into_iter()
                .collect();
        }
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .orders
            .iter()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect()
    }

    pub fn list_all(&self) -> Vec<Order> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .orders
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .orders
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
