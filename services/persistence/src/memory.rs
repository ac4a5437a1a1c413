//! In-memory storage
//!
//! `OrderTable` is the shared materialised view: `MemoryStorage` keeps one
//! behind a lock, `JournalStorage` rebuilds one from the journal.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use types::errors::StorageError;
use types::fill::Fill;
use types::ids::OrderId;
use types::order::Order;
use types::storage::StorageAdapter;

/// Latest snapshot of every order plus every fill, in first-save order
#[derive(Debug, Default, Clone)]
pub struct OrderTable {
    orders: Vec<Order>,
    index: HashMap<OrderId, usize>,
    fills: Vec<Fill>,
}

impl OrderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_order(&mut self, order: Order) {
        match self.index.get(&order.order_id) {
            Some(&slot) => self.orders[slot] = order,
            None => {
                self.index.insert(order.order_id, self.orders.len());
                self.orders.push(order);
            }
        }
    }

    pub fn put_fill(&mut self, fill: Fill) {
        self.fills.push(fill);
    }

    /// Apply one commit batch
    pub fn apply(&mut self, orders: &[Order], fills: &[Fill]) {
        for order in orders {
            self.put_order(order.clone());
        }
        self.fills.extend_from_slice(fills);
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.index.get(order_id).map(|&slot| &self.orders[slot])
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn fill_count(&self) -> usize {
        self.fills.len()
    }
}

/// Volatile `StorageAdapter`; commits are atomic under one write lock
#[derive(Debug, Default)]
pub struct MemoryStorage {
    table: RwLock<OrderTable>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, OrderTable>, StorageError> {
        self.table
            .read()
            .map_err(|_| StorageError::Unavailable("memory table lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, OrderTable>, StorageError> {
        self.table
            .write()
            .map_err(|_| StorageError::Unavailable("memory table lock poisoned".into()))
    }
}

impl StorageAdapter for MemoryStorage {
    fn save_order(&self, order: &Order) -> Result<(), StorageError> {
        self.write()?.put_order(order.clone());
        Ok(())
    }

    fn save_fill(&self, fill: &Fill) -> Result<(), StorageError> {
        self.write()?.put_fill(fill.clone());
        Ok(())
    }

    fn commit(&self, orders: &[Order], fills: &[Fill]) -> Result<(), StorageError> {
        self.write()?.apply(orders, fills);
        Ok(())
    }

    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, StorageError> {
        Ok(self.read()?.get(order_id).cloned())
    }

    fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        Ok(self.read()?.orders().to_vec())
    }

    fn list_fills(&self) -> Result<Vec<Fill>, StorageError> {
        Ok(self.read()?.fills().to_vec())
    }
}
