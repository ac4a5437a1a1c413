//! Order queries
//!
//! An `OrderFilter` with no criteria set matches every order. Each criterion
//! that is set must hold, and the price bounds are inclusive.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, OrderId, UserId};
use crate::numeric::Price;
use crate::order::{Order, OrderStatus, OrderType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub order_id: Option<OrderId>,
    pub item_id: Option<ItemId>,
    pub user_id: Option<UserId>,
    pub order_type: Option<OrderType>,
    pub status: Option<OrderStatus>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
}

impl OrderFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn item_id(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Price at or above `price`
    pub fn min_price(mut self, price: Price) -> Self {
        self.min_price = Some(price);
        self
    }

    /// Price at or below `price`
    pub fn max_price(mut self, price: Price) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.order_id.map_or(true, |id| order.order_id == id)
            && self.item_id.map_or(true, |id| order.item_id == id)
            && self.user_id.map_or(true, |id| order.user_id == id)
            && self.order_type.map_or(true, |t| order.order_type == t)
            && self.status.map_or(true, |s| order.status == s)
            && self.min_price.map_or(true, |p| order.price >= p)
            && self.max_price.map_or(true, |p| order.price <= p)
    }
}
