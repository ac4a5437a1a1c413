//! Match execution records

use crate::ids::{FillId, ItemId, OrderId, UserId};
use crate::numeric::{Price, Quantity};
use crate::order::OrderType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One crossing between an incoming (taker) order and a resting (maker) order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub fill_id: FillId,
    pub sequence: u64, // Engine-wide monotonic sequence
    pub item_id: ItemId,

    // Order references
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,

    // Party references
    pub maker_user_id: UserId,
    pub taker_user_id: UserId,

    // Trade details (from taker perspective)
    pub taker_side: OrderType,
    pub price: Price,
    pub quantity: Quantity,

    pub executed_at: i64, // Unix nanos
}

impl Fill {
    /// Record a new fill
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        item_id: ItemId,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_user_id: UserId,
        taker_user_id: UserId,
        taker_side: OrderType,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Self {
        Self {
            fill_id: FillId::new(),
            sequence,
            item_id,
            maker_order_id,
            taker_order_id,
            maker_user_id,
            taker_user_id,
            taker_side,
            price,
            quantity,
            executed_at,
        }
    }

    /// Calculate trade value (price × quantity)
    pub fn notional(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }

    /// Whether the given order took part in this fill
    pub fn involves(&self, order_id: &OrderId) -> bool {
        &self.maker_order_id == order_id || &self.taker_order_id == order_id
    }

    /// Both sides belong to the same user
    pub fn is_self_trade(&self) -> bool {
        self.maker_user_id == self.taker_user_id
    }
}
