//! Order lifecycle types
//!
//! An order moves OPEN -> PARTIALLY_FILLED -> FILLED as fills arrive, or to
//! CANCELLED from either live state. FILLED and CANCELLED are terminal.

use crate::errors::OrderError;
use crate::ids::{ItemId, OrderId, UserId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl OrderType {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            OrderType::Buy => OrderType::Sell,
            OrderType::Sell => OrderType::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Buy => "BUY",
            OrderType::Sell => "SELL",
        }
    }
}

impl FromStr for OrderType {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderType::Buy),
            "SELL" => Ok(OrderType::Sell),
            _ => Err(OrderError::InvalidOrderType(s.to_string())),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an order left the book without being filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    UserRequested,
    SelfTradePrevention,
}

/// Order status
///
/// Always recomputed from the remaining quantity after a fill, so it can
/// never disagree with the quantities it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Resting with nothing matched yet
    Open,
    /// Resting with part of the quantity matched
    PartiallyFilled,
    /// Completely matched (terminal)
    Filled,
    /// Withdrawn (terminal)
    Cancelled(CancelReason),
}

impl OrderStatus {
    /// Status implied by the quantities of a live order
    pub fn derive(quantity: Quantity, remaining: Quantity) -> Self {
        if remaining.is_zero() {
            OrderStatus::Filled
        } else if remaining < quantity {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Open
        }
    }

    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled(_))
    }

    /// Live orders are the only ones allowed in an order book
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled(_) => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller input for a new order
///
/// The engine assigns the id and timestamps when it accepts the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub price: Price,
}

impl OrderRequest {
    pub fn new(
        user_id: UserId,
        item_id: ItemId,
        order_type: OrderType,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        Self {
            user_id,
            item_id,
            order_type,
            quantity,
            price,
        }
    }

    /// Whole-unit buy request
    pub fn buy(user_id: u64, item_id: u64, quantity: u64, price: u64) -> Self {
        Self::new(
            UserId::new(user_id),
            ItemId::new(item_id),
            OrderType::Buy,
            Quantity::new(quantity),
            Price::from_u64(price),
        )
    }

    /// Whole-unit sell request
    pub fn sell(user_id: u64, item_id: u64, quantity: u64, price: u64) -> Self {
        Self::new(
            UserId::new(user_id),
            ItemId::new(item_id),
            OrderType::Sell,
            Quantity::new(quantity),
            Price::from_u64(price),
        )
    }

    /// Reject malformed input before it can touch a book
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.quantity.is_zero() {
            return Err(OrderError::InvalidQuantity(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if !self.price.is_positive() {
            return Err(OrderError::InvalidPrice(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

/// Complete order structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    pub created_at: i64, // Unix nanos, time priority key
    pub updated_at: i64, // Unix nanos
    pub version: u64,
}

impl Order {
    /// Create a new open order
    pub fn new(
        user_id: UserId,
        item_id: ItemId,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            user_id,
            item_id,
            order_type,
            price,
            quantity,
            remaining_quantity: quantity,
            status: OrderStatus::Open,
            created_at: timestamp,
            updated_at: timestamp,
            version: 0,
        }
    }

    /// Accept a validated request
    pub fn from_request(request: &OrderRequest, timestamp: i64) -> Self {
        Self::new(
            request.user_id,
            request.item_id,
            request.order_type,
            request.price,
            request.quantity,
            timestamp,
        )
    }

    /// Quantity matched so far
    pub fn filled_quantity(&self) -> Quantity {
        self.quantity
            .checked_sub(self.remaining_quantity)
            .unwrap_or_else(Quantity::zero)
    }

    /// Check the quantity and status invariants
    pub fn check_invariant(&self) -> bool {
        if self.remaining_quantity > self.quantity {
            return false;
        }
        match self.status {
            OrderStatus::Filled => self.remaining_quantity.is_zero(),
            OrderStatus::Cancelled(_) => true,
            status => {
                !self.remaining_quantity.is_zero()
                    && status == OrderStatus::derive(self.quantity, self.remaining_quantity)
            }
        }
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        self.remaining_quantity < self.quantity
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Decrement the remaining quantity and recompute the status
    pub fn apply_fill(&mut self, fill_quantity: Quantity, timestamp: i64) -> Result<(), OrderError> {
        if !self.is_live() {
            return Err(OrderError::NotFillable {
                order_id: self.order_id.to_string(),
                status: self.status.to_string(),
            });
        }

        let remaining = self
            .remaining_quantity
            .checked_sub(fill_quantity)
            .ok_or_else(|| OrderError::Overfill {
                order_id: self.order_id.to_string(),
                fill: fill_quantity.value(),
                remaining: self.remaining_quantity.value(),
            })?;

        self.remaining_quantity = remaining;
        self.status = OrderStatus::derive(self.quantity, self.remaining_quantity);
        self.touch(timestamp);
        Ok(())
    }

    /// Withdraw a live order
    pub fn cancel(&mut self, reason: CancelReason, timestamp: i64) -> Result<(), OrderError> {
        if !self.is_live() {
            return Err(OrderError::NotCancellable {
                order_id: self.order_id.to_string(),
                status: self.status.to_string(),
            });
        }

        self.status = OrderStatus::Cancelled(reason);
        self.touch(timestamp);
        Ok(())
    }

    fn touch(&mut self, timestamp: i64) {
        self.updated_at = timestamp;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_order(order_type: OrderType, qty: u64) -> Order {
        Order::new(
            UserId::new(1),
            ItemId::new(1001),
            order_type,
            Price::from_u64(150),
            Quantity::new(qty),
            1708123456789000000,
        )
    }

    #[test]
    fn test_order_type_opposite() {
        assert_eq!(OrderType::Buy.opposite(), OrderType::Sell);
        assert_eq!(OrderType::Sell.opposite(), OrderType::Buy);
    }

    #[test]
    fn test_order_type_parse() {
        assert_eq!("buy".parse::<OrderType>().unwrap(), OrderType::Buy);
        assert_eq!(" SELL ".parse::<OrderType>().unwrap(), OrderType::Sell);

        let err = "HOLD".parse::<OrderType>().unwrap_err();
        assert!(err.is_invalid_order());
    }

    #[test]
    fn test_order_creation() {
        let order = create_order(OrderType::Buy, 10);

        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.remaining_quantity, order.quantity);
        assert!(order.check_invariant());
        assert!(!order.has_fills());
    }

    #[test]
    fn test_order_fill() {
        let mut order = create_order(OrderType::Buy, 10);

        // Partial fill
        order.apply_fill(Quantity::new(3), 1708123456790000000).unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_quantity, Quantity::new(7));
        assert_eq!(order.filled_quantity(), Quantity::new(3));
        assert!(order.check_invariant());

        // Complete fill
        order.apply_fill(Quantity::new(7), 1708123456791000000).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.is_filled());
        assert!(order.check_invariant());
        assert_eq!(order.version, 2);
    }

    #[test]
    fn test_order_overfill_rejected() {
        let mut order = create_order(OrderType::Sell, 5);

        let err = order.apply_fill(Quantity::new(6), 1708123456790000000).unwrap_err();
        assert!(matches!(err, OrderError::Overfill { fill: 6, remaining: 5, .. }));
        assert_eq!(order.remaining_quantity, Quantity::new(5));
        assert_eq!(order.status, OrderStatus::Open);
    }

    #[test]
    fn test_order_cancel() {
        let mut order = create_order(OrderType::Buy, 10);
        order.apply_fill(Quantity::new(4), 1708123456790000000).unwrap();

        order.cancel(CancelReason::UserRequested, 1708123456791000000).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled(CancelReason::UserRequested));
        assert!(order.status.is_terminal());
        assert_eq!(order.remaining_quantity, Quantity::new(6));
        assert!(order.check_invariant());
    }

    #[test]
    fn test_cancel_terminal_rejected() {
        let mut order = create_order(OrderType::Buy, 10);
        order.apply_fill(Quantity::new(10), 1708123456790000000).unwrap();

        let err = order.cancel(CancelReason::UserRequested, 1708123456791000000).unwrap_err();
        assert!(matches!(err, OrderError::NotCancellable { .. }));
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[test]
    fn test_fill_after_cancel_rejected() {
        let mut order = create_order(OrderType::Sell, 10);
        order.cancel(CancelReason::UserRequested, 1708123456790000000).unwrap();

        let err = order.apply_fill(Quantity::new(1), 1708123456791000000).unwrap_err();
        assert!(matches!(err, OrderError::NotFillable { .. }));
    }

    #[test]
    fn test_request_validation() {
        assert!(OrderRequest::buy(1, 1001, 10, 150).validate().is_ok());

        let zero_qty = OrderRequest::buy(1, 1001, 0, 150).validate().unwrap_err();
        assert!(matches!(zero_qty, OrderError::InvalidQuantity(_)));

        let zero_price = OrderRequest::sell(1, 1001, 10, 0).validate().unwrap_err();
        assert!(matches!(zero_price, OrderError::InvalidPrice(_)));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(OrderStatus::Open.to_string(), "OPEN");
        assert_eq!(OrderStatus::PartiallyFilled.to_string(), "PARTIALLY_FILLED");
        assert_eq!(OrderStatus::Filled.to_string(), "FILLED");
        assert_eq!(
            OrderStatus::Cancelled(CancelReason::SelfTradePrevention).to_string(),
            "CANCELLED"
        );
    }

    #[test]
    fn test_order_serialization() {
        let order = Order::new(
            UserId::new(2),
            ItemId::new(1001),
            OrderType::Sell,
            "140.25".parse().unwrap(),
            Quantity::new(5),
            1708123456789000000,
        );

        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(order, deserialized);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_fills_keep_invariant(qty in 1u64..1_000, fills in prop::collection::vec(1u64..200, 0..20)) {
                let mut order = create_order(OrderType::Buy, qty);
                let mut accepted = 0u64;

                for (i, f) in fills.into_iter().enumerate() {
                    let before = order.remaining_quantity;
                    match order.apply_fill(Quantity::new(f), 1708123456790000000 + i as i64) {
                        Ok(()) => accepted += f,
                        Err(_) => prop_assert_eq!(order.remaining_quantity, before),
                    }
                    prop_assert!(order.check_invariant());
                    prop_assert!(order.remaining_quantity <= order.quantity);
                }

                prop_assert_eq!(order.filled_quantity().value(), accepted);
                prop_assert_eq!(order.is_filled(), accepted == qty);
            }
        }
    }
}
