//! Fill generation
//!
//! Turns one crossing step into a `Fill` record with an engine-wide
//! sequence number.

use std::sync::atomic::{AtomicU64, Ordering};
use types::fill::Fill;
use types::numeric::Quantity;
use types::order::Order;

/// Match executor for handling fill generation
///
/// Shared by every item's crossing loop, so the sequence counter is atomic.
/// Numbers handed out to a call that is later rolled back are not reused.
#[derive(Debug)]
pub struct FillExecutor {
    sequence_counter: AtomicU64,
}

impl FillExecutor {
    /// Create a new match executor with starting sequence number
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence_counter: AtomicU64::new(starting_sequence),
        }
    }

    /// Get next sequence number (monotonically increasing)
    fn next_sequence(&self) -> u64 {
        self.sequence_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Sequence number the next fill will receive
    pub fn peek_sequence(&self) -> u64 {
        self.sequence_counter.load(Ordering::SeqCst)
    }

    /// Record a fill between a resting maker and an incoming taker.
    ///
    /// The execution price is the maker's price.
    pub fn execute(&self, maker: &Order, taker: &Order, quantity: Quantity, timestamp: i64) -> Fill {
        Fill::new(
            self.next_sequence(),
            maker.item_id,
            maker.order_id,
            taker.order_id,
            maker.user_id,
            taker.user_id,
            taker.order_type,
            maker.price,
            quantity,
            timestamp,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{ItemId, UserId};
    use types::numeric::Price;
    use types::order::OrderType;

    fn order(user: u64, order_type: OrderType, price: u64) -> Order {
        Order::new(
            UserId::new(user),
            ItemId::new(1001),
            order_type,
            Price::from_u64(price),
            Quantity::new(10),
            1708123456789000000,
        )
    }

    #[test]
    fn test_execute_uses_maker_price() {
        let executor = FillExecutor::new(1000);
        let maker = order(1, OrderType::Buy, 150);
        let taker = order(2, OrderType::Sell, 140);

        let fill = executor.execute(&maker, &taker, Quantity::new(5), 1708123456790000000);

        assert_eq!(fill.sequence, 1000);
        assert_eq!(fill.price, Price::from_u64(150));
        assert_eq!(fill.quantity, Quantity::new(5));
        assert_eq!(fill.maker_order_id, maker.order_id);
        assert_eq!(fill.taker_order_id, taker.order_id);
        assert_eq!(fill.taker_side, OrderType::Sell);
    }

    #[test]
    fn test_sequence_monotonic() {
        let executor = FillExecutor::new(1000);
        let maker = order(1, OrderType::Sell, 100);
        let taker = order(2, OrderType::Buy, 100);

        let fill1 = executor.execute(&maker, &taker, Quantity::new(1), 1);
        let fill2 = executor.execute(&maker, &taker, Quantity::new(1), 2);

        assert_eq!(fill1.sequence, 1000);
        assert_eq!(fill2.sequence, 1001);
        assert_eq!(executor.peek_sequence(), 1002);
    }
}
