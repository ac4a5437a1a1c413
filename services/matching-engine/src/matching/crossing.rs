//! Crossing detection logic
//!
//! Determines when a bid and ask can match based on price compatibility

use types::numeric::Price;
use types::order::OrderType;

/// Check if a bid and ask can match at given prices
///
/// For a buy order to match with a sell order the buy price must be
/// greater than or equal to the sell price.
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming order can match against a resting order
///
/// Returns true if the incoming order price crosses the resting order price
pub fn incoming_can_match(incoming_type: OrderType, incoming_price: Price, resting_price: Price) -> bool {
    match incoming_type {
        OrderType::Buy => can_match(incoming_price, resting_price),
        OrderType::Sell => can_match(resting_price, incoming_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_match_crossing() {
        let bid = Price::from_u64(150);
        let ask = Price::from_u64(140);
        assert!(can_match(bid, ask), "Bid >= ask should match");
    }

    #[test]
    fn test_can_match_exact() {
        let price = Price::from_u64(150);
        assert!(can_match(price, price), "Equal prices should match");
    }

    #[test]
    fn test_can_match_no_cross() {
        let bid = Price::from_u64(90);
        let ask = Price::from_u64(100);
        assert!(!can_match(bid, ask), "Bid < ask should not match");
    }

    #[test]
    fn test_incoming_buy_can_match() {
        assert!(incoming_can_match(OrderType::Buy, Price::from_u64(150), Price::from_u64(140)));
        assert!(!incoming_can_match(OrderType::Buy, Price::from_u64(90), Price::from_u64(100)));
    }

    #[test]
    fn test_incoming_sell_can_match() {
        assert!(incoming_can_match(OrderType::Sell, Price::from_u64(140), Price::from_u64(150)));
        assert!(!incoming_can_match(OrderType::Sell, Price::from_u64(160), Price::from_u64(150)));
    }
}
