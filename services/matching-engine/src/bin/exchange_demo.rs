use std::sync::Arc;

use matching_engine::{EngineConfig, MatchingEngine};
use persistence::{JournalConfig, JournalStorage, MemoryStorage};
use types::order::OrderRequest;
use types::storage::StorageAdapter;

/// Journal file to use instead of in-memory storage
const JOURNAL_PATH_ENV: &str = "EXCHANGE_JOURNAL_PATH";

fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = EngineConfig::from_env()?;

    let engine = match std::env::var(JOURNAL_PATH_ENV) {
        Ok(path) => {
            tracing::info!(path = %path, "Using journal storage");
            let storage: Arc<dyn StorageAdapter> = Arc::new(JournalStorage::open(JournalConfig::new(path))?);
            MatchingEngine::recover(config, storage)?
        }
        Err(_) => MatchingEngine::new(config, Arc::new(MemoryStorage::new())),
    };

    let buy = engine.place_order(OrderRequest::buy(1, 1001, 10, 150))?;
    let sell_low = engine.place_order(OrderRequest::sell(2, 1001, 5, 140))?;
    let sell_at = engine.place_order(OrderRequest::sell(3, 1001, 5, 150))?;
    let sell_other = engine.place_order(OrderRequest::sell(4, 1002, 10, 200))?;

    for placed in [&buy, &sell_low, &sell_at, &sell_other] {
        let order_id = placed.order.order_id;
        let order = engine.get_order(&order_id)?;
        tracing::info!(
            order_id = %order_id,
            item_id = %order.item_id,
            order_type = %order.order_type,
            status = %order.status,
            remaining = %engine.get_order_remaining_quantity(&order_id)?,
            "Order state"
        );
    }

    for fill in engine.list_fills()? {
        tracing::info!(
            sequence = fill.sequence,
            item_id = %fill.item_id,
            price = %fill.price,
            quantity = %fill.quantity,
            "Fill"
        );
    }

    Ok(())
}
