//! Journal-backed engine: restart and torn-tail recovery

use matching_engine::{EngineConfig, MatchingEngine};
use persistence::{JournalConfig, JournalStorage};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use types::ids::ItemId;
use types::numeric::{Price, Quantity};
use types::order::{OrderRequest, OrderStatus};

fn open_engine(path: &Path) -> MatchingEngine {
    let storage = JournalStorage::open(JournalConfig::new(path)).unwrap();
    MatchingEngine::recover(EngineConfig::default(), Arc::new(storage)).unwrap()
}

#[test]
fn test_restart_restores_books_and_registry() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("exchange.journal");

    let (resting_buy, cancelled) = {
        let engine = open_engine(&path);
        let buy = engine.place_order(OrderRequest::buy(1, 1001, 10, 150)).unwrap();
        engine.place_order(OrderRequest::sell(2, 1001, 5, 140)).unwrap();
        let doomed = engine.place_order(OrderRequest::sell(3, 1002, 4, 300)).unwrap();
        engine.cancel_order(&doomed.order.order_id).unwrap();
        (buy.order.order_id, doomed.order.order_id)
    };

    let engine = open_engine(&path);
    assert_eq!(engine.list_orders().len(), 3);
    assert_eq!(
        engine.get_order(&resting_buy).unwrap().status,
        OrderStatus::PartiallyFilled
    );
    assert!(matches!(
        engine.get_order(&cancelled).unwrap().status,
        OrderStatus::Cancelled(_)
    ));

    let book = engine.order_book(ItemId::new(1001), 5).unwrap().unwrap();
    assert_eq!(book.bids, vec![(Price::from_u64(150), Quantity::new(5))]);
    assert!(engine
        .order_book(ItemId::new(1002), 5)
        .unwrap()
        .map_or(true, |b| b.asks.is_empty()));

    // Matching continues against the recovered book
    let sell = engine.place_order(OrderRequest::sell(4, 1001, 5, 150)).unwrap();
    assert_eq!(sell.fills.len(), 1);
    assert_eq!(sell.fills[0].maker_order_id, resting_buy);
    assert_eq!(sell.fills[0].sequence, 2);
    assert!(sell.fills[0].executed_at > engine.get_order(&cancelled).unwrap().updated_at);
}

#[test]
fn test_torn_tail_loses_only_last_commit() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("exchange.journal");

    let kept = {
        let engine = open_engine(&path);
        engine.place_order(OrderRequest::sell(1, 1001, 5, 100)).unwrap().order.order_id
    };
    let intact = fs::metadata(&path).unwrap().len();

    {
        let engine = open_engine(&path);
        engine.place_order(OrderRequest::buy(2, 1001, 5, 100)).unwrap();
    }

    // Chop the second commit in half
    let full = fs::metadata(&path).unwrap().len();
    let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(intact + (full - intact) / 2).unwrap();
    drop(file);

    let engine = open_engine(&path);
    assert_eq!(fs::metadata(&path).unwrap().len(), intact);
    assert_eq!(engine.list_orders().len(), 1);
    assert_eq!(engine.get_order(&kept).unwrap().status, OrderStatus::Open);
    assert!(engine.list_fills().unwrap().is_empty());

    // Appends after truncation are readable on the next restart
    engine.place_order(OrderRequest::buy(3, 1001, 2, 100)).unwrap();
    drop(engine);

    let engine = open_engine(&path);
    assert_eq!(engine.list_orders().len(), 2);
    assert_eq!(
        engine.get_order_remaining_quantity(&kept).unwrap(),
        Quantity::new(3)
    );
}

#[test]
fn test_garbage_after_valid_frames_is_dropped() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("exchange.journal");

    {
        let engine = open_engine(&path);
        engine.place_order(OrderRequest::buy(1, 1001, 1, 10)).unwrap();
    }
    let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(b"not a frame at all").unwrap();
    drop(file);

    let engine = open_engine(&path);
    assert_eq!(engine.list_orders().len(), 1);
}
