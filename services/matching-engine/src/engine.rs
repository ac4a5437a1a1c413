//! Matching engine core
//!
//! Main coordinator for order books, the order registry and storage.
//!
//! Each item's book sits behind its own mutex, held for the whole of a
//! `place_order` or `cancel_order` call: crossing, storage commit and
//! registry write. Calls for different items run in parallel.

use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};
use types::errors::EngineError;
use types::fill::Fill;
use types::filter::OrderFilter;
use types::ids::{ItemId, OrderId};
use types::numeric::Quantity;
use types::order::{CancelReason, Order, OrderRequest};
use types::storage::StorageAdapter;

use crate::book::{OrderBook, OrderBookSnapshot};
use crate::clock::MonotonicClock;
use crate::config::{EngineConfig, SelfTradePolicy};
use crate::matching::{crossing, FillExecutor};
use crate::registry::OrderRegistry;

/// Main matching engine
pub struct MatchingEngine {
    config: EngineConfig,
    /// Order books per item
    books: DashMap<ItemId, Arc<Mutex<OrderBook>>>,
    registry: OrderRegistry,
    /// Fill executor with sequence generation
    executor: FillExecutor,
    clock: MonotonicClock,
    storage: Arc<dyn StorageAdapter>,
}

/// Result of placing an order
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitResult {
    /// Incoming order after crossing
    pub order: Order,
    /// Fills in execution order
    pub fills: Vec<Fill>,
}

impl SubmitResult {
    /// Order was completely filled on arrival
    pub fn is_filled(&self) -> bool {
        self.order.is_filled()
    }

    /// Order (or its remainder) now rests in the book
    pub fn is_resting(&self) -> bool {
        self.order.is_live()
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.order.filled_quantity()
    }
}

/// Book changes made by one crossing loop, kept for commit or rollback
#[derive(Debug, Default)]
struct CrossOutcome {
    fills: Vec<Fill>,
    /// Resting orders as they were before this call touched them
    makers_before: Vec<Order>,
    /// The same orders after their fills
    makers_after: Vec<Order>,
    /// Crossing stopped at a resting order from the same user
    self_trade_halt: bool,
}

impl MatchingEngine {
    /// Create an empty engine on top of the given storage
    pub fn new(config: EngineConfig, storage: Arc<dyn StorageAdapter>) -> Self {
        info!(
            self_trade_policy = ?config.self_trade_policy,
            starting_fill_sequence = config.starting_fill_sequence,
            "MatchingEngine initialized"
        );

        Self {
            executor: FillExecutor::new(config.starting_fill_sequence),
            config,
            books: DashMap::new(),
            registry: OrderRegistry::new(),
            clock: MonotonicClock::new(),
            storage,
        }
    }

    /// Rebuild an engine from everything the storage holds.
    ///
    /// Live orders go back into their books in time priority. The fill
    /// sequence continues after the highest stored fill.
    pub fn recover(config: EngineConfig, storage: Arc<dyn StorageAdapter>) -> Result<Self, EngineError> {
        let orders = storage.list_orders()?;
        let fills = storage.list_fills()?;

        let next_sequence = fills
            .iter()
            .map(|fill| fill.sequence + 1)
            .max()
            .unwrap_or(config.starting_fill_sequence)
            .max(config.starting_fill_sequence);

        let engine = Self::new(
            EngineConfig {
                starting_fill_sequence: next_sequence,
                ..config
            },
            storage,
        );

        let mut resting = 0usize;
        for order in &orders {
            engine.clock.advance_to(order.created_at.max(order.updated_at));
            if order.is_live() {
                let book = engine.book_for(order.item_id);
                let mut book = lock_book(&book, order.item_id)?;
                if book.insert(order.clone())? {
                    resting += 1;
                }
            }
        }
        for fill in &fills {
            engine.clock.advance_to(fill.executed_at);
        }
        engine.registry.upsert_all(orders.iter().cloned());

        info!(
            orders = orders.len(),
            resting,
            fills = fills.len(),
            next_fill_sequence = next_sequence,
            "MatchingEngine recovered from storage"
        );

        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Submit an order to the matching engine
    ///
    /// This is the main entry point. The order is crossed against the
    /// opposite side of its item's book and any remainder rests in the
    /// book. Order ids are assigned here, so a retried call creates a second
    /// order.
    pub fn place_order(&self, request: OrderRequest) -> Result<SubmitResult, EngineError> {
        request.validate()?;

        let book = self.book_for(request.item_id);
        let mut book = lock_book(&book, request.item_id)?;

        let mut order = Order::from_request(&request, self.clock.now());
        info!(
            order_id = %order.order_id,
            user_id = %order.user_id,
            item_id = %order.item_id,
            order_type = %order.order_type,
            quantity = %order.quantity,
            price = %order.price,
            "Order received"
        );

        let mut outcome = CrossOutcome::default();
        if let Err(err) = self.cross(&mut book, &mut order, &mut outcome) {
            error!(order_id = %order.order_id, error = %err, "Crossing failed");
            Self::rollback(&mut book, &order.order_id, &outcome.makers_before);
            return Err(err);
        }

        if outcome.self_trade_halt && !order.remaining_quantity.is_zero() {
            if let Err(err) = order.cancel(CancelReason::SelfTradePrevention, self.clock.now()) {
                Self::rollback(&mut book, &order.order_id, &outcome.makers_before);
                return Err(err.into());
            }
            info!(
                order_id = %order.order_id,
                remaining = %order.remaining_quantity,
                "Self-trade prevention cancelled incoming remainder"
            );
        }

        match book.insert(order.clone()) {
            Ok(true) => info!(
                order_id = %order.order_id,
                status = %order.status,
                remaining = %order.remaining_quantity,
                "Order resting"
            ),
            Ok(false) => {}
            Err(err) => {
                warn!(order_id = %order.order_id, error = %err, "Order cannot rest, rolling back order book");
                Self::rollback(&mut book, &order.order_id, &outcome.makers_before);
                return Err(err.into());
            }
        }

        let mut touched = Vec::with_capacity(outcome.makers_after.len() + 1);
        touched.push(order.clone());
        touched.extend(outcome.makers_after);

        if let Err(err) = self.storage.commit(&touched, &outcome.fills) {
            warn!(
                order_id = %order.order_id,
                fills = outcome.fills.len(),
                error = %err,
                "Storage commit failed, rolling back order book"
            );
            Self::rollback(&mut book, &order.order_id, &outcome.makers_before);
            return Err(err.into());
        }

        self.registry.upsert_all(touched);

        Ok(SubmitResult {
            order,
            fills: outcome.fills,
        })
    }

    /// Crossing loop: match `order` against the best opposite orders while
    /// prices cross and quantity remains.
    fn cross(
        &self,
        book: &mut OrderBook,
        order: &mut Order,
        outcome: &mut CrossOutcome,
    ) -> Result<(), EngineError> {
        while !order.remaining_quantity.is_zero() {
            let resting = match book.best_opposite(order.order_type) {
                Some(resting) => resting.clone(),
                None => break,
            };

            if !crossing::incoming_can_match(order.order_type, order.price, resting.price) {
                break;
            }

            if resting.user_id == order.user_id
                && self.config.self_trade_policy == SelfTradePolicy::CancelNewest
            {
                outcome.self_trade_halt = true;
                break;
            }

            let quantity = order.remaining_quantity.min(resting.remaining_quantity);
            let timestamp = self.clock.now();

            let maker = book.fill_resting(&resting.order_id, quantity, timestamp)?;
            outcome.makers_before.push(resting);
            order.apply_fill(quantity, timestamp)?;

            let fill = self.executor.execute(&maker, order, quantity, timestamp);
            debug!(
                sequence = fill.sequence,
                item_id = %fill.item_id,
                maker_order_id = %fill.maker_order_id,
                taker_order_id = %fill.taker_order_id,
                price = %fill.price,
                quantity = %fill.quantity,
                "Fill executed"
            );

            outcome.fills.push(fill);
            outcome.makers_after.push(maker);
        }

        Ok(())
    }

    /// Put the book back the way it was before the current call
    fn rollback(book: &mut OrderBook, incoming_id: &OrderId, makers_before: &[Order]) {
        book.remove(incoming_id);
        for maker in makers_before {
            book.remove(&maker.order_id);
            if let Err(err) = book.insert(maker.clone()) {
                error!(order_id = %maker.order_id, error = %err, "Could not restore resting order");
            }
        }
    }

    /// Cancel a resting order
    pub fn cancel_order(&self, order_id: &OrderId) -> Result<Order, EngineError> {
        let item_id = self.registry.get(order_id)?.item_id;
        let book = self.book_for(item_id);
        let mut book = lock_book(&book, item_id)?;

        // Re-read under the item lock; a fill may have landed in between
        let mut order = self.registry.get(order_id)?;
        order.cancel(CancelReason::UserRequested, self.clock.now())?;

        let removed = book.remove(order_id);

        if let Err(err) = self.storage.commit(std::slice::from_ref(&order), &[]) {
            warn!(order_id = %order_id, error = %err, "Storage commit failed, restoring cancelled order");
            if let Some(resting) = removed {
                if let Err(restore) = book.insert(resting) {
                    error!(order_id = %order_id, error = %restore, "Could not restore resting order");
                }
            }
            return Err(err.into());
        }

        self.registry.upsert(order.clone());
        info!(
            order_id = %order_id,
            remaining = %order.remaining_quantity,
            "Order cancelled"
        );

        Ok(order)
    }

    pub fn get_order(&self, order_id: &OrderId) -> Result<Order, EngineError> {
        Ok(self.registry.get(order_id)?)
    }

    pub fn get_order_remaining_quantity(&self, order_id: &OrderId) -> Result<Quantity, EngineError> {
        Ok(self.registry.remaining_quantity(order_id)?)
    }

    /// Every order in acceptance order
    pub fn list_orders(&self) -> Vec<Order> {
        self.registry.list_all()
    }

    pub fn list_orders_for_item(&self, item_id: ItemId) -> Vec<Order> {
        self.registry.list_for_item(item_id)
    }

    /// Orders matching every criterion set in `filter`, in acceptance order
    pub fn query_orders(&self, filter: &OrderFilter) -> Vec<Order> {
        self.registry.query(filter)
    }

    /// Every fill the storage has recorded
    pub fn list_fills(&self) -> Result<Vec<Fill>, EngineError> {
        Ok(self.storage.list_fills()?)
    }

    /// Fills in which the order was maker or taker, in execution order.
    ///
    /// An order the engine never accepted is `NotFound`; an accepted order
    /// that has not traded has no fills.
    pub fn list_fills_for_order(&self, order_id: &OrderId) -> Result<Vec<Fill>, EngineError> {
        self.registry.get(order_id)?;
        Ok(self.storage.list_fills_for_order(order_id)?)
    }

    /// Get order book snapshot
    pub fn order_book(&self, item_id: ItemId, depth: usize) -> Result<Option<OrderBookSnapshot>, EngineError> {
        let book = match self.books.get(&item_id) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(None),
        };
        let book = lock_book(&book, item_id)?;
        Ok(Some(book.depth_snapshot(depth)))
    }

    /// Get or create the book for an item
    fn book_for(&self, item_id: ItemId) -> Arc<Mutex<OrderBook>> {
        if let Some(entry) = self.books.get(&item_id) {
            return Arc::clone(entry.value());
        }
        Arc::clone(
            self.books
                .entry(item_id)
                .or_insert_with(|| Arc::new(Mutex::new(OrderBook::new(item_id))))
                .value(),
        )
    }
}

fn lock_book(book: &Mutex<OrderBook>, item_id: ItemId) -> Result<MutexGuard<'_, OrderBook>, EngineError> {
    book.lock().map_err(|_| EngineError::System {
        message: format!("order book for item {} is poisoned", item_id),
    })
}
