//! Ingredient-selection screen controller.

use shared::{
    domain::{Group, Price},
    error::StorefrontError,
    protocol::{keys, OrderSnapshot, OrderView, StorefrontEvent},
};
use storage::{save_json, KeyValueStore};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::order_book::{OrderBook, QuantityChange};

/// A menu entry as the screen describes it: raw name, price text and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTile {
    pub name: String,
    pub price: String,
    pub category: String,
}

impl MenuTile {
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            category: category.into(),
        }
    }

    pub fn parse(&self) -> Result<(Group, Price), StorefrontError> {
        Ok((self.category.parse()?, self.price.parse()?))
    }
}

/// Owns the order being built and publishes a fresh view after every change.
pub struct OrderSession {
    book: OrderBook,
    events: broadcast::Sender<StorefrontEvent>,
}

impl OrderSession {
    pub fn new(events: broadcast::Sender<StorefrontEvent>) -> Self {
        Self {
            book: OrderBook::new(),
            events,
        }
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn view(&self) -> OrderView {
        self.book.view()
    }

    pub fn select_tile(&mut self, tile: &MenuTile) -> Result<u32, StorefrontError> {
        let (group, price) = tile.parse()?;
        self.add_item(group, &tile.name, price)
    }

    pub fn add_item(
        &mut self,
        group: Group,
        name: &str,
        unit_price: Price,
    ) -> Result<u32, StorefrontError> {
        let quantity = self.book.add_item(group, name, unit_price)?;
        debug!(%group, item = name, quantity, "order: item added");
        self.publish();
        Ok(quantity)
    }

    pub fn increase(&mut self, group: Group, name: &str) -> QuantityChange {
        let change = self.book.increment(group, name);
        self.after_press(group, name, change);
        change
    }

    pub fn decrease(&mut self, group: Group, name: &str) -> QuantityChange {
        let change = self.book.decrement(group, name);
        self.after_press(group, name, change);
        change
    }

    /// Discards the current selection ("another bowl").
    pub fn start_new_bowl(&mut self) {
        self.book.clear();
        info!("order: selection cleared for a new bowl");
        self.publish();
    }

    /// Hands the order to the checkout screen by writing the `orderData` snapshot.
    pub async fn proceed_to_checkout(
        &self,
        store: &dyn KeyValueStore,
    ) -> Result<OrderSnapshot, StorefrontError> {
        if self.book.is_empty() {
            return Err(StorefrontError::MissingOrder);
        }
        let snapshot = self.book.snapshot();
        save_json(store, keys::ORDER_DATA, &snapshot)
            .await
            .map_err(StorefrontError::storage)?;
        info!(
            items = self.book.item_count(),
            total = %self.book.order_total(),
            "order: snapshot handed to checkout"
        );
        Ok(snapshot)
    }

    fn after_press(&self, group: Group, name: &str, change: QuantityChange) {
        if change.is_effective() {
            debug!(%group, item = name, ?change, "order: quantity changed");
            self.publish();
        } else {
            debug!(%group, item = name, "order: ignoring press for item not in order");
        }
    }

    fn publish(&self) {
        let _ = self.events.send(StorefrontEvent::OrderUpdated(self.book.view()));
    }
}
