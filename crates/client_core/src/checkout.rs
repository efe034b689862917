//! Checkout screen: `AwaitingOrder -> AwaitingLocation -> ReadyToSubmit`.

use chrono::Utc;
use shared::{
    domain::{is_catalog_location, Location, LocationId},
    error::StorefrontError,
    protocol::{keys, FinalizedOrder, OrderSnapshot, OrderView, StorefrontEvent},
};
use storage::{save_json, KeyValueStore};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::order_book::OrderBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    AwaitingOrder,
    AwaitingLocation,
    ReadyToSubmit,
}

pub struct CheckoutFlow {
    order: Option<OrderBook>,
    events: broadcast::Sender<StorefrontEvent>,
}

impl CheckoutFlow {
    pub fn new(events: broadcast::Sender<StorefrontEvent>) -> Self {
        Self {
            order: None,
            events,
        }
    }

    pub fn state(&self) -> CheckoutState {
        match &self.order {
            None => CheckoutState::AwaitingOrder,
            Some(book) if book.pickup_location().is_none() => CheckoutState::AwaitingLocation,
            Some(_) => CheckoutState::ReadyToSubmit,
        }
    }

    pub fn order(&self) -> Option<&OrderBook> {
        self.order.as_ref()
    }

    pub fn view(&self) -> Option<OrderView> {
        self.order.as_ref().map(OrderBook::view)
    }

    /// Reads the order handed over by the selection screen.
    ///
    /// An absent, unreadable or empty order leaves the flow in `AwaitingOrder`
    /// and yields `MissingOrder`.
    pub async fn load_order(
        &mut self,
        store: &dyn KeyValueStore,
    ) -> Result<CheckoutState, StorefrontError> {
        self.order = None;
        let Some(raw) = read_stored(store, keys::ORDER_DATA).await? else {
            info!("checkout: no order data stored");
            return Err(StorefrontError::MissingOrder);
        };
        let snapshot = match serde_json::from_str::<OrderSnapshot>(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "checkout: stored order data is unreadable");
                return Err(StorefrontError::MissingOrder);
            }
        };

        let book = match OrderBook::from_snapshot(snapshot) {
            Ok(book) => book,
            Err(err) => {
                warn!(error = %err, "checkout: stored order data violates order invariants");
                return Err(StorefrontError::MissingOrder);
            }
        };
        if book.is_empty() {
            info!("checkout: stored order has no items");
            return Err(StorefrontError::MissingOrder);
        }

        info!(
            items = book.item_count(),
            total = %book.order_total(),
            "checkout: order loaded"
        );
        let _ = self.events.send(StorefrontEvent::OrderUpdated(book.view()));
        self.order = Some(book);
        Ok(self.state())
    }

    pub fn select_location(&mut self, id: LocationId) -> Result<Location, StorefrontError> {
        let book = self.order.as_mut().ok_or(StorefrontError::MissingOrder)?;
        let location = book.set_pickup_location(id)?.clone();
        info!(
            location_id = location.id.0,
            name = %location.name,
            "checkout: pickup location selected"
        );
        let _ = self
            .events
            .send(StorefrontEvent::LocationSelected(location.clone()));
        Ok(location)
    }

    /// Finalizes the order and records the chosen location under `selectedLocation`.
    pub async fn submit(
        &self,
        store: &dyn KeyValueStore,
        customer: Option<String>,
    ) -> Result<FinalizedOrder, StorefrontError> {
        let result = self.try_submit(store, customer).await;
        if let Err(err) = &result {
            let _ = self.events.send(StorefrontEvent::Error(err.report()));
        }
        result
    }

    async fn try_submit(
        &self,
        store: &dyn KeyValueStore,
        customer: Option<String>,
    ) -> Result<FinalizedOrder, StorefrontError> {
        let book = self.order.as_ref().ok_or(StorefrontError::MissingOrder)?;
        let location = book
            .pickup_location()
            .cloned()
            .ok_or(StorefrontError::LocationRequired)?;

        save_json(store, keys::SELECTED_LOCATION, &location)
            .await
            .map_err(StorefrontError::storage)?;

        let finalized = FinalizedOrder::new(book.snapshot(), location, customer, Utc::now());
        info!(
            location_id = finalized.location.id.0,
            total = %finalized.order_total,
            "checkout: order submitted"
        );
        let _ = self
            .events
            .send(StorefrontEvent::CheckoutSubmitted(finalized.clone()));
        Ok(finalized)
    }
}

/// Store failures surface as `Storage`; only absent keys count as missing state.
async fn read_stored(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<String>, StorefrontError> {
    store.get(key).await.map_err(StorefrontError::storage)
}

/// Rebuilds the submitted order (with its pickup location) for the confirmation screen.
pub async fn load_confirmation(store: &dyn KeyValueStore) -> Result<OrderBook, StorefrontError> {
    let raw = read_stored(store, keys::ORDER_DATA)
        .await?
        .ok_or(StorefrontError::MissingOrder)?;
    let snapshot = serde_json::from_str::<OrderSnapshot>(&raw)
        .map_err(|_| StorefrontError::MissingOrder)?;
    let mut book =
        OrderBook::from_snapshot(snapshot).map_err(|_| StorefrontError::MissingOrder)?;
    if book.is_empty() {
        return Err(StorefrontError::MissingOrder);
    }

    let raw = read_stored(store, keys::SELECTED_LOCATION)
        .await?
        .ok_or(StorefrontError::LocationRequired)?;
    let location = serde_json::from_str::<Location>(&raw)
        .map_err(|_| StorefrontError::LocationRequired)?;
    if !is_catalog_location(&location) {
        return Err(StorefrontError::invalid_input(format!(
            "stored location '{}' is not a pickup location",
            location.name
        )));
    }
    book.set_pickup_location(location.id)?;
    Ok(book)
}

/// Discards the hand-off state once the transaction is done.
pub async fn complete_transaction(store: &dyn KeyValueStore) -> Result<(), StorefrontError> {
    for key in [keys::ORDER_DATA, keys::SELECTED_LOCATION] {
        store.remove(key).await.map_err(StorefrontError::storage)?;
    }
    info!("checkout: transaction completed, order state discarded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{
        domain::{pickup_locations, Group, Price},
        error::ErrorCode,
    };
    use storage::{load_json, MemoryStore};

    /// Store whose reads fail, as a locked or unreachable database would.
    struct UnreadableStore;

    #[async_trait::async_trait]
    impl KeyValueStore for UnreadableStore {
        async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("disk I/O error")
        }

        async fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    async fn store_with_order() -> MemoryStore {
        let store = MemoryStore::new();
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Chicken", Price::from_cents(350))
            .expect("add");
        book.add_item(Group::Sauces, "Teriyaki", Price::from_cents(50))
            .expect("add");
        save_json(&store, keys::ORDER_DATA, &book.snapshot())
            .await
            .expect("save");
        store
    }

    fn flow() -> (CheckoutFlow, broadcast::Receiver<StorefrontEvent>) {
        let (events, rx) = broadcast::channel(16);
        (CheckoutFlow::new(events), rx)
    }

    #[tokio::test]
    async fn missing_order_keeps_flow_waiting() {
        let (mut flow, _rx) = flow();
        let store = MemoryStore::new();

        let err = flow.load_order(&store).await.expect_err("no order");
        assert_eq!(err.code(), ErrorCode::MissingOrder);
        assert_eq!(flow.state(), CheckoutState::AwaitingOrder);

        let err = flow.submit(&store, None).await.expect_err("no order");
        assert_eq!(err.code(), ErrorCode::MissingOrder);
    }

    #[tokio::test]
    async fn corrupt_or_empty_order_data_counts_as_missing() {
        let (mut flow, _rx) = flow();
        let store = MemoryStore::new();

        store.set(keys::ORDER_DATA, "{broken").await.expect("set");
        let err = flow.load_order(&store).await.expect_err("corrupt");
        assert_eq!(err.code(), ErrorCode::MissingOrder);

        store
            .set(keys::ORDER_DATA, r#"{"ingredients":{},"sauces":{}}"#)
            .await
            .expect("set");
        let err = flow.load_order(&store).await.expect_err("empty");
        assert_eq!(err.code(), ErrorCode::MissingOrder);
        assert_eq!(flow.state(), CheckoutState::AwaitingOrder);
    }

    #[tokio::test]
    async fn store_read_failures_are_not_reported_as_missing_order() {
        let (mut flow, _rx) = flow();

        let err = flow.load_order(&UnreadableStore).await.expect_err("read fails");
        assert_eq!(err.code(), ErrorCode::Storage);
        assert!(err.to_string().contains("disk I/O error"));
        assert_eq!(flow.state(), CheckoutState::AwaitingOrder);

        let err = load_confirmation(&UnreadableStore)
            .await
            .expect_err("read fails");
        assert_eq!(err.code(), ErrorCode::Storage);
    }

    #[tokio::test]
    async fn submission_requires_location_then_succeeds() {
        let (mut flow, mut rx) = flow();
        let store = store_with_order().await;

        let state = flow.load_order(&store).await.expect("load");
        assert_eq!(state, CheckoutState::AwaitingLocation);

        let err = flow.submit(&store, None).await.expect_err("no location");
        assert_eq!(err.code(), ErrorCode::LocationRequired);
        assert_eq!(store.get(keys::SELECTED_LOCATION).await.expect("get"), None);

        let catalog = pickup_locations();
        flow.select_location(catalog[0].id).expect("select");
        assert_eq!(flow.state(), CheckoutState::ReadyToSubmit);

        let finalized = flow
            .submit(&store, Some("sam@example.com".into()))
            .await
            .expect("submit");
        assert_eq!(finalized.location, catalog[0]);
        assert_eq!(finalized.order_total.cents(), 400);
        assert_eq!(finalized.customer.as_deref(), Some("sam@example.com"));

        let stored: Location = load_json(&store, keys::SELECTED_LOCATION)
            .await
            .expect("load")
            .expect("present");
        assert_eq!(stored, catalog[0]);

        let mut saw_error = false;
        let mut saw_submit = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                StorefrontEvent::Error(report) => {
                    saw_error = report.code == ErrorCode::LocationRequired
                }
                StorefrontEvent::CheckoutSubmitted(_) => saw_submit = true,
                _ => {}
            }
        }
        assert!(saw_error && saw_submit);
    }

    #[tokio::test]
    async fn unknown_location_is_rejected() {
        let (mut flow, _rx) = flow();
        let store = store_with_order().await;
        flow.load_order(&store).await.expect("load");

        let err = flow
            .select_location(LocationId(0))
            .expect_err("not in catalog");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert_eq!(flow.state(), CheckoutState::AwaitingLocation);
    }

    #[tokio::test]
    async fn reselecting_replaces_location() {
        let (mut flow, _rx) = flow();
        let store = store_with_order().await;
        flow.load_order(&store).await.expect("load");

        flow.select_location(LocationId(1)).expect("first");
        flow.select_location(LocationId(3)).expect("second");
        let finalized = flow.submit(&store, None).await.expect("submit");
        assert_eq!(finalized.location.name, "Library Hub");
    }

    #[tokio::test]
    async fn confirmation_reads_back_and_completion_discards() {
        let (mut flow, _rx) = flow();
        let store = store_with_order().await;
        flow.load_order(&store).await.expect("load");

        let err = load_confirmation(&store).await.expect_err("not submitted");
        assert_eq!(err.code(), ErrorCode::LocationRequired);

        flow.select_location(LocationId(2)).expect("select");
        flow.submit(&store, None).await.expect("submit");

        let confirmed = load_confirmation(&store).await.expect("confirmation");
        assert_eq!(
            confirmed.pickup_location().map(|l| l.name.as_str()),
            Some("Student Center")
        );
        assert_eq!(confirmed.order_total().cents(), 400);

        complete_transaction(&store).await.expect("complete");
        assert!(store.is_empty().await);
        let err = load_confirmation(&store).await.expect_err("discarded");
        assert_eq!(err.code(), ErrorCode::MissingOrder);
    }
}
