use std::sync::Arc;

use shared::{
    error::StorefrontError,
    protocol::{FinalizedOrder, StorefrontEvent},
};
use storage::KeyValueStore;
use tokio::sync::broadcast;
use tracing::info;

pub mod auth;
pub mod checkout;
pub mod order_book;
pub mod selection;

pub use auth::Authenticator;
pub use checkout::{complete_transaction, load_confirmation, CheckoutFlow, CheckoutState};
pub use order_book::{OrderBook, QuantityChange};
pub use selection::{MenuTile, OrderSession};

const EVENT_CAPACITY: usize = 256;

/// Wires the screens to the persistent store, the session store and the event stream.
#[derive(Clone)]
pub struct Storefront {
    store: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StorefrontEvent>,
}

impl Storefront {
    pub fn new(store: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            session,
            events,
        }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StorefrontEvent> {
        self.events.subscribe()
    }

    pub fn auth(&self) -> Authenticator {
        Authenticator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.session),
            self.events.clone(),
        )
    }

    /// Starts an empty ingredient selection.
    pub fn start_order(&self) -> OrderSession {
        info!("storefront: ingredient selection started");
        OrderSession::new(self.events.clone())
    }

    /// Opens the checkout screen for whatever order was last handed over.
    pub async fn open_checkout(&self) -> Result<CheckoutFlow, StorefrontError> {
        let mut flow = CheckoutFlow::new(self.events.clone());
        flow.load_order(self.store.as_ref()).await?;
        Ok(flow)
    }

    /// Submits the checkout on behalf of the signed-in user, if any.
    pub async fn submit_checkout(
        &self,
        flow: &CheckoutFlow,
    ) -> Result<FinalizedOrder, StorefrontError> {
        let customer = self.auth().current_user().await?.map(|session| session.email);
        flow.submit(self.store.as_ref(), customer).await
    }

    pub async fn confirmation(&self) -> Result<OrderBook, StorefrontError> {
        load_confirmation(self.store.as_ref()).await
    }

    pub async fn finish(&self) -> Result<(), StorefrontError> {
        complete_transaction(self.store.as_ref()).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
