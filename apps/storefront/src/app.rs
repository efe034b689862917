//! Screen controller: routes commands to the storefront and prints what changed.

use client_core::{auth::display_name, CheckoutFlow, OrderSession, Storefront};
use shared::{domain::pickup_locations, error::StorefrontError, protocol::StorefrontEvent};
use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    commands::{Command, HELP},
    render::{render_event, render_locations, render_order, toast_kind},
};

pub enum Flow {
    Continue,
    Exit,
}

pub struct App {
    storefront: Storefront,
    order: OrderSession,
    checkout: Option<CheckoutFlow>,
    events: broadcast::Receiver<StorefrontEvent>,
}

impl App {
    pub fn new(storefront: Storefront) -> Self {
        let events = storefront.subscribe_events();
        let order = storefront.start_order();
        Self {
            storefront,
            order,
            checkout: None,
            events,
        }
    }

    /// Runs one command and returns the lines to print.
    pub async fn handle(&mut self, command: Command) -> (Flow, Vec<String>) {
        debug!(command = command.name(), "ui: handling command");
        let mut output = Vec::new();
        let flow = match self.dispatch(command, &mut output).await {
            Ok(flow) => flow,
            Err(err) => {
                output.push(format!("[{}] {err}", toast_kind(err.code())));
                Flow::Continue
            }
        };

        let mut rendered = self.drain_events();
        rendered.append(&mut output);
        (flow, rendered)
    }

    fn drain_events(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => lines.extend(render_event(&event)),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "ui: render events lagged");
                }
                Err(_) => break,
            }
        }
        lines
    }

    /// Saves the current selection and opens checkout on it.
    async fn hand_off(&mut self) -> Result<(), StorefrontError> {
        self.checkout = None;
        self.order
            .proceed_to_checkout(self.storefront.store())
            .await?;
        self.checkout = Some(self.storefront.open_checkout().await?);
        Ok(())
    }

    /// An open checkout holds a copy of the order; editing the bowl invalidates it.
    fn discard_checkout(&mut self) {
        if self.checkout.take().is_some() {
            debug!("ui: selection changed, checkout reopened on next order");
        }
    }

    async fn dispatch(
        &mut self,
        command: Command,
        output: &mut Vec<String>,
    ) -> Result<Flow, StorefrontError> {
        match command {
            Command::SignUp { email, password } => {
                self.storefront.auth().sign_up(&email, &password).await?;
                output.push("[success] Account created successfully!".into());
            }
            Command::Login { email, password } => {
                self.storefront.auth().login(&email, &password).await?;
            }
            Command::Logout => self.storefront.auth().logout().await?,
            Command::WhoAmI => match self.storefront.auth().current_user().await? {
                Some(session) => output.push(format!(
                    "{} (signed in {})",
                    display_name(&session),
                    session.login_time.format("%Y-%m-%d %H:%M")
                )),
                None => output.push("not signed in".into()),
            },
            Command::Add { group, price, name } => {
                self.order.add_item(group, &name, price)?;
                self.discard_checkout();
            }
            Command::Increase { group, name } => {
                if self.order.increase(group, &name).is_effective() {
                    self.discard_checkout();
                } else {
                    output.push(format!("[info] no {name} in {group}"));
                }
            }
            Command::Decrease { group, name } => {
                if self.order.decrease(group, &name).is_effective() {
                    self.discard_checkout();
                } else {
                    output.push(format!("[info] no {name} in {group}"));
                }
            }
            Command::Clear => {
                self.order.start_new_bowl();
                self.discard_checkout();
            }
            Command::Show => output.push(match &self.checkout {
                Some(flow) => flow
                    .view()
                    .map(|view| render_order(&view))
                    .unwrap_or_default(),
                None => render_order(&self.order.view()),
            }),
            Command::Checkout => {
                self.storefront.auth().require_auth().await?;
                self.hand_off().await?;
                output.push(render_locations(&pickup_locations(), None));
            }
            Command::Locations => {
                let selected = self
                    .checkout
                    .as_ref()
                    .and_then(|flow| flow.order())
                    .and_then(|book| book.pickup_location());
                output.push(render_locations(&pickup_locations(), selected));
            }
            Command::Pick { location_id } => {
                let flow = self.checkout.as_mut().ok_or(StorefrontError::MissingOrder)?;
                flow.select_location(location_id)?;
            }
            Command::Order => {
                self.storefront.auth().require_auth().await?;
                if self.checkout.is_none() {
                    self.hand_off().await?;
                }
                let flow = self.checkout.as_ref().ok_or(StorefrontError::MissingOrder)?;
                self.storefront.submit_checkout(flow).await?;
            }
            Command::Confirm => {
                let confirmed = self.storefront.confirmation().await?;
                output.push(render_order(&confirmed.view()));
                self.storefront.finish().await?;
                self.checkout = None;
                self.order = self.storefront.start_order();
                output.push("[success] Thank you! Your order is complete.".into());
            }
            Command::Help => output.push(HELP.to_string()),
            Command::Quit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }
}
