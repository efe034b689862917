use std::fmt::Write as _;

use shared::{
    domain::Location,
    error::ErrorCode,
    protocol::{FinalizedOrder, GroupView, OrderView, StorefrontEvent},
};

fn render_group(out: &mut String, title: &str, empty_hint: &str, group: &GroupView) {
    let _ = writeln!(out, "{title}");
    if group.items.is_empty() {
        let _ = writeln!(out, "  {empty_hint}");
    }
    for line in &group.items {
        let _ = writeln!(
            out,
            "  {}x {:<24} {:>9}",
            line.quantity, line.name, line.line_total.to_string()
        );
    }
    let _ = writeln!(out, "  {:<27} {:>9}", "subtotal", group.total.to_string());
}

pub fn render_order(view: &OrderView) -> String {
    let mut out = String::new();
    render_group(
        &mut out,
        "Your bowl",
        "Click on ingredients to add them to your bowl!",
        &view.ingredients,
    );
    render_group(&mut out, "Sauces", "Add your favorite sauces!", &view.sauces);
    let _ = writeln!(out, "  {:<27} {:>9}", "total", view.order_total.to_string());
    match &view.pickup_location {
        Some(location) => {
            let _ = write!(out, "Pickup Location: {}", location.name);
        }
        None => {
            let _ = write!(out, "Please select a pickup location on the map");
        }
    }
    out
}

pub fn render_locations(locations: &[Location], selected: Option<&Location>) -> String {
    let mut out = String::from("Pickup locations");
    for location in locations {
        let marker = if selected == Some(location) { "*" } else { " " };
        let _ = write!(
            out,
            "\n {marker} [{}] {:<16} ({}%, {}%)",
            location.id, location.name, location.x, location.y
        );
    }
    out
}

pub fn render_finalized(order: &FinalizedOrder) -> String {
    let mut out = format!(
        "Order placed for pickup at {} ({})",
        order.location.name,
        order.order_total
    );
    if let Some(customer) = &order.customer {
        let _ = write!(out, " by {customer}");
    }
    out
}

/// Toast-style line for a bridge event.
pub fn render_event(event: &StorefrontEvent) -> Option<String> {
    match event {
        StorefrontEvent::OrderUpdated(view) => Some(render_order(view)),
        StorefrontEvent::LocationSelected(location) => {
            Some(format!("[info] pickup location set to {}", location.name))
        }
        StorefrontEvent::CheckoutSubmitted(order) => {
            Some(format!("[success] {}", render_finalized(order)))
        }
        StorefrontEvent::SignedIn { email } => Some(format!("[success] signed in as {email}")),
        StorefrontEvent::SignedOut => Some("[info] signed out".to_string()),
        // failures are printed from the command result
        StorefrontEvent::Error(_) => None,
    }
}

pub fn toast_kind(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::MissingOrder | ErrorCode::LocationRequired => "warning",
        _ => "error",
    }
}
