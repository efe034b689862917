use std::fmt;

use chrono::{DateTime, Utc};
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{
    domain::{Group, LineItem, Location, Price},
    error::ErrorReport,
};

/// Stored key names shared with the presentation layer.
pub mod keys {
    pub const USERS: &str = "users";
    pub const ORDER_DATA: &str = "orderData";
    pub const SELECTED_LOCATION: &str = "selectedLocation";
    pub const CURRENT_USER: &str = "currentUser";
}

/// One group's entries in pick order, encoded as a JSON object keyed by item name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub entries: Vec<(String, LineItem)>,
}

impl GroupSnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> Price {
        self.entries
            .iter()
            .fold(Price::ZERO, |acc, (_, item)| acc.saturating_add(item.line_total()))
    }
}

impl Serialize for GroupSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, item) in &self.entries {
            map.serialize_entry(name, item)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GroupSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(GroupSnapshotVisitor)
    }
}

struct GroupSnapshotVisitor;

impl<'de> Visitor<'de> for GroupSnapshotVisitor {
    type Value = GroupSnapshot;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of item name to {quantity, price}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, LineItem)> =
            Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, item)) = access.next_entry::<String, LineItem>()? {
            if entries.iter().any(|(existing, _)| *existing == name) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate item name '{name}'"
                )));
            }
            // zero-quantity rows are never kept
            if item.quantity == 0 {
                continue;
            }
            entries.push((name, item));
        }
        Ok(GroupSnapshot { entries })
    }
}

/// The whole-order hand-off between the selection and checkout screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    #[serde(default)]
    pub ingredients: GroupSnapshot,
    #[serde(default)]
    pub sauces: GroupSnapshot,
}

impl OrderSnapshot {
    pub fn group(&self, group: Group) -> &GroupSnapshot {
        match group {
            Group::Ingredients => &self.ingredients,
            Group::Sauces => &self.sauces,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty() && self.sauces.is_empty()
    }

    pub fn total(&self) -> Price {
        self.ingredients.total().saturating_add(self.sauces.total())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub group: Group,
    pub items: Vec<LineView>,
    pub total: Price,
}

/// Everything a screen needs to draw the order panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub ingredients: GroupView,
    pub sauces: GroupView,
    pub order_total: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedOrder {
    pub order: OrderSnapshot,
    pub location: Location,
    pub ingredients_total: Price,
    pub sauces_total: Price,
    pub order_total: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    pub placed_at: DateTime<Utc>,
}

impl FinalizedOrder {
    pub fn new(
        order: OrderSnapshot,
        location: Location,
        customer: Option<String>,
        placed_at: DateTime<Utc>,
    ) -> Self {
        let ingredients_total = order.ingredients.total();
        let sauces_total = order.sauces.total();
        Self {
            ingredients_total,
            sauces_total,
            order_total: ingredients_total.saturating_add(sauces_total),
            order,
            location,
            customer,
            placed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub email: String,
    pub login_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StorefrontEvent {
    OrderUpdated(OrderView),
    LocationSelected(Location),
    CheckoutSubmitted(FinalizedOrder),
    SignedIn { email: String },
    SignedOut,
    Error(ErrorReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_legacy_order_data_in_pick_order() {
        let raw = r#"{"ingredients":{"Rice":{"quantity":1,"price":2},"Chicken":{"quantity":2,"price":3.5}},"sauces":{}}"#;
        let snapshot: OrderSnapshot = serde_json::from_str(raw).expect("snapshot");
        let names: Vec<&str> = snapshot
            .ingredients
            .entries
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, ["Rice", "Chicken"]);
        assert_eq!(snapshot.total(), Price::from_cents(900));
    }

    #[test]
    fn drops_zero_quantity_rows_and_rejects_negative_prices() {
        let raw = r#"{"ingredients":{"Tofu":{"quantity":0,"price":1}},"sauces":{}}"#;
        let snapshot: OrderSnapshot = serde_json::from_str(raw).expect("snapshot");
        assert!(snapshot.is_empty());

        let raw = r#"{"ingredients":{"Tofu":{"quantity":1,"price":-1}},"sauces":{}}"#;
        assert!(serde_json::from_str::<OrderSnapshot>(raw).is_err());
    }

    #[test]
    fn encodes_prices_as_decimal_numbers() {
        let snapshot = OrderSnapshot {
            ingredients: GroupSnapshot {
                entries: vec![(
                    "Chicken".into(),
                    LineItem {
                        quantity: 2,
                        unit_price: Price::from_cents(350),
                    },
                )],
            },
            sauces: GroupSnapshot::default(),
        };
        let encoded = serde_json::to_string(&snapshot).expect("encode");
        assert_eq!(
            encoded,
            r#"{"ingredients":{"Chicken":{"quantity":2,"price":3.5}},"sauces":{}}"#
        );
    }
}
