use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StorefrontError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(LocationId);

/// The two fixed item groups of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Ingredients,
    Sauces,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Ingredients, Group::Sauces];

    pub fn as_str(self) -> &'static str {
        match self {
            Group::Ingredients => "ingredients",
            Group::Sauces => "sauces",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = StorefrontError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ingredients" | "ingredient" => Ok(Group::Ingredients),
            "sauces" | "sauce" => Ok(Group::Sauces),
            other => Err(StorefrontError::invalid_input(format!(
                "unrecognized item group '{other}'"
            ))),
        }
    }
}

/// A non-negative amount of money in whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(u64);

impl Price {
    pub const ZERO: Price = Price(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Converts a dollar amount. Amounts finer than one cent are rejected, the same
    /// as decimal text with more than two fractional digits.
    pub fn from_dollars(amount: f64) -> Result<Self, StorefrontError> {
        if !amount.is_finite() {
            return Err(StorefrontError::invalid_input(format!(
                "price {amount} is not a finite number"
            )));
        }
        if amount < 0.0 {
            return Err(StorefrontError::invalid_input(format!(
                "price {amount} must not be negative"
            )));
        }
        let scaled = amount * 100.0;
        let cents = scaled.round();
        if (scaled - cents).abs() > 1e-6 {
            return Err(StorefrontError::invalid_input(format!(
                "price {amount} has more than two decimal places"
            )));
        }
        if cents > u64::MAX as f64 {
            return Err(StorefrontError::invalid_input(format!(
                "price {amount} is out of range"
            )));
        }
        Ok(Self(cents as u64))
    }

    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_mul(self, quantity: u32) -> Option<Price> {
        self.0.checked_mul(u64::from(quantity)).map(Price)
    }

    pub fn saturating_add(self, other: Price) -> Price {
        Price(self.0.saturating_add(other.0))
    }
}

impl FromStr for Price {
    type Err = StorefrontError;

    /// Parses decimal text such as `3.50`, `3.5`, `3` or `$3.50`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let invalid = || StorefrontError::invalid_input(format!("invalid price '{trimmed}'"));

        if digits.starts_with('-') {
            return Err(StorefrontError::invalid_input(format!(
                "price {trimmed} must not be negative"
            )));
        }

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || fraction.len() > 2
        {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .map(Price)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// Snapshots carry prices as plain decimal numbers (`"price": 3.5`).
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_dollars())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Price::from_dollars(amount).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub quantity: u32,
    #[serde(rename = "price")]
    pub unit_price: Price,
}

impl LineItem {
    pub fn new(unit_price: Price) -> Self {
        Self {
            quantity: 1,
            unit_price,
        }
    }

    pub fn line_total(&self) -> Price {
        self.unit_price
            .checked_mul(self.quantity)
            .unwrap_or(Price::from_cents(u64::MAX))
    }
}

/// A pickup point; `x`/`y` are map coordinates in percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub x: u8,
    pub y: u8,
}

#[derive(Debug, Clone, Copy)]
struct CatalogEntry {
    id: i64,
    name: &'static str,
    x: u8,
    y: u8,
}

const PICKUP_CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        id: 1,
        name: "Campus Cafe",
        x: 25,
        y: 30,
    },
    CatalogEntry {
        id: 2,
        name: "Student Center",
        x: 60,
        y: 45,
    },
    CatalogEntry {
        id: 3,
        name: "Library Hub",
        x: 40,
        y: 70,
    },
    CatalogEntry {
        id: 4,
        name: "Main Building",
        x: 75,
        y: 25,
    },
];

impl From<&CatalogEntry> for Location {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: LocationId(entry.id),
            name: entry.name.to_string(),
            x: entry.x,
            y: entry.y,
        }
    }
}

pub fn pickup_locations() -> Vec<Location> {
    PICKUP_CATALOG.iter().map(Location::from).collect()
}

pub fn find_pickup_location(id: LocationId) -> Option<Location> {
    PICKUP_CATALOG
        .iter()
        .find(|entry| entry.id == id.0)
        .map(Location::from)
}

/// Resolves `id` against the catalog, failing with `InvalidInput` for unknown ids.
pub fn resolve_pickup_location(id: LocationId) -> Result<Location, StorefrontError> {
    find_pickup_location(id).ok_or_else(|| {
        StorefrontError::invalid_input(format!("location {id} is not a pickup location"))
    })
}

pub fn is_catalog_location(location: &Location) -> bool {
    find_pickup_location(location.id).as_ref() == Some(location)
}
