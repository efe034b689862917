//! In-memory order state: two item groups, derived totals and the pickup point.
//!
//! Every mutation leaves each group free of zero-quantity rows and duplicate
//! names, and totals are always recomputed from the rows themselves.

use shared::{
    domain::{resolve_pickup_location, Group, LineItem, Location, LocationId, Price},
    error::StorefrontError,
    protocol::{GroupSnapshot, GroupView, LineView, OrderSnapshot, OrderView},
};

/// Outcome of a quantity button press.
///
/// Presses that reference an item no longer in the order are tolerated and
/// reported as `Missing`; they never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated(u32),
    Removed,
    Missing,
}

impl QuantityChange {
    pub fn is_effective(self) -> bool {
        !matches!(self, QuantityChange::Missing)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ItemGroup {
    entries: Vec<(String, LineItem)>,
}

impl ItemGroup {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| existing == name)
    }

    fn get(&self, name: &str) -> Option<&LineItem> {
        self.position(name).map(|idx| &self.entries[idx].1)
    }

    fn total(&self) -> Price {
        self.entries
            .iter()
            .fold(Price::ZERO, |acc, (_, item)| acc.saturating_add(item.line_total()))
    }

    fn view(&self, group: Group) -> GroupView {
        GroupView {
            group,
            items: self
                .entries
                .iter()
                .map(|(name, item)| LineView {
                    name: name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_total: item.line_total(),
                })
                .collect(),
            total: self.total(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    ingredients: ItemGroup,
    sauces: ItemGroup,
    pickup_location: Option<Location>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn group(&self, group: Group) -> &ItemGroup {
        match group {
            Group::Ingredients => &self.ingredients,
            Group::Sauces => &self.sauces,
        }
    }

    fn group_mut(&mut self, group: Group) -> &mut ItemGroup {
        match group {
            Group::Ingredients => &mut self.ingredients,
            Group::Sauces => &mut self.sauces,
        }
    }

    /// Adds one of `name` to `group` and returns its new quantity.
    ///
    /// An existing entry keeps the unit price it was first added with.
    pub fn add_item(
        &mut self,
        group: Group,
        name: &str,
        unit_price: Price,
    ) -> Result<u32, StorefrontError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorefrontError::invalid_input("item name must not be empty"));
        }

        let items = self.group_mut(group);
        match items.position(name) {
            Some(idx) => {
                let item = &mut items.entries[idx].1;
                item.quantity = item.quantity.saturating_add(1);
                Ok(item.quantity)
            }
            None => {
                items.entries.push((name.to_string(), LineItem::new(unit_price)));
                Ok(1)
            }
        }
    }

    pub fn increment(&mut self, group: Group, name: &str) -> QuantityChange {
        let items = self.group_mut(group);
        let Some(idx) = items.position(name.trim()) else {
            return QuantityChange::Missing;
        };
        let item = &mut items.entries[idx].1;
        item.quantity = item.quantity.saturating_add(1);
        QuantityChange::Updated(item.quantity)
    }

    pub fn decrement(&mut self, group: Group, name: &str) -> QuantityChange {
        let items = self.group_mut(group);
        let Some(idx) = items.position(name.trim()) else {
            return QuantityChange::Missing;
        };
        let item = &mut items.entries[idx].1;
        item.quantity = item.quantity.saturating_sub(1);
        if item.quantity == 0 {
            items.entries.remove(idx);
            QuantityChange::Removed
        } else {
            QuantityChange::Updated(item.quantity)
        }
    }

    pub fn remove_group(&mut self, group: Group) {
        self.group_mut(group).entries.clear();
    }

    /// Empties both groups. The pickup location is left as it is.
    pub fn clear(&mut self) {
        for group in Group::ALL {
            self.remove_group(group);
        }
    }

    pub fn group_total(&self, group: Group) -> Price {
        self.group(group).total()
    }

    pub fn order_total(&self) -> Price {
        Group::ALL
            .into_iter()
            .fold(Price::ZERO, |acc, group| acc.saturating_add(self.group_total(group)))
    }

    pub fn set_pickup_location(&mut self, id: LocationId) -> Result<&Location, StorefrontError> {
        let location = resolve_pickup_location(id)?;
        Ok(&*self.pickup_location.insert(location))
    }

    pub fn pickup_location(&self) -> Option<&Location> {
        self.pickup_location.as_ref()
    }

    pub fn item(&self, group: Group, name: &str) -> Option<&LineItem> {
        self.group(group).get(name.trim())
    }

    pub fn quantity(&self, group: Group, name: &str) -> u32 {
        self.item(group, name).map_or(0, |item| item.quantity)
    }

    pub fn entries(&self, group: Group) -> impl Iterator<Item = (&str, &LineItem)> {
        self.group(group)
            .entries
            .iter()
            .map(|(name, item)| (name.as_str(), item))
    }

    /// Total number of units across both groups.
    pub fn item_count(&self) -> u64 {
        Group::ALL
            .into_iter()
            .flat_map(|group| self.group(group).entries.iter())
            .map(|(_, item)| u64::from(item.quantity))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        Group::ALL
            .into_iter()
            .all(|group| self.group(group).entries.is_empty())
    }

    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            ingredients: GroupSnapshot {
                entries: self.ingredients.entries.clone(),
            },
            sauces: GroupSnapshot {
                entries: self.sauces.entries.clone(),
            },
        }
    }

    /// Rebuilds an order from a stored snapshot, re-checking row invariants.
    pub fn from_snapshot(snapshot: OrderSnapshot) -> Result<Self, StorefrontError> {
        let mut book = OrderBook::new();
        for group in Group::ALL {
            let rows = snapshot.group(group);
            let items = book.group_mut(group);
            for (name, item) in &rows.entries {
                let name = name.trim();
                if name.is_empty() {
                    return Err(StorefrontError::invalid_input(format!(
                        "{group} snapshot contains an unnamed item"
                    )));
                }
                if items.position(name).is_some() {
                    return Err(StorefrontError::invalid_input(format!(
                        "{group} snapshot lists '{name}' more than once"
                    )));
                }
                if item.quantity == 0 {
                    continue;
                }
                items.entries.push((name.to_string(), *item));
            }
        }
        Ok(book)
    }

    pub fn view(&self) -> OrderView {
        OrderView {
            ingredients: self.ingredients.view(Group::Ingredients),
            sauces: self.sauces.view(Group::Sauces),
            order_total: self.order_total(),
            pickup_location: self.pickup_location.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared::{domain::pickup_locations, error::ErrorCode};

    fn price(raw: &str) -> Price {
        raw.parse().expect("price")
    }

    #[test]
    fn adding_same_item_twice_increments_single_entry() {
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Chicken", price("3.50"))
            .expect("add");
        let quantity = book
            .add_item(Group::Ingredients, "Chicken", price("3.50"))
            .expect("add again");

        assert_eq!(quantity, 2);
        assert_eq!(book.entries(Group::Ingredients).count(), 1);
        assert_eq!(book.group_total(Group::Ingredients), price("7.00"));
    }

    #[test]
    fn empty_order_totals_zero() {
        let book = OrderBook::new();
        assert_eq!(book.order_total(), Price::ZERO);
        assert_eq!(book.group_total(Group::Sauces), Price::ZERO);
        assert!(book.is_empty());
    }

    #[test]
    fn decrementing_last_unit_removes_entry() {
        let mut book = OrderBook::new();
        book.add_item(Group::Sauces, "Teriyaki", price("0.75"))
            .expect("add");

        assert_eq!(book.decrement(Group::Sauces, "Teriyaki"), QuantityChange::Removed);
        assert!(book.item(Group::Sauces, "Teriyaki").is_none());
        assert_eq!(book.entries(Group::Sauces).count(), 0);
    }

    #[test]
    fn quantity_presses_for_missing_items_are_noops() {
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Rice", price("2"))
            .expect("add");
        let before = book.clone();

        assert_eq!(book.increment(Group::Sauces, "Rice"), QuantityChange::Missing);
        assert_eq!(book.decrement(Group::Ingredients, "Tofu"), QuantityChange::Missing);
        assert_eq!(book, before);
    }

    #[test]
    fn increment_and_decrement_adjust_by_one() {
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Salmon", price("4.25"))
            .expect("add");
        assert_eq!(
            book.increment(Group::Ingredients, "Salmon"),
            QuantityChange::Updated(2)
        );
        assert_eq!(
            book.increment(Group::Ingredients, "Salmon"),
            QuantityChange::Updated(3)
        );
        assert_eq!(
            book.decrement(Group::Ingredients, "Salmon"),
            QuantityChange::Updated(2)
        );
        assert_eq!(book.group_total(Group::Ingredients), price("8.50"));
    }

    #[test]
    fn existing_entry_keeps_first_unit_price() {
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Egg", price("1.00"))
            .expect("add");
        book.add_item(Group::Ingredients, "Egg", price("9.00"))
            .expect("add again");
        assert_eq!(book.group_total(Group::Ingredients), price("2.00"));
    }

    #[test]
    fn rejects_blank_item_names() {
        let mut book = OrderBook::new();
        let err = book
            .add_item(Group::Ingredients, "   ", price("1"))
            .expect_err("blank name");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn order_total_sums_both_groups() {
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Chicken", price("3.50"))
            .expect("add");
        book.add_item(Group::Sauces, "Sriracha", price("0.50"))
            .expect("add");
        book.add_item(Group::Sauces, "Sriracha", price("0.50"))
            .expect("add");

        assert_eq!(book.order_total(), price("4.50"));
        assert_eq!(
            book.order_total(),
            book.group_total(Group::Ingredients)
                .saturating_add(book.group_total(Group::Sauces))
        );
    }

    #[test]
    fn clear_empties_both_groups_and_keeps_location() {
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Chicken", price("3.50"))
            .expect("add");
        book.add_item(Group::Sauces, "Mayo", price("0.25"))
            .expect("add");
        book.set_pickup_location(LocationId(2)).expect("location");

        book.clear();

        assert!(book.is_empty());
        assert_eq!(book.order_total(), Price::ZERO);
        assert_eq!(book.pickup_location().map(|l| l.id), Some(LocationId(2)));
    }

    #[test]
    fn remove_group_only_touches_that_group() {
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Chicken", price("3.50"))
            .expect("add");
        book.add_item(Group::Sauces, "Mayo", price("0.25"))
            .expect("add");

        book.remove_group(Group::Sauces);

        assert_eq!(book.quantity(Group::Ingredients, "Chicken"), 1);
        assert_eq!(book.group_total(Group::Sauces), Price::ZERO);
    }

    #[test]
    fn selecting_location_replaces_previous_choice() {
        let mut book = OrderBook::new();
        book.set_pickup_location(LocationId(1)).expect("first");
        let chosen = book.set_pickup_location(LocationId(4)).expect("second").clone();

        assert_eq!(chosen, pickup_locations()[3]);
        assert_eq!(book.pickup_location(), Some(&chosen));

        let err = book
            .set_pickup_location(LocationId(42))
            .expect_err("unknown location");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert_eq!(book.pickup_location(), Some(&chosen));
    }

    #[test]
    fn snapshot_restores_entries_in_pick_order() {
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Rice", price("2"))
            .expect("add");
        book.add_item(Group::Ingredients, "Chicken", price("3.50"))
            .expect("add");
        book.add_item(Group::Sauces, "Mayo", price("0.25"))
            .expect("add");

        let restored = OrderBook::from_snapshot(book.snapshot()).expect("restore");
        let names: Vec<&str> = restored
            .entries(Group::Ingredients)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["Rice", "Chicken"]);
        assert_eq!(restored.order_total(), book.order_total());
    }

    #[test]
    fn view_reports_line_and_group_totals() {
        let mut book = OrderBook::new();
        book.add_item(Group::Ingredients, "Chicken", price("3.50"))
            .expect("add");
        book.increment(Group::Ingredients, "Chicken");

        let view = book.view();
        assert_eq!(view.ingredients.items[0].quantity, 2);
        assert_eq!(view.ingredients.items[0].line_total, price("7.00"));
        assert_eq!(view.ingredients.total, price("7.00"));
        assert!(view.sauces.items.is_empty());
        assert_eq!(view.order_total, price("7.00"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(Group, usize, u64),
        Increment(Group, usize),
        Decrement(Group, usize),
    }

    const NAMES: [&str; 4] = ["Chicken", "Rice", "Teriyaki", "Corn"];

    fn group_strategy() -> impl Strategy<Value = Group> {
        prop_oneof![Just(Group::Ingredients), Just(Group::Sauces)]
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (group_strategy(), 0..NAMES.len(), 0_u64..2_000).prop_map(|(g, n, c)| Op::Add(g, n, c)),
            (group_strategy(), 0..NAMES.len()).prop_map(|(g, n)| Op::Increment(g, n)),
            (group_strategy(), 0..NAMES.len()).prop_map(|(g, n)| Op::Decrement(g, n)),
        ]
    }

    proptest! {
        #[test]
        fn totals_never_drift_from_entries(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let mut book = OrderBook::new();
            for op in ops {
                match op {
                    Op::Add(group, name, cents) => {
                        book.add_item(group, NAMES[name], Price::from_cents(cents)).expect("add");
                    }
                    Op::Increment(group, name) => {
                        book.increment(group, NAMES[name]);
                    }
                    Op::Decrement(group, name) => {
                        book.decrement(group, NAMES[name]);
                    }
                }

                for group in Group::ALL {
                    let expected: u64 = book
                        .entries(group)
                        .map(|(_, item)| item.unit_price.cents() * u64::from(item.quantity))
                        .sum();
                    prop_assert_eq!(book.group_total(group).cents(), expected);
                    prop_assert!(book.entries(group).all(|(_, item)| item.quantity > 0));

                    let mut names: Vec<&str> = book.entries(group).map(|(name, _)| name).collect();
                    let before = names.len();
                    names.sort_unstable();
                    names.dedup();
                    prop_assert_eq!(names.len(), before);
                }
                prop_assert_eq!(
                    book.order_total(),
                    book.group_total(Group::Ingredients)
                        .saturating_add(book.group_total(Group::Sauces))
                );
            }
        }
    }
}
