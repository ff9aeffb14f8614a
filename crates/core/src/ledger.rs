//! Admin order ledger: server-owned orders with local filter and sort.
//!
//! The ledger never changes an order on its own. Mutations go to the API
//! first and the confirmed order is patched in with [`OrderLedger::patch`]
//! (or the whole list is replaced after a re-fetch).

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::order::OrderItem;
use crate::types::date::{iso_day, iso_day_opt};
use crate::types::{Money, OrderId, OrderStatus, StatusError};

/// An order as the API returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    pub customer_name: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub preference: String,
    #[serde(default)]
    pub status: OrderStatus,
    pub total: Money,
    #[serde(default)]
    pub advance_paid: Money,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(with = "iso_day")]
    pub order_date: NaiveDate,
    #[serde(default, with = "iso_day_opt")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub placed_by_admin: Option<String>,
}

impl Order {
    /// Amount still owed: `total - advancePaid`.
    #[must_use]
    pub fn balance(&self) -> Money {
        self.total - self.advance_paid
    }

    /// Delivered but not fully paid.
    #[must_use]
    pub fn has_outstanding_balance(&self) -> bool {
        self.status == OrderStatus::Delivered && self.balance().is_positive()
    }

    /// Case-insensitive substring match on name, mobile and address.
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.customer_name, &self.mobile, &self.address]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Check that the order may move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError`] for terminal orders and illegal moves.
    pub fn check_transition(&self, next: OrderStatus) -> Result<OrderStatus, StatusError> {
        self.status.transition_to(next)
    }
}

/// Status dropdown of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Pending and processing orders.
    #[default]
    Active,
    /// Every order.
    All,
    /// One exact status.
    Only(OrderStatus),
}

impl StatusFilter {
    /// Whether `status` passes the filter.
    #[must_use]
    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            Self::Active => status.is_active(),
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::All => f.write_str("all"),
            Self::Only(status) => write!(f, "{status}"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

/// Filters applied to the ledger. All conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    pub status: StatusFilter,
    /// Only orders placed on this day.
    pub order_date: Option<NaiveDate>,
    /// Free-text search over name, mobile and address.
    pub search: String,
    /// Only delivered orders with a balance left to collect.
    ///
    /// When set, the default [`StatusFilter::Active`] restriction is lifted,
    /// since delivered orders would otherwise never show. An explicit status
    /// choice still applies.
    pub outstanding_delivered: bool,
}

impl LedgerFilter {
    /// Filter with a status choice.
    #[must_use]
    pub const fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Filter to one order day.
    #[must_use]
    pub const fn on(mut self, day: NaiveDate) -> Self {
        self.order_date = Some(day);
        self
    }

    /// Filter by search text.
    #[must_use]
    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = needle.into();
        self
    }

    /// Only delivered orders with an outstanding balance.
    #[must_use]
    pub const fn outstanding(mut self) -> Self {
        self.outstanding_delivered = true;
        self
    }

    /// Whether `order` passes every condition.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        let status_ok = (self.outstanding_delivered && self.status == StatusFilter::Active)
            || self.status.matches(order.status);
        let day_ok = self.order_date.is_none_or(|day| order.order_date == day);
        let outstanding_ok = !self.outstanding_delivered || order.has_outstanding_balance();

        status_ok && day_ok && outstanding_ok && order.matches_search(&self.search)
    }
}

/// Sortable ledger columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    OrderDate,
    DeliveryDate,
}

/// Sort direction of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Sort state: one active column, each column with its own direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerSort {
    active: SortKey,
    order_date: SortDirection,
    delivery_date: SortDirection,
}

impl LedgerSort {
    /// The column currently sorted on.
    #[must_use]
    pub const fn active(&self) -> SortKey {
        self.active
    }

    /// Direction remembered for `key`.
    #[must_use]
    pub const fn direction(&self, key: SortKey) -> SortDirection {
        match key {
            SortKey::OrderDate => self.order_date,
            SortKey::DeliveryDate => self.delivery_date,
        }
    }

    /// Click on a column header: flip that column's direction and make it
    /// the active column.
    pub const fn toggle(&mut self, key: SortKey) {
        match key {
            SortKey::OrderDate => self.order_date = self.order_date.flipped(),
            SortKey::DeliveryDate => self.delivery_date = self.delivery_date.flipped(),
        }
        self.active = key;
    }

    /// Compare two orders on the active column.
    ///
    /// Orders without a delivery date sort last in either direction.
    #[must_use]
    pub fn compare(&self, a: &Order, b: &Order) -> Ordering {
        let direction = self.direction(self.active);
        match self.active {
            SortKey::OrderDate => direction.apply(a.order_date.cmp(&b.order_date)),
            SortKey::DeliveryDate => match (a.delivery_date, b.delivery_date) {
                (Some(a), Some(b)) => direction.apply(a.cmp(&b)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

/// Locally cached orders in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderLedger {
    orders: Vec<Order>,
}

impl OrderLedger {
    /// Create a ledger from a fetched list.
    #[must_use]
    pub const fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// Replace the cache after a re-fetch.
    pub fn replace(&mut self, orders: Vec<Order>) {
        self.orders = orders;
    }

    /// All orders in fetch order.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Look up an order by id.
    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| &order.id == id)
    }

    /// Swap in the server's copy of an order. Returns `false` if the order
    /// was not in the cache, in which case it is appended.
    pub fn patch(&mut self, order: Order) -> bool {
        if let Some(existing) = self.orders.iter_mut().find(|o| o.id == order.id) {
            *existing = order;
            return true;
        }
        self.orders.push(order);
        false
    }

    /// Filtered and sorted view. The sort is stable, so fetch order breaks
    /// ties.
    #[must_use]
    pub fn view(&self, filter: &LedgerFilter, sort: &LedgerSort) -> Vec<&Order> {
        let mut rows: Vec<&Order> = self.orders.iter().filter(|o| filter.matches(o)).collect();
        rows.sort_by(|a, b| sort.compare(a, b));
        rows
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order(id: &str, status: OrderStatus, placed: NaiveDate) -> Order {
        Order {
            id: OrderId::new(id),
            customer_name: format!("Customer {id}"),
            mobile: "9876543210".to_string(),
            address: "Main Bazaar".to_string(),
            preference: String::new(),
            status,
            total: Money::from_rupees(500),
            advance_paid: Money::ZERO,
            items: Vec::new(),
            order_date: placed,
            delivery_date: None,
            placed_by_admin: None,
        }
    }

    fn ids(rows: &[&Order]) -> Vec<String> {
        rows.iter().map(|o| o.id.to_string()).collect()
    }

    #[test]
    fn test_order_deserializes_api_shape() {
        let json = r#"{
            "_id": "o1",
            "customerName": "Asha",
            "mobile": "9876543210",
            "address": "12 MG Road",
            "status": "processing",
            "total": 450.5,
            "items": [{"sweetName": "Kaju Katli", "quantity": 250, "price": 200, "unit": "grams"}],
            "orderDate": "2025-01-15T08:00:00.000Z",
            "deliveryDate": "2025-01-16"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.advance_paid, Money::ZERO);
        assert_eq!(order.order_date, day(2025, 1, 15));
        assert_eq!(order.delivery_date, Some(day(2025, 1, 16)));
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.placed_by_admin, None);
        assert_eq!(order.items.len(), 1);
    }

    #[test]
    fn test_default_filter_shows_active_only() {
        let ledger = OrderLedger::new(vec![
            order("a", OrderStatus::Pending, day(2025, 1, 15)),
            order("b", OrderStatus::Delivered, day(2025, 1, 15)),
            order("c", OrderStatus::Processing, day(2025, 1, 15)),
            order("d", OrderStatus::Cancelled, day(2025, 1, 15)),
        ]);
        let rows = ledger.view(&LedgerFilter::default(), &LedgerSort::default());
        assert_eq!(ids(&rows), ["a", "c"]);
    }

    #[test]
    fn test_all_statuses_on_one_day() {
        let ledger = OrderLedger::new(vec![
            order("a", OrderStatus::Pending, day(2025, 1, 15)),
            order("b", OrderStatus::Delivered, day(2025, 1, 15)),
            order("c", OrderStatus::Cancelled, day(2025, 1, 14)),
            order("d", OrderStatus::Cancelled, day(2025, 1, 15)),
        ]);
        let filter = LedgerFilter::default()
            .with_status(StatusFilter::All)
            .on(day(2025, 1, 15));
        let rows = ledger.view(&filter, &LedgerSort::default());
        assert_eq!(ids(&rows), ["a", "b", "d"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut rahul = order("a", OrderStatus::Pending, day(2025, 1, 15));
        rahul.customer_name = "Rahul Sharma".to_string();
        let mut other = order("b", OrderStatus::Pending, day(2025, 1, 15));
        other.mobile = "9123456789".to_string();
        let ledger = OrderLedger::new(vec![rahul, other]);

        let sort = LedgerSort::default();
        assert_eq!(ids(&ledger.view(&LedgerFilter::default().search("SHARMA"), &sort)), ["a"]);
        assert_eq!(ids(&ledger.view(&LedgerFilter::default().search("912345"), &sort)), ["b"]);
        assert_eq!(ledger.view(&LedgerFilter::default().search("bazaar"), &sort).len(), 2);
    }

    #[test]
    fn test_outstanding_filter_overrides_default_status() {
        let mut owing = order("a", OrderStatus::Delivered, day(2025, 1, 15));
        owing.advance_paid = Money::from_rupees(100);
        let mut paid = order("b", OrderStatus::Delivered, day(2025, 1, 15));
        paid.advance_paid = Money::from_rupees(500);
        let pending = order("c", OrderStatus::Pending, day(2025, 1, 15));
        let ledger = OrderLedger::new(vec![owing, paid, pending]);

        let filter = LedgerFilter::default().outstanding();
        let rows = ledger.view(&filter, &LedgerSort::default());
        assert_eq!(ids(&rows), ["a"]);
        assert_eq!(rows.first().unwrap().balance(), Money::from_rupees(400));

        let filter = filter.with_status(StatusFilter::Only(OrderStatus::Pending));
        assert!(ledger.view(&filter, &LedgerSort::default()).is_empty());
    }

    #[test]
    fn test_sort_toggle_keeps_per_column_direction() {
        let mut sort = LedgerSort::default();
        assert_eq!(sort.active(), SortKey::OrderDate);
        assert_eq!(sort.direction(SortKey::OrderDate), SortDirection::Descending);

        sort.toggle(SortKey::DeliveryDate);
        assert_eq!(sort.active(), SortKey::DeliveryDate);
        assert_eq!(sort.direction(SortKey::DeliveryDate), SortDirection::Ascending);
        assert_eq!(sort.direction(SortKey::OrderDate), SortDirection::Descending);

        sort.toggle(SortKey::OrderDate);
        assert_eq!(sort.active(), SortKey::OrderDate);
        assert_eq!(sort.direction(SortKey::OrderDate), SortDirection::Ascending);
        assert_eq!(sort.direction(SortKey::DeliveryDate), SortDirection::Ascending);
    }

    #[test]
    fn test_sort_is_stable() {
        let ledger = OrderLedger::new(vec![
            order("a", OrderStatus::Pending, day(2025, 1, 15)),
            order("b", OrderStatus::Pending, day(2025, 1, 16)),
            order("c", OrderStatus::Pending, day(2025, 1, 15)),
        ]);
        let filter = LedgerFilter::default();
        let mut sort = LedgerSort::default();
        assert_eq!(ids(&ledger.view(&filter, &sort)), ["b", "a", "c"]);

        sort.toggle(SortKey::OrderDate);
        assert_eq!(ids(&ledger.view(&filter, &sort)), ["a", "c", "b"]);
    }

    #[test]
    fn test_sort_by_delivery_date_puts_missing_last() {
        let mut early = order("a", OrderStatus::Pending, day(2025, 1, 10));
        early.delivery_date = Some(day(2025, 1, 12));
        let undated = order("b", OrderStatus::Pending, day(2025, 1, 10));
        let mut late = order("c", OrderStatus::Pending, day(2025, 1, 10));
        late.delivery_date = Some(day(2025, 1, 20));
        let ledger = OrderLedger::new(vec![early, undated, late]);

        let mut sort = LedgerSort::default();
        sort.toggle(SortKey::DeliveryDate);
        assert_eq!(ids(&ledger.view(&LedgerFilter::default(), &sort)), ["a", "c", "b"]);
        sort.toggle(SortKey::DeliveryDate);
        assert_eq!(ids(&ledger.view(&LedgerFilter::default(), &sort)), ["c", "a", "b"]);
    }

    #[test]
    fn test_patch_replaces_by_id() {
        let mut ledger = OrderLedger::new(vec![order("a", OrderStatus::Pending, day(2025, 1, 15))]);
        let mut confirmed = order("a", OrderStatus::Processing, day(2025, 1, 15));
        confirmed.advance_paid = Money::from_rupees(50);

        assert!(ledger.patch(confirmed));
        let stored = ledger.get(&OrderId::new("a")).unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(stored.advance_paid, Money::from_rupees(50));
        assert_eq!(ledger.orders().len(), 1);
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("Active".parse::<StatusFilter>(), Ok(StatusFilter::Active));
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "delivered".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(OrderStatus::Delivered))
        );
        assert!("shipped".parse::<StatusFilter>().is_err());
    }
}
