//! Per-day sales summary.
//!
//! The API can produce this itself (`GET /api/orders/summary`); the same
//! figures are derived locally from a ledger snapshot by [`summarize`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::Order;
use crate::order::ItemUnit;
use crate::types::date::iso_day;
use crate::types::{Money, OrderStatus, round_quantity};

/// Order counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub delivered: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    fn record(&mut self, status: OrderStatus) {
        let slot = match status {
            OrderStatus::Pending => &mut self.pending,
            OrderStatus::Processing => &mut self.processing,
            OrderStatus::Delivered => &mut self.delivered,
            OrderStatus::Cancelled => &mut self.cancelled,
        };
        *slot += 1;
    }
}

/// Quantity of one sweet sold, in pieces or kilograms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweetTally {
    pub sweet_name: String,
    pub quantity: Decimal,
    pub unit: ItemUnit,
}

/// Sales figures for one day of orders.
///
/// Cancelled orders are counted in `by_status` but excluded from every
/// money figure and from the sweet tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[serde(with = "iso_day")]
    pub date: NaiveDate,
    #[serde(default)]
    pub order_count: usize,
    #[serde(default)]
    pub revenue: Money,
    #[serde(default)]
    pub collected: Money,
    #[serde(default)]
    pub outstanding: Money,
    #[serde(default)]
    pub by_status: StatusCounts,
    #[serde(default)]
    pub sweets: Vec<SweetTally>,
}

/// Summarize the orders placed on `day`.
#[must_use]
pub fn summarize(orders: &[Order], day: NaiveDate) -> DailySummary {
    let mut summary = DailySummary {
        date: day,
        order_count: 0,
        revenue: Money::ZERO,
        collected: Money::ZERO,
        outstanding: Money::ZERO,
        by_status: StatusCounts::default(),
        sweets: Vec::new(),
    };

    for order in orders.iter().filter(|o| o.order_date == day) {
        summary.order_count += 1;
        summary.by_status.record(order.status);
        if order.status == OrderStatus::Cancelled {
            continue;
        }

        summary.revenue = summary.revenue + order.total;
        summary.collected = summary.collected + order.advance_paid;
        if order.balance().is_positive() {
            summary.outstanding = summary.outstanding + order.balance();
        }

        for item in &order.items {
            // Grams and kilograms of the same sweet share one kilogram tally.
            let unit = match item.unit {
                ItemUnit::Piece => ItemUnit::Piece,
                ItemUnit::Kg | ItemUnit::Grams => ItemUnit::Kg,
            };
            let quantity = item.canonical_quantity();
            match summary
                .sweets
                .iter_mut()
                .find(|t| t.unit == unit && t.sweet_name == item.sweet_name)
            {
                Some(tally) => tally.quantity = round_quantity(tally.quantity + quantity),
                None => summary.sweets.push(SweetTally {
                    sweet_name: item.sweet_name.clone(),
                    quantity,
                    unit,
                }),
            }
        }
    }

    summary
        .sweets
        .sort_by(|a, b| a.sweet_name.cmp(&b.sweet_name));
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::order::OrderItem;
    use crate::types::OrderId;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn item(name: &str, quantity: Decimal, unit: ItemUnit, price: i64) -> OrderItem {
        OrderItem {
            sweet_name: name.to_string(),
            quantity,
            price: Money::from_rupees(price),
            unit,
        }
    }

    fn order(id: &str, placed: u32, status: OrderStatus, advance: i64, items: Vec<OrderItem>) -> Order {
        let total = items.iter().map(|i| i.price).sum();
        Order {
            id: OrderId::new(id),
            customer_name: "Asha".to_string(),
            mobile: String::new(),
            address: String::new(),
            preference: String::new(),
            status,
            total,
            advance_paid: Money::from_rupees(advance),
            items,
            order_date: day(placed),
            delivery_date: None,
            placed_by_admin: None,
        }
    }

    #[test]
    fn test_summarize_one_day() {
        let orders = vec![
            order(
                "a",
                15,
                OrderStatus::Delivered,
                100,
                vec![
                    item("Kaju Katli", dec!(250), ItemUnit::Grams, 200),
                    item("Ladoo", dec!(4), ItemUnit::Piece, 60),
                ],
            ),
            order(
                "b",
                15,
                OrderStatus::Pending,
                0,
                vec![item("Kaju Katli", dec!(0.5), ItemUnit::Kg, 400)],
            ),
            order(
                "c",
                15,
                OrderStatus::Cancelled,
                0,
                vec![item("Ladoo", dec!(10), ItemUnit::Piece, 150)],
            ),
            order(
                "d",
                14,
                OrderStatus::Pending,
                0,
                vec![item("Ladoo", dec!(1), ItemUnit::Piece, 15)],
            ),
        ];

        let summary = summarize(&orders, day(15));
        assert_eq!(summary.order_count, 3);
        assert_eq!(summary.revenue, Money::from_rupees(660));
        assert_eq!(summary.collected, Money::from_rupees(100));
        assert_eq!(summary.outstanding, Money::from_rupees(560));
        assert_eq!(
            summary.by_status,
            StatusCounts {
                pending: 1,
                processing: 0,
                delivered: 1,
                cancelled: 1
            }
        );
        assert_eq!(
            summary.sweets,
            vec![
                SweetTally {
                    sweet_name: "Kaju Katli".to_string(),
                    quantity: dec!(0.75),
                    unit: ItemUnit::Kg,
                },
                SweetTally {
                    sweet_name: "Ladoo".to_string(),
                    quantity: dec!(4),
                    unit: ItemUnit::Piece,
                },
            ]
        );
    }

    #[test]
    fn test_summarize_empty_day() {
        let summary = summarize(&[], day(1));
        assert_eq!(summary.order_count, 0);
        assert_eq!(summary.revenue, Money::ZERO);
        assert!(summary.sweets.is_empty());
    }

    #[test]
    fn test_summary_from_api_json() {
        let json = r#"{"date": "2025-01-15", "orderCount": 2, "revenue": 660}"#;
        let summary: DailySummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.date, day(15));
        assert_eq!(summary.revenue, Money::from_rupees(660));
        assert_eq!(summary.by_status, StatusCounts::default());
    }
}
