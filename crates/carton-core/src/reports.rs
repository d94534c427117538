//! # Reports Module
//!
//! Read-only views over items and sales: low-stock alerts, the sales history
//! filter and the dashboard overview.
//!
//! All date arithmetic is UTC. A "day" is the UTC calendar day and a "month"
//! the UTC calendar month containing `now`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{InventoryItem, Sale, SaleLineItem};

// =============================================================================
// Low Stock
// =============================================================================

/// Items below their danger level, in input order.
pub fn low_stock_items(items: &[InventoryItem]) -> Vec<&InventoryItem> {
    items.iter().filter(|item| item.is_low_stock()).collect()
}

/// Short availability text for an alert row.
///
/// ```rust
/// use carton_core::reports::stock_message;
/// # use carton_core::types::InventoryItem;
/// # use carton_core::money::Money;
/// # let mut item = InventoryItem {
/// #     id: String::new(), name: "Tea".into(), category: "Drinks".into(),
/// #     actual_price: Money::zero(), selling_price: Money::zero(),
/// #     cartons: 0, pieces: 0, pieces_per_carton: 12, total_pieces: 0, danger_level: 30,
/// # };
/// item.set_stock(1, 5);
/// assert_eq!(stock_message(&item), "17 available (Cartons: 1, Pieces: 5)");
///
/// item.set_stock(0, 0);
/// assert_eq!(stock_message(&item), "Out of stock");
/// ```
pub fn stock_message(item: &InventoryItem) -> String {
    if item.total_pieces == 0 {
        return "Out of stock".to_string();
    }
    format!(
        "{} available (Cartons: {}, Pieces: {})",
        item.total_pieces, item.cartons, item.pieces
    )
}

// =============================================================================
// Sales History
// =============================================================================

/// Time-of-day window, inclusive at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TimeWindow {
    #[ts(as = "String")]
    pub start: NaiveTime,
    #[ts(as = "String")]
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Parses `HH:MM` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Ok(TimeWindow {
            start: parse_time("start_time", start)?,
            end: parse_time("end_time", end)?,
        })
    }

    /// True when `time`'s hour and minute fall inside the window.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let minute = minute_of_day(time);
        minute >= minute_of_day(self.start) && minute <= minute_of_day(self.end)
    }
}

impl Default for TimeWindow {
    /// 00:00 through 23:59.
    fn default() -> Self {
        TimeWindow {
            start: NaiveTime::MIN,
            end: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Sales history search criteria. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesFilter {
    /// Case-insensitive substring of the sale id.
    #[serde(default)]
    pub search: Option<String>,

    /// UTC calendar date.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub window: TimeWindow,
}

impl SalesFilter {
    pub fn matches(&self, sale: &Sale) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty()
                && !sale
                    .sale_id
                    .to_lowercase()
                    .contains(&search.to_lowercase())
            {
                return false;
            }
        }

        if let Some(date) = self.date {
            if sale.timestamp.date_naive() != date {
                return false;
            }
        }

        self.window.contains(sale.timestamp.time())
    }
}

/// Sales matching `filter`, newest first.
pub fn filter_sales<'a>(sales: &'a [Sale], filter: &SalesFilter) -> Vec<&'a Sale> {
    let mut matched: Vec<&Sale> = sales.iter().filter(|sale| filter.matches(sale)).collect();
    matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    matched
}

/// Human-readable quantity of a sale line.
///
/// `"2 carton(s) (24 pieces per carton) and 5 piece(s)"`
pub fn quantity_display(line: &SaleLineItem) -> String {
    format!(
        "{} carton(s) ({} pieces per carton) and {} piece(s)",
        line.cartons,
        line.pieces_per_carton,
        line.loose_pieces()
    )
}

// =============================================================================
// Overview
// =============================================================================

/// Dashboard figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Overview {
    pub sales_today: u32,
    pub profit_today: Money,
    pub profit_this_month: Money,
}

/// Computes the dashboard for the UTC day and month containing `now`.
pub fn overview(sales: &[Sale], now: DateTime<Utc>) -> Overview {
    let today = now.date_naive();

    let mut summary = Overview {
        sales_today: 0,
        profit_today: Money::zero(),
        profit_this_month: Money::zero(),
    };

    for sale in sales {
        let day = sale.timestamp.date_naive();
        if day.year() == today.year() && day.month() == today.month() {
            summary.profit_this_month += sale.profit;
            if day == today {
                summary.sales_today += 1;
                summary.profit_today += sale.profit;
            }
        }
    }

    summary
}

// =============================================================================
// Unit Tests
// =============================================================================
