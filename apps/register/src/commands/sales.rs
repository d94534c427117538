//! # Sales Commands
//!
//! Sales history search and the dashboard overview.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use carton_core::reports::{filter_sales, overview, quantity_display, Overview, SalesFilter, TimeWindow};
use carton_core::{Sale, ValidationError};

/// Sales history search, as typed into the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesQuery {
    /// Part of a sale id, any case.
    pub search: Option<String>,

    /// `YYYY-MM-DD`
    pub date: Option<String>,

    /// `HH:MM`, default `00:00`
    pub start_time: Option<String>,

    /// `HH:MM`, default `23:59`
    pub end_time: Option<String>,
}

impl SalesQuery {
    /// Parses the query into a [`SalesFilter`].
    pub fn to_filter(&self) -> Result<SalesFilter, ValidationError> {
        let date = match self.date.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(
                NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| {
                    ValidationError::InvalidFormat {
                        field: "date".to_string(),
                        reason: e.to_string(),
                    }
                })?,
            ),
            _ => None,
        };

        let window = TimeWindow::parse(
            self.start_time.as_deref().unwrap_or("00:00"),
            self.end_time.as_deref().unwrap_or("23:59"),
        )?;

        Ok(SalesFilter {
            search: self.search.clone(),
            date,
            window,
        })
    }
}

/// A sale with its line quantities spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleView {
    pub sale: Sale,

    /// One entry per line, e.g. `2 carton(s) (12 pieces per carton) and 5 piece(s)`.
    pub quantities: Vec<String>,
}

impl From<&Sale> for SaleView {
    fn from(sale: &Sale) -> Self {
        SaleView {
            sale: sale.clone(),
            quantities: sale.items.iter().map(quantity_display).collect(),
        }
    }
}

/// Dashboard figures plus display strings in the configured currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OverviewResponse {
    pub store_name: String,
    pub overview: Overview,
    pub profit_today_display: String,
    pub profit_this_month_display: String,
    pub low_stock_count: usize,
}

/// Sales matching `query`, newest first.
pub async fn list_sales(db: &DbState, query: SalesQuery) -> Result<Vec<SaleView>, ApiError> {
    debug!(?query, "list_sales command");

    let filter = query.to_filter()?;
    let sales = db.inner().sales().list().await?;
    Ok(filter_sales(&sales, &filter)
        .into_iter()
        .map(SaleView::from)
        .collect())
}

pub async fn get_sale(db: &DbState, sale_id: &str) -> Result<SaleView, ApiError> {
    debug!(sale_id, "get_sale command");
    db.inner()
        .sales()
        .get(sale_id)
        .await?
        .map(|sale| SaleView::from(&sale))
        .ok_or_else(|| ApiError::not_found("Sale", sale_id))
}

/// Sales today, profit today and profit this month (UTC).
pub async fn get_overview(db: &DbState, config: &ConfigState) -> Result<OverviewResponse, ApiError> {
    debug!("get_overview command");

    let sales = db.inner().sales().list().await?;
    let low_stock_count = db.inner().items().low_stock().await?.len();
    let summary = overview(&sales, Utc::now());

    Ok(OverviewResponse {
        store_name: config.store_name.clone(),
        profit_today_display: config.format_currency(summary.profit_today),
        profit_this_month_display: config.format_currency(summary.profit_this_month),
        overview: summary,
        low_stock_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::anonymous_app;
    use crate::error::ErrorCode;
    use carton_core::{DiscountRate, Money, SaleLineItem};
    use chrono::{DateTime, Duration, TimeZone};

    fn sale(id: &str, timestamp: DateTime<Utc>, profit: i64) -> Sale {
        Sale {
            sale_id: id.to_string(),
            timestamp,
            items: vec![SaleLineItem {
                item_id: "tea".to_string(),
                name: "Tea".to_string(),
                category: "Drinks".to_string(),
                unit_price: Money::from_cents(100),
                cartons: 2,
                pieces_per_carton: 12,
                total_pieces: 29,
                broken_cartons: 0,
                discount: DiscountRate::zero(),
                line_total: Money::from_cents(2_900),
            }],
            total: Money::from_cents(2_900),
            profit: Money::from_cents(profit),
            customer: None,
        }
    }

    #[test]
    fn test_query_defaults_and_errors() {
        let filter = SalesQuery::default().to_filter().unwrap();
        assert_eq!(filter.window, TimeWindow::default());
        assert!(filter.date.is_none());

        let bad_date = SalesQuery {
            date: Some("19/10/2026".to_string()),
            ..SalesQuery::default()
        };
        assert!(bad_date.to_filter().is_err());

        let bad_time = SalesQuery {
            start_time: Some("25:00".to_string()),
            ..SalesQuery::default()
        };
        assert!(bad_time.to_filter().is_err());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let app = anonymous_app().await;
        let repo = app.db.inner().sales();
        let morning = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();

        repo.insert(&sale("Sale-1", morning, 100)).await.unwrap();
        repo.insert(&sale("Sale-2", morning + Duration::hours(6), 100)).await.unwrap();
        repo.insert(&sale("Sale-3", morning - Duration::days(1), 100)).await.unwrap();

        let all = list_sales(&app.db, SalesQuery::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|v| v.sale.sale_id.as_str()).collect();
        assert_eq!(ids, ["Sale-2", "Sale-1", "Sale-3"]);
        assert_eq!(
            all[0].quantities[0],
            "2 carton(s) (12 pieces per carton) and 5 piece(s)"
        );

        let query = SalesQuery {
            date: Some("2026-10-19".to_string()),
            start_time: Some("09:00".to_string()),
            end_time: Some("12:00".to_string()),
            ..SalesQuery::default()
        };
        let found = list_sales(&app.db, query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sale.sale_id, "Sale-1");

        let query = SalesQuery {
            search: Some("sale-3".to_string()),
            ..SalesQuery::default()
        };
        assert_eq!(list_sales(&app.db, query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_sale_and_overview() {
        let app = anonymous_app().await;
        let now = Utc::now();
        app.db
            .inner()
            .sales()
            .insert(&sale("Sale-1", now, 250))
            .await
            .unwrap();

        assert_eq!(get_sale(&app.db, "Sale-1").await.unwrap().sale.sale_id, "Sale-1");
        let err = get_sale(&app.db, "Sale-9").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let response = get_overview(&app.db, &app.config).await.unwrap();
        assert_eq!(response.overview.sales_today, 1);
        assert_eq!(response.overview.profit_today, Money::from_cents(250));
        assert_eq!(response.profit_today_display, "Rs 2.50");
        assert_eq!(response.low_stock_count, 0);
    }
}
