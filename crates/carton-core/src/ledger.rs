//! # Cart Line Ledger
//!
//! The checkout session: one [`CartLine`] per item the cashier has touched,
//! plus the selected credit account.
//!
//! ## Re-derive, Never Increment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Every Edit Starts From The Snapshot                  │
//! │                                                                         │
//! │  original_stock ──┐  (taken when the line is created, never changes)   │
//! │                   │                                                     │
//! │  request ─────────┼──► allocate() ──┬── Ok  ──► allocated, live_stock  │
//! │  (cumulative)     │                 │           overwritten             │
//! │                   │                 └── Err ──► line untouched          │
//! │                                                                         │
//! │  add_to_cart(+2 pcs)   request.pieces += 2, then re-derive             │
//! │  edit_quantity(c, p)   request = (c, p), then re-derive                │
//! │  remove_line / clear   return allocation, live_stock == original       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Live stock is never adjusted incrementally, so any sequence of edits ends
//! in the same state as a single edit with the final request.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::allocation::{allocate, Allocation, AllocationRequest, StockState};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DiscountRate, InventoryItem, Sale};

// =============================================================================
// Quantity Unit
// =============================================================================

/// Unit of an add-to-cart quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum QuantityUnit {
    Carton,
    Piece,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One item in the checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub item_id: String,
    pub name: String,
    pub category: String,
    pub actual_price: Money,
    pub selling_price: Money,

    /// As stored on the item; 0 for a pieces-only item.
    pub item_pieces_per_carton: u32,

    /// Stock when the line was created. Immutable for the session.
    pub original_stock: StockState,

    /// Stock left on the shelf given the current allocation.
    pub live_stock: StockState,

    /// Cumulative quantity the customer wants.
    pub request: AllocationRequest,

    /// What the allocator hands out for `request`.
    pub allocated: Allocation,

    pub discount: DiscountRate,
}

/// Stock handed back to the shelf when a line is removed or the cart cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockReturn {
    pub item_id: String,

    /// Whole cartons plus broken cartons.
    pub cartons: u32,

    /// Allocated units minus `cartons * ppc`. Negative when broken cartons
    /// were only partly handed out.
    pub pieces: i64,
}

impl CartLine {
    /// Starts an empty line from the item's current stock.
    pub fn from_item(item: &InventoryItem) -> Self {
        let stock = item.sellable_stock();
        CartLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            actual_price: item.actual_price,
            selling_price: item.selling_price,
            item_pieces_per_carton: item.pieces_per_carton,
            original_stock: stock,
            live_stock: stock,
            request: AllocationRequest::empty(),
            allocated: Allocation::default(),
            discount: DiscountRate::zero(),
        }
    }

    #[inline]
    pub fn pieces_per_carton(&self) -> u32 {
        self.original_stock.pieces_per_carton
    }

    /// Units handed out by the current allocation.
    #[inline]
    pub fn units(&self) -> u64 {
        self.allocated.units(self.pieces_per_carton())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty()
    }

    /// Selling price times units, before discount.
    pub fn subtotal(&self) -> Money {
        self.selling_price.multiply_units(self.units())
    }

    pub fn discount_amount(&self) -> Money {
        self.subtotal().discount_amount(self.discount)
    }

    /// Amount charged for this line.
    pub fn line_total(&self) -> Money {
        self.subtotal() - self.discount_amount()
    }

    /// Margin on this line after the discount.
    pub fn line_profit(&self) -> Money {
        (self.selling_price - self.actual_price).multiply_units(self.units())
            - self.discount_amount()
    }

    /// Re-derives the line from its original snapshot for `request`.
    ///
    /// On failure nothing on the line changes.
    pub fn apply_request(&mut self, request: AllocationRequest) -> CoreResult<()> {
        let result = allocate(&self.original_stock, &request)
            .map_err(|err| CoreError::from_allocation(self.name.clone(), err))?;

        self.request = request;
        self.allocated = result.allocated;
        self.live_stock = result.remaining_stock;
        Ok(())
    }

    /// Returns the allocation to live stock and resets the line.
    pub fn return_to_stock(&mut self) -> StockReturn {
        let ppc = self.pieces_per_carton() as i64;
        let cartons = self.allocated.cartons + self.allocated.broken_cartons;
        let pieces = self.units() as i64 - cartons as i64 * ppc;

        let live_pieces = self.live_stock.pieces as i64 + pieces;
        self.live_stock = self.live_stock.with_counts(
            self.live_stock.cartons + cartons,
            u32::try_from(live_pieces).unwrap_or(self.original_stock.pieces),
        );
        debug_assert_eq!(self.live_stock, self.original_stock);

        self.request = AllocationRequest::empty();
        self.allocated = Allocation::default();

        StockReturn {
            item_id: self.item_id.clone(),
            cartons,
            pieces,
        }
    }
}

// =============================================================================
// Checkout Session
// =============================================================================

/// Result of re-opening a stored sale in a fresh session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PrefillReport {
    /// Sale lines restored into the cart.
    pub restored: Vec<String>,

    /// Sale lines whose item no longer exists.
    pub unmatched: Vec<String>,

    /// Sale lines that no longer fit in current stock.
    pub rejected: Vec<String>,
}

/// Cart state for one checkout, from first scan to commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutSession {
    lines: Vec<CartLine>,

    /// Document id of the credit account to charge, if any.
    credit_account: Option<String>,
}

impl CheckoutSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line created this session, including ones with nothing allocated.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Lines that will be sold at checkout.
    pub fn active_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|line| !line.is_empty())
    }

    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item_id == item_id)
    }

    /// True when no line has a non-zero allocation.
    pub fn is_empty(&self) -> bool {
        self.active_lines().next().is_none()
    }

    pub fn credit_account(&self) -> Option<&str> {
        self.credit_account.as_deref()
    }

    pub fn select_credit_account(&mut self, account_id: Option<String>) {
        self.credit_account = account_id;
    }

    /// Adds `quantity` cartons or pieces to the item's cumulative request.
    ///
    /// ## Errors
    /// `InsufficientStock` when the new cumulative request does not fit the
    /// line's original stock. The line keeps its previous allocation.
    pub fn add_to_cart(
        &mut self,
        item: &InventoryItem,
        quantity: u32,
        unit: QuantityUnit,
    ) -> CoreResult<&CartLine> {
        let current = self
            .line(&item.id)
            .map(|line| line.request)
            .unwrap_or_default();

        let request = match unit {
            QuantityUnit::Carton => AllocationRequest::new(
                current.request_cartons.saturating_add(quantity),
                current.request_pieces,
            ),
            QuantityUnit::Piece => AllocationRequest::new(
                current.request_cartons,
                current.request_pieces.saturating_add(quantity),
            ),
        };

        self.apply(item, request)
    }

    /// Replaces the item's cumulative request with `cartons` and `pieces`.
    pub fn edit_quantity(
        &mut self,
        item: &InventoryItem,
        cartons: u32,
        pieces: u32,
    ) -> CoreResult<&CartLine> {
        self.apply(item, AllocationRequest::new(cartons, pieces))
    }

    /// Sets the percentage discount on an existing line.
    pub fn set_discount(&mut self, item_id: &str, discount: DiscountRate) -> CoreResult<&CartLine> {
        let line = self.line_mut(item_id)?;
        line.discount = discount;
        Ok(line)
    }

    /// Returns a line's allocation to stock and drops it from the session.
    pub fn remove_line(&mut self, item_id: &str) -> CoreResult<StockReturn> {
        let index = self
            .lines
            .iter()
            .position(|line| line.item_id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

        let mut line = self.lines.remove(index);
        Ok(line.return_to_stock())
    }

    /// Returns every allocation to stock and empties the session.
    pub fn clear(&mut self) -> Vec<StockReturn> {
        let returns = self
            .lines
            .iter_mut()
            .filter(|line| !line.is_empty())
            .map(CartLine::return_to_stock)
            .collect();

        self.lines.clear();
        self.credit_account = None;
        returns
    }

    /// Sum of line totals.
    pub fn total(&self) -> Money {
        self.active_lines().map(CartLine::line_total).sum()
    }

    /// Sum of line profits.
    pub fn profit(&self) -> Money {
        self.active_lines().map(CartLine::line_profit).sum()
    }

    /// Sum of line discounts.
    pub fn discount_total(&self) -> Money {
        self.active_lines().map(CartLine::discount_amount).sum()
    }

    /// Loads the quantities of a stored sale into this session.
    ///
    /// Each sale line is matched to a current item by id, then by name
    /// ignoring case. Sale lines that resolve to the same item are added
    /// together and allocated once against the item's current stock; a
    /// request that no longer fits rejects every sale line behind it.
    pub fn prefill_from_sale(&mut self, sale: &Sale, items: &[InventoryItem]) -> PrefillReport {
        struct Merged<'a> {
            item: &'a InventoryItem,
            cartons: u32,
            pieces: u32,
            discount: DiscountRate,
            names: Vec<String>,
        }

        let mut report = PrefillReport::default();
        let mut merged: Vec<Merged<'_>> = Vec::new();

        for sold in &sale.items {
            let item = items
                .iter()
                .find(|item| !sold.item_id.is_empty() && item.id == sold.item_id)
                .or_else(|| {
                    items
                        .iter()
                        .find(|item| item.name.to_lowercase() == sold.name.to_lowercase())
                });

            let Some(item) = item else {
                report.unmatched.push(sold.name.clone());
                continue;
            };

            let loose = u32::try_from(sold.loose_pieces()).unwrap_or(u32::MAX);
            match merged.iter().position(|entry| entry.item.id == item.id) {
                Some(index) => {
                    let entry = &mut merged[index];
                    entry.cartons = entry.cartons.saturating_add(sold.cartons);
                    entry.pieces = entry.pieces.saturating_add(loose);
                    entry.names.push(sold.name.clone());
                }
                None => merged.push(Merged {
                    item,
                    cartons: sold.cartons,
                    pieces: loose,
                    discount: sold.discount,
                    names: vec![sold.name.clone()],
                }),
            }
        }

        for entry in merged {
            match self.edit_quantity(entry.item, entry.cartons, entry.pieces) {
                Ok(_) => {
                    // Line exists after a successful edit.
                    if let Ok(line) = self.line_mut(&entry.item.id) {
                        line.discount = entry.discount;
                    }
                    report.restored.extend(entry.names);
                }
                Err(_) => report.rejected.extend(entry.names),
            }
        }

        report
    }

    fn line_mut(&mut self, item_id: &str) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.item_id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))
    }

    fn apply(&mut self, item: &InventoryItem, request: AllocationRequest) -> CoreResult<&CartLine> {
        let index = match self.lines.iter().position(|line| line.item_id == item.id) {
            Some(index) => {
                self.lines[index].apply_request(request)?;
                index
            }
            None => {
                let mut line = CartLine::from_item(item);
                line.apply_request(request)?;
                self.lines.push(line);
                self.lines.len() - 1
            }
        };

        Ok(&self.lines[index])
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleLineItem;
    use chrono::Utc;

    fn item(id: &str, cartons: u32, pieces: u32, ppc: u32) -> InventoryItem {
        let mut item = InventoryItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            category: "General".to_string(),
            actual_price: Money::from_cents(80),
            selling_price: Money::from_cents(100),
            cartons: 0,
            pieces: 0,
            pieces_per_carton: ppc,
            total_pieces: 0,
            danger_level: 0,
        };
        item.set_stock(cartons, pieces);
        item
    }

    #[test]
    fn test_add_to_cart_accumulates_request() {
        let soap = item("soap", 5, 4, 3);
        let mut session = CheckoutSession::new();

        session.add_to_cart(&soap, 2, QuantityUnit::Carton).unwrap();
        session.add_to_cart(&soap, 3, QuantityUnit::Piece).unwrap();
        let line = session.add_to_cart(&soap, 2, QuantityUnit::Piece).unwrap();

        assert_eq!(line.request, AllocationRequest::new(2, 5));
        assert_eq!(line.allocated.broken_cartons, 1);
        assert_eq!(line.live_stock, StockState::new(2, 2, 3));
        assert_eq!(line.original_stock, StockState::new(5, 4, 3));
    }

    #[test]
    fn test_rejected_add_leaves_line_untouched() {
        let juice = item("juice", 1, 0, 5);
        let mut session = CheckoutSession::new();

        session.add_to_cart(&juice, 4, QuantityUnit::Piece).unwrap();
        let before = session.line("juice").cloned().unwrap();

        let err = session.add_to_cart(&juice, 2, QuantityUnit::Piece).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { needed: 6, available: 5, .. }));
        assert_eq!(session.line("juice"), Some(&before));
    }

    #[test]
    fn test_rejected_first_add_creates_no_line() {
        let juice = item("juice", 1, 0, 5);
        let mut session = CheckoutSession::new();

        assert!(session.add_to_cart(&juice, 2, QuantityUnit::Carton).is_err());
        assert!(session.lines().is_empty());
    }

    #[test]
    fn test_edit_is_order_independent() {
        let soap = item("soap", 5, 4, 3);

        let mut edited = CheckoutSession::new();
        edited.edit_quantity(&soap, 0, 7).unwrap();
        edited.edit_quantity(&soap, 4, 1).unwrap();
        edited.edit_quantity(&soap, 2, 3).unwrap();

        let mut direct = CheckoutSession::new();
        direct.edit_quantity(&soap, 2, 3).unwrap();

        assert_eq!(edited.line("soap"), direct.line("soap"));
        assert_eq!(
            direct.line("soap").unwrap().live_stock,
            StockState::new(3, 1, 3)
        );
    }

    #[test]
    fn test_edit_uses_snapshot_not_fresh_item() {
        let mut soap = item("soap", 2, 0, 5);
        let mut session = CheckoutSession::new();
        session.edit_quantity(&soap, 0, 3).unwrap();

        // Another terminal sold everything; the line keeps its snapshot.
        soap.set_stock(0, 0);
        let line = session.edit_quantity(&soap, 0, 7).unwrap();
        assert_eq!(line.live_stock, StockState::new(0, 3, 5));
    }

    #[test]
    fn test_remove_line_returns_broken_cartons() {
        let juice = item("juice", 2, 0, 5);
        let mut session = CheckoutSession::new();
        session.edit_quantity(&juice, 0, 7).unwrap();

        let returned = session.remove_line("juice").unwrap();

        // 2 broken cartons back, minus the 3 loose pieces they left behind
        assert_eq!(returned.cartons, 2);
        assert_eq!(returned.pieces, -3);
        assert!(session.line("juice").is_none());
    }

    #[test]
    fn test_return_restores_original_stock() {
        let soap = item("soap", 5, 4, 3);
        let mut line = CartLine::from_item(&soap);
        line.apply_request(AllocationRequest::new(2, 5)).unwrap();

        let returned = line.return_to_stock();

        assert_eq!(returned.cartons, 3);
        assert_eq!(returned.pieces, 2);
        assert_eq!(line.live_stock, line.original_stock);
        assert!(line.is_empty());
    }

    #[test]
    fn test_remove_unknown_line() {
        let mut session = CheckoutSession::new();
        assert!(matches!(
            session.remove_line("ghost"),
            Err(CoreError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_clear_returns_every_line() {
        let soap = item("soap", 5, 4, 3);
        let juice = item("juice", 2, 0, 5);
        let mut session = CheckoutSession::new();
        session.edit_quantity(&soap, 1, 0).unwrap();
        session.edit_quantity(&juice, 0, 2).unwrap();
        session.select_credit_account(Some("acct-1".to_string()));

        let returns = session.clear();

        assert_eq!(returns.len(), 2);
        assert!(session.is_empty());
        assert!(session.credit_account().is_none());
    }

    #[test]
    fn test_totals_and_profit() {
        let soap = item("soap", 5, 4, 3);
        let mut session = CheckoutSession::new();
        session.edit_quantity(&soap, 2, 4).unwrap(); // 10 units
        session
            .set_discount("soap", DiscountRate::from_percent(10))
            .unwrap();

        // 10 × 1.00 = 10.00, minus 1.00 discount
        assert_eq!(session.total(), Money::from_cents(900));
        // 10 × 0.20 margin = 2.00, minus 1.00 discount
        assert_eq!(session.profit(), Money::from_cents(100));
        assert_eq!(session.discount_total(), Money::from_cents(100));
    }

    #[test]
    fn test_pieces_only_item() {
        let candy = item("candy", 0, 40, 0);
        let mut session = CheckoutSession::new();

        let line = session.add_to_cart(&candy, 15, QuantityUnit::Piece).unwrap();
        assert_eq!(line.allocated.pieces, 15);
        assert_eq!(line.live_stock.pieces, 25);
    }

    #[test]
    fn test_prefill_matches_by_id_then_name() {
        let soap = item("soap", 5, 4, 3);
        let juice = item("juice-new-id", 2, 0, 5);
        let tea = item("tea", 1, 0, 3);
        let sold = |item_id: &str, name: &str, cartons: u32, total: u64, ppc: u32| SaleLineItem {
            item_id: item_id.to_string(),
            name: name.to_string(),
            category: "General".to_string(),
            unit_price: Money::from_cents(100),
            cartons,
            pieces_per_carton: ppc,
            total_pieces: total,
            broken_cartons: 0,
            discount: DiscountRate::from_percent(5),
            line_total: Money::zero(),
        };
        let sale = Sale {
            sale_id: "Sale-3".to_string(),
            timestamp: Utc::now(),
            items: vec![
                sold("soap", "Item soap", 1, 5, 3),
                sold("juice-old-id", "ITEM JUICE-NEW-ID", 0, 4, 5),
                sold("gone", "Discontinued", 0, 1, 1),
                sold("tea", "Item tea", 9, 27, 3),
            ],
            total: Money::zero(),
            profit: Money::zero(),
            customer: None,
        };

        let mut session = CheckoutSession::new();
        let report = session.prefill_from_sale(&sale, &[soap, juice, tea]);

        assert_eq!(report.unmatched, vec!["Discontinued".to_string()]);
        assert_eq!(report.rejected, vec!["Item tea".to_string()]);
        assert_eq!(report.restored.len(), 2);

        let soap_line = session.line("soap").unwrap();
        assert_eq!(soap_line.request, AllocationRequest::new(1, 2));
        assert_eq!(soap_line.discount, DiscountRate::from_percent(5));
        assert_eq!(
            session.line("juice-new-id").unwrap().request,
            AllocationRequest::new(0, 4)
        );
    }

    #[test]
    fn test_prefill_adds_up_lines_for_the_same_item() {
        let soap = item("soap", 5, 4, 3);
        let sold = |item_id: &str, name: &str, cartons: u32, total: u64| SaleLineItem {
            item_id: item_id.to_string(),
            name: name.to_string(),
            category: "General".to_string(),
            unit_price: Money::from_cents(100),
            cartons,
            pieces_per_carton: 3,
            total_pieces: total,
            broken_cartons: 0,
            discount: DiscountRate::zero(),
            line_total: Money::zero(),
        };
        let sale = Sale {
            sale_id: "Sale-7".to_string(),
            timestamp: Utc::now(),
            items: vec![
                sold("soap", "Item soap", 1, 4),
                sold("", "item SOAP", 1, 5),
            ],
            total: Money::zero(),
            profit: Money::zero(),
            customer: None,
        };

        let mut session = CheckoutSession::new();
        let report = session.prefill_from_sale(&sale, std::slice::from_ref(&soap));

        assert_eq!(report.restored.len(), 2);
        assert!(report.rejected.is_empty());
        assert_eq!(session.lines().len(), 1);
        assert_eq!(session.line("soap").unwrap().request, AllocationRequest::new(2, 3));

        // Together the two lines ask for more than is on the shelf.
        let greedy = Sale {
            items: vec![sold("soap", "Item soap", 4, 12), sold("soap", "Item soap", 3, 9)],
            ..sale
        };
        let mut session = CheckoutSession::new();
        let report = session.prefill_from_sale(&greedy, &[soap]);

        assert!(report.restored.is_empty());
        assert_eq!(report.rejected.len(), 2);
        assert!(session.line("soap").is_none());
    }
}
