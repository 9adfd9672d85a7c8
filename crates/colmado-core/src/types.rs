//! # Domain Types
//!
//! Core domain types used throughout Colmado POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  ref_type       │       │
//! │  │  sku (business) │   │  invoice_no     │   │  qty_change     │       │
//! │  │  stock_qty      │   │  status / ncf   │   │  before/after   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ FiscalSequence  │   │  CreditAccount  │   │ PurchaseOrder   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  doc_type 'B02' │   │  balance_cents  │   │  status         │       │
//! │  │  current_number │   │  due_date       │   │  items          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, invoice_no, ncf, ...) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::NCF_NUMBER_WIDTH;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (ITBIS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// The fixed ITBIS rate every sale in this engine settles under.
    #[inline]
    pub const fn itbis() -> Self {
        TaxRate(crate::ITBIS_RATE_BPS)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::itbis()
    }
}

// =============================================================================
// Actor Context
// =============================================================================

/// The authenticated actor every engine operation runs as.
///
/// Supplied by the external auth layer and threaded as an explicit parameter
/// into every operation - never ambient/global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    /// Company (tenant) the operation is scoped to.
    pub company_id: String,
    /// User performing the operation; recorded on audit trails.
    pub user_id: String,
}

impl ActorContext {
    pub fn new(company_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        ActorContext {
            company_id: company_id.into(),
            user_id: user_id.into(),
        }
    }
}

// =============================================================================
// Sale Status / Invoice Type / Payment Method
// =============================================================================

/// The status of a sale through its lifecycle.
///
/// ```text
/// DRAFT ──pay──► PAID ────refund──► PARTIAL_REFUNDED ──refund──► REFUNDED
///   │              └──► CREDIT ──┘
///   │
///   └──cancel──► CANCELLED (also reachable from PAID/CREDIT, restoring stock)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is a priced quote; no stock has moved.
    Draft,
    /// Settled in full with a non-credit payment method.
    Paid,
    /// Settled on credit terms; a credit account tracks the balance.
    Credit,
    /// Some, but not all, sold quantity has been refunded.
    PartialRefunded,
    /// All sold quantity has been refunded.
    Refunded,
    /// Terminal: cancelled, any stock effect rolled back.
    Cancelled,
}

impl SaleStatus {
    /// Whether settlement has already deducted stock for this sale.
    pub fn has_stock_effect(&self) -> bool {
        matches!(
            self,
            SaleStatus::Paid
                | SaleStatus::Credit
                | SaleStatus::PartialRefunded
                | SaleStatus::Refunded
        )
    }

    /// Whether a refund may be applied in this status.
    pub fn is_refundable(&self) -> bool {
        matches!(
            self,
            SaleStatus::Paid | SaleStatus::Credit | SaleStatus::PartialRefunded
        )
    }

    /// Stable string form, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Draft => "draft",
            SaleStatus::Paid => "paid",
            SaleStatus::Credit => "credit",
            SaleStatus::PartialRefunded => "partial_refunded",
            SaleStatus::Refunded => "refunded",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Draft
    }
}

/// Whether the sale carries a fiscal document number (NCF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    /// Plain receipt; no NCF, no RNC requirement.
    Normal,
    /// Fiscal invoice; requires a customer RNC and an issued NCF.
    Fiscal,
}

impl Default for InvoiceType {
    fn default() -> Self {
        InvoiceType::Normal
    }
}

/// How a sale was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; the only method that produces change.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
    /// Credit terms; opens a credit account for the balance.
    Credit,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// What caused a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    /// Outgoing stock from a settled sale.
    Sale,
    /// Incoming stock from a (partial) refund.
    Refund,
    /// Incoming stock from receiving a purchase order.
    PurchaseReceipt,
    /// Manual operator adjustment (requires a note).
    Adjustment,
    /// Incoming stock restored by cancelling a settled sale.
    CancelRestore,
}

/// One append-only ledger entry representing a quantity change and its cause.
///
/// Summing `qty_change` for a product over its whole history reconstructs
/// the product's `stock_qty` exactly; `before_qty`/`after_qty` are audit
/// snapshots only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub company_id: String,
    pub product_id: String,
    pub ref_type: RefType,
    /// Sale or purchase order id; None for manual adjustments.
    pub ref_id: Option<String>,
    /// Signed quantity delta (negative for outgoing stock).
    pub qty_change: i64,
    pub before_qty: i64,
    pub after_qty: i64,
    pub unit_cost_cents: Option<i64>,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// One product that could not cover its requested settlement quantity.
///
/// Settlement reports ALL shortages in one response so the caller can
/// resolve every line in a single round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    pub product_id: String,
    pub requested: i64,
    pub available: i64,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Owned by the catalog module; this engine only ever mutates the stock
/// fields (`stock_qty`, `cost_cents`) and never deletes products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Company this product belongs to.
    pub company_id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown on invoices.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Latest received unit cost in cents (cost basis).
    pub cost_cents: Option<i64>,

    /// Current stock level, in whole units.
    pub stock_qty: i64,

    /// Reorder threshold.
    pub min_stock: i64,

    /// Optional shelf capacity.
    pub max_stock: Option<i64>,

    /// Advisory flag: allow stock to go negative.
    ///
    /// Respected by manual adjustments only. Settlement ALWAYS blocks
    /// oversell regardless of this flag.
    pub allow_negative_stock: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether current stock has fallen to or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_qty <= self.min_stock
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub company_id: String,
    /// Human-facing invoice number (time-based, NOT the fiscal number).
    pub invoice_no: String,
    pub invoice_type: InvoiceType,
    /// Fiscal document number; assigned at most once, never reused.
    pub ncf: Option<String>,
    pub status: SaleStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub itbis_cents: i64,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub change_cents: i64,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    /// Customer fiscal id (RNC/cedula); required for fiscal invoices.
    pub customer_rnc: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
///
/// Immutable once the sale is created: line totals are computed exactly once,
/// and refunds/cancellations operate on quantities, never on re-derived
/// prices. Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold, in whole units.
    pub qty: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Discount applied to this line.
    pub discount_cents: i64,
    /// ITBIS for this line.
    pub itbis_cents: i64,
    /// Line subtotal + line ITBIS.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Fiscal Sequence
// =============================================================================

/// Per document-type atomic counter producing unique fiscal numbers.
///
/// Mutated only by a single increment-and-return statement; never
/// read-then-written in two steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FiscalSequence {
    pub id: String,
    pub company_id: String,
    /// NCF series + type prefix, e.g. "B01", "B02".
    pub doc_type: String,
    /// Last number issued (monotonic).
    pub current_number: i64,
    /// Optional cap; issuance stops when reached.
    pub max_number: Option<i64>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Formats an issued sequence number into a full NCF document code.
///
/// ## Example
/// ```rust
/// use colmado_core::types::format_ncf;
///
/// assert_eq!(format_ncf("B02", 7), "B0200000007");
/// ```
pub fn format_ncf(doc_type: &str, number: i64) -> String {
    format!("{}{:0width$}", doc_type, number, width = NCF_NUMBER_WIDTH)
}

// =============================================================================
// Credit Account
// =============================================================================

/// Status of a credit account (receivable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    /// Nothing paid yet.
    Open,
    /// Partially paid down.
    Partial,
    /// Fully paid.
    Paid,
    /// Past due date with a remaining balance.
    Overdue,
}

impl CreditStatus {
    /// Derives the status a freshly opened account should carry.
    pub fn for_new_account(paid_cents: i64, balance_cents: i64) -> Self {
        if balance_cents <= 0 {
            CreditStatus::Paid
        } else if paid_cents > 0 {
            CreditStatus::Partial
        } else {
            CreditStatus::Open
        }
    }
}

/// A receivable opened when a sale settles on credit terms.
///
/// Created exactly once per credit settlement; deleted if the originating
/// sale is cancelled (cancellation is a rollback, not a write-off).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditAccount {
    pub id: String,
    pub company_id: String,
    pub sale_id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub total_cents: i64,
    pub paid_cents: i64,
    /// Always `total_cents - paid_cents`.
    pub balance_cents: i64,
    pub due_date: DateTime<Utc>,
    pub status: CreditStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Purchase Order
// =============================================================================

/// Status of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Received,
    Cancelled,
}

impl PurchaseStatus {
    /// Stable string form, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Received => "received",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }
}

/// An inbound stock order from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrder {
    pub id: String,
    pub company_id: String,
    pub supplier_name: String,
    pub status: PurchaseStatus,
    pub total_cents: i64,
    pub received_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A committed line on a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrderItem {
    pub id: String,
    pub purchase_order_id: String,
    pub product_id: String,
    pub qty: i64,
    pub unit_cost_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_itbis() {
        let rate = TaxRate::itbis();
        assert_eq!(rate.bps(), 1800);
        assert!((rate.percentage() - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_sale_status_transitions() {
        assert!(!SaleStatus::Draft.has_stock_effect());
        assert!(SaleStatus::Paid.has_stock_effect());
        assert!(SaleStatus::Credit.has_stock_effect());
        assert!(SaleStatus::PartialRefunded.has_stock_effect());
        assert!(!SaleStatus::Cancelled.has_stock_effect());

        assert!(SaleStatus::Paid.is_refundable());
        assert!(SaleStatus::PartialRefunded.is_refundable());
        assert!(!SaleStatus::Refunded.is_refundable());
        assert!(!SaleStatus::Draft.is_refundable());
    }

    #[test]
    fn test_format_ncf() {
        assert_eq!(format_ncf("B01", 1), "B0100000001");
        assert_eq!(format_ncf("B02", 12345678), "B0212345678");
    }

    #[test]
    fn test_credit_status_for_new_account() {
        assert_eq!(CreditStatus::for_new_account(0, 1000), CreditStatus::Open);
        assert_eq!(CreditStatus::for_new_account(500, 500), CreditStatus::Partial);
        assert_eq!(CreditStatus::for_new_account(1000, 0), CreditStatus::Paid);
    }

    #[test]
    fn test_low_stock() {
        let now = Utc::now();
        let product = Product {
            id: "p1".into(),
            company_id: "c1".into(),
            sku: "COLA-600".into(),
            name: "Refresco Cola 600ml".into(),
            price_cents: 7500,
            cost_cents: Some(5000),
            stock_qty: 3,
            min_stock: 5,
            max_stock: None,
            allow_negative_stock: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(product.is_low_stock());
    }
}
