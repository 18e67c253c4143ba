use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Store registration
// ---------------------------------------------------------------------------

/// One linked seller account. Created when a user connects a store;
/// immutable afterwards except for wholesale replacement under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    /// Per-store access token presented alongside the signed headers.
    pub token: String,
}

/// Shop profile as returned by the shop-info endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInfo {
    pub shop_name: String,
    pub region: Option<String>,
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Raw records: fetched fresh on every orchestration, never persisted
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
    pub stock: u64,
    pub sales_count: u64,
    /// Absent when the listing carries no category; such products are
    /// skipped by the category distribution.
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub amount: f64,
    /// Unix epoch seconds of order creation.
    pub created_at: i64,
}

/// One page of the product listing. The client never follows pagination
/// itself; `has_more` tells the caller whether another page exists.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub has_more: bool,
}

// ---------------------------------------------------------------------------
// Derived metrics: recomputed from scratch on every fetch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_products: usize,
    pub total_sales: f64,
    /// Product with the highest sales count, ties broken by first
    /// occurrence in fetch order. None when the product set is empty.
    pub best_seller: Option<Product>,
    pub out_of_stock: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesTrendPoint {
    /// Calendar date, short month + day ("Aug 29").
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDistributionEntry {
    pub category: String,
    pub count: usize,
}

/// Everything one dashboard render needs. Owned by the caller after
/// return; the pipeline keeps no state between fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub store_info: StoreInfo,
    pub products: Vec<Product>,
    pub summary: Summary,
    pub sales_trend: Vec<SalesTrendPoint>,
    pub category_distribution: Vec<CategoryDistributionEntry>,
}

// ---------------------------------------------------------------------------
// Fetch lifecycle, published to the presentation layer via watch channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Ready(AggregateResult),
    Failed(String),
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchState::Ready(_) | FetchState::Failed(_))
    }
}
