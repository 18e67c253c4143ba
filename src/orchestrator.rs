use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::MarketplaceApi;
use crate::config::{
    DEFAULT_ORDER_PAGE_SIZE, DEFAULT_PRODUCT_LIMIT, SECS_PER_DAY, TREND_WINDOW_DAYS,
};
use crate::error::{AppError, Result};
use crate::metrics::{compute_category_distribution, compute_sales_trend, compute_summary};
use crate::state::StoreRegistry;
use crate::types::AggregateResult;

/// Coordinates one dashboard fetch: registry lookup, the three partner API
/// calls, then the aggregation pass. Holds no per-fetch state; concurrent
/// fetches for the same store each do their own full round trips (no
/// single-flight deduplication).
pub struct Orchestrator<C: MarketplaceApi> {
    client: Arc<C>,
    registry: Arc<StoreRegistry>,
}

impl<C: MarketplaceApi> Orchestrator<C> {
    pub fn new(client: Arc<C>, registry: Arc<StoreRegistry>) -> Self {
        Self { client, registry }
    }

    pub fn registry(&self) -> &Arc<StoreRegistry> {
        &self.registry
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Fetch and aggregate everything the dashboard needs for one store.
    ///
    /// The registry lookup happens before any network I/O. The three
    /// endpoint calls run concurrently all-or-nothing: the first failure
    /// aborts the siblings and propagates unchanged, and already-resolved
    /// results are discarded; a partial `AggregateResult` is never built.
    /// `cancel` aborts in-flight calls and pending aggregation with
    /// `AppError::Cancelled`.
    pub async fn fetch_store_data(
        &self,
        shop_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult> {
        let token = self
            .registry
            .token_for(shop_id)
            .ok_or_else(|| AppError::UnknownStore(shop_id.to_string()))?;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        // One snapshot shared by the order window and the trend axis, so
        // total_sales and the trend series agree on what "the last 30 days"
        // means.
        let end_epoch = now_secs();
        let time_from = end_epoch - i64::from(TREND_WINDOW_DAYS) * SECS_PER_DAY;

        let calls = async {
            tokio::try_join!(
                self.client.get_store_info(shop_id, &token),
                self.client
                    .get_products(shop_id, &token, 0, DEFAULT_PRODUCT_LIMIT),
                self.client.get_orders(
                    shop_id,
                    &token,
                    time_from,
                    end_epoch,
                    DEFAULT_ORDER_PAGE_SIZE
                ),
            )
        };

        let (store_info, page, orders) = tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            res = calls => res?,
        };

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let summary = compute_summary(&page.items, &orders);
        let sales_trend = compute_sales_trend(&orders, end_epoch, TREND_WINDOW_DAYS);
        let category_distribution = compute_category_distribution(&page.items);

        info!(
            shop_id,
            products = summary.total_products,
            orders = orders.len(),
            total_sales = summary.total_sales,
            has_more_products = page.has_more,
            "store data assembled"
        );

        Ok(AggregateResult {
            store_info,
            products: page.items,
            summary,
            sales_trend,
            category_distribution,
        })
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
