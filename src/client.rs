use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::{
    Config, HTTP_TIMEOUT_SECS, ITEM_GET_PATH, ITEM_LIST_PATH, ORDER_LIST_PATH, SHOP_INFO_PATH,
};
use crate::error::{AppError, Result};
use crate::signer;
use crate::types::{Order, Product, ProductPage, StoreInfo};

/// The partner API surface the orchestrator depends on. A trait so tests
/// can drive the orchestration with a scripted client.
///
/// `token` is the per-store credential recorded at registration; the wire
/// contract authenticates through the signed headers alone, so the calls
/// accept it without sending it.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    async fn get_store_info(&self, shop_id: &str, token: &str) -> Result<StoreInfo>;

    /// Fetches a single page of the catalog. Looping on `has_more`/offset
    /// is the caller's responsibility.
    async fn get_products(
        &self,
        shop_id: &str,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<ProductPage>;

    async fn get_product_detail(&self, shop_id: &str, token: &str, item_id: u64)
        -> Result<Product>;

    async fn get_orders(
        &self,
        shop_id: &str,
        token: &str,
        time_from: i64,
        time_to: i64,
        page_size: u32,
    ) -> Result<Vec<Order>>;
}

/// reqwest-backed client. No retries, no cache; every call is a fresh
/// round trip, and any transport failure or non-2xx status aborts the
/// caller's orchestration.
pub struct ShopeeClient {
    http: reqwest::Client,
    base_url: String,
    partner_id: String,
    partner_key: String,
}

impl ShopeeClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            partner_id: cfg.partner_id.clone(),
            partner_key: cfg.partner_key.clone(),
        })
    }

    /// Issue one signed GET and unwrap the `response` field of the JSON
    /// envelope. `extra` carries the endpoint-specific query params beyond
    /// the always-present `partner_id`/`shop_id`/`timestamp`.
    async fn signed_get(
        &self,
        endpoint: &'static str,
        shop_id: &str,
        extra: &[(&str, String)],
    ) -> Result<Value> {
        let timestamp = now_secs();
        let headers = signer::sign(
            &self.partner_id,
            &self.partner_key,
            shop_id,
            endpoint,
            timestamp,
            "",
        )?;

        let mut query: Vec<(&str, String)> = vec![
            ("partner_id", self.partner_id.clone()),
            ("shop_id", shop_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        query.extend(extra.iter().cloned());

        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint, shop_id, "partner API request");

        let body: Value = self
            .http
            .get(&url)
            .header("Content-Type", headers.content_type)
            .header("Authorization", &headers.authorization)
            .header("X-Timestamp", headers.timestamp.to_string())
            .header("X-Shopid", &headers.shop_id)
            .query(&query)
            .send()
            .await
            .map_err(|source| AppError::RemoteCall { endpoint, source })?
            .error_for_status()
            .map_err(|source| AppError::RemoteCall { endpoint, source })?
            .json()
            .await
            .map_err(|source| AppError::RemoteCall { endpoint, source })?;

        body.get("response")
            .cloned()
            .ok_or_else(|| AppError::InvalidRecord {
                endpoint,
                detail: "missing response envelope".to_string(),
            })
    }
}

#[async_trait]
impl MarketplaceApi for ShopeeClient {
    async fn get_store_info(&self, shop_id: &str, _token: &str) -> Result<StoreInfo> {
        let response = self.signed_get(SHOP_INFO_PATH, shop_id, &[]).await?;
        parse_store_info(&response).map_err(|detail| AppError::InvalidRecord {
            endpoint: SHOP_INFO_PATH,
            detail,
        })
    }

    async fn get_products(
        &self,
        shop_id: &str,
        _token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<ProductPage> {
        let response = self
            .signed_get(
                ITEM_LIST_PATH,
                shop_id,
                &[("offset", offset.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        parse_product_page(&response).map_err(|detail| AppError::InvalidRecord {
            endpoint: ITEM_LIST_PATH,
            detail,
        })
    }

    async fn get_product_detail(
        &self,
        shop_id: &str,
        _token: &str,
        item_id: u64,
    ) -> Result<Product> {
        let response = self
            .signed_get(ITEM_GET_PATH, shop_id, &[("item_id", item_id.to_string())])
            .await?;
        response
            .get("item")
            .ok_or_else(|| "missing item".to_string())
            .and_then(parse_product)
            .map_err(|detail| AppError::InvalidRecord {
                endpoint: ITEM_GET_PATH,
                detail,
            })
    }

    async fn get_orders(
        &self,
        shop_id: &str,
        _token: &str,
        time_from: i64,
        time_to: i64,
        page_size: u32,
    ) -> Result<Vec<Order>> {
        let response = self
            .signed_get(
                ORDER_LIST_PATH,
                shop_id,
                &[
                    ("time_from", time_from.to_string()),
                    ("time_to", time_to.to_string()),
                    ("page_size", page_size.to_string()),
                ],
            )
            .await?;
        parse_orders(&response).map_err(|detail| AppError::InvalidRecord {
            endpoint: ORDER_LIST_PATH,
            detail,
        })
    }
}

// ---------------------------------------------------------------------------
// Boundary parsing: typed records or a rejection, never silent defaults
// ---------------------------------------------------------------------------

pub(crate) fn parse_store_info(v: &Value) -> std::result::Result<StoreInfo, String> {
    let shop_name = v
        .get("shop_name")
        .and_then(|s| s.as_str())
        .ok_or("shop_name missing or not a string")?
        .to_string();

    Ok(StoreInfo {
        shop_name,
        region: v.get("region").and_then(|s| s.as_str()).map(str::to_string),
        status: v.get("status").and_then(|s| s.as_str()).map(str::to_string),
    })
}

pub(crate) fn parse_product_page(v: &Value) -> std::result::Result<ProductPage, String> {
    let raw_items = v
        .get("item_list")
        .and_then(|l| l.as_array())
        .ok_or("item_list missing or not an array")?;

    let mut items = Vec::with_capacity(raw_items.len());
    for (idx, item) in raw_items.iter().enumerate() {
        items.push(parse_product(item).map_err(|e| format!("item_list[{idx}]: {e}"))?);
    }

    let has_more = v.get("more").and_then(|m| m.as_bool()).unwrap_or(false);
    Ok(ProductPage { items, has_more })
}

pub(crate) fn parse_product(v: &Value) -> std::result::Result<Product, String> {
    let id = v
        .get("item_id")
        .and_then(|x| x.as_u64())
        .ok_or("item_id missing or not a non-negative integer")?;
    let name = v
        .get("item_name")
        .and_then(|s| s.as_str())
        .ok_or("item_name missing or not a string")?
        .to_string();
    let price = v
        .get("price")
        .and_then(numeric)
        .ok_or("price missing or not numeric")?;
    let stock = v
        .get("stock")
        .and_then(|x| x.as_u64())
        .ok_or("stock missing or negative")?;
    let sales_count = v
        .get("sales")
        .and_then(|x| x.as_u64())
        .ok_or("sales missing or negative")?;
    let category = v
        .get("category_name")
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(Product {
        id,
        name,
        price,
        stock,
        sales_count,
        category,
    })
}

pub(crate) fn parse_orders(v: &Value) -> std::result::Result<Vec<Order>, String> {
    let raw = v
        .get("orders")
        .and_then(|l| l.as_array())
        .ok_or("orders missing or not an array")?;

    let mut orders = Vec::with_capacity(raw.len());
    for (idx, order) in raw.iter().enumerate() {
        let amount = order
            .get("order_amount")
            .and_then(numeric)
            .ok_or_else(|| format!("orders[{idx}]: order_amount missing or not numeric"))?;
        let created_at = order
            .get("create_time")
            .and_then(|x| x.as_i64())
            .ok_or_else(|| format!("orders[{idx}]: create_time missing or not an integer"))?;
        orders.push(Order { amount, created_at });
    }
    Ok(orders)
}

/// The partner API serializes money inconsistently, sometimes a JSON
/// number, sometimes a numeric string. Accept both, reject everything else.
fn numeric(v: &Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(base_url: &str) -> ShopeeClient {
        ShopeeClient::new(&Config {
            api_base_url: base_url.to_string(),
            partner_id: "10001".to_string(),
            partner_key: "secret".to_string(),
            log_level: "info".to_string(),
            api_port: 0,
        })
        .unwrap()
    }

    // -- parsing ------------------------------------------------------------

    #[test]
    fn parse_product_accepts_string_price() {
        let v = json!({
            "item_id": 7, "item_name": "Mug", "price": "12.50",
            "stock": 3, "sales": 40, "category_name": "Kitchen"
        });
        let p = parse_product(&v).unwrap();
        assert_eq!(p.id, 7);
        assert!((p.price - 12.5).abs() < 1e-9);
        assert_eq!(p.category.as_deref(), Some("Kitchen"));
    }

    #[test]
    fn parse_product_rejects_non_numeric_price() {
        let v = json!({
            "item_id": 7, "item_name": "Mug", "price": "free",
            "stock": 3, "sales": 40
        });
        let err = parse_product(&v).unwrap_err();
        assert!(err.contains("price"), "got: {err}");
    }

    #[test]
    fn parse_product_rejects_negative_stock() {
        let v = json!({
            "item_id": 7, "item_name": "Mug", "price": 1.0,
            "stock": -2, "sales": 40
        });
        assert!(parse_product(&v).unwrap_err().contains("stock"));
    }

    #[test]
    fn parse_product_treats_empty_category_as_uncategorized() {
        let v = json!({
            "item_id": 7, "item_name": "Mug", "price": 1.0,
            "stock": 0, "sales": 0, "category_name": ""
        });
        assert!(parse_product(&v).unwrap().category.is_none());
    }

    #[test]
    fn parse_product_page_reports_index_of_bad_record() {
        let v = json!({
            "item_list": [
                { "item_id": 1, "item_name": "A", "price": 1.0, "stock": 1, "sales": 1 },
                { "item_id": 2, "item_name": "B", "price": null, "stock": 1, "sales": 1 }
            ],
            "more": true
        });
        let err = parse_product_page(&v).unwrap_err();
        assert!(err.starts_with("item_list[1]"), "got: {err}");
    }

    #[test]
    fn parse_orders_rejects_non_numeric_amount() {
        let v = json!({ "orders": [ { "order_amount": {}, "create_time": 100 } ] });
        assert!(parse_orders(&v).unwrap_err().contains("order_amount"));
    }

    #[test]
    fn parse_store_info_requires_name() {
        assert!(parse_store_info(&json!({ "region": "SG" })).is_err());
        let info = parse_store_info(&json!({ "shop_name": "My Shop" })).unwrap();
        assert_eq!(info.shop_name, "My Shop");
        assert!(info.region.is_none());
    }

    // -- wire ---------------------------------------------------------------

    #[tokio::test]
    async fn get_products_sends_signed_headers_and_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/item/list")
                .query_param("partner_id", "10001")
                .query_param("shop_id", "shop9")
                .query_param("offset", "0")
                .query_param("limit", "100")
                .query_param_exists("timestamp")
                .header("content-type", "application/json")
                .header("x-shopid", "shop9")
                .header_exists("authorization")
                .header_exists("x-timestamp");
            then.status(200).json_body(json!({
                "response": {
                    "item_list": [
                        { "item_id": 1, "item_name": "A", "price": 9.99,
                          "stock": 0, "sales": 12, "category_name": "Toys" }
                    ],
                    "more": false
                }
            }));
        });

        let client = test_client(&server.base_url());
        let page = client.get_products("shop9", "tok", 0, 100).await.unwrap();

        mock.assert();
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_more);
        assert_eq!(page.items[0].id, 1);
    }

    #[tokio::test]
    async fn get_orders_passes_time_window() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/order/get_order_list")
                .query_param("time_from", "100")
                .query_param("time_to", "200")
                .query_param("page_size", "100");
            then.status(200).json_body(json!({
                "response": { "orders": [ { "order_amount": "50.5", "create_time": 150 } ] }
            }));
        });

        let client = test_client(&server.base_url());
        let orders = client.get_orders("shop9", "tok", 100, 200, 100).await.unwrap();

        mock.assert();
        assert_eq!(orders.len(), 1);
        assert!((orders[0].amount - 50.5).abs() < 1e-9);
        assert_eq!(orders[0].created_at, 150);
    }

    #[tokio::test]
    async fn non_2xx_surfaces_as_remote_call_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/shop/get_shop_info");
            then.status(503);
        });

        let client = test_client(&server.base_url());
        let err = client.get_store_info("shop9", "tok").await.unwrap_err();
        match err {
            AppError::RemoteCall { endpoint, .. } => assert_eq!(endpoint, SHOP_INFO_PATH),
            other => panic!("expected RemoteCall, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_envelope_is_a_malformed_record() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/shop/get_shop_info");
            then.status(200).json_body(json!({ "error": "" }));
        });

        let client = test_client(&server.base_url());
        let err = client.get_store_info("shop9", "tok").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRecord { .. }));
    }

    #[tokio::test]
    async fn get_product_detail_unwraps_single_item() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/item/get").query_param("item_id", "42");
            then.status(200).json_body(json!({
                "response": {
                    "item": { "item_id": 42, "item_name": "Lamp", "price": 30,
                              "stock": 5, "sales": 2 }
                }
            }));
        });

        let client = test_client(&server.base_url());
        let product = client.get_product_detail("shop9", "tok", 42).await.unwrap();
        assert_eq!(product.id, 42);
        assert_eq!(product.name, "Lamp");
    }
}
