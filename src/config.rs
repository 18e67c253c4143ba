use crate::error::{AppError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://partner.shopeemobile.com/api/v1";

/// Partner API endpoint paths (leading slash, no query string; the signed
/// canonical string includes the path exactly as sent).
pub const SHOP_INFO_PATH: &str = "/shop/get_shop_info";
pub const ITEM_LIST_PATH: &str = "/item/list";
pub const ITEM_GET_PATH: &str = "/item/get";
pub const ORDER_LIST_PATH: &str = "/order/get_order_list";

/// Per-request timeout for every partner API call (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Trailing window of the daily sales trend, in calendar days.
pub const TREND_WINDOW_DAYS: u32 = 30;

/// Default page size for the product listing. The client fetches a single
/// page; callers loop on `has_more`/offset themselves if they want the full
/// catalog.
pub const DEFAULT_PRODUCT_LIMIT: u32 = 100;

/// Default page size for the order listing.
pub const DEFAULT_ORDER_PAGE_SIZE: u32 = 100;

pub const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    /// Partner credentials identifying this application to the marketplace
    /// API. Read once at startup, never mutated (SHOPEE_PARTNER_ID /
    /// SHOPEE_PARTNER_KEY).
    pub partner_id: String,
    pub partner_key: String,
    pub log_level: String,
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let cfg = Self {
            api_base_url: std::env::var("SHOPEE_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            partner_id: std::env::var("SHOPEE_PARTNER_ID").unwrap_or_default(),
            partner_key: std::env::var("SHOPEE_PARTNER_KEY").unwrap_or_default(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Missing signing credentials are fatal at startup; every request
    /// would fail signature verification anyway.
    pub fn validate(&self) -> Result<()> {
        if self.partner_id.is_empty() {
            return Err(AppError::Config("SHOPEE_PARTNER_ID must be set".to_string()));
        }
        if self.partner_key.is_empty() {
            return Err(AppError::Config("SHOPEE_PARTNER_KEY must be set".to_string()));
        }
        Ok(())
    }
}
