use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::client::{MarketplaceApi, ShopeeClient};
use crate::error::AppError;
use crate::orchestrator::Orchestrator;
use crate::session::DashboardSession;
use crate::types::{AggregateResult, FetchState, Product, Store};

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator<ShopeeClient>>,
    /// One dashboard session per store id, created lazily on first refresh.
    pub sessions: Arc<DashMap<String, Arc<DashboardSession<ShopeeClient>>>>,
}

impl ApiState {
    pub fn new(orchestrator: Arc<Orchestrator<ShopeeClient>>) -> Self {
        Self {
            orchestrator,
            sessions: Arc::new(DashMap::new()),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/stores", get(get_stores).post(post_store))
        .route("/stores/:id", get(get_store))
        .route("/stores/:id/dashboard", get(get_dashboard))
        .route("/stores/:id/products/:item_id", get(get_product_detail))
        .route("/stores/:id/refresh", post(post_refresh))
        .route("/stores/:id/refresh/cancel", post(post_cancel))
        .route("/stores/:id/status", get(get_status))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AddStoreRequest {
    pub id: String,
    pub name: String,
    pub token: String,
}

/// Public view of a registered store; the access token never leaves the
/// registry.
#[derive(Serialize)]
pub struct StoreResponse {
    pub id: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub registered_stores: usize,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    /// Long-poll: block until the fetch reaches a terminal state.
    pub wait: Option<bool>,
}

#[derive(Serialize)]
pub struct FetchStatusResponse {
    pub state: &'static str,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AggregateResult>,
}

impl From<FetchState> for FetchStatusResponse {
    fn from(state: FetchState) -> Self {
        let done = state.is_terminal();
        match state {
            FetchState::Idle => Self {
                state: "idle",
                done,
                error: None,
                result: None,
            },
            FetchState::Loading => Self {
                state: "loading",
                done,
                error: None,
                result: None,
            },
            FetchState::Ready(result) => Self {
                state: "ready",
                done,
                error: None,
                result: Some(result),
            },
            FetchState::Failed(message) => Self {
                state: "failed",
                done,
                error: Some(message),
                result: None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        registered_stores: state.orchestrator.registry().len(),
    })
}

async fn get_stores(State(state): State<ApiState>) -> Json<Vec<StoreResponse>> {
    let stores = state
        .orchestrator
        .registry()
        .list()
        .into_iter()
        .map(|s| StoreResponse {
            id: s.id,
            name: s.name,
        })
        .collect();
    Json(stores)
}

async fn get_store(
    State(state): State<ApiState>,
    Path(store_id): Path<String>,
) -> Result<Json<StoreResponse>, AppError> {
    let store = state
        .orchestrator
        .registry()
        .get(&store_id)
        .ok_or(AppError::UnknownStore(store_id))?;
    Ok(Json(StoreResponse {
        id: store.id,
        name: store.name,
    }))
}

async fn post_store(
    State(state): State<ApiState>,
    Json(req): Json<AddStoreRequest>,
) -> (StatusCode, Json<StoreResponse>) {
    let store = Store {
        id: req.id,
        name: req.name,
        token: req.token,
    };
    let response = StoreResponse {
        id: store.id.clone(),
        name: store.name.clone(),
    };
    state.orchestrator.registry().add(store);
    (StatusCode::CREATED, Json(response))
}

/// Synchronous fetch: one orchestration, the assembled result as the body.
async fn get_dashboard(
    State(state): State<ApiState>,
    Path(store_id): Path<String>,
) -> Result<Json<AggregateResult>, AppError> {
    // One fresh token per request; dropping the handler future (client
    // disconnect) aborts the fetch anyway.
    let cancel = CancellationToken::new();
    let result = state
        .orchestrator
        .fetch_store_data(&store_id, &cancel)
        .await?;
    Ok(Json(result))
}

async fn get_product_detail(
    State(state): State<ApiState>,
    Path((store_id, item_id)): Path<(String, u64)>,
) -> Result<Json<Product>, AppError> {
    let token = state
        .orchestrator
        .registry()
        .token_for(&store_id)
        .ok_or(AppError::UnknownStore(store_id.clone()))?;
    let product = state
        .orchestrator
        .client()
        .get_product_detail(&store_id, &token, item_id)
        .await?;
    Ok(Json(product))
}

/// Asynchronous fetch: kick the store's session and return immediately;
/// progress is observed via `/stores/{id}/status`.
async fn post_refresh(
    State(state): State<ApiState>,
    Path(store_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.orchestrator.registry().get(&store_id).is_none() {
        return Err(AppError::UnknownStore(store_id));
    }

    let session = session_for(&state, &store_id);
    session.start(&store_id);
    Ok(StatusCode::ACCEPTED)
}

async fn post_cancel(
    State(state): State<ApiState>,
    Path(store_id): Path<String>,
) -> StatusCode {
    match state.sessions.get(&store_id) {
        Some(session) => {
            session.cancel();
            StatusCode::ACCEPTED
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn get_status(
    State(state): State<ApiState>,
    Path(store_id): Path<String>,
    Query(params): Query<StatusQuery>,
) -> Result<Json<FetchStatusResponse>, AppError> {
    let Some(session) = state.sessions.get(&store_id).map(|s| s.value().clone()) else {
        return Ok(Json(FetchStatusResponse::from(FetchState::Idle)));
    };

    let fetch_state = if params.wait.unwrap_or(false) {
        let mut rx = session.subscribe();
        // Clone out of the watch guard before `rx` goes away.
        let terminal = rx
            .wait_for(|s| s.is_terminal())
            .await
            .map_err(|_| AppError::Cancelled)?
            .clone();
        terminal
    } else {
        session.state()
    };

    Ok(Json(FetchStatusResponse::from(fetch_state)))
}

fn session_for(state: &ApiState, store_id: &str) -> Arc<DashboardSession<ShopeeClient>> {
    state
        .sessions
        .entry(store_id.to_string())
        .or_insert_with(|| {
            Arc::new(DashboardSession::new(Arc::clone(&state.orchestrator)))
        })
        .clone()
}
