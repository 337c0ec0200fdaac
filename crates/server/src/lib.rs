pub mod error;
pub mod routes;

use axum::http::{header, Method};
use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use expensetrend_storage::QueryService;

pub use error::ApiError;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub queries: QueryService,
}

impl AppState {
    pub fn new(queries: QueryService) -> Self {
        Self { queries }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(routes::dashboard))
        .route("/api/monthly-trend", get(routes::monthly_trend))
        .route("/api/category-breakdown", get(routes::category_breakdown))
        .route("/api/transactions", get(routes::transactions))
        .route("/api/transactions/search", get(routes::search))
        .route("/api/transactions/{id}", put(routes::update_transaction))
        .route("/api/filters", get(routes::filters))
        .route("/api/summary", get(routes::summary))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
