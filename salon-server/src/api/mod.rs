//! HTTP API
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | GET | `/api/health` | - |
//! | POST | `/api/auth/login` | - |
//! | POST | `/api/auth/logout` | JWT |
//! | GET | `/api/auth/me` | JWT |
//! | GET | `/api/auth/connections` | JWT, admin |

pub mod auth;
pub mod connections;
pub mod health;

use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use http::{HeaderValue, Method, header};
use shared::error::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{require_admin, require_auth};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Build the application router with all middleware and state
pub fn create_router(state: AppState) -> Router {
    // Any authenticated user
    let protected = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Admin only; require_auth is the outer layer and runs first
    let admin = Router::new()
        .route("/api/auth/connections", get(connections::status))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .merge(admin)
        .layer(cors_layer(&state.config.frontend_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => layer.allow_origin(origin).allow_credentials(true),
        Err(e) => {
            tracing::warn!(
                frontend_url = %frontend_url,
                error = %e,
                "Invalid FRONTEND_URL, CORS origin not set"
            );
            layer
        }
    }
}
