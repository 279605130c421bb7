use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::db::{PropertyStore, TableRows};

pub const SERVICE_NAME: &str = "ReValix Read-Only API";

#[derive(Clone)]
pub struct AppState {
    store: PropertyStore,
}

impl AppState {
    pub fn new(store: PropertyStore) -> Self {
        Self { store }
    }
}

/// Data-store failure, answered as 500 `{"detail": …}`.
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = format!("{:#}", self.0);
        error!("{}", detail);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": detail }))).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/property/:acct", get(get_property))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    info!(
        "{} serving tables: {}",
        SERVICE_NAME,
        state.store.tables().join(", ")
    );
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server failed")
}

async fn home() -> Json<Value> {
    Json(json!({ "message": format!("{} is running.", SERVICE_NAME) }))
}

/// Every row of every table for `acct`, column names untouched.
async fn get_property(
    State(state): State<AppState>,
    Path(acct): Path<String>,
) -> Result<Json<TableRows>, ApiError> {
    let rows = state.store.fetch(&acct).await?;
    info!(
        "acct {}: {} rows across {} tables",
        acct,
        rows.values().map(Vec::len).sum::<usize>(),
        rows.len()
    );
    Ok(Json(rows))
}

/// Open CORS: any origin, method and header.
// TODO: restrict allowed origins to the deployed lookup front-end.
async fn cors(req: Request<Body>, next: Next) -> Response {
    let origin = req.headers().get("origin").cloned();
    let requested_headers = req.headers().get("access-control-request-headers").cloned();

    let mut resp = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = resp.headers_mut();
    allow_origin(headers, origin);
    headers.insert("access-control-allow-methods", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-headers",
        requested_headers.unwrap_or_else(|| HeaderValue::from_static("*")),
    );
    resp
}

fn allow_origin(headers: &mut HeaderMap, origin: Option<HeaderValue>) {
    match origin {
        // Echo the caller so credentialed requests are accepted too.
        Some(o) => {
            headers.insert("access-control-allow-origin", o);
            headers.insert("access-control-allow-credentials", HeaderValue::from_static("true"));
            headers.insert("vary", HeaderValue::from_static("Origin"));
        }
        None => {
            headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
        }
    }
}

// ── Tests ──
