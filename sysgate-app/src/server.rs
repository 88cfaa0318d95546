//! JSON API over the gateway.
//!
//! Routes:
//! - `GET /api/system?cmd=NAME` runs a catalog metric (default `health`)
//! - `POST /api/system` with `{"command": "..."}` runs a free-form command
//! - `POST /api/agent` with an agent envelope (plus optional `query`)
//! - `GET /api/metrics` returns the gateway counters

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Query, State},
    http::{StatusCode, Uri},
    routing::get,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use sysgate_core::{AgentTranslation, ApiResponse, FreeFormRequest, Gateway};
use sysgate_executor::CommandRunner;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

const MAX_REQUEST_BYTES: usize = 64 * 1024;
const DEFAULT_METRIC: &str = "health";

type SharedGateway<R> = Arc<Gateway<R>>;
type Reply = (StatusCode, Json<Value>);

#[derive(Debug, Default, Deserialize)]
pub struct MetricQuery {
    #[serde(default)]
    pub cmd: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommandBody {
    #[serde(default)]
    pub command: String,
}

pub fn router<R>(gateway: SharedGateway<R>) -> Router
where
    R: CommandRunner + 'static,
{
    Router::new()
        .route("/api/system", get(run_metric::<R>).post(run_command::<R>))
        .route("/api/agent", post(run_agent::<R>))
        .route("/api/metrics", get(metrics::<R>))
        .fallback(not_found)
        .with_state(gateway)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http())
}

/// Serve until the process is stopped.
pub async fn serve<R>(gateway: SharedGateway<R>, bind: &str) -> Result<()>
where
    R: CommandRunner + 'static,
{
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(gateway))
        .await
        .context("HTTP server stopped")?;
    Ok(())
}

fn reply(response: ApiResponse) -> Reply {
    let status =
        StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::to_value(&response).unwrap_or(Value::Null);
    (status, Json(body))
}

async fn run_metric<R: CommandRunner>(
    State(gateway): State<SharedGateway<R>>,
    Query(query): Query<MetricQuery>,
) -> Reply {
    let name = query
        .cmd
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_METRIC.to_string());
    debug!("Metric request: {}", name);

    match gateway.run_metric(&name).await {
        Ok(report) => reply(ApiResponse::from_metric(&report)),
        Err(e) => reply(ApiResponse::from_error(&e)),
    }
}

async fn run_command<R: CommandRunner>(
    State(gateway): State<SharedGateway<R>>,
    body: Result<Json<CommandBody>, JsonRejection>,
) -> Reply {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return reply(ApiResponse::bad_request(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        }
    };

    match gateway
        .run_free_form(FreeFormRequest::new("", body.command))
        .await
    {
        Ok(result) => reply(ApiResponse::from_result(&result)),
        Err(e) => reply(ApiResponse::from_error(&e)),
    }
}

async fn run_agent<R: CommandRunner>(
    State(gateway): State<SharedGateway<R>>,
    envelope: Result<Json<Value>, JsonRejection>,
) -> Reply {
    let Json(envelope) = match envelope {
        Ok(envelope) => envelope,
        Err(rejection) => {
            return reply(ApiResponse::bad_request(format!(
                "Invalid agent envelope: {}",
                rejection.body_text()
            )))
        }
    };

    let query = envelope
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let translation = AgentTranslation::extract(&query, &envelope);

    match gateway.run_translation(translation).await {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::to_value(&result).unwrap_or(Value::Null)),
        ),
        Err(e) => reply(ApiResponse::from_error(&e)),
    }
}

async fn metrics<R: CommandRunner>(State(gateway): State<SharedGateway<R>>) -> Json<Value> {
    let snapshot = gateway.metrics().snapshot();
    Json(json!({
        "counters": serde_json::to_value(&snapshot).unwrap_or(Value::Null),
        "execution_success_rate": snapshot.execution_success_rate(),
        "denial_rate": snapshot.denial_rate(),
    }))
}

async fn not_found(uri: Uri) -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": format!("Not found: {}", uri.path()) })),
    )
}
