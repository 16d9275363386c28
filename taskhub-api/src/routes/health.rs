/// Liveness and store reachability
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "store": "connected", "storeLatencyMs": 1 }
/// ```
///
/// `store` is `"in-memory"` when the server runs without Redis, and
/// `"disconnected"` (with `status: "degraded"`) when Redis does not answer.
/// The endpoint always answers 200 so load balancers can tell a live process
/// from a dead one; `status` carries the store's condition.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected`, `disconnected` or `in-memory`
    pub store: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_latency_ms: Option<u64>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (store, store_latency_ms) = match &state.redis {
        None => ("in-memory", None),
        Some(redis) => {
            let stats = redis.stats().await;
            if stats.healthy {
                ("connected", stats.latency_ms)
            } else {
                ("disconnected", None)
            }
        }
    };

    let status = if store == "disconnected" {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: taskhub_shared::VERSION.to_string(),
        store: store.to_string(),
        store_latency_ms,
    })
}
