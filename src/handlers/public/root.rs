// handlers/public/root.rs - GET / and GET /health

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Nodos API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Tree of nodes with role-based access and localized rendering",
            "endpoints": {
                "health": "/health (public)",
                "token": "/api/token/, /api/token/refresh/ (public - token acquisition)",
                "nodes": "/api/nodes[/:id[/restore]] (protected)",
                "users": "/api/users[/:id[/nodes-created]] (protected)",
                "me": "/api/users/me[/update|/change-password] (protected)",
            },
            "localization": {
                "languages": ["en", "es", "fr", "de", "it", "pt"],
                "headers": ["Accept-Language", "Time-Zone", "X-Timezone"],
            }
        }
    }))
}

/// Liveness plus database reachability; 503 while the database is down
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            let detail = if crate::is_production!() { "unavailable".to_string() } else { e.to_string() };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": detail
                    }
                })),
            )
        }
    }
}
