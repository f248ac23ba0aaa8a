use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::locale::TIMEZONE_HEADERS;
use crate::middleware::{jwt_auth_middleware, locale_middleware, vary_middleware};

/// Full application router with the global middleware stack
pub fn app() -> Router {
    let cfg = config::config();

    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .fallback(not_found)
        // Innermost first: vary sees the handler's status, locale runs before handlers
        .layer(from_fn(vary_middleware))
        .layer(from_fn(locale_middleware))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(cfg.api.max_request_size_bytes));

    let router = if cfg.security.enable_cors {
        router.layer(cors_layer(&cfg.security.cors_origins))
    } else {
        router
    };

    if cfg.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/token", post(public::token::obtain))
        .route("/api/token/refresh", post(public::token::refresh))
}

fn protected_routes() -> Router {
    Router::new()
        .merge(node_routes())
        .merge(user_routes())
        .route_layer(from_fn(jwt_auth_middleware))
}

fn node_routes() -> Router {
    use protected::nodes;

    Router::new()
        .route("/api/nodes", get(nodes::list).post(nodes::create))
        .route(
            "/api/nodes/:id",
            get(nodes::get).put(nodes::put).patch(nodes::patch).delete(nodes::delete),
        )
        .route("/api/nodes/:id/restore", post(nodes::restore))
}

fn user_routes() -> Router {
    use protected::users;

    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        // Static segments win over :id
        .route("/api/users/me", get(users::me))
        .route("/api/users/me/update", put(users::update_me).patch(users::update_me))
        .route("/api/users/me/change-password", post(users::change_password))
        .route(
            "/api/users/:id",
            get(users::get).put(users::update).patch(users::update).delete(users::delete),
        )
        .route("/api/users/:id/nodes-created", get(users::nodes_created))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found.")
}

/// `*` (or an empty list) allows any origin; otherwise only the listed ones
fn cors_layer(origins: &[String]) -> CorsLayer {
    let mut headers = vec![
        axum::http::header::AUTHORIZATION,
        axum::http::header::CONTENT_TYPE,
        axum::http::header::ACCEPT_LANGUAGE,
    ];
    headers.extend(TIMEZONE_HEADERS.iter().filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok()));

    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(headers);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}
