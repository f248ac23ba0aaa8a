use axum::{
    extract::Request,
    http::{header::VARY, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config;
use crate::locale::{Language, RequestLocale};

/// Headers that change how node responses are rendered
const LOCALE_VARY: [&str; 3] = ["Accept-Language", "Time-Zone", "X-Timezone"];

/// Resolve language and timezone once per request
pub async fn locale_middleware(mut request: Request, next: Next) -> Response {
    let default_language = Language::from_code(&config::config().api.default_language).unwrap_or(Language::En);
    let locale = RequestLocale::from_headers(request.headers(), default_language);
    request.extensions_mut().insert(locale);
    next.run(request).await
}

/// Add the locale headers to `Vary` on successful node reads
pub async fn vary_middleware(request: Request, next: Next) -> Response {
    let is_node_read = request.method() == Method::GET && request.uri().path().starts_with("/api/nodes");
    let mut response = next.run(request).await;

    if is_node_read && response.status() == StatusCode::OK {
        merge_vary(response.headers_mut());
    }
    response
}

fn merge_vary(headers: &mut HeaderMap) {
    let mut values: Vec<String> = headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    values.extend(LOCALE_VARY.iter().map(|v| v.to_string()));

    values.sort_by_key(|v| v.to_ascii_lowercase());
    values.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

    if let Ok(value) = HeaderValue::from_str(&values.join(", ")) {
        headers.insert(VARY, value);
    }
}
