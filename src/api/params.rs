use serde::Deserialize;
use serde_json::Value;

use crate::config;
use crate::error::ApiError;

const INVALID_ID_FORMAT_MSG: &str = "Invalid ID. It must be an integer.";
const INVALID_ID_MSG: &str = "ID must be a positive integer greater than or equal to 1.";

/// Parse a path identifier: non-integer -> INVALID_ID_FORMAT, below 1 -> INVALID_ID
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidIdFormat(INVALID_ID_FORMAT_MSG.to_string()))?;
    if id < 1 {
        return Err(ApiError::InvalidId(INVALID_ID_MSG.to_string()));
    }
    Ok(id)
}

/// An `id` in a request body is never written, but a bad one is still rejected
pub fn check_body_id(body: &Value) -> Result<(), ApiError> {
    match body.get("id") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) if id >= 1 => Ok(()),
            Some(_) => Err(ApiError::InvalidId(INVALID_ID_MSG.to_string())),
            None => Err(ApiError::InvalidIdFormat(INVALID_ID_FORMAT_MSG.to_string())),
        },
        Some(Value::String(s)) => parse_id(s).map(|_| ()),
        Some(_) => Err(ApiError::InvalidIdFormat(INVALID_ID_FORMAT_MSG.to_string())),
    }
}

/// `?limit=&offset=` as sent; unparsable values fall back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageParams {
    /// (limit, offset) clamped to the configured page sizes
    pub fn resolve(&self) -> (i64, i64) {
        let api = &config::config().api;
        resolve_page(self.limit.as_deref(), self.offset.as_deref(), api.default_page_size, api.max_page_size)
    }
}

fn resolve_page(limit: Option<&str>, offset: Option<&str>, default_size: i64, max_size: i64) -> (i64, i64) {
    let limit = limit
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default_size)
        .min(max_size);
    let offset = offset
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .unwrap_or(0);
    (limit, offset)
}

/// Lenient boolean filter: true/false/1/0, anything else ignored
pub fn parse_bool(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_ids() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("abc").unwrap_err().error_code(), "INVALID_ID_FORMAT");
        assert_eq!(parse_id("1.5").unwrap_err().error_code(), "INVALID_ID_FORMAT");
        assert_eq!(parse_id("0").unwrap_err().error_code(), "INVALID_ID");
        assert_eq!(parse_id("-3").unwrap_err().error_code(), "INVALID_ID");
    }

    #[test]
    fn body_ids() {
        assert!(check_body_id(&json!({"content": "x"})).is_ok());
        assert!(check_body_id(&json!({"id": null})).is_ok());
        assert!(check_body_id(&json!({"id": 7})).is_ok());
        assert!(check_body_id(&json!({"id": "7"})).is_ok());
        assert_eq!(check_body_id(&json!({"id": 0})).unwrap_err().error_code(), "INVALID_ID");
        assert_eq!(check_body_id(&json!({"id": "seven"})).unwrap_err().error_code(), "INVALID_ID_FORMAT");
        assert_eq!(check_body_id(&json!({"id": 1.5})).unwrap_err().error_code(), "INVALID_ID_FORMAT");
        assert_eq!(check_body_id(&json!({"id": [1]})).unwrap_err().error_code(), "INVALID_ID_FORMAT");
    }

    #[test]
    fn page_bounds() {
        assert_eq!(resolve_page(None, None, 50, 100), (50, 0));
        assert_eq!(resolve_page(Some("500"), Some("20"), 50, 100), (100, 20));
        assert_eq!(resolve_page(Some("-1"), Some("x"), 50, 100), (50, 0));
    }

    #[test]
    fn booleans() {
        assert_eq!(parse_bool(Some("True")), Some(true));
        assert_eq!(parse_bool(Some("0")), Some(false));
        assert_eq!(parse_bool(Some("maybe")), None);
        assert_eq!(parse_bool(None), None);
    }
}
