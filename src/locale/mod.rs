pub mod numerals;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Headers consulted for the client timezone, in priority order
pub const TIMEZONE_HEADERS: [&str; 4] = ["Time-Zone", "X-Timezone", "Timezone", "X-Time-Zone"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ru,
    Ar,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
            Language::Ru => "ru",
            Language::Ar => "ar",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::En),
            "es" => Some(Language::Es),
            "fr" => Some(Language::Fr),
            "de" => Some(Language::De),
            "it" => Some(Language::It),
            "pt" => Some(Language::Pt),
            "ru" => Some(Language::Ru),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }

    /// "es-ES,es;q=0.9" -> es. Only the first listed tag counts; quality
    /// weights are not considered. A missing header gives `fallback`, an
    /// unsupported tag gives English.
    pub fn from_accept_language(header: Option<&str>, fallback: Language) -> Self {
        let Some(header) = header else {
            return fallback;
        };
        let first = header.split(',').next().unwrap_or_default();
        let primary = first.split(';').next().unwrap_or_default().split('-').next().unwrap_or_default();
        let code: String = primary.trim().chars().take(2).collect::<String>().to_lowercase();
        Self::from_code(&code).unwrap_or(Language::En)
    }

    /// Number spelled out in this language
    pub fn spell(&self, n: i64) -> String {
        numerals::to_words(n, *self)
    }
}

/// Map common abbreviations to IANA names; blank means UTC
pub fn normalize_timezone(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        return "UTC".to_string();
    }
    match name.to_ascii_uppercase().as_str() {
        "EST" => "America/New_York".to_string(),
        "CST" => "America/Chicago".to_string(),
        "MST" => "America/Denver".to_string(),
        "PST" => "America/Los_Angeles".to_string(),
        "CET" => "Europe/Paris".to_string(),
        "EET" => "Europe/Bucharest".to_string(),
        "GMT" => "UTC".to_string(),
        _ => name.to_string(),
    }
}

/// Request-scoped language and timezone
#[derive(Debug, Clone, Serialize)]
pub struct RequestLocale {
    pub language: Language,
    /// Normalized zone name as sent by the client, possibly unknown
    pub timezone: String,
}

impl Default for RequestLocale {
    fn default() -> Self {
        Self {
            language: Language::En,
            timezone: "UTC".to_string(),
        }
    }
}

impl RequestLocale {
    pub fn from_headers(headers: &HeaderMap, default_language: Language) -> Self {
        let accept = headers
            .get(axum::http::header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());
        let language = Language::from_accept_language(accept, default_language);

        let raw_zone = TIMEZONE_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name))
            .filter_map(|v| v.to_str().ok())
            .find(|v| !v.trim().is_empty())
            .unwrap_or("UTC");

        Self {
            language,
            timezone: normalize_timezone(raw_zone),
        }
    }

    pub fn tz(&self) -> Option<Tz> {
        self.timezone.parse::<Tz>().ok()
    }

    /// Wall-clock time in the request zone, or UTC marked as such when the
    /// zone is unknown
    pub fn format_timestamp(&self, at: &DateTime<Utc>) -> String {
        match self.tz() {
            Some(tz) => at.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string(),
            None => format!("{} UTC", at.format(TIMESTAMP_FORMAT)),
        }
    }

    pub fn title(&self, id: i64) -> String {
        self.language.spell(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    #[test]
    fn language_from_first_tag() {
        assert_eq!(Language::from_accept_language(Some("es-ES,es;q=0.9,en;q=0.8"), Language::En), Language::Es);
        assert_eq!(Language::from_accept_language(Some("FR"), Language::En), Language::Fr);
        assert_eq!(Language::from_accept_language(Some("pt-BR"), Language::En), Language::Pt);
        assert_eq!(Language::from_accept_language(Some("deu"), Language::En), Language::De);
        assert_eq!(Language::from_accept_language(Some("ru-RU,ru;q=0.9"), Language::En), Language::Ru);
        assert_eq!(Language::from_accept_language(Some("ar-EG"), Language::En), Language::Ar);
    }

    #[test]
    fn unsupported_language_falls_back_to_english() {
        assert_eq!(Language::from_accept_language(Some("ja-JP"), Language::Es), Language::En);
        assert_eq!(Language::from_accept_language(Some(""), Language::Es), Language::En);
        assert_eq!(Language::from_accept_language(None, Language::Es), Language::Es);
    }

    #[test]
    fn abbreviations_normalize() {
        assert_eq!(normalize_timezone("est"), "America/New_York");
        assert_eq!(normalize_timezone(" PST "), "America/Los_Angeles");
        assert_eq!(normalize_timezone("GMT"), "UTC");
        assert_eq!(normalize_timezone(""), "UTC");
        assert_eq!(normalize_timezone("Europe/Madrid"), "Europe/Madrid");
    }

    #[test]
    fn timezone_header_priority() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Time-Zone", HeaderValue::from_static("Asia/Tokyo"));
        headers.insert("X-Timezone", HeaderValue::from_static("CET"));
        let locale = RequestLocale::from_headers(&headers, Language::En);
        assert_eq!(locale.timezone, "Europe/Paris");

        let locale = RequestLocale::from_headers(&HeaderMap::new(), Language::En);
        assert_eq!(locale.timezone, "UTC");
        assert_eq!(locale.language, Language::En);
    }

    #[test]
    fn formats_in_zone_or_marks_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();

        let madrid = RequestLocale { language: Language::Es, timezone: "Europe/Madrid".into() };
        assert_eq!(madrid.format_timestamp(&at), "2024-01-15 11:00:00");

        let utc = RequestLocale::default();
        assert_eq!(utc.format_timestamp(&at), "2024-01-15 10:00:00");

        let bogus = RequestLocale { language: Language::En, timezone: "Mars/Olympus".into() };
        assert_eq!(bogus.format_timestamp(&at), "2024-01-15 10:00:00 UTC");
    }

    #[test]
    fn title_follows_language() {
        let locale = RequestLocale { language: Language::Fr, timezone: "UTC".into() };
        assert_eq!(locale.title(2), "deux");

        let locale = RequestLocale { language: Language::Ru, timezone: "UTC".into() };
        assert_eq!(locale.title(5), "пять");

        let locale = RequestLocale { language: Language::Ar, timezone: "UTC".into() };
        assert_eq!(locale.title(5), "خمسة");
    }
}
