//! `Accept` header negotiation between the two wire formats we speak.
//!
//! Each media range is scored against both representations:
//!
//! | range                                   | specificity |
//! |-----------------------------------------|-------------|
//! | `application/problem+cbor` / `+json`    | 4           |
//! | `application/cbor`, `application/*+cbor` (and json) | 3 |
//! | `application/*`                         | 2 (both)    |
//! | `*/*`                                   | 1 (both)    |
//!
//! The representation with the higher q wins; equal q falls back to
//! specificity and then to JSON. A `q=0` range vetoes a representation unless a
//! more specific positive range re-enables it.

use axum::http::{header, HeaderMap};
use serde::Serialize;

use super::problem::{APPLICATION_PROBLEM_CBOR, APPLICATION_PROBLEM_JSON};

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_CBOR: &str = "application/cbor";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WireFormat {
    #[default]
    Json,
    Cbor,
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cbor encoding failed: {0}")]
    Cbor(#[from] serde_cbor::Error),
}

impl WireFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            WireFormat::Json => APPLICATION_JSON,
            WireFormat::Cbor => APPLICATION_CBOR,
        }
    }

    pub fn problem_content_type(self) -> &'static str {
        match self {
            WireFormat::Json => APPLICATION_PROBLEM_JSON,
            WireFormat::Cbor => APPLICATION_PROBLEM_CBOR,
        }
    }

    /// Structured-syntax suffix (`+json`, `+cbor`) without the plus.
    fn suffix(self) -> &'static str {
        match self {
            WireFormat::Json => "json",
            WireFormat::Cbor => "cbor",
        }
    }

    /// Negotiate from every `Accept` line in `headers`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let lines: Vec<&str> = headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if lines.is_empty() {
            return WireFormat::Json;
        }
        negotiate(Some(&lines.join(",")))
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>, EncodeError> {
        Ok(match self {
            // serde_json never HTML-escapes, so `<`, `>` and `&` go out verbatim.
            WireFormat::Json => serde_json::to_vec(value)?,
            WireFormat::Cbor => serde_cbor::to_vec(value)?,
        })
    }
}

/// One parsed `Accept` entry.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaRange {
    pub main_type: String,
    pub subtype: String,
    pub q: f64,
}

impl MediaRange {
    /// Parse a single comma-free segment such as `application/json;q=0.5`.
    pub fn parse(segment: &str) -> Option<Self> {
        let mut parts = segment.split(';');
        let media = parts.next()?.trim();
        if media.is_empty() {
            return None;
        }

        let mut q = 1.0;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("q") {
                q = parse_q(value);
            }
        }

        let (main_type, subtype) = match media.split_once('/') {
            Some((t, s)) => (t.trim().to_ascii_lowercase(), s.trim().to_ascii_lowercase()),
            None => (media.to_ascii_lowercase(), "*".to_string()),
        };

        Some(Self {
            main_type,
            subtype,
            q,
        })
    }

    /// How precisely this range names `target`, or `None` if it does not match it.
    pub fn specificity(&self, target: WireFormat) -> Option<u8> {
        let suffix = target.suffix();
        match (self.main_type.as_str(), self.subtype.as_str()) {
            ("*", "*") => Some(1),
            ("application", "*") => Some(2),
            ("application", sub) if sub.strip_prefix("problem+") == Some(suffix) => Some(4),
            ("application", sub)
                if sub == suffix
                    || sub
                        .strip_suffix(suffix)
                        .is_some_and(|rest| rest.ends_with('+')) =>
            {
                Some(3)
            }
            _ => None,
        }
    }
}

/// Anything unparseable, non-finite or outside `[0, 1]` counts as an absent q.
fn parse_q(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(q) if q.is_finite() && (0.0..=1.0).contains(&q) => q,
        _ => 1.0,
    }
}

/// Split an `Accept` header into media ranges, skipping empty segments.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    header
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(MediaRange::parse)
        .collect()
}

#[derive(Debug, Default)]
struct Preference {
    best: Option<(u8, f64)>,
    veto: Option<u8>,
}

impl Preference {
    fn observe(&mut self, specificity: u8, q: f64) {
        if q == 0.0 {
            self.veto = Some(self.veto.map_or(specificity, |v| v.max(specificity)));
            return;
        }
        match self.best {
            Some((s, best_q)) if specificity < s || (specificity == s && q <= best_q) => {}
            _ => self.best = Some((specificity, q)),
        }
    }

    /// `(specificity, q)` after applying vetoes; `(0, 0.0)` when not acceptable.
    fn effective(&self) -> (u8, f64) {
        match self.best {
            Some((s, q)) if self.veto.map_or(true, |v| v < s) => (s, q),
            _ => (0, 0.0),
        }
    }
}

/// Pick the representation for a request's `Accept` header. JSON unless CBOR is
/// strictly preferred.
pub fn negotiate(accept: Option<&str>) -> WireFormat {
    let Some(accept) = accept.map(str::trim).filter(|a| !a.is_empty()) else {
        return WireFormat::Json;
    };

    let mut cbor = Preference::default();
    let mut json = Preference::default();
    for range in parse_accept(accept) {
        if let Some(s) = range.specificity(WireFormat::Cbor) {
            cbor.observe(s, range.q);
        }
        if let Some(s) = range.specificity(WireFormat::Json) {
            json.observe(s, range.q);
        }
    }

    let (cbor_spec, cbor_q) = cbor.effective();
    let (json_spec, json_q) = json.effective();

    if cbor_q <= 0.0 && json_q <= 0.0 {
        return WireFormat::Json;
    }
    if cbor_q != json_q {
        return if cbor_q > json_q {
            WireFormat::Cbor
        } else {
            WireFormat::Json
        };
    }
    if cbor_spec > json_spec {
        WireFormat::Cbor
    } else {
        WireFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn pick(accept: &str) -> WireFormat {
        negotiate(Some(accept))
    }

    #[test]
    fn missing_or_empty_header_is_json() {
        assert_eq!(negotiate(None), WireFormat::Json);
        assert_eq!(pick(""), WireFormat::Json);
        assert_eq!(pick("  ,  , "), WireFormat::Json);
    }

    #[test]
    fn explicit_q_preference_wins() {
        assert_eq!(
            pick("application/cbor;q=1.0, application/json;q=0.9"),
            WireFormat::Cbor
        );
        assert_eq!(
            pick("application/cbor;q=0.5, application/json;q=0.9"),
            WireFormat::Json
        );
    }

    #[test]
    fn equal_q_ties_go_to_json() {
        assert_eq!(pick("application/json, application/cbor"), WireFormat::Json);
        assert_eq!(pick("application/cbor, application/json"), WireFormat::Json);
        assert_eq!(pick("*/*"), WireFormat::Json);
        assert_eq!(pick("application/*"), WireFormat::Json);
    }

    #[test]
    fn specificity_breaks_equal_q() {
        assert_eq!(pick("application/cbor, */*"), WireFormat::Cbor);
        assert_eq!(pick("application/problem+cbor, application/json"), WireFormat::Cbor);
        assert_eq!(pick("application/vnd.api+cbor, application/*"), WireFormat::Cbor);
    }

    #[test]
    fn higher_q_beats_specificity() {
        assert_eq!(
            pick("application/problem+json;q=0.4, */*;q=0.8"),
            WireFormat::Cbor
        );
        assert_eq!(pick("application/json;q=0.4, application/cbor;q=0.41"), WireFormat::Cbor);
    }

    #[test]
    fn zero_q_is_never_selected() {
        assert_eq!(pick("application/cbor;q=0"), WireFormat::Json);
        assert_eq!(pick("application/json;q=0, */*"), WireFormat::Cbor);
        assert_eq!(pick("*/*, application/json;q=0"), WireFormat::Cbor);
        assert_eq!(pick("application/cbor;q=0, application/*"), WireFormat::Json);
        assert_eq!(pick("application/json;q=0, application/cbor;q=0"), WireFormat::Json);
    }

    #[test]
    fn more_specific_range_overrides_wildcard_veto() {
        assert_eq!(pick("*/*;q=0, application/cbor"), WireFormat::Cbor);
    }

    #[test]
    fn q_parsing_is_lenient() {
        assert_eq!(MediaRange::parse("application/json;Q=0.3").unwrap().q, 0.3);
        assert_eq!(MediaRange::parse("application/json;q=abc").unwrap().q, 1.0);
        assert_eq!(MediaRange::parse("application/json;q=1.5").unwrap().q, 1.0);
        assert_eq!(MediaRange::parse("application/json;q=-1").unwrap().q, 1.0);
        assert_eq!(MediaRange::parse("application/json;q=NaN").unwrap().q, 1.0);
        assert_eq!(
            MediaRange::parse("application/json;q=0.2;q=0.7").unwrap().q,
            0.7
        );
    }

    #[test]
    fn media_type_is_lowercased_and_bare_tokens_widen() {
        let r = MediaRange::parse(" Application/CBOR ; charset=x").unwrap();
        assert_eq!(r.main_type, "application");
        assert_eq!(r.subtype, "cbor");

        let bare = MediaRange::parse("application").unwrap();
        assert_eq!(bare.subtype, "*");
        assert_eq!(bare.specificity(WireFormat::Cbor), Some(2));
    }

    #[test]
    fn unrelated_ranges_are_ignored() {
        assert_eq!(pick("text/html, image/*;q=0.9"), WireFormat::Json);
        let r = MediaRange::parse("text/cbor").unwrap();
        assert_eq!(r.specificity(WireFormat::Cbor), None);
        let r = MediaRange::parse("application/xcbor").unwrap();
        assert_eq!(r.specificity(WireFormat::Cbor), None);
    }

    #[test]
    fn from_headers_joins_multiple_lines() {
        let mut headers = HeaderMap::new();
        headers.append(header::ACCEPT, HeaderValue::from_static("application/json;q=0.1"));
        headers.append(header::ACCEPT, HeaderValue::from_static("application/cbor"));
        assert_eq!(WireFormat::from_headers(&headers), WireFormat::Cbor);
        assert_eq!(WireFormat::from_headers(&HeaderMap::new()), WireFormat::Json);
    }

    #[test]
    fn json_encoding_does_not_escape_html() {
        let bytes = WireFormat::Json.encode(&"<a> & <b>").unwrap();
        assert_eq!(bytes, b"\"<a> & <b>\"");
    }

    #[test]
    fn cbor_encodes_problem_documents() {
        use crate::api::problem::Problem;
        use axum::http::StatusCode;

        let problem = Problem::new(StatusCode::NOT_FOUND, "Not Found", "resource not found");
        let bytes = WireFormat::Cbor.encode(&problem).unwrap();
        let decoded: Problem = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(decoded, problem);
    }
}
