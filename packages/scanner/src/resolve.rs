// ABOUTME: Three-tier reader token resolution
// ABOUTME: URL query parameter, raw fragment, or the bare trimmed string

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

const READER_TOKEN_PARAM: &str = "readerToken";

static FRAGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"readerToken=([^&\s]+)").expect("fragment pattern is valid"));

/// Resolve any observed string into a reader token.
///
/// A reader may display a bare token or a navigable link, so resolution
/// tries, in order: a well-formed address with a `readerToken` query
/// parameter; a raw `readerToken=` fragment; the trimmed string itself.
/// Whitespace-only input resolves to nothing.
pub fn resolve_reader_token(raw: &str) -> Option<String> {
    if let Some(token) = token_from_url(raw) {
        debug!("Token resolved from URL parameter");
        return Some(token);
    }
    if let Some(token) = token_from_fragment(raw) {
        debug!("Token resolved from raw fragment");
        return Some(token);
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Extract the `readerToken` query parameter from a well-formed address,
/// URL-decoded.
pub fn token_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == READER_TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}

fn token_from_fragment(raw: &str) -> Option<String> {
    let captured = FRAGMENT_RE.captures(raw)?.get(1)?.as_str();
    let decoded = urlencoding::decode(captured)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| captured.to_string());
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}
