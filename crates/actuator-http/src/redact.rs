//! Header redaction for request and response logging.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::header::HeaderMap;

/// Replacement for sensitive values.
pub const REDACTED: &str = "[REDACTED]";

fn sensitive_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)auth|token|key|secret|password").expect("Invalid sensitive header regex")
    })
}

/// Whether a header (or field) name may carry a credential.
pub fn is_sensitive(name: &str) -> bool {
    sensitive_name().is_match(name)
}

/// Copy name/value pairs, masking the values of sensitive names.
pub fn redact_pairs<'a, I>(pairs: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(name, value)| {
            let shown = if is_sensitive(name) { REDACTED } else { value };
            (name.to_string(), shown.to_string())
        })
        .collect()
}

/// Redacted view of a reqwest header map.
pub fn redact_header_map(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_sensitive(name.as_str()) {
                REDACTED.to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}

/// Truncate to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_sensitive_names() {
        for name in [
            "Authorization",
            "X-Auth-Token",
            "x-api-key",
            "Client-Secret",
            "password",
            "Proxy-Authorization",
            "X-Refresh-TOKEN",
        ] {
            assert!(is_sensitive(name), "{name} should be sensitive");
        }
    }

    #[test]
    fn test_ordinary_names() {
        for name in ["Content-Type", "Accept", "User-Agent", "client-id", "Title"] {
            assert!(!is_sensitive(name), "{name} should not be sensitive");
        }
    }

    #[test]
    fn test_redact_pairs() {
        let redacted = redact_pairs([
            ("Authorization", "Bearer abc123"),
            ("Accept", "application/json"),
        ]);
        assert_eq!(redacted[0].1, REDACTED);
        assert_eq!(redacted[1].1, "application/json");
    }

    #[test]
    fn test_redact_header_map() {
        let mut headers = HeaderMap::new();
        headers.insert("set-cookie", HeaderValue::from_static("a=b"));
        headers.insert("x-session-token", HeaderValue::from_static("secret-value"));
        let redacted = redact_header_map(&headers);
        let token = redacted.iter().find(|(n, _)| n == "x-session-token").unwrap();
        assert_eq!(token.1, REDACTED);
        assert!(redacted.iter().all(|(_, v)| v != "secret-value"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 200), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("", 0), "");
    }
}
