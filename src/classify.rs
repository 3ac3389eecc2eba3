//! URL classification for inbound messages.
//!
//! A pure text-in, URL-out helper: no side effects, no state. Absent or
//! unsupported URLs are a normal outcome (`None`), not an error.

// Allow non_std_lazy_statics because we use lazy_regex! macro which uses once_cell internally
#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;
use url::Url;

/// Domains the bot accepts source URLs from.
///
/// Matching is a case-insensitive substring check on the URL host, so
/// `www.`-prefixed and regional hosts are covered as well.
pub const SUPPORTED_DOMAINS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "tiktok.com",
    "instagram.com",
    "facebook.com",
    "fb.watch",
];

/// Match URL-shaped substrings in free-form text
static RE_URL: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"https?://\S+");

fn is_supported(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.to_lowercase();
        SUPPORTED_DOMAINS.iter().any(|d| host.contains(d))
    })
}

/// Extracts the first supported media URL from free-form text.
///
/// Candidates that do not parse as URLs, or whose host is not on the
/// allow-list, are skipped; the first accepted candidate is returned
/// verbatim. Returns `None` when no supported URL is present.
#[must_use]
pub fn extract_supported_url(text: &str) -> Option<String> {
    RE_URL
        .find_iter(text)
        .filter_map(|m| {
            let parsed = Url::parse(m.as_str()).ok()?;
            Some((m.as_str(), parsed))
        })
        .find(|(_, parsed)| is_supported(parsed))
        .map(|(raw, _)| raw.to_string())
}
