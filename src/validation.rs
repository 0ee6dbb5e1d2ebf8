//! Media URL validation
//!
//! Recognizes the URL shapes of the supported provider (the YouTube family):
//!
//! - `https://www.youtube.com/watch?v=<id>`
//! - `https://www.youtube.com/{embed,v,shorts,live}/<id>`
//! - `https://youtu.be/<id>`
//!
//! where `<id>` is 11 characters of `[A-Za-z0-9_-]`. Everything here is pure;
//! nothing touches the job registry.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

const WATCH_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "gaming.youtube.com",
];

const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

const PATH_PREFIXES: &[&str] = &["embed", "v", "shorts", "live"];

fn id_pattern() -> &'static Regex {
    static ID: OnceLock<Regex> = OnceLock::new();
    ID.get_or_init(|| match Regex::new(r"^[A-Za-z0-9_-]{11}$") {
        Ok(re) => re,
        Err(e) => unreachable!("static media id pattern is valid: {e}"),
    })
}

/// Whether `url` is a non-empty URL of a shape the provider understands
pub fn validate(url: &str) -> bool {
    extract_media_id(url).is_some()
}

/// Extract the provider media id from a supported URL
pub fn extract_media_id(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let host = parsed.host_str()?.to_ascii_lowercase();
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    let candidate = if SHORT_HOSTS.contains(&host.as_str()) {
        segments.next()?.to_string()
    } else if WATCH_HOSTS.contains(&host.as_str()) {
        match segments.next()? {
            "watch" => parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())?,
            prefix if PATH_PREFIXES.contains(&prefix) => segments.next()?.to_string(),
            _ => return None,
        }
    } else {
        return None;
    };

    id_pattern().is_match(&candidate).then_some(candidate)
}
