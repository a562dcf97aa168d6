use sha2::{Digest, Sha256};

/// SHA-256 fingerprint of scraped content, hex encoded.
///
/// Content is lowercased and whitespace-collapsed first so re-scrapes that
/// only differ in layout produce the same hash. Used to spot the same page
/// discovered under different URLs.
pub fn content_hash(raw_content: &str) -> String {
    let normalized = raw_content
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    hex::encode(Sha256::digest(normalized.as_bytes()))
}
