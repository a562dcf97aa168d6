//! Identity keys and name comparison.
//!
//! A pattern's identity key is a lowercase ASCII slug of its name
//! ("Woolly Bugger" -> "woolly-bugger"). Ingestion resolves catalog identity
//! with it, and the catalog enforces one pattern per key.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9]+").expect("valid slug regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
}

/// Derive the normalized identity key for a pattern name.
///
/// Returns `None` when nothing slug-worthy remains (empty or punctuation-only names).
pub fn identity_key(name: &str) -> Option<String> {
    let lowered = name.trim().to_lowercase().replace('\'', "");
    let slug = NON_SLUG.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// Case- and whitespace-insensitive comparison key for display names.
pub fn name_key(name: &str) -> String {
    WHITESPACE
        .replace_all(name.trim(), " ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_names() {
        assert_eq!(identity_key("Woolly Bugger").as_deref(), Some("woolly-bugger"));
        assert_eq!(identity_key("  Pheasant Tail  Nymph ").as_deref(), Some("pheasant-tail-nymph"));
        assert_eq!(identity_key("Clouser's Minnow").as_deref(), Some("clousers-minnow"));
        assert_eq!(identity_key("Elk-Hair Caddis (#14)").as_deref(), Some("elk-hair-caddis-14"));
    }

    #[test]
    fn empty_names_have_no_key() {
        assert_eq!(identity_key(""), None);
        assert_eq!(identity_key(" -- !! "), None);
    }

    #[test]
    fn name_key_ignores_case_and_spacing() {
        assert_eq!(name_key("  Adams   Parachute "), name_key("adams parachute"));
        assert_ne!(name_key("Adams"), name_key("Adams Parachute"));
    }
}
