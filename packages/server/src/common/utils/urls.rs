use url::Url;

use crate::common::PipelineError;

/// Canonical form of a source URL, used as the registry's uniqueness key.
///
/// Lowercases scheme and host (the `url` crate does this on parse), drops the
/// fragment and any trailing slash on the path. Only http(s) URLs are accepted.
pub fn canonicalize_url(raw: &str) -> Result<String, PipelineError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| PipelineError::PermanentSource(format!("invalid URL '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(PipelineError::PermanentSource(format!(
            "unsupported URL scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(PipelineError::PermanentSource(format!(
            "URL has no host: {}",
            raw
        )));
    }

    url.set_fragment(None);
    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);

    let canonical = url.to_string();
    if url.query().is_none() {
        Ok(canonical.trim_end_matches('/').to_string())
    } else {
        Ok(canonical)
    }
}

/// Host portion of a URL, used as the rate limiting key.
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_spellings_collapse() {
        let a = canonicalize_url("HTTPS://Example.com/flies/woolly-bugger/").unwrap();
        let b = canonicalize_url("https://example.com/flies/woolly-bugger#materials").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "https://example.com/flies/woolly-bugger");
    }

    #[test]
    fn query_strings_are_kept() {
        let url = canonicalize_url("https://www.youtube.com/watch?v=abc123").unwrap();
        assert_eq!(url, "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn rejects_non_http_schemes() {
        let err = canonicalize_url("ftp://example.com/file.pdf").unwrap_err();
        assert!(matches!(err, PipelineError::PermanentSource(_)));
        assert!(canonicalize_url("not a url").is_err());
    }

    #[test]
    fn extracts_domain() {
        assert_eq!(
            domain_of("https://Blog.Example.com/a/b").as_deref(),
            Some("blog.example.com")
        );
        assert_eq!(domain_of("garbage"), None);
    }
}
