//! Simple content fetcher - local HTTP + HTML parsing
//!
//! This implementation:
//! - Uses reqwest for HTTP requests
//! - Uses scraper crate for HTML parsing
//! - Uses htmd for HTML to Markdown conversion
//! - Classifies every failure as transient (retry) or permanent (mark failed)
//!
//! Limitations:
//! - No JavaScript rendering (static HTML and plain-text pages only)

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::StatusCode;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::common::{PipelineError, PipelineResult};

use super::{BaseContentFetcher, FetchedContent};

const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; FlyboxPipeline/0.1; +https://github.com/flybox/flybox)";

/// Pages with less Markdown than this are still accepted but logged.
const MIN_CONTENT_CHARS: usize = 100;

/// Content fetcher using reqwest + scraper + htmd
pub struct SimpleFetcher {
    client: reqwest::Client,
}

impl SimpleFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,text/plain;q=0.9,*/*;q=0.5"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Map an HTTP status onto the pipeline error taxonomy.
    pub(crate) fn classify_status(status: StatusCode, url: &str) -> Option<PipelineError> {
        if status.is_success() {
            None
        } else if status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
            || status.is_server_error()
        {
            Some(PipelineError::TransientNetwork(format!("HTTP {} for {}", status, url)))
        } else {
            Some(PipelineError::PermanentSource(format!("HTTP {} for {}", status, url)))
        }
    }

    pub(crate) fn classify_transport(error: &reqwest::Error, url: &str) -> PipelineError {
        if error.is_builder() || error.is_redirect() {
            PipelineError::PermanentSource(format!("request to {} failed: {}", url, error))
        } else {
            PipelineError::TransientNetwork(format!("request to {} failed: {}", url, error))
        }
    }

    fn is_supported_content_type(content_type: Option<&str>) -> bool {
        match content_type {
            None => true,
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.starts_with("text/html")
                    || ct.starts_with("application/xhtml")
                    || ct.starts_with("text/plain")
            }
        }
    }

    /// Fetch raw body text from a URL
    async fn fetch_body(&self, url: &str) -> PipelineResult<(String, bool)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::classify_transport(&e, url))?;

        if let Some(error) = Self::classify_status(response.status(), url) {
            return Err(error);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !Self::is_supported_content_type(content_type.as_deref()) {
            return Err(PipelineError::PermanentSource(format!(
                "unsupported content type '{}' for {}",
                content_type.unwrap_or_default(),
                url
            )));
        }
        let is_plain = content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().starts_with("text/plain"))
            .unwrap_or(false);

        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_transport(&e, url))?;
        Ok((body, is_plain))
    }

    /// Extract title from HTML document
    fn extract_title(document: &Html) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;
        document
            .select(&title_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Extract main content HTML, stripping nav/header/footer/aside
    fn extract_main_content(document: &Html) -> String {
        let main_selectors = [
            "main",
            "article",
            "[role='main']",
            ".entry-content",
            ".post-content",
            ".recipe",
            "#content",
            ".content",
        ];

        for selector_str in main_selectors {
            if let Ok(selector) = Selector::parse(selector_str) {
                if let Some(main) = document.select(&selector).next() {
                    return Self::remove_boilerplate(&main.html());
                }
            }
        }

        if let Ok(body_selector) = Selector::parse("body") {
            if let Some(body) = document.select(&body_selector).next() {
                return Self::remove_boilerplate(&body.html());
            }
        }

        document.html()
    }

    /// Remove common boilerplate elements from HTML string
    fn remove_boilerplate(html: &str) -> String {
        let document = Html::parse_fragment(html);
        let unwanted = [
            "nav", "header", "footer", "aside", ".sidebar", ".menu", ".comments", ".share",
            ".advertisement", ".ads", "script", "style", "noscript", "iframe", "form",
        ];

        let mut result = html.to_string();
        for selector_str in unwanted {
            if let Ok(selector) = Selector::parse(selector_str) {
                for element in document.select(&selector) {
                    result = result.replace(&element.html(), "");
                }
            }
        }
        result
    }

    /// Convert HTML to Markdown
    fn html_to_markdown(html: &str) -> String {
        htmd::convert(html).unwrap_or_else(|_| {
            let document = Html::parse_document(html);
            document.root_element().text().collect::<String>()
        })
    }
}

#[async_trait]
impl BaseContentFetcher for SimpleFetcher {
    async fn fetch(&self, url: &str) -> PipelineResult<FetchedContent> {
        let parsed = Url::parse(url)
            .map_err(|e| PipelineError::PermanentSource(format!("invalid URL '{}': {}", url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(PipelineError::PermanentSource(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        debug!(url = %url, "Fetching source");
        let (body, is_plain) = self.fetch_body(url).await?;

        let (title, markdown) = if is_plain {
            (None, body)
        } else {
            let document = Html::parse_document(&body);
            let title = Self::extract_title(&document);
            let main_content = Self::extract_main_content(&document);
            (title, Self::html_to_markdown(&main_content))
        };

        if markdown.trim().is_empty() {
            return Err(PipelineError::PermanentSource(format!(
                "no readable content at {}",
                url
            )));
        }
        if markdown.trim().chars().count() < MIN_CONTENT_CHARS {
            warn!(url = %url, "Page has minimal content");
        }

        Ok(FetchedContent {
            url: url.to_string(),
            title,
            markdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(SimpleFetcher::classify_status(StatusCode::OK, "u").is_none());
        assert!(matches!(
            SimpleFetcher::classify_status(StatusCode::SERVICE_UNAVAILABLE, "u"),
            Some(PipelineError::TransientNetwork(_))
        ));
        assert!(matches!(
            SimpleFetcher::classify_status(StatusCode::TOO_MANY_REQUESTS, "u"),
            Some(PipelineError::TransientNetwork(_))
        ));
        assert!(matches!(
            SimpleFetcher::classify_status(StatusCode::NOT_FOUND, "u"),
            Some(PipelineError::PermanentSource(_))
        ));
        assert!(matches!(
            SimpleFetcher::classify_status(StatusCode::FORBIDDEN, "u"),
            Some(PipelineError::PermanentSource(_))
        ));
    }

    #[test]
    fn test_supported_content_types() {
        assert!(SimpleFetcher::is_supported_content_type(Some("text/html; charset=utf-8")));
        assert!(SimpleFetcher::is_supported_content_type(Some("text/plain")));
        assert!(SimpleFetcher::is_supported_content_type(None));
        assert!(!SimpleFetcher::is_supported_content_type(Some("image/png")));
        assert!(!SimpleFetcher::is_supported_content_type(Some("application/zip")));
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Woolly Bugger Recipe</title></head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(
            SimpleFetcher::extract_title(&document),
            Some("Woolly Bugger Recipe".to_string())
        );
    }

    #[test]
    fn test_main_content_drops_boilerplate() {
        let html = r#"<html><body>
            <nav>Home | Shop</nav>
            <article><h1>Zebra Midge</h1><p>Hook: scud 18</p><aside>Buy now</aside></article>
        </body></html>"#;
        let document = Html::parse_document(html);
        let markdown = SimpleFetcher::html_to_markdown(&SimpleFetcher::extract_main_content(&document));
        assert!(markdown.contains("Zebra Midge"));
        assert!(markdown.contains("scud 18"));
        assert!(!markdown.contains("Home | Shop"));
        assert!(!markdown.contains("Buy now"));
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let fetcher = SimpleFetcher::new().unwrap();
        let result = fetcher.fetch("ftp://files.example.com/fly.txt").await;
        assert!(matches!(result, Err(PipelineError::PermanentSource(_))));
        let result = fetcher.fetch("not a url").await;
        assert!(matches!(result, Err(PipelineError::PermanentSource(_))));
    }
}
