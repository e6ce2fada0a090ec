//! HTTP scraper - local HTTP fetch + HTML parsing + markdown conversion.
//!
//! This implementation:
//! - Uses reqwest for HTTP requests
//! - Uses the scraper crate for HTML parsing
//! - Uses htmd for HTML to Markdown conversion
//!
//! Limitation: no JavaScript rendering (static HTML sites only), and no
//! screenshot capture. A scraper backed by a rendering service would
//! populate the screenshot output through the same trait.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use scraper::{Html, Selector};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{ScrapeError, ScrapeResult};
use crate::traits::scraper::{ScrapeOutput, Scraper};
use crate::types::options::{OutputFormat, ScrapeOptions};

/// Scraper using reqwest + scraper + htmd.
pub struct HttpScraper {
    client: reqwest::Client,
}

impl Default for HttpScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpScraper {
    pub fn new() -> Self {
        // Browser-like User-Agent to avoid bot detection
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().unwrap(),
        );

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Use a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Fetch raw HTML, returning the body and the final URL after redirects.
    async fn fetch_html(&self, url: &str, timeout: Duration) -> ScrapeResult<(String, String)> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScrapeError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    ScrapeError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout {
                    url: url.to_string(),
                }
            } else {
                ScrapeError::Http(Box::new(e))
            }
        })?;

        Ok((html, final_url))
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

    /// Extract main content HTML, preferring semantic content containers.
    fn extract_main_content(document: &Html) -> String {
        let main_selectors = [
            "main",
            "article",
            "[role='main']",
            "#content",
            "#main",
            ".content",
            ".main",
            ".post-content",
            ".entry-content",
        ];

        for selector_str in main_selectors {
            if let Ok(selector) = Selector::parse(selector_str) {
                if let Some(main) = document.select(&selector).next() {
                    return main.html();
                }
            }
        }

        // Fallback: use body but remove unwanted elements
        if let Ok(body_selector) = Selector::parse("body") {
            if let Some(body) = document.select(&body_selector).next() {
                let html = body.html();
                return Self::remove_boilerplate(&html);
            }
        }

        document.html()
    }

    /// Remove common boilerplate elements from an HTML string.
    fn remove_boilerplate(html: &str) -> String {
        let document = Html::parse_document(html);
        let unwanted = [
            "nav", "header", "footer", "aside", ".nav", ".navbar", ".header", ".footer",
            ".sidebar", ".menu", ".advertisement", ".ads", "#nav", "#header", "#footer",
            "#sidebar", "script", "style", "noscript", "iframe",
        ];

        let mut result = html.to_string();
        for selector_str in unwanted {
            if let Ok(selector) = Selector::parse(selector_str) {
                for element in document.select(&selector) {
                    let element_html = element.html();
                    result = result.replace(&element_html, "");
                }
            }
        }

        result
    }

    /// Convert HTML to Markdown
    fn html_to_markdown(html: &str) -> String {
        htmd::convert(html).unwrap_or_else(|_| {
            // Fallback: strip tags and return plain text
            let document = Html::parse_document(html);
            document.root_element().text().collect::<String>()
        })
    }

    /// Normalize URL by adding https:// if no scheme is present
    pub(crate) fn normalize_url(url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{}", url)
        }
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn scrape(&self, url: &str, options: &ScrapeOptions) -> ScrapeResult<ScrapeOutput> {
        let url = Self::normalize_url(url);
        if url::Url::parse(&url).is_err() {
            return Err(ScrapeError::InvalidUrl { url });
        }

        debug!(url = %url, "scraping page");
        let timeout = Duration::from_secs(options.timeout_secs);
        let (html, final_url) = self.fetch_html(&url, timeout).await?;

        let document = Html::parse_document(&html);
        let title = Self::extract_title(&document);
        let main_content = Self::extract_main_content(&document);
        let markdown = Self::html_to_markdown(&main_content);

        if markdown.trim().is_empty() {
            return Err(ScrapeError::EmptyContent { url });
        }
        if markdown.trim().len() < 100 {
            warn!(url = %url, "page has minimal content");
        }

        let mut output = ScrapeOutput::new(final_url.clone());
        if let Some(title) = title.clone() {
            output = output.with_title(title);
        }
        if options.wants(OutputFormat::Markdown) {
            output = output.with_markdown(markdown.clone());
        }
        if options.wants(OutputFormat::Structured) {
            output = output.with_structured(json!({
                "url": final_url,
                "title": title,
                "markdown_length": markdown.len(),
                "fetched_at": Utc::now(),
            }));
        }
        // Screenshots need a rendering engine; left unset.

        Ok(output)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(
            HttpScraper::extract_title(&document),
            Some("Test Page".to_string())
        );
    }

    #[test]
    fn test_extract_title_empty() {
        let html = r#"<html><head><title>  </title></head><body></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(HttpScraper::extract_title(&document), None);
    }

    #[test]
    fn test_html_to_markdown() {
        let html = "<h1>Hello</h1><p>World</p>";
        let md = HttpScraper::html_to_markdown(html);
        assert!(md.contains("Hello"));
        assert!(md.contains("World"));
    }

    #[test]
    fn test_prefers_main_content() {
        let html = r#"<html><body><nav>menu</nav><main><p>the content</p></main></body></html>"#;
        let document = Html::parse_document(html);
        let main = HttpScraper::extract_main_content(&document);
        assert!(main.contains("the content"));
        assert!(!main.contains("menu"));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            HttpScraper::normalize_url("example.com"),
            "https://example.com"
        );
        assert_eq!(
            HttpScraper::normalize_url("https://example.com"),
            "https://example.com"
        );
        assert_eq!(
            HttpScraper::normalize_url("http://example.com"),
            "http://example.com"
        );
    }
}
