//! HTTP page fetching and listing-page link discovery.

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::{PageFetcher, UrlDiscovery};

const DEFAULT_USER_AGENT: &str = "stagewatch/0.1";

/// Fetches pages over HTTP with a request timeout and custom UA.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        debug!(url = %url, "HTTP fetch starting");

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                FetchError::Http {
                    url: url.to_string(),
                    source: Box::new(e),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: Box::new(e),
        })
    }
}

/// Discovers detail-page links by scanning listing HTML for `href`
/// attributes, joining relative links against the listing URL, and
/// keeping those that match the source's keyword filters.
pub struct HtmlLinkDiscovery<F: PageFetcher> {
    fetcher: F,
    href_pattern: Regex,
}

impl<F: PageFetcher> HtmlLinkDiscovery<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            href_pattern: Regex::new(r#"(?i)href\s*=\s*["']([^"'#]+)["']"#)
                .expect("href pattern is valid"),
        }
    }
}

#[async_trait]
impl<F: PageFetcher> UrlDiscovery for HtmlLinkDiscovery<F> {
    async fn discover(&self, listing_url: &str, keywords: &[String]) -> FetchResult<Vec<String>> {
        let html = self.fetcher.fetch(listing_url).await?;
        let base = Url::parse(listing_url).map_err(|_| FetchError::InvalidUrl {
            url: listing_url.to_string(),
        })?;

        let urls = extract_links(&base, &html, keywords, &self.href_pattern);
        debug!(
            listing = %listing_url,
            count = urls.len(),
            "Discovered candidate detail pages"
        );
        Ok(urls)
    }
}

/// Pull matching absolute URLs out of listing HTML, deduplicated in
/// first-seen order.
fn extract_links(base: &Url, html: &str, keywords: &[String], pattern: &Regex) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut urls = Vec::new();

    for caps in pattern.captures_iter(html) {
        let raw = caps[1].trim();
        if raw.is_empty()
            || raw.starts_with("mailto:")
            || raw.starts_with("javascript:")
            || raw.starts_with("tel:")
        {
            continue;
        }

        let Ok(resolved) = base.join(raw) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        let url = resolved.to_string();
        if url == base.as_str() {
            continue;
        }

        if !keywords.is_empty() {
            let lowered = url.to_lowercase();
            if !keywords.iter().any(|k| lowered.contains(&k.to_lowercase())) {
                continue;
            }
        }

        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Regex {
        Regex::new(r#"(?i)href\s*=\s*["']([^"'#]+)["']"#).unwrap()
    }

    #[test]
    fn test_extract_links_resolves_relative_urls() {
        let base = Url::parse("https://band.example/news/").unwrap();
        let html = r#"
            <a href="/live/9th-live">9th LIVE</a>
            <a href="detail/123">Detail</a>
            <a href="https://other.example/live/fest">Fest</a>
        "#;

        let urls = extract_links(&base, html, &[], &pattern());
        assert_eq!(
            urls,
            vec![
                "https://band.example/live/9th-live",
                "https://band.example/news/detail/123",
                "https://other.example/live/fest",
            ]
        );
    }

    #[test]
    fn test_extract_links_filters_by_keyword() {
        let base = Url::parse("https://band.example/").unwrap();
        let html = r#"
            <a href="/live/9th-live">live</a>
            <a href="/goods/shirt">goods</a>
        "#;

        let urls = extract_links(&base, html, &["live".to_string()], &pattern());
        assert_eq!(urls, vec!["https://band.example/live/9th-live"]);
    }

    #[test]
    fn test_extract_links_dedupes_and_skips_non_http() {
        let base = Url::parse("https://band.example/").unwrap();
        let html = r#"
            <a href="/live/a">one</a>
            <a href="/live/a">again</a>
            <a href="mailto:info@band.example">mail</a>
            <a href="javascript:void(0)">js</a>
        "#;

        let urls = extract_links(&base, html, &[], &pattern());
        assert_eq!(urls, vec!["https://band.example/live/a"]);
    }

    #[tokio::test]
    async fn test_discovery_uses_fetcher() {
        use crate::testing::MockFetcher;

        let fetcher = MockFetcher::new().with_page(
            "https://band.example/news",
            r#"<a href="/live/9th">9th LIVE</a>"#,
        );
        let discovery = HtmlLinkDiscovery::new(fetcher);

        let urls = discovery
            .discover("https://band.example/news", &[])
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://band.example/live/9th"]);
    }
}
