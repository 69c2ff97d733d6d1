//! HTTP client for Amazon search requests.

use crate::amazon::models::SearchOutcome;
use crate::amazon::parser::Parser;
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use wreq::Client;

/// Static browser identification sent with every marketplace request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Trait for marketplace search fetching - enables mocking for tests.
#[async_trait]
pub trait AmazonSearch: Send + Sync {
    /// Performs a price-filtered search and returns the HTML response.
    async fn search(&self, query: &str, min_price: Option<u64>, max_price: Option<u64>)
        -> Result<String>;

    /// Returns the marketplace origin used to resolve relative links.
    fn origin(&self) -> &str;
}

/// Amazon HTTP client with a static browser identity.
pub struct AmazonClient {
    client: Client,
    origin: String,
    referral_tag: String,
}

impl AmazonClient {
    /// Creates a new Amazon client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .context("Failed to build marketplace HTTP client")?;

        Ok(Self {
            client,
            origin: config.marketplace_url.trim_end_matches('/').to_string(),
            referral_tag: config.referral_tag.clone(),
        })
    }

    /// Builds the search URL for a phrase and price range.
    pub fn search_url(&self, query: &str, min_price: Option<u64>, max_price: Option<u64>) -> String {
        format!(
            "{}/s?k={}&rh={}&ref={}",
            self.origin,
            urlencoding::encode(query),
            urlencoding::encode(&price_filter_param(min_price, max_price)),
            urlencoding::encode(&self.referral_tag)
        )
    }

    /// Performs a GET request with the static browser headers.
    async fn get(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Marketplace returned 503; it may be throttling this client.");
        }

        if !status.is_success() {
            anyhow::bail!("Request failed with status: {}", status);
        }

        response.text().await.context("Failed to read response body")
    }
}

#[async_trait]
impl AmazonSearch for AmazonClient {
    async fn search(
        &self,
        query: &str,
        min_price: Option<u64>,
        max_price: Option<u64>,
    ) -> Result<String> {
        let url = self.search_url(query, min_price, max_price);

        info!("Searching: {} (price {:?} - {:?})", query, min_price, max_price);
        self.get(&url).await
    }

    fn origin(&self) -> &str {
        &self.origin
    }
}

/// Encodes an inclusive rupee range as the marketplace `p_36` refinement.
///
/// Both bounds are scaled by 100 twice, matching the encoding this service
/// has always sent. A missing lower bound becomes 0 and a missing upper bound
/// leaves the range open.
pub fn price_filter_param(min_price: Option<u64>, max_price: Option<u64>) -> String {
    let scale = |price: u64| price.saturating_mul(100).saturating_mul(100);

    let low = min_price.map(scale).unwrap_or(0);
    let high = max_price.map(|p| scale(p).to_string()).unwrap_or_default();

    format!("p_36:{}-{}", low, high)
}

/// Searches the marketplace and parses up to `limit` listings.
///
/// Request failures are reported as [`SearchOutcome::Failed`] rather than
/// errors; callers that only want records get an empty list either way.
pub async fn fetch_listings(
    client: &dyn AmazonSearch,
    query: &str,
    min_price: Option<u64>,
    max_price: Option<u64>,
    limit: usize,
    currency: &str,
) -> SearchOutcome {
    let html = match client.search(query, min_price, max_price).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Search request failed: {:#}", e);
            return SearchOutcome::Failed(format!("{:#}", e));
        }
    };

    let parser = Parser::new(client.origin(), currency);
    let outcome = parser.parse_search(&html, limit);

    if let SearchOutcome::Listings(records) = &outcome {
        info!("Fetched {} listings for {:?}", records.len(), query);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_test_config(base_url: &str) -> Config {
        Config {
            marketplace_url: base_url.to_string(),
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            ..Config::default()
        }
    }

    const SEARCH_HTML: &str = r#"
        <html><body>
            <div data-component-type="s-search-result" data-asin="B08N5WRWNW">
                <h2><a class="a-link-normal" href="/dp/B08N5WRWNW"><span>Test Product</span></a></h2>
                <span class="a-price-whole">1,299.</span>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_price_filter_both_bounds() {
        assert_eq!(price_filter_param(Some(10000), Some(20000)), "p_36:100000000-200000000");
    }

    #[test]
    fn test_price_filter_missing_min() {
        assert_eq!(price_filter_param(None, Some(80000)), "p_36:0-800000000");
    }

    #[test]
    fn test_price_filter_missing_max() {
        assert_eq!(price_filter_param(Some(500), None), "p_36:5000000-");
        assert_eq!(price_filter_param(None, None), "p_36:0-");
    }

    #[test]
    fn test_price_filter_saturates() {
        assert_eq!(price_filter_param(Some(u64::MAX), None), format!("p_36:{}-", u64::MAX));
    }

    #[test]
    fn test_search_url() {
        let client = AmazonClient::new(&make_test_config("https://www.amazon.in/")).unwrap();
        let url = client.search_url("gaming laptop", None, Some(80000));
        assert_eq!(
            url,
            "https://www.amazon.in/s?k=gaming%20laptop&rh=p_36%3A0-800000000&ref=sr_nr_p_36_5"
        );
        assert_eq!(client.origin(), "https://www.amazon.in");
    }

    #[tokio::test]
    async fn test_search_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/s"))
            .and(query_param("k", "test query"))
            .and(query_param("rh", "p_36:1000000-2000000"))
            .and(query_param("ref", "sr_nr_p_36_5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_HTML))
            .mount(&mock_server)
            .await;

        let client = AmazonClient::new(&make_test_config(&mock_server.uri())).unwrap();

        let body = client.search("test query", Some(100), Some(200)).await.unwrap();
        assert!(body.contains("Test Product"));
        assert!(body.contains("B08N5WRWNW"));

        let requests = mock_server.received_requests().await.unwrap();
        let headers = &requests[0].headers;
        assert_eq!(headers.get("user-agent").unwrap().to_str().unwrap(), USER_AGENT);
        assert_eq!(headers.get("accept-language").unwrap().to_str().unwrap(), "en-US,en;q=0.9");
    }

    #[tokio::test]
    async fn test_http_error_500() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = AmazonClient::new(&make_test_config(&mock_server.uri())).unwrap();

        let result = client.search("test", None, None).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_fetch_listings_parses_records() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_HTML))
            .mount(&mock_server)
            .await;

        let client = AmazonClient::new(&make_test_config(&mock_server.uri())).unwrap();
        let outcome = fetch_listings(&client, "test", None, None, 5, "₹").await;

        let records = outcome.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Test Product");
        assert_eq!(records[0].price, 1299);
        assert_eq!(records[0].link, format!("{}/dp/B08N5WRWNW", mock_server.uri()));
    }

    #[tokio::test]
    async fn test_fetch_listings_non_success_is_failed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = AmazonClient::new(&make_test_config(&mock_server.uri())).unwrap();
        let outcome = fetch_listings(&client, "test", None, None, 5, "₹").await;

        assert!(matches!(outcome, SearchOutcome::Failed(ref reason) if reason.contains("503")));
        assert!(outcome.into_records().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_listings_network_failure_is_failed() {
        // Nothing listens on port 9 (discard) in the test environment.
        let client = AmazonClient::new(&make_test_config("http://127.0.0.1:9")).unwrap();
        let outcome = fetch_listings(&client, "test", None, None, 5, "₹").await;
        assert!(matches!(outcome, SearchOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_fetch_listings_bot_challenge_is_blocked() {
        let mock_server = MockServer::start().await;

        let html = "<html><body><h4>Sorry, we just need to make sure you're not a robot.</h4></body></html>";
        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let client = AmazonClient::new(&make_test_config(&mock_server.uri())).unwrap();
        let outcome = fetch_listings(&client, "test", None, None, 5, "₹").await;
        assert!(outcome.is_blocked());
    }
}
