//! SerpApi provider: `GET <endpoint>?q=..&hl=..&api_key=..` returning JSON
//! with an `organic_results` array.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use huddle_shared::{HuddleError, Result, SearchConfig, SearchFragment};

use crate::SearchProvider;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("Huddle/", env!("CARGO_PKG_VERSION"));

/// The parts of a SerpApi response we read.
#[derive(Debug, Deserialize)]
struct SerpResponse {
    /// Items stay raw so one badly typed entry doesn't sink the rest.
    #[serde(default)]
    organic_results: Option<Vec<Value>>,
    /// SerpApi reports account/key problems here, sometimes with a 200.
    #[serde(default)]
    error: Option<String>,
}

/// Web search through SerpApi.
pub struct SerpApiProvider {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    locale: String,
    query_prefix: String,
}

impl SerpApiProvider {
    /// Build a provider from config. `api_key = None` is a valid,
    /// degraded configuration in which every search comes back empty.
    pub fn new(config: &SearchConfig, api_key: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            HuddleError::config(format!("invalid search endpoint '{}': {e}", config.endpoint))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HuddleError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            locale: config.locale.clone(),
            query_prefix: config.query_prefix.trim().to_string(),
        })
    }

    /// Whether a credential is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Prepend the topic qualifier to the user's query.
    fn qualified_query(&self, query: &str) -> String {
        if self.query_prefix.is_empty() {
            query.trim().to_string()
        } else {
            format!("{} {}", self.query_prefix, query.trim())
        }
    }

    fn request_url(&self, query: &str, api_key: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("hl", &self.locale)
            .append_pair("api_key", api_key);
        url
    }

    /// Run the request; any failure is an error here and is collapsed by
    /// the [`SearchProvider`] impl.
    async fn fetch(&self, query: &str, api_key: &str) -> Result<Vec<SearchFragment>> {
        let url = self.request_url(query, api_key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HuddleError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HuddleError::Provider(format!(
                "HTTP {status}: {}",
                truncate_for_log(&body, 200)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| HuddleError::Network(format!("failed to read body: {}", e.without_url())))?;

        let parsed: SerpResponse = serde_json::from_str(&body)
            .map_err(|e| HuddleError::Provider(format!("malformed response: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(HuddleError::Provider(error));
        }

        Ok(parsed
            .organic_results
            .unwrap_or_default()
            .iter()
            .filter_map(fragment_from_item)
            .collect())
    }
}

/// Map one `organic_results` item, keeping only string-valued fields.
fn fragment_from_item(item: &Value) -> Option<SearchFragment> {
    let object = item.as_object()?;
    let text = |key: &str| object.get(key).and_then(Value::as_str).map(String::from);
    Some(SearchFragment {
        title: text("title"),
        snippet: text("snippet"),
        link: text("link"),
        source: text("source"),
    })
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    fn name(&self) -> &'static str {
        "serpapi"
    }

    #[instrument(skip_all, fields(provider = "serpapi"))]
    async fn search(&self, query: &str) -> Vec<SearchFragment> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("search API key not configured, skipping web search");
            return Vec::new();
        };

        let query = self.qualified_query(query);
        match self.fetch(&query, api_key).await {
            Ok(fragments) => {
                debug!(results = fragments.len(), "search completed");
                fragments
            }
            Err(e) => {
                warn!(error = %e, "search failed, continuing without results");
                Vec::new()
            }
        }
    }
}

fn truncate_for_log(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
