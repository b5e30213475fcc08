use crate::errors::Error;
use async_trait::async_trait;
use mockall::automock;
use reqwest::Client as HTTPClient;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::ParseError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream quote provider. Bodies are returned as parsed JSON without any
/// shape checks; callers decide what an unexpected shape means.
#[automock]
#[async_trait]
pub trait Interface: Send + Sync {
    async fn get_quotes(&self, tickers: Vec<String>) -> Result<Value, Error>;
    async fn get_short_quote(&self, ticker: String) -> Result<Value, Error>;
}

#[derive(Clone)]
pub struct Client {
    fmp_base_url: String,
    fmp_api_key: String,
    http_client: HTTPClient,
}

impl Client {
    pub fn new(fmp_api_key: String, fmp_base_url: String) -> Result<Self, Error> {
        let http_client = HTTPClient::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Client {
            fmp_base_url,
            fmp_api_key,
            http_client,
        })
    }

    /// `key` is appended as a single escaped path segment, so `/`, `?` and
    /// `#` in a caller-supplied ticker stay inside the resource path.
    fn endpoint(&self, resource: &str, key: &str) -> Result<Url, Error> {
        let mut url = Url::parse(&self.fmp_base_url)?;

        url.path_segments_mut()
            .map_err(|_| Error::URLError(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(resource)
            .push(key);

        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value, Error> {
        let response = self
            .http_client
            .get(url)
            .header("accept", "application/json")
            .query(&[("apikey", &self.fmp_api_key)])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            debug!("FMP request returned status: {}", status);
        }

        let body = response.text().await?;

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Interface for Client {
    async fn get_quotes(&self, tickers: Vec<String>) -> Result<Value, Error> {
        let url = self.endpoint("quote", &tickers.join(","))?;

        self.get_json(url).await
    }

    async fn get_short_quote(&self, ticker: String) -> Result<Value, Error> {
        let url = self.endpoint("quote-short", &ticker)?;

        self.get_json(url).await
    }
}
