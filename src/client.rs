//! Remote dashboard API client
//!
//! Thin client over the platform's REST API:
//! - Stored stock listings and per-symbol quotes
//! - Portfolios and their transactions
//! - Simulated trading accounts
//! - Market news
//!
//! Every response is consumed as opaque JSON records; the server owns the
//! schema and all price/performance computation.

use serde_json::Value;

use crate::error::{DashboardError, Result};
use crate::types::Record;

/// Dashboard API client
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create new client for the given API base URL
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            http: reqwest::Client::new(),
        }
    }

    /// Create client from Cloudflare environment (API_BASE_URL var,
    /// optional API_TOKEN secret)
    pub fn from_env(env: &worker::Env) -> Result<Self> {
        let base_url = env
            .var("API_BASE_URL")
            .map(|v| v.to_string())
            .map_err(|_| DashboardError::Config("API_BASE_URL must be set".into()))?;
        let token = env.secret("API_TOKEN").ok().map(|s| s.to_string());
        Ok(Self::new(base_url, token))
    }

    /// Get stored stock listings
    pub async fn stocks(&self) -> Result<Vec<Record>> {
        self.get_collection("/stocks/").await
    }

    /// Get the live quote for a symbol
    pub async fn stock_quote(&self, symbol: &str) -> Result<Record> {
        self.get_record(&format!("/stocks/quote/{symbol}")).await
    }

    /// Get the user's portfolios
    pub async fn portfolios(&self) -> Result<Vec<Record>> {
        self.get_collection("/portfolios").await
    }

    /// Get transactions recorded for a portfolio
    pub async fn portfolio_transactions(&self, portfolio_id: &str) -> Result<Vec<Record>> {
        self.get_collection(&format!("/transactions/portfolio/{portfolio_id}"))
            .await
    }

    /// Get simulated trading accounts
    pub async fn simulation_accounts(&self) -> Result<Vec<Record>> {
        self.get_collection("/simulation/accounts").await
    }

    /// Get one account with holdings and performance
    pub async fn simulation_account_detail(&self, account_id: &str) -> Result<Record> {
        self.get_record(&format!("/simulation/accounts/{account_id}"))
            .await
    }

    /// Get market news articles (first page of the given size)
    pub async fn market_news(&self, page_size: usize) -> Result<Vec<Record>> {
        let envelope: Record = self
            .get_record(&format!("/news/market?page=1&page_size={page_size}"))
            .await?;
        Ok(extract_articles(&envelope))
    }

    /// Perform GET request for a JSON array of records
    async fn get_collection(&self, path: &str) -> Result<Vec<Record>> {
        self.get(path).await
    }

    /// Perform GET request for a single JSON object
    async fn get_record(&self, path: &str) -> Result<Record> {
        self.get(path).await
    }

    /// Perform GET request with optional bearer auth and a request id
    async fn get<T: for<'de> serde::Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .http
            .get(&url)
            .header("Content-Type", "application/json")
            .header("X-Request-ID", uuid::Uuid::new_v4().to_string());

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle API response, checking for errors
    async fn handle_response<T: for<'de> serde::Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(DashboardError::Api(format!("HTTP {status}: {error_text}")));
        }

        response.json().await.map_err(DashboardError::from)
    }
}

/// Unwrap the `{articles, totalResults}` news envelope into its article
/// records; anything malformed degrades to an empty collection.
fn extract_articles(envelope: &Record) -> Vec<Record> {
    match envelope.get("articles") {
        Some(Value::Array(articles)) => articles
            .iter()
            .filter_map(|a| a.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_articles() {
        let envelope = json!({
            "articles": [
                { "title": "Apple unveils new iPhone", "source": "Reuters" },
                { "title": "Tesla beats earnings estimates", "source": "AP" },
            ],
            "totalResults": 2,
        });
        let articles = extract_articles(envelope.as_object().unwrap());
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].get("title").and_then(Value::as_str), Some("Apple unveils new iPhone"));
    }

    #[test]
    fn test_extract_articles_malformed_envelope() {
        let envelope = json!({ "totalResults": 0 });
        assert!(extract_articles(envelope.as_object().unwrap()).is_empty());

        let not_an_array = json!({ "articles": "gone" });
        assert!(extract_articles(not_an_array.as_object().unwrap()).is_empty());
    }
}
