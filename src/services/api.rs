use itertools::Itertools;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::models::config::Config;
use crate::models::market::{MarketRecord, MarketsItem, SearchResponse};

/// CoinGecko accepts comma-separated ids; keep each request within a safe size
const ID_CHUNK_SIZE: usize = 50;
const DEFAULT_ORDER: &str = "market_cap_desc";
const PRICE_CHANGE_WINDOWS: &str = "1h,24h,7d";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("CoinGecko {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to parse API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Thin client over the public CoinGecko REST API
#[derive(Debug, Clone)]
pub struct MarketClient {
    client: reqwest::Client,
    base_url: String,
    vs_currency: String,
}

impl MarketClient {
    pub fn new(config: &Config) -> Self {
        MarketClient {
            client: reqwest::Client::new(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.clone(),
        }
    }

    /// Fetches the top `page_size` coins by market cap
    pub async fn fetch_list(&self, page_size: u32) -> Result<Vec<MarketRecord>, ApiError> {
        self.fetch_page(page_size, 1, DEFAULT_ORDER).await
    }

    pub async fn fetch_page(
        &self,
        per_page: u32,
        page: u32,
        order: &str,
    ) -> Result<Vec<MarketRecord>, ApiError> {
        let query = [
            ("vs_currency", self.vs_currency.clone()),
            ("order", order.to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("sparkline", "true".to_string()),
            ("price_change_percentage", PRICE_CHANGE_WINDOWS.to_string()),
        ];
        let items: Vec<MarketsItem> = self.get_json("/coins/markets", &query).await?;
        info!(count = items.len(), page, "fetched market list");
        Ok(items.into_iter().map(MarketRecord::from).collect())
    }

    /// Fetches market rows for specific coin ids, preserving chunk order
    pub async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<MarketRecord>, ApiError> {
        let mut results = Vec::with_capacity(ids.len());
        for chunk in id_chunks(ids) {
            let query = [
                ("vs_currency", self.vs_currency.clone()),
                ("ids", chunk),
                ("sparkline", "true".to_string()),
                ("price_change_percentage", PRICE_CHANGE_WINDOWS.to_string()),
            ];
            let items: Vec<MarketsItem> = self.get_json("/coins/markets", &query).await?;
            results.extend(items.into_iter().map(MarketRecord::from));
        }
        Ok(results)
    }

    /// Resolves a free-text query to coin ids, then fetches their market rows
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<MarketRecord>, ApiError> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Vec::new());
        }

        let found: SearchResponse = self.get_json("/search", &[("query", q.to_string())]).await?;
        let ids: Vec<String> = found.coins.into_iter().map(|c| c.id).take(limit).collect();
        info!(query = q, matches = ids.len(), "search resolved");
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_by_ids(&ids).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!(%status, %url, "API error");
            return Err(ApiError::Status {
                status,
                body: response_text,
            });
        }

        serde_json::from_str::<T>(&response_text).map_err(|e| {
            error!(error = %e, %url, "parse error");
            ApiError::Decode(e)
        })
    }
}

fn id_chunks(ids: &[String]) -> Vec<String> {
    ids.chunks(ID_CHUNK_SIZE)
        .map(|chunk| chunk.iter().join(","))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> MarketClient {
        MarketClient::new(&Config {
            api_base: "http://127.0.0.1:9/api/v3/".to_string(),
            ..Config::default()
        })
    }

    #[test]
    fn test_id_chunks_split_at_fifty() {
        let ids: Vec<String> = (0..120).map(|i| format!("coin-{}", i)).collect();
        let chunks = id_chunks(&ids);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].split(',').count(), 50);
        assert_eq!(chunks[2].split(',').count(), 20);
        assert!(chunks[0].starts_with("coin-0,coin-1,"));
        assert!(chunks[2].ends_with("coin-119"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(offline_client().base_url, "http://127.0.0.1:9/api/v3");
    }

    #[tokio::test]
    async fn test_blank_search_skips_network() {
        let results = offline_client().search("   ", 25).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_no_ids_skips_network() {
        let results = offline_client().fetch_by_ids(&[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_status_error_message() {
        let err = ApiError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "CoinGecko 429 Too Many Requests: rate limited");
    }
}
