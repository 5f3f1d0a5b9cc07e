//! DexScreener API client.
//!
//! Endpoints implemented:
//! 1. /token-profiles/latest/v1 - latest token profiles
//! 2. /latest/dex/tokens/{tokenAddresses} - pairs for up to 30 tokens (batch)
//!
//! API documentation: https://docs.dexscreener.com/api/reference

pub mod types;

pub use self::types::{
    Boosts, Liquidity, PairInfo, PairToken, PairsResponse, PriceChange, ProfileLink, SocialLink,
    TokenPair, TokenProfile, WebsiteLink,
};

use crate::constants::{DEXSCREENER_BASE_URL, MAX_TOKENS_PER_REQUEST, TIMEOUT_SECS};
use crate::errors::{ScreenerError, ScreenerResult};
use crate::screener::source::MarketDataSource;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client over the DexScreener endpoints the screener consumes.
pub struct DexScreenerClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl DexScreenerClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEXSCREENER_BASE_URL.to_string(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
        }
    }

    /// Point the client at a different host (staging, local fixture server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new()
        }
    }

    async fn get_json<T>(&self, endpoint: &str) -> ScreenerResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);

        log::debug!("[DEXSCREENER] GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ScreenerError::Network(format!("DexScreener request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScreenerError::Api(format!(
                "DexScreener API error {}: {}",
                status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ScreenerError::Parsing(format!("Failed to parse response: {}", e)))
    }

    /// Get latest token profiles (newest promoted listings).
    pub async fn latest_token_profiles(&self) -> ScreenerResult<Vec<TokenProfile>> {
        let profiles: Vec<TokenProfile> = self.get_json("token-profiles/latest/v1").await?;
        log::info!("Fetched {} token profiles from DexScreener", profiles.len());
        Ok(profiles)
    }

    /// Batch fetch pairs for up to 30 token addresses in one call.
    pub async fn token_pairs_for(&self, addresses: &[String]) -> ScreenerResult<Vec<TokenPair>> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        if addresses.len() > MAX_TOKENS_PER_REQUEST {
            return Err(ScreenerError::Api(format!(
                "Too many addresses: {} (max {})",
                addresses.len(),
                MAX_TOKENS_PER_REQUEST
            )));
        }

        let endpoint = format!("latest/dex/tokens/{}", addresses.join(","));
        let data: PairsResponse = self.get_json(&endpoint).await?;
        let pairs = data.pairs.unwrap_or_default();
        log::info!(
            "Fetched {} pairs for {} addresses from DexScreener",
            pairs.len(),
            addresses.len()
        );
        Ok(pairs)
    }
}

impl Default for DexScreenerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MarketDataSource for DexScreenerClient {
    async fn latest_profiles(&self) -> ScreenerResult<Vec<TokenProfile>> {
        self.latest_token_profiles().await
    }

    async fn token_pairs(&self, addresses: &[String]) -> ScreenerResult<Vec<TokenPair>> {
        self.token_pairs_for(addresses).await
    }
}
