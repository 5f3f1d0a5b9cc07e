//! Wire types for the DexScreener endpoints consumed by the screener.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// DexScreener Token Profiles API response types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenProfile {
    pub url: String,
    #[serde(rename = "chainId")]
    pub chain_id: String,
    #[serde(rename = "tokenAddress")]
    pub token_address: String,
    pub icon: Option<String>,
    pub header: Option<String>,
    pub description: Option<String>,
    pub links: Option<Vec<ProfileLink>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileLink {
    #[serde(rename = "type")]
    pub link_type: Option<String>,
    pub label: Option<String>,
    pub url: String,
}

// DexScreener batch pair endpoint response types
#[derive(Debug, Clone, Deserialize)]
pub struct PairsResponse {
    #[serde(rename = "schemaVersion")]
    pub schema_version: Option<String>,
    pub pairs: Option<Vec<TokenPair>>,
}

/// A resolved market pair as returned by `/latest/dex/tokens/{addresses}`.
///
/// `amount` is never populated from the wire; it is assigned when the pair is
/// promoted into the saved-token list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "chainId")]
    pub chain_id: String,
    #[serde(rename = "dexId")]
    pub dex_id: String,
    pub url: Option<String>,
    #[serde(rename = "pairAddress")]
    pub pair_address: String,
    #[serde(rename = "baseToken")]
    pub base_token: PairToken,
    #[serde(rename = "quoteToken")]
    pub quote_token: PairToken,
    #[serde(rename = "priceNative")]
    pub price_native: Option<String>,
    #[serde(rename = "priceUsd")]
    pub price_usd: Option<String>,
    #[serde(rename = "priceChange")]
    pub price_change: Option<PriceChange>,
    pub liquidity: Option<Liquidity>,
    pub fdv: Option<f64>,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "pairCreatedAt")]
    pub pair_created_at: Option<i64>,
    pub info: Option<PairInfo>,
    pub boosts: Option<Boosts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairToken {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChange {
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Liquidity {
    pub usd: Option<f64>,
    pub base: Option<f64>,
    pub quote: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairInfo {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub websites: Vec<WebsiteLink>,
    #[serde(default)]
    pub socials: Vec<SocialLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteLink {
    pub label: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    #[serde(rename = "type")]
    pub link_type: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boosts {
    pub active: Option<u64>,
}

impl TokenPair {
    /// Pair creation time, converted from the upstream epoch-millisecond field.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.pair_created_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Hours since pair creation, when the upstream timestamp is present.
    pub fn age_hours(&self) -> Option<f64> {
        self.created_at()
            .map(|created| (Utc::now() - created).num_minutes() as f64 / 60.0)
    }

    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .unwrap_or(0.0)
    }
}
