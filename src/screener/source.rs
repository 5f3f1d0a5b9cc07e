//! Standard interface for market-data backends feeding the screener.

use crate::apis::dexscreener::{TokenPair, TokenProfile};
use crate::errors::ScreenerResult;
use async_trait::async_trait;

/// Seam between the screener session and the upstream API.
///
/// Implemented by [`DexScreenerClient`](crate::apis::DexScreenerClient) for
/// production use; tests drive the session with in-memory stubs.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the full set of currently-promoted token profiles.
    async fn latest_profiles(&self) -> ScreenerResult<Vec<TokenProfile>>;

    /// Resolve a batch of token addresses into market pairs.
    async fn token_pairs(&self, addresses: &[String]) -> ScreenerResult<Vec<TokenPair>>;
}
