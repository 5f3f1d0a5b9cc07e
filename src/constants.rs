//! Global constants used across the token screener.
//!
//! This module contains system-wide constants that are not configurable
//! and are used across multiple modules.

// ============================================================================
// DEXSCREENER API CONSTANTS
// ============================================================================

/// Base URL for all DexScreener endpoints
pub const DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com";

/// Maximum token addresses accepted by the batch pair endpoint
pub const MAX_TOKENS_PER_REQUEST: usize = 30;

/// Request timeout in seconds - DexScreener is fast, 10s is sufficient
pub const TIMEOUT_SECS: u64 = 10;

// ============================================================================
// SCREENING DEFAULTS
// ============================================================================

/// Chain id accepted from the profile feed
pub const TARGET_CHAIN_ID: &str = "base";

/// Dex id accepted from resolved pairs
pub const TARGET_DEX_ID: &str = "uniswap";

/// Addresses resolved per `fetch_more_tokens` call
pub const TOKENS_PER_BATCH: usize = 10;

/// Trade-size string stamped onto saved tokens that carry no amount
pub const DEFAULT_TRADE_AMOUNT: &str = "0.1";
