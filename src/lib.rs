pub mod apis;
pub mod constants;
pub mod errors;
pub mod portfolio;
pub mod screener;

// Re-export the consumer-facing surface
pub use apis::dexscreener::{DexScreenerClient, TokenPair, TokenProfile};
pub use errors::{ScreenerError, ScreenerResult};
pub use portfolio::Portfolio;
pub use screener::source::MarketDataSource;
pub use screener::{ScreenerConfig, TokenScreener};
