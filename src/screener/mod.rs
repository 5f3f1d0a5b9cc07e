//! Token screening pipeline.
//!
//! Two collaborating stages composed into one session: profile discovery
//! (profile feed -> chain filter -> candidate addresses) and the batched
//! pair resolver (candidate window -> batch endpoint -> venue filter ->
//! accumulated pairs). Discovery runs once per session via [`TokenScreener::start`];
//! afterwards the resolver advances only through explicit
//! [`TokenScreener::fetch_more_tokens`] calls.

pub(crate) mod session;
pub mod source;

use crate::apis::dexscreener::{TokenPair, TokenProfile};
use crate::constants::{DEFAULT_TRADE_AMOUNT, TARGET_CHAIN_ID, TARGET_DEX_ID, TOKENS_PER_BATCH};
use crate::portfolio::Portfolio;
use parking_lot::RwLock;
use session::SessionState;
use source::MarketDataSource;
use std::sync::Arc;

/// Screening configuration.
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// Chain id accepted from the profile feed.
    pub chain_id: String,
    /// Dex id accepted from resolved pairs.
    pub dex_id: String,
    /// Addresses resolved per batch.
    pub batch_size: usize,
    /// Trade-size string stamped onto saved tokens added without one.
    pub default_amount: String,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            chain_id: TARGET_CHAIN_ID.to_string(),
            dex_id: TARGET_DEX_ID.to_string(),
            batch_size: TOKENS_PER_BATCH,
            default_amount: DEFAULT_TRADE_AMOUNT.to_string(),
        }
    }
}

/// Owned screening session: holds all pagination state for one mount of the
/// module and exposes snapshot accessors to the consuming layer.
///
/// All state mutation happens inside the two fetch operations; the interior
/// lock is never held across a suspension point.
pub struct TokenScreener {
    source: Arc<dyn MarketDataSource>,
    config: ScreenerConfig,
    state: RwLock<SessionState>,
    portfolio: RwLock<Portfolio>,
}

impl TokenScreener {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self::with_config(source, ScreenerConfig::default())
    }

    pub fn with_config(source: Arc<dyn MarketDataSource>, config: ScreenerConfig) -> Self {
        let portfolio = Portfolio::new(config.default_amount.clone());
        Self {
            source,
            config,
            state: RwLock::new(SessionState::new()),
            portfolio: RwLock::new(portfolio),
        }
    }

    /// Run discovery, then the first batch if discovery produced candidates.
    ///
    /// Called once on session activation; re-invocation is an external
    /// lifecycle concern.
    pub async fn start(&self) {
        self.discover_profiles().await;

        let has_candidates = !self.state.read().candidates.is_empty();
        if has_candidates {
            self.fetch_next_batch().await;
        }
    }

    /// Externally triggerable re-entry into the resolver ("load more").
    ///
    /// No-op while a batch is in flight or once the session is exhausted.
    pub async fn fetch_more_tokens(&self) {
        self.fetch_next_batch().await;
    }

    /// Fetch the profile feed and append accepted addresses to the candidate
    /// queue. On failure the profile list keeps whatever it held.
    pub async fn discover_profiles(&self) {
        self.state.write().last_error = None;

        log::info!("Fetching token profiles from DexScreener");

        match self.source.latest_profiles().await {
            Ok(profiles) => {
                let accepted: Vec<TokenProfile> = profiles
                    .into_iter()
                    .filter(|p| p.chain_id == self.config.chain_id)
                    .collect();

                log::info!(
                    "Discovery accepted {} profiles on chain {}",
                    accepted.len(),
                    self.config.chain_id
                );

                let mut state = self.state.write();
                let addresses: Vec<String> =
                    accepted.iter().map(|p| p.token_address.clone()).collect();
                state.push_candidates(addresses);
                state.profiles = accepted;
            }
            Err(e) => {
                log::warn!("Failed to fetch token profiles: {}", e);
                self.state.write().last_error = Some(e.to_string());
            }
        }
    }

    /// Advance pagination by exactly one batch.
    async fn fetch_next_batch(&self) {
        // Precondition check and window selection are synchronous, under the
        // write lock, so the loading flag is set before the first suspension
        // point and re-entrant calls bail out without side effects.
        let (window, batch_index) = {
            let mut state = self.state.write();
            if state.loading || !state.has_more {
                return;
            }
            state.loading = true;
            state.last_error = None;
            (state.next_window(self.config.batch_size), state.page)
        };

        if window.is_empty() {
            let mut state = self.state.write();
            state.has_more = false;
            state.loading = false;
            log::info!("No unresolved candidates left; screening session exhausted");
            return;
        }

        log::debug!(
            "Resolving batch {} ({} addresses)",
            batch_index,
            window.len()
        );

        let result = self.source.token_pairs(&window).await;

        let mut state = self.state.write();
        match result {
            Ok(pairs) => {
                let fetched = pairs.len();
                let retained: Vec<TokenPair> = pairs
                    .into_iter()
                    .filter(|p| p.dex_id == self.config.dex_id)
                    .collect();

                log::info!(
                    "Batch {}: kept {}/{} pairs on {}",
                    batch_index,
                    retained.len(),
                    fetched,
                    self.config.dex_id
                );

                // The whole window is consumed, pair or no pair; exhaustion
                // follows window size, not resolved-pair count.
                state.mark_resolved(&window);
                state.pairs.extend(retained);
                state.page += 1;
                if window.len() < self.config.batch_size {
                    state.has_more = false;
                }
            }
            Err(e) => {
                // Pagination state stays put so the next call retries the
                // same window.
                log::warn!("Batch {} failed: {}", batch_index, e);
                state.last_error = Some(e.to_string());
            }
        }
        state.loading = false;
    }

    // ------------------------------------------------------------------
    // Read accessors (snapshots)
    // ------------------------------------------------------------------

    pub fn profiles(&self) -> Vec<TokenProfile> {
        self.state.read().profiles.clone()
    }

    pub fn token_pairs(&self) -> Vec<TokenPair> {
        self.state.read().pairs.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    pub fn has_more_tokens(&self) -> bool {
        self.state.read().has_more
    }

    // ------------------------------------------------------------------
    // Saved-token registry
    // ------------------------------------------------------------------

    pub fn saved_tokens(&self) -> Vec<TokenPair> {
        self.portfolio.read().tokens().to_vec()
    }

    pub fn default_amount(&self) -> String {
        self.portfolio.read().default_amount().to_string()
    }

    pub fn add_token(&self, pair: TokenPair) {
        self.portfolio.write().add(pair);
    }

    pub fn remove_token(&self, base_address: &str) {
        self.portfolio.write().remove(base_address);
    }

    pub fn set_default_amount(&self, amount: impl Into<String>) {
        self.portfolio.write().set_default_amount(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ScreenerError, ScreenerResult};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use tokio::sync::Notify;

    fn profile(address: &str, chain: &str) -> TokenProfile {
        serde_json::from_value(serde_json::json!({
            "url": format!("https://dexscreener.com/{chain}/{address}"),
            "chainId": chain,
            "tokenAddress": address,
        }))
        .unwrap()
    }

    fn pair(base_address: &str, dex: &str) -> TokenPair {
        serde_json::from_value(serde_json::json!({
            "chainId": "base",
            "dexId": dex,
            "pairAddress": format!("pair-{base_address}"),
            "baseToken": {"address": base_address, "name": "Token", "symbol": "TKN"},
            "quoteToken": {"address": "0xweth", "name": "Wrapped Ether", "symbol": "WETH"},
        }))
        .unwrap()
    }

    fn base_profiles(n: usize) -> Vec<TokenProfile> {
        (0..n).map(|i| profile(&format!("0x{:03}", i), "base")).collect()
    }

    /// In-memory market-data backend. Resolves every requested address to a
    /// uniswap pair unless told otherwise, and records each batch request.
    #[derive(Default)]
    struct StubSource {
        profiles: Vec<TokenProfile>,
        profile_failure: Option<String>,
        /// Fail this many batch calls before succeeding.
        batch_failures: Arc<Mutex<usize>>,
        /// Addresses that resolve to no pair at all.
        missing: HashSet<String>,
        /// Per-address dex id overrides.
        dex_overrides: HashMap<String, String>,
        /// Address lists of every batch request issued.
        requests: Arc<Mutex<Vec<Vec<String>>>>,
        /// Signalled when a batch call enters; awaited before it returns.
        entered: Option<Arc<Notify>>,
        proceed: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn latest_profiles(&self) -> ScreenerResult<Vec<TokenProfile>> {
            match &self.profile_failure {
                Some(msg) => Err(ScreenerError::Network(msg.clone())),
                None => Ok(self.profiles.clone()),
            }
        }

        async fn token_pairs(&self, addresses: &[String]) -> ScreenerResult<Vec<TokenPair>> {
            self.requests.lock().push(addresses.to_vec());

            if let Some(entered) = &self.entered {
                entered.notify_one();
            }
            if let Some(proceed) = &self.proceed {
                proceed.notified().await;
            }

            {
                let mut failures = self.batch_failures.lock();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(ScreenerError::Network("connection reset by peer".into()));
                }
            }

            Ok(addresses
                .iter()
                .filter(|a| !self.missing.contains(*a))
                .map(|a| {
                    let dex = self
                        .dex_overrides
                        .get(a)
                        .map(String::as_str)
                        .unwrap_or("uniswap");
                    pair(a, dex)
                })
                .collect())
        }
    }

    fn screener_with(source: StubSource) -> (TokenScreener, Arc<Mutex<Vec<Vec<String>>>>) {
        let requests = source.requests.clone();
        (TokenScreener::new(Arc::new(source)), requests)
    }

    #[tokio::test]
    async fn discovery_keeps_only_target_chain_profiles() {
        let mut profiles = Vec::new();
        for i in 0..6 {
            profiles.push(profile(&format!("0xb{:02}", i), "base"));
            if i % 2 == 0 {
                profiles.push(profile(&format!("0xe{:02}", i), "ethereum"));
            }
        }
        let source = StubSource { profiles, ..Default::default() };
        let (screener, requests) = screener_with(source);

        screener.start().await;

        let accepted = screener.profiles();
        assert_eq!(accepted.len(), 6);
        assert!(accepted.iter().all(|p| p.chain_id == "base"));

        // The first batch only ever sees base addresses.
        let first_request = requests.lock()[0].clone();
        assert!(first_request.iter().all(|a| a.starts_with("0xb")));
    }

    #[tokio::test]
    async fn twenty_five_candidates_exhaust_in_two_requests() {
        let source = StubSource { profiles: base_profiles(25), ..Default::default() };
        let (screener, requests) = screener_with(source);

        screener.start().await;
        assert_eq!(screener.token_pairs().len(), 10);
        assert!(screener.has_more_tokens());

        // The second window indexes 10..20 into the 15 still-unresolved
        // addresses: the final 5 resolve, positions 10..19 of the original
        // queue are passed over, and the short window exhausts the session.
        screener.fetch_more_tokens().await;
        assert_eq!(screener.token_pairs().len(), 15);
        assert!(!screener.has_more_tokens());

        let resolved: Vec<String> = screener
            .token_pairs()
            .iter()
            .map(|p| p.base_token.address.clone())
            .collect();
        let mut expected: Vec<String> = (0..10).map(|i| format!("0x{:03}", i)).collect();
        expected.extend((20..25).map(|i| format!("0x{:03}", i)));
        assert_eq!(resolved, expected);

        // Exhaustion is terminal: a further call issues no request.
        screener.fetch_more_tokens().await;
        assert_eq!(requests.lock().len(), 2);
        assert_eq!(screener.token_pairs().len(), 15);
    }

    #[tokio::test]
    async fn no_window_overlaps_across_batches() {
        let source = StubSource { profiles: base_profiles(40), ..Default::default() };
        let (screener, requests) = screener_with(source);

        screener.start().await;
        while screener.has_more_tokens() {
            screener.fetch_more_tokens().await;
        }

        let mut seen = HashSet::new();
        for request in requests.lock().iter() {
            for address in request {
                assert!(seen.insert(address.clone()), "address {} requested twice", address);
            }
        }
    }

    #[tokio::test]
    async fn venue_filter_drops_foreign_pairs_but_consumes_their_slots() {
        let mut dex_overrides = HashMap::new();
        dex_overrides.insert("0x001".to_string(), "sushiswap".to_string());
        dex_overrides.insert("0x004".to_string(), "pancakeswap".to_string());

        let source = StubSource {
            profiles: base_profiles(10),
            dex_overrides,
            ..Default::default()
        };
        let (screener, requests) = screener_with(source);

        screener.start().await;

        let pairs = screener.token_pairs();
        assert_eq!(pairs.len(), 8);
        assert!(pairs.iter().all(|p| p.dex_id == "uniswap"));
        // Window size 10 == batch size, so the session is not exhausted by
        // pair count alone; the next call finds nothing unresolved.
        assert!(screener.has_more_tokens());

        screener.fetch_more_tokens().await;
        assert!(!screener.has_more_tokens());
        assert_eq!(requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn address_without_pair_still_consumes_its_pagination_slot() {
        let mut missing = HashSet::new();
        missing.insert("0x002".to_string());

        let source = StubSource {
            profiles: base_profiles(25),
            missing,
            ..Default::default()
        };
        let (screener, requests) = screener_with(source);

        screener.start().await;
        assert_eq!(screener.token_pairs().len(), 9);

        // 0x002 was marked resolved despite returning no pair, so the second
        // window is computed over the 15 remaining addresses, exactly as if
        // it had resolved.
        screener.fetch_more_tokens().await;
        assert_eq!(screener.token_pairs().len(), 14);
        assert!(!screener.has_more_tokens());

        // The missing address was never re-requested.
        let all_requested: Vec<String> =
            requests.lock().iter().flatten().cloned().collect();
        assert_eq!(
            all_requested.iter().filter(|a| a.as_str() == "0x002").count(),
            1
        );
    }

    #[tokio::test]
    async fn failed_batch_leaves_state_untouched_and_retries_same_window() {
        let source = StubSource { profiles: base_profiles(25), ..Default::default() };
        let failures = source.batch_failures.clone();
        *failures.lock() = 1;
        let (screener, requests) = screener_with(source);

        screener.start().await;

        assert_eq!(screener.token_pairs().len(), 0);
        assert!(screener.has_more_tokens());
        assert!(!screener.is_loading());
        let error = screener.last_error().expect("failure must be recorded");
        assert!(error.contains("connection reset"));

        screener.fetch_more_tokens().await;

        let recorded = requests.lock();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0], recorded[1], "retry must reissue the identical window");
        drop(recorded);

        assert_eq!(screener.token_pairs().len(), 10);
        assert!(screener.last_error().is_none());
    }

    #[tokio::test]
    async fn reentrant_call_while_loading_issues_no_request() {
        let entered = Arc::new(Notify::new());
        let proceed = Arc::new(Notify::new());
        let source = StubSource {
            profiles: base_profiles(10),
            entered: Some(entered.clone()),
            proceed: Some(proceed.clone()),
            ..Default::default()
        };
        let requests = source.requests.clone();
        let screener = Arc::new(TokenScreener::new(Arc::new(source)));

        screener.discover_profiles().await;

        let in_flight = {
            let screener = screener.clone();
            tokio::spawn(async move { screener.fetch_more_tokens().await })
        };

        entered.notified().await;
        assert!(screener.is_loading());

        // Second caller hits the loading guard and performs zero requests.
        screener.fetch_more_tokens().await;
        assert_eq!(requests.lock().len(), 1);

        proceed.notify_one();
        in_flight.await.unwrap();

        assert!(!screener.is_loading());
        assert_eq!(screener.token_pairs().len(), 10);
    }

    #[tokio::test]
    async fn discovery_failure_records_error_and_skips_first_batch() {
        let source = StubSource {
            profile_failure: Some("dns lookup failed".to_string()),
            ..Default::default()
        };
        let (screener, requests) = screener_with(source);

        screener.start().await;

        assert!(screener.profiles().is_empty());
        assert!(screener.token_pairs().is_empty());
        assert!(requests.lock().is_empty());
        assert!(screener.has_more_tokens());
        let error = screener.last_error().expect("discovery failure must be recorded");
        assert!(error.contains("dns lookup failed"));

        // An explicit fetch over the empty queue exhausts without a request
        // and clears the stale error for its cycle.
        screener.fetch_more_tokens().await;
        assert!(!screener.has_more_tokens());
        assert!(requests.lock().is_empty());
        assert!(screener.last_error().is_none());
    }

    #[tokio::test]
    async fn saved_tokens_are_stamped_and_removed_by_base_address() {
        let source = StubSource { profiles: base_profiles(3), ..Default::default() };
        let (screener, _requests) = screener_with(source);

        screener.start().await;
        let pairs = screener.token_pairs();

        screener.add_token(pairs[0].clone());
        screener.set_default_amount("2.5");
        screener.add_token(pairs[0].clone());
        screener.add_token(pairs[1].clone());

        let saved = screener.saved_tokens();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved[0].amount.as_deref(), Some("0.1"));
        assert_eq!(saved[1].amount.as_deref(), Some("2.5"));

        // Removal matches on base address and clears every entry, including
        // duplicates saved with different amounts.
        screener.remove_token(&pairs[0].base_token.address);
        let saved = screener.saved_tokens();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].base_token.address, pairs[1].base_token.address);
    }
}
