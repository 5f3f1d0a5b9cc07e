//! Session-scoped pagination state for the screening pipeline.
//!
//! One `SessionState` lives for one mount of the screener. Nothing here
//! touches the network; the session object in `screener::mod` drives the
//! fetches and applies the results under its lock.

use crate::apis::dexscreener::{TokenPair, TokenProfile};
use std::collections::HashSet;

#[derive(Debug)]
pub(crate) struct SessionState {
    /// Profiles accepted by the chain filter, kept whole for consumers.
    pub profiles: Vec<TokenProfile>,
    /// Ordered candidate addresses extracted from accepted profiles. Append-only.
    pub candidates: Vec<String>,
    /// Addresses already included in a fetched batch. Insertion-only.
    pub resolved: HashSet<String>,
    /// Resolved pairs, growing one batch at a time. Append-only.
    pub pairs: Vec<TokenPair>,
    /// Next batch index, starting at 1. Advances only on a successful batch.
    pub page: usize,
    pub has_more: bool,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            profiles: Vec::new(),
            candidates: Vec::new(),
            resolved: HashSet::new(),
            pairs: Vec::new(),
            page: 1,
            has_more: true,
            loading: false,
            last_error: None,
        }
    }

    /// Select the addresses for the next batch.
    ///
    /// The window `[(page-1)*batch, page*batch)` indexes into the unresolved
    /// list recomputed on every call, while the page cursor only ever moves
    /// forward. The window position is therefore relative to an evolving
    /// list, not a fixed offset into the candidate queue: once earlier
    /// batches have shrunk the unresolved list, later windows can land past
    /// addresses that were never fetched. Exhaustion accounting depends on
    /// this exact arithmetic, so it must not be replaced with a plain
    /// offset into the full queue.
    pub fn next_window(&self, batch: usize) -> Vec<String> {
        self.candidates
            .iter()
            .filter(|addr| !self.resolved.contains(*addr))
            .skip((self.page - 1) * batch)
            .take(batch)
            .cloned()
            .collect()
    }

    /// Mark a whole window as resolved, whether or not the upstream returned
    /// a pair for each address. A candidate with no matching pair still
    /// consumes its pagination slot.
    pub fn mark_resolved(&mut self, window: &[String]) {
        for addr in window {
            self.resolved.insert(addr.clone());
        }
    }

    pub fn push_candidates<I>(&mut self, addresses: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.candidates.extend(addresses);
    }
}
