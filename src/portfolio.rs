//! Saved-token registry.
//!
//! Tokens the consumer has picked out of the screened list for a simulated
//! or actual trade, each carrying a trade-size string. Additions are plain
//! appends; identity is only consulted on removal, which matches by base
//! token address. A token saved twice stays twice.

use crate::apis::dexscreener::TokenPair;

#[derive(Debug, Clone)]
pub struct Portfolio {
    saved: Vec<TokenPair>,
    default_amount: String,
}

impl Portfolio {
    pub fn new(default_amount: impl Into<String>) -> Self {
        Self {
            saved: Vec::new(),
            default_amount: default_amount.into(),
        }
    }

    /// Append a pair, stamping the current default amount onto entries that
    /// arrive without one. A caller-assigned amount wins.
    pub fn add(&mut self, mut pair: TokenPair) {
        if pair.amount.is_none() {
            pair.amount = Some(self.default_amount.clone());
        }
        log::debug!(
            "Saved token {} (amount {})",
            pair.base_token.address,
            pair.amount.as_deref().unwrap_or_default()
        );
        self.saved.push(pair);
    }

    /// Remove every saved entry whose base token address matches.
    pub fn remove(&mut self, base_address: &str) {
        let before = self.saved.len();
        self.saved.retain(|p| p.base_token.address != base_address);
        log::debug!(
            "Removed {} saved entries for {}",
            before - self.saved.len(),
            base_address
        );
    }

    /// Replace the default trade-size string. Not validated; it only seeds
    /// future additions.
    pub fn set_default_amount(&mut self, amount: impl Into<String>) {
        self.default_amount = amount.into();
    }

    pub fn tokens(&self) -> &[TokenPair] {
        &self.saved
    }

    pub fn default_amount(&self) -> &str {
        &self.default_amount
    }
}
