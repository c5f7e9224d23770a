//! Latest-wins request tokens.
//!
//! Fetches for the same dataset may overlap when the user flips filters
//! quickly. Each refresh takes a monotonically increasing token; a response
//! is only allowed to overwrite state while its token is still the newest,
//! so a slow stale fetch can never clobber a fresher one.

use std::collections::HashMap;

use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct TokenGate {
    latest: Mutex<HashMap<&'static str, u64>>,
}

impl TokenGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh for `key`: returns the token the caller must hold
    /// to commit its result.
    pub async fn issue(&self, key: &'static str) -> u64 {
        let mut latest = self.latest.lock().await;
        let token = latest.get(key).copied().unwrap_or(0) + 1;
        latest.insert(key, token);
        token
    }

    /// Whether `token` is still the newest issued for `key`.
    pub async fn is_current(&self, key: &'static str, token: u64) -> bool {
        let latest = self.latest.lock().await;
        latest.get(key).copied() == Some(token)
    }
}
