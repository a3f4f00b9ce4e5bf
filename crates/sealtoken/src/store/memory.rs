//! In-process revocation store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::RevocationStore;
use crate::TokenResult;

/// Revocation registry held in process memory.
///
/// Suitable for a single instance; revocations are not shared across
/// processes and do not survive restarts.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    /// set key -> member -> expiry score
    sets: Mutex<HashMap<String, HashMap<String, i64>>>,
}

impl InMemoryRevocationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held for `set_key`, pruned or not.
    pub async fn len(&self, set_key: &str) -> usize {
        self.sets.lock().await.get(set_key).map_or(0, HashMap::len)
    }

    /// Stored expiry for `member`, if any.
    pub async fn score(&self, set_key: &str, member: &str) -> Option<i64> {
        self.sets
            .lock()
            .await
            .get(set_key)
            .and_then(|set| set.get(member).copied())
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn check_and_prune(&self, set_key: &str, member: &str, now: i64) -> TokenResult<bool> {
        let mut sets = self.sets.lock().await;
        let Some(set) = sets.get_mut(set_key) else {
            return Ok(false);
        };

        let revoked = set.contains_key(member);

        let before = set.len();
        set.retain(|_, expires_at| *expires_at > now);
        let pruned = before - set.len();
        if pruned > 0 {
            tracing::debug!(set_key = %set_key, pruned, "pruned expired revocations");
        }
        if set.is_empty() {
            sets.remove(set_key);
        }

        Ok(revoked)
    }

    async fn add(&self, set_key: &str, member: &str, expires_at: i64) -> TokenResult<()> {
        self.sets
            .lock()
            .await
            .entry(set_key.to_string())
            .or_default()
            .insert(member.to_string(), expires_at);
        Ok(())
    }
}
