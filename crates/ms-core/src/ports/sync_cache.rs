use async_trait::async_trait;
use thiserror::Error;

use crate::ids::AccountId;

#[derive(Debug, Error)]
pub enum SyncCacheError {
    #[error("sync cache invalidation failed: {0}")]
    Invalidation(String),
}

/// Derived sync state (decrypted message cache, sync cursors) that must be
/// rebuilt after the group keypair changes.
///
/// `invalidate` is idempotent: invalidating an empty cache succeeds.
#[async_trait]
pub trait SyncCachePort: Send + Sync {
    async fn invalidate(&self, account_id: &AccountId) -> Result<(), SyncCacheError>;
}

#[cfg(test)]
mockall::mock! {
    pub SyncCache {}

    #[async_trait]
    impl SyncCachePort for SyncCache {
        async fn invalidate(&self, account_id: &AccountId) -> Result<(), SyncCacheError>;
    }
}
