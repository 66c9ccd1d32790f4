use async_trait::async_trait;
use thiserror::Error;

use crate::ids::AccountId;
use crate::keysync::SyncGroupKeypair;

#[derive(Debug, Error)]
pub enum KeypairStoreError {
    #[error("keypair storage unavailable: {0}")]
    Unavailable(String),

    #[error("keypair storage failed: {0}")]
    Storage(String),
}

/// Local installation point for sync group keypairs.
///
/// `install` is all-or-nothing: after an `Err`, `installed` must still
/// return whatever was there before. No partial key state, ever.
#[async_trait]
pub trait KeypairStorePort: Send + Sync {
    async fn install(
        &self,
        account_id: &AccountId,
        keypair: SyncGroupKeypair,
    ) -> Result<(), KeypairStoreError>;

    async fn installed(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<SyncGroupKeypair>, KeypairStoreError>;

    async fn clear(&self, account_id: &AccountId) -> Result<(), KeypairStoreError>;
}

#[cfg(test)]
mockall::mock! {
    pub KeypairStore {}

    #[async_trait]
    impl KeypairStorePort for KeypairStore {
        async fn install(
            &self,
            account_id: &AccountId,
            keypair: SyncGroupKeypair,
        ) -> Result<(), KeypairStoreError>;
        async fn installed(
            &self,
            account_id: &AccountId,
        ) -> Result<Option<SyncGroupKeypair>, KeypairStoreError>;
        async fn clear(&self, account_id: &AccountId) -> Result<(), KeypairStoreError>;
    }
}
