use async_trait::async_trait;
use thiserror::Error;

use crate::ids::{AccountId, DeviceId};
use crate::keysync::KeyEnvelope;

#[derive(Debug, Error)]
pub enum EnvelopeStoreError {
    #[error("envelope store unreachable: {0}")]
    Unreachable(String),

    #[error("envelope store failed: {0}")]
    Backend(String),
}

/// Remote mailbox for key envelopes, keyed by the receiving device.
///
/// Single-consumer semantics: `get` after a `delete` returns `None`, and
/// deleting an already-deleted envelope succeeds.
#[async_trait]
pub trait KeyEnvelopeStorePort: Send + Sync {
    async fn get(
        &self,
        account_id: &AccountId,
        device_id: &DeviceId,
    ) -> Result<Option<KeyEnvelope>, EnvelopeStoreError>;

    async fn delete(
        &self,
        account_id: &AccountId,
        device_id: &DeviceId,
    ) -> Result<(), EnvelopeStoreError>;
}

#[cfg(test)]
mockall::mock! {
    pub KeyEnvelopeStore {}

    #[async_trait]
    impl KeyEnvelopeStorePort for KeyEnvelopeStore {
        async fn get(
            &self,
            account_id: &AccountId,
            device_id: &DeviceId,
        ) -> Result<Option<KeyEnvelope>, EnvelopeStoreError>;
        async fn delete(
            &self,
            account_id: &AccountId,
            device_id: &DeviceId,
        ) -> Result<(), EnvelopeStoreError>;
    }
}
