//! Recovery actions for a paired account whose installed keypair no longer
//! decrypts incoming content.
//!
//! Detection happens in the consuming sync layer; this module only exposes
//! the two explicit user actions offered from the key-mismatch screen.

use std::sync::Arc;

use tracing::{info_span, Instrument};

use ms_core::ids::AccountId;
use ms_core::keysync::KeySyncError;
use ms_core::ports::{PairingBackendError, PairingBackendPort};

use super::import_keys::KeyEnvelopeManager;

pub struct KeySyncRecovery {
    manager: KeyEnvelopeManager,
    backend: Arc<dyn PairingBackendPort>,
}

impl KeySyncRecovery {
    pub fn new(manager: KeyEnvelopeManager, backend: Arc<dyn PairingBackendPort>) -> Self {
        Self { manager, backend }
    }

    /// Re-run the envelope fetch and import against the already-paired
    /// identity. The remote device must have published a fresh envelope for
    /// this to find anything new.
    pub async fn resync(&self, account_id: &AccountId) -> Result<(), KeySyncError> {
        let span = info_span!("keysync.resync", account_id = %account_id);
        self.manager
            .fetch_and_import(account_id)
            .instrument(span)
            .await
    }

    /// Ask the remote device to re-push historical data. Content is opaque
    /// here; only transport success or failure is reported.
    pub async fn request_history_resync(
        &self,
        account_id: &AccountId,
    ) -> Result<(), PairingBackendError> {
        let span = info_span!("keysync.history_resync", account_id = %account_id);
        async {
            self.backend.request_history_resync(account_id).await?;
            tracing::info!("history resync requested");
            Ok(())
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    use ms_core::ids::PairingToken;
    use ms_core::pairing::{PairingOutcome, PairingSession};
    use ms_core::ports::{
        DeviceIdentityPort, DeviceKeyError, DeviceKeyPort, EnvelopeStoreError,
        KeyEnvelopeStorePort, KeypairStoreError, KeypairStorePort, SyncCacheError, SyncCachePort,
    };
    use ms_core::settings::KeySyncSettings;

    mock! {
        Backend {}

        #[async_trait]
        impl PairingBackendPort for Backend {
            async fn create_session(
                &self,
            ) -> Result<PairingSession, PairingBackendError>;
            async fn wait_for_approval(
                &self,
                token: &PairingToken,
                timeout: Duration,
            ) -> Result<PairingOutcome, PairingBackendError>;
            async fn request_history_resync(
                &self,
                account_id: &AccountId,
            ) -> Result<(), PairingBackendError>;
        }
    }

    struct EmptyStore;

    #[async_trait]
    impl KeyEnvelopeStorePort for EmptyStore {
        async fn get(
            &self,
            _account_id: &AccountId,
            _device_id: &ms_core::ids::DeviceId,
        ) -> Result<Option<ms_core::keysync::KeyEnvelope>, EnvelopeStoreError> {
            Ok(None)
        }

        async fn delete(
            &self,
            _account_id: &AccountId,
            _device_id: &ms_core::ids::DeviceId,
        ) -> Result<(), EnvelopeStoreError> {
            Ok(())
        }
    }

    struct NullDeviceKeys;

    #[async_trait]
    impl DeviceKeyPort for NullDeviceKeys {
        async fn decrypt_with_device_key(
            &self,
            ciphertext: &[u8],
        ) -> Result<Vec<u8>, DeviceKeyError> {
            Ok(ciphertext.to_vec())
        }
    }

    struct NullKeypairStore;

    #[async_trait]
    impl KeypairStorePort for NullKeypairStore {
        async fn install(
            &self,
            _account_id: &AccountId,
            _keypair: ms_core::keysync::SyncGroupKeypair,
        ) -> Result<(), KeypairStoreError> {
            Ok(())
        }

        async fn installed(
            &self,
            _account_id: &AccountId,
        ) -> Result<Option<ms_core::keysync::SyncGroupKeypair>, KeypairStoreError> {
            Ok(None)
        }

        async fn clear(&self, _account_id: &AccountId) -> Result<(), KeypairStoreError> {
            Ok(())
        }
    }

    struct NullSyncCache;

    #[async_trait]
    impl SyncCachePort for NullSyncCache {
        async fn invalidate(&self, _account_id: &AccountId) -> Result<(), SyncCacheError> {
            Ok(())
        }
    }

    struct FixedIdentity(ms_core::ids::DeviceId);

    impl DeviceIdentityPort for FixedIdentity {
        fn current_device_id(&self) -> ms_core::ids::DeviceId {
            self.0.clone()
        }
    }

    fn manager() -> KeyEnvelopeManager {
        KeyEnvelopeManager::new(
            Arc::new(EmptyStore),
            Arc::new(NullDeviceKeys),
            Arc::new(NullKeypairStore),
            Arc::new(NullSyncCache),
            Arc::new(FixedIdentity(ms_core::ids::DeviceId::new())),
            KeySyncSettings {
                max_attempts: 1,
                retry_delay: Duration::from_millis(1),
            },
        )
    }

    #[tokio::test]
    async fn history_resync_targets_the_given_account() {
        let account = AccountId::from("acct-1");
        let mut backend = MockBackend::new();
        backend
            .expect_request_history_resync()
            .with(eq(account.clone()))
            .times(1)
            .returning(|_| Ok(()));

        let recovery = KeySyncRecovery::new(manager(), Arc::new(backend));
        recovery.request_history_resync(&account).await.unwrap();
    }

    #[tokio::test]
    async fn history_resync_reports_transport_failure() {
        let mut backend = MockBackend::new();
        backend
            .expect_request_history_resync()
            .returning(|_| Err(PairingBackendError::Unreachable("offline".into())));

        let recovery = KeySyncRecovery::new(manager(), Arc::new(backend));
        let err = recovery
            .request_history_resync(&AccountId::from("acct-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PairingBackendError::Unreachable(_)));
    }
}
