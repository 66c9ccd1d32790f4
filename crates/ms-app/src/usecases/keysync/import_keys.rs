//! Fetches the key envelope published after approval and installs the sync
//! group keypair locally.

use std::sync::Arc;

use tracing::{info_span, Instrument};

use ms_core::ids::AccountId;
use ms_core::keysync::{KeySyncError, ReadyEnvelope, SyncGroupKeypair};
use ms_core::ports::{
    DeviceIdentityPort, DeviceKeyPort, KeyEnvelopeStorePort, KeypairStorePort, SyncCachePort,
};
use ms_core::settings::KeySyncSettings;

use crate::retry::{poll_until_ready, Attempt, RetryError, RetryPolicy};

/// Drives the key import pipeline after a pairing approval.
///
/// The envelope is pushed by the approving device around the same moment the
/// approval lands, so a short settle window of polls is expected operation,
/// not an error path.
#[derive(Clone)]
pub struct KeyEnvelopeManager {
    envelope_store: Arc<dyn KeyEnvelopeStorePort>,
    device_keys: Arc<dyn DeviceKeyPort>,
    keypair_store: Arc<dyn KeypairStorePort>,
    sync_cache: Arc<dyn SyncCachePort>,
    device_identity: Arc<dyn DeviceIdentityPort>,
    settings: KeySyncSettings,
}

impl KeyEnvelopeManager {
    pub fn new(
        envelope_store: Arc<dyn KeyEnvelopeStorePort>,
        device_keys: Arc<dyn DeviceKeyPort>,
        keypair_store: Arc<dyn KeypairStorePort>,
        sync_cache: Arc<dyn SyncCachePort>,
        device_identity: Arc<dyn DeviceIdentityPort>,
        settings: KeySyncSettings,
    ) -> Self {
        Self {
            envelope_store,
            device_keys,
            keypair_store,
            sync_cache,
            device_identity,
            settings,
        }
    }

    /// Fetch the envelope addressed to this device, decrypt it, and install
    /// the keypair. On success the envelope is consumed and the sync cache
    /// invalidated exactly once.
    pub async fn fetch_and_import(&self, account_id: &AccountId) -> Result<(), KeySyncError> {
        let span = info_span!("keysync.import", account_id = %account_id);
        async {
            let device_id = self.device_identity.current_device_id();

            let envelope = self.poll_for_envelope(account_id, &device_id).await?;

            let private_key = self
                .device_keys
                .decrypt_with_device_key(&envelope.encrypted_private_key)
                .await
                .map_err(|err| KeySyncError::DecryptionFailed(err.to_string()))?;

            let keypair = SyncGroupKeypair::new(private_key, envelope.public_key);
            self.keypair_store
                .install(account_id, keypair)
                .await
                .map_err(|err| KeySyncError::ImportFailed(err.to_string()))?;

            // Consume the envelope so it cannot be replayed. Best-effort:
            // the keys are already installed, a leftover envelope is only
            // a hygiene problem.
            if let Err(err) = self.envelope_store.delete(account_id, &device_id).await {
                tracing::warn!(error = %err, "failed to delete consumed key envelope");
            }

            // The keypair is installed at this point, but stale cached
            // ciphertext stays undecryptable until the cache is flushed, so
            // an invalidation failure must reach the caller.
            self.sync_cache
                .invalidate(account_id)
                .await
                .map_err(|err| KeySyncError::CacheInvalidationFailed(err.to_string()))?;

            tracing::info!("sync group keypair installed");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn poll_for_envelope(
        &self,
        account_id: &AccountId,
        device_id: &ms_core::ids::DeviceId,
    ) -> Result<ReadyEnvelope, KeySyncError> {
        let policy = RetryPolicy::new(self.settings.max_attempts, self.settings.retry_delay);

        let result = poll_until_ready(policy, |attempt| {
            let store = Arc::clone(&self.envelope_store);
            let account_id = account_id.clone();
            let device_id = device_id.clone();
            async move {
                let envelope = store
                    .get(&account_id, &device_id)
                    .await
                    .map_err(|err| KeySyncError::Store(err.to_string()))?;
                match envelope {
                    Some(envelope) if envelope.is_ready() => {
                        // Malformed ready envelopes fail the whole import;
                        // more polling would fetch the same garbage.
                        envelope.into_ready().map(Attempt::Ready)
                    }
                    Some(_) | None => {
                        tracing::debug!(attempt, "key envelope not published yet");
                        Ok(Attempt::NotYet)
                    }
                }
            }
        })
        .await;

        match result {
            Ok(envelope) => Ok(envelope),
            Err(RetryError::Exhausted { attempts }) => {
                Err(KeySyncError::EnvelopeNotReady { attempts })
            }
            Err(RetryError::Failed(err)) => Err(err),
        }
    }
}
