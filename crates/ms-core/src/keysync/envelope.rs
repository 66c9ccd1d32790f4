use serde::{Deserialize, Serialize};

use super::error::KeySyncError;

/// Publication state of a key envelope, as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    /// The approving device is still uploading.
    Pending,
    Ready,
}

/// Key material package written once by the approving device and consumed
/// once by this one.
///
/// The private half arrives sealed for this device's own asymmetric key;
/// both fields stay optional because a `Pending` envelope legitimately has
/// neither yet.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEnvelope {
    pub status: EnvelopeStatus,
    pub encrypted_private_key: Option<Vec<u8>>,
    pub public_key: Option<Vec<u8>>,
}

impl KeyEnvelope {
    pub fn pending() -> Self {
        Self {
            status: EnvelopeStatus::Pending,
            encrypted_private_key: None,
            public_key: None,
        }
    }

    pub fn ready(encrypted_private_key: Vec<u8>, public_key: Vec<u8>) -> Self {
        Self {
            status: EnvelopeStatus::Ready,
            encrypted_private_key: Some(encrypted_private_key),
            public_key: Some(public_key),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == EnvelopeStatus::Ready
    }

    /// Validate the consumption contract.
    ///
    /// A `Ready` envelope must carry both halves; a missing field means the
    /// writer produced garbage and no number of retries will fix it.
    pub fn into_ready(self) -> Result<ReadyEnvelope, KeySyncError> {
        if self.status != EnvelopeStatus::Ready {
            return Err(KeySyncError::EnvelopeMalformed(
                "envelope is not ready".to_string(),
            ));
        }
        let encrypted_private_key = self.encrypted_private_key.ok_or_else(|| {
            KeySyncError::EnvelopeMalformed("missing encrypted private key".to_string())
        })?;
        let public_key = self
            .public_key
            .ok_or_else(|| KeySyncError::EnvelopeMalformed("missing public key".to_string()))?;
        Ok(ReadyEnvelope {
            encrypted_private_key,
            public_key,
        })
    }
}

impl std::fmt::Debug for KeyEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEnvelope")
            .field("status", &self.status)
            .field("encrypted_private_key", &"[REDACTED]")
            .field(
                "public_key",
                &self.public_key.as_ref().map(|k| k.len()),
            )
            .finish()
    }
}

/// A validated envelope with both fields present.
#[derive(Clone, PartialEq, Eq)]
pub struct ReadyEnvelope {
    pub encrypted_private_key: Vec<u8>,
    pub public_key: Vec<u8>,
}

impl std::fmt::Debug for ReadyEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyEnvelope")
            .field("encrypted_private_key", &"[REDACTED]")
            .field("public_key_len", &self.public_key.len())
            .finish()
    }
}
