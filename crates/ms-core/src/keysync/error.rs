use thiserror::Error;

/// Failure taxonomy for fetching and installing sync group keys.
///
/// Stages report their own kind upward without re-interpreting what a lower
/// stage returned. Only `EnvelopeNotReady` invites another attempt, and only
/// through an explicit user action; the fatal kinds would not converge under
/// blind retry against the same envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeySyncError {
    /// The approving device has not published the envelope yet.
    #[error("key envelope not ready after {attempts} attempts")]
    EnvelopeNotReady { attempts: u32 },

    /// A ready envelope is missing a required field. Needs re-pairing.
    #[error("key envelope malformed: {0}")]
    EnvelopeMalformed(String),

    /// The local device key could not open the envelope. Likely a key
    /// mismatch; needs re-pairing or the key-mismatch recovery flow.
    #[error("envelope decryption failed: {0}")]
    DecryptionFailed(String),

    /// Local keypair installation failed.
    #[error("keypair import failed: {0}")]
    ImportFailed(String),

    /// The envelope store itself failed (network or backend).
    #[error("envelope store error: {0}")]
    Store(String),

    /// Keys were installed but the stale-content cache could not be flushed.
    /// Previously undecryptable data stays stale until invalidation succeeds.
    #[error("sync cache invalidation failed: {0}")]
    CacheInvalidationFailed(String),
}

impl KeySyncError {
    /// Whether an explicit user-driven retry of the whole operation can
    /// succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KeySyncError::EnvelopeNotReady { .. }
                | KeySyncError::Store(_)
                | KeySyncError::CacheInvalidationFailed(_)
        )
    }
}
