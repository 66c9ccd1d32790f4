use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::ids::{AccountId, PairingToken};
use crate::pairing::{PairingOutcome, PairingSession};

/// Backend failures during pairing.
///
/// `Timeout` means the wait window closed without a decision and maps to an
/// expired session. Everything else is a real transport or protocol failure
/// and must never be presented as expiry.
#[derive(Debug, Error)]
pub enum PairingBackendError {
    #[error("pairing backend unreachable: {0}")]
    Unreachable(String),

    #[error("pairing backend rejected the request: {0}")]
    Protocol(String),

    #[error("pairing wait timed out")]
    Timeout,

    #[error("token generation failed: {0}")]
    TokenGeneration(#[from] crate::ids::TokenError),
}

/// Remote pairing service.
///
/// `wait_for_approval` is a long-poll: it resolves exactly once per token,
/// either with the remote decision or with `Err(Timeout)` when `timeout`
/// elapses undecided.
#[async_trait]
pub trait PairingBackendPort: Send + Sync {
    /// Mint a token, register it with the backend, and return the session.
    async fn create_session(&self) -> Result<PairingSession, PairingBackendError>;

    async fn wait_for_approval(
        &self,
        token: &PairingToken,
        timeout: Duration,
    ) -> Result<PairingOutcome, PairingBackendError>;

    /// Ask the remote device to re-push historical data. Fire-and-forget at
    /// the protocol level; only transport success is reported.
    async fn request_history_resync(
        &self,
        account_id: &AccountId,
    ) -> Result<(), PairingBackendError>;
}

#[cfg(test)]
mockall::mock! {
    pub PairingBackend {}

    #[async_trait]
    impl PairingBackendPort for PairingBackend {
        async fn create_session(&self) -> Result<PairingSession, PairingBackendError>;
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
