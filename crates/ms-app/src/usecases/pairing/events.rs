use async_trait::async_trait;
use tokio::sync::mpsc;

use ms_core::ids::AccountId;
use ms_core::pairing::PairingStatus;

/// Events projected to the embedding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingUiEvent {
    StatusChanged(PairingStatus),
    KeysImported {
        account_id: AccountId,
    },
    KeyImportFailed {
        message: String,
        /// Whether a "retry key sync" action makes sense, as opposed to
        /// re-pairing from scratch.
        recoverable: bool,
    },
}

#[async_trait]
pub trait PairingEventPort: Send + Sync {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<PairingUiEvent>>;
}
