use serde::{Deserialize, Serialize};

use super::session::PairingSession;

/// UI-facing status of the current pairing attempt.
///
/// This is what screens subscribe to; transitions between these values are
/// decided by the lifecycle machine, never ad hoc by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairingStatus {
    /// A token is being minted and registered with the backend.
    Generating,
    /// The payload is on screen, waiting for the other device to scan.
    WaitingForScan { session: PairingSession },
    /// The remote side approved and key material is installed.
    Success,
    Rejected,
    Expired,
    /// Something failed; the message is safe to surface verbatim.
    Error { message: String },
}

impl PairingStatus {
    /// Terminal states end the attempt; a new session must be started to
    /// pair again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PairingStatus::Success
                | PairingStatus::Rejected
                | PairingStatus::Expired
                | PairingStatus::Error { .. }
        )
    }

    /// True while the payload is on screen awaiting a remote decision.
    pub fn is_waiting(&self) -> bool {
        matches!(self, PairingStatus::WaitingForScan { .. })
    }
}

impl std::fmt::Display for PairingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairingStatus::Generating => write!(f, "generating"),
            PairingStatus::WaitingForScan { .. } => write!(f, "waiting_for_scan"),
            PairingStatus::Success => write!(f, "success"),
            PairingStatus::Rejected => write!(f, "rejected"),
            PairingStatus::Expired => write!(f, "expired"),
            PairingStatus::Error { .. } => write!(f, "error"),
        }
    }
}
