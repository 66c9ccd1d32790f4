//! Pairing lifecycle state machine.
//!
//! Pure transition logic: the orchestrator feeds inputs in as
//! [`LifecycleEvent`]s and executes whatever [`Decision`] comes back.
//! No IO, no clocks, no channels in here, which keeps every transition
//! testable as a plain function call.

use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, DeviceId};

use super::outcome::PairingOutcome;
use super::session::PairingSession;
use super::state::PairingStatus;

/// Inputs that can move the lifecycle forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// Token minted and registered; the payload can go on screen.
    SessionReady { session: PairingSession },
    /// The backend answered a status poll or push.
    OutcomeArrived { outcome: PairingOutcome },
    /// The local expiry timer fired.
    DeadlineElapsed,
    /// Backend or network failure while the attempt was live.
    TransportFailed { message: String },
    /// User asked to start over from a terminal screen.
    RetryRequested,
}

/// What the orchestrator should do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to do; the event was stale or redundant.
    Ignore,
    /// Show the payload and fingerprint, arm the expiry timer.
    PresentPayload { session: PairingSession },
    /// Approval arrived; run the key import pipeline for this identity.
    BeginKeyImport {
        remote_account_id: AccountId,
        remote_device_id: Option<DeviceId>,
    },
    NotifyRejected,
    NotifyExpired,
    NotifyError { message: String },
    /// Mint a fresh token and begin again.
    StartNewSession,
}

/// Tracks one pairing attempt through its states.
///
/// Terminal states absorb everything except `RetryRequested`; in particular
/// a late `DeadlineElapsed` after approval, or a late `OutcomeArrived` after
/// local expiry, must land on [`Decision::Ignore`].
#[derive(Debug, Clone)]
pub struct PairingLifecycle {
    status: PairingStatus,
}

impl PairingLifecycle {
    pub fn new() -> Self {
        Self {
            status: PairingStatus::Generating,
        }
    }

    pub fn status(&self) -> &PairingStatus {
        &self.status
    }

    /// Apply one event, mutating the status and returning the decision.
    pub fn apply(&mut self, event: LifecycleEvent) -> Decision {
        let (next, decision) = self.transition(event);
        self.status = next;
        decision
    }

    fn transition(&self, event: LifecycleEvent) -> (PairingStatus, Decision) {
        match (&self.status, event) {
            (PairingStatus::Generating, LifecycleEvent::SessionReady { session }) => (
                PairingStatus::WaitingForScan {
                    session: session.clone(),
                },
                Decision::PresentPayload { session },
            ),
            // Registration with the backend failed before anything was shown.
            (PairingStatus::Generating, LifecycleEvent::TransportFailed { message }) => (
                PairingStatus::Error {
                    message: message.clone(),
                },
                Decision::NotifyError { message },
            ),

            (PairingStatus::WaitingForScan { .. }, LifecycleEvent::OutcomeArrived { outcome }) => {
                match outcome {
                    PairingOutcome::Pending => (self.status.clone(), Decision::Ignore),
                    PairingOutcome::Approved {
                        remote_account_id,
                        remote_device_id,
                    } => (
                        PairingStatus::Success,
                        Decision::BeginKeyImport {
                            remote_account_id,
                            remote_device_id,
                        },
                    ),
                    PairingOutcome::Rejected => (PairingStatus::Rejected, Decision::NotifyRejected),
                    PairingOutcome::Expired => (PairingStatus::Expired, Decision::NotifyExpired),
                }
            }
            (PairingStatus::WaitingForScan { .. }, LifecycleEvent::DeadlineElapsed) => {
                (PairingStatus::Expired, Decision::NotifyExpired)
            }
            (PairingStatus::WaitingForScan { .. }, LifecycleEvent::TransportFailed { message }) => (
                PairingStatus::Error {
                    message: message.clone(),
                },
                Decision::NotifyError { message },
            ),

            // Retry is allowed from any terminal state.
            (status, LifecycleEvent::RetryRequested) if status.is_terminal() => {
                (PairingStatus::Generating, Decision::StartNewSession)
            }

            // Everything else is stale input for the current state.
            _ => (self.status.clone(), Decision::Ignore),
        }
    }

    /// Downgrade `Success` to `Error` when the key import pipeline fails
    /// after approval. A no-op from any other state.
    pub fn fail_import(&mut self, message: String) -> PairingStatus {
        if self.status == PairingStatus::Success {
            self.status = PairingStatus::Error { message };
        }
        self.status.clone()
    }
}

impl Default for PairingLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
