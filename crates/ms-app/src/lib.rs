//! # ms-app
//!
//! Application layer for MirrorSync: use cases that drive the domain types
//! in `ms-core` through the ports, plus the async plumbing (timers, retry,
//! event channels) those use cases need.

pub mod retry;
pub mod usecases;

pub use usecases::keysync::{KeyEnvelopeManager, KeySyncRecovery};
pub use usecases::pairing::{PairingEventPort, PairingService, PairingUiEvent};
