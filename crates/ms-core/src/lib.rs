//! # ms-core
//!
//! Core domain models and business logic for MirrorSync.
//!
//! This crate contains pure business logic without any infrastructure
//! dependencies: pairing sessions and their lifecycle state machine, key
//! envelope models for the E2EE key exchange, and the ports the application
//! layer drives against.

// Public module exports
pub mod ids;
pub mod keysync;
pub mod pairing;
pub mod ports;
pub mod settings;

// Re-export commonly used types at the crate root
pub use ids::{AccountId, DeviceId, PairingToken};
pub use keysync::{KeyEnvelope, KeySyncError, SyncGroupKeypair};
pub use pairing::{PairingOutcome, PairingSession, PairingStatus};
