//! Key envelope and sync group keypair types.

pub mod envelope;
pub mod error;
pub mod keypair;

pub use envelope::{EnvelopeStatus, KeyEnvelope, ReadyEnvelope};
pub use error::KeySyncError;
pub use keypair::SyncGroupKeypair;
