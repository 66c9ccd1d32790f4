//! Device pairing domain: sessions, scannable payloads, outcomes, and the
//! lifecycle state machine that ties them together.

pub mod lifecycle;
pub mod outcome;
pub mod qr;
pub mod session;
pub mod state;

pub use lifecycle::{Decision, LifecycleEvent, PairingLifecycle};
pub use outcome::PairingOutcome;
pub use qr::{QrPayload, QrPayloadError, PROTOCOL_VERSION};
pub use session::PairingSession;
pub use state::PairingStatus;
