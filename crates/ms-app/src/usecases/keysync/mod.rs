pub mod import_keys;
pub mod recovery;

pub use import_keys::KeyEnvelopeManager;
pub use recovery::KeySyncRecovery;
