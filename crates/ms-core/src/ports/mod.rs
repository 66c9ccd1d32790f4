//! Port interfaces between the domain and its collaborators.
//!
//! Ports keep the pairing and key sync logic independent of the concrete
//! backend, keystore, and cache implementations. Use cases depend on these
//! traits only; infrastructure supplies the impls at wiring time.

pub mod clock;
pub mod device_identity;
pub mod device_keys;
pub mod envelope_store;
pub mod keypair_store;
pub mod pairing_backend;
pub mod sync_cache;


pub use clock::{ClockPort, SystemClock};
pub use device_identity::DeviceIdentityPort;
pub use device_keys::{DeviceKeyError, DeviceKeyPort};
pub use envelope_store::{EnvelopeStoreError, KeyEnvelopeStorePort};
pub use keypair_store::{KeypairStoreError, KeypairStorePort};
pub use pairing_backend::{PairingBackendError, PairingBackendPort};
pub use sync_cache::{SyncCacheError, SyncCachePort};

#[cfg(test)]
pub use device_identity::MockDeviceIdentity;
#[cfg(test)]
pub use device_keys::MockDeviceKey;
#[cfg(test)]
pub use envelope_store::MockKeyEnvelopeStore;
#[cfg(test)]
pub use keypair_store::MockKeypairStore;
#[cfg(test)]
pub use pairing_backend::MockPairingBackend;
#[cfg(test)]
pub use sync_cache::MockSyncCache;
