use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceKeyError {
    /// The platform keystore refused to hand over the device key.
    #[error("device key unavailable: {0}")]
    Unavailable(String),

    /// The ciphertext did not open with the device key.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

/// The device's own long-lived asymmetric key.
///
/// Strictly local: the key never leaves the platform keystore and nothing
/// here touches the network.
#[async_trait]
pub trait DeviceKeyPort: Send + Sync {
    async fn decrypt_with_device_key(&self, ciphertext: &[u8]) -> Result<Vec<u8>, DeviceKeyError>;
}

#[cfg(test)]
mockall::mock! {
    pub DeviceKey {}

    #[async_trait]
    impl DeviceKeyPort for DeviceKey {
        async fn decrypt_with_device_key(
            &self,
            ciphertext: &[u8],
        ) -> Result<Vec<u8>, DeviceKeyError>;
    }
}
