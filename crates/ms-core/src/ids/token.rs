use rand::{rngs::OsRng, TryRngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of random bytes backing a token (256 bits of entropy).
const TOKEN_ENTROPY_BYTES: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The OS entropy source failed. Fatal to the calling pairing attempt;
    /// never retried automatically.
    #[error("entropy source unavailable")]
    EntropyUnavailable,
}

/// Short-lived pairing token.
///
/// Unlike the uuid-backed ids, tokens are drawn directly from the OS RNG so
/// they cannot be guessed within the pairing window. The text form is Base32
/// (no padding) so it survives being embedded in a scannable payload string.
///
/// A token is bound to exactly one [`crate::PairingSession`] and one approval
/// wait; retry always mints a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairingToken(String);

impl PairingToken {
    /// Generate a fresh token from the OS entropy source.
    pub fn generate() -> Result<Self, TokenError> {
        let mut buf = [0u8; TOKEN_ENTROPY_BYTES];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|_| TokenError::EntropyUnavailable)?;
        let encoded = base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &buf);
        Ok(Self(encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PairingToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PairingToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PairingToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
