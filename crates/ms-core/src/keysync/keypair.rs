use zeroize::Zeroizing;

/// The asymmetric keypair shared by every device in a sync group.
///
/// The private half lives in zeroizing memory and is wiped on drop. Equality
/// compares public keys only so the secret never feeds a comparison that
/// could leak timing.
#[derive(Clone)]
pub struct SyncGroupKeypair {
    private_key: Zeroizing<Vec<u8>>,
    public_key: Vec<u8>,
}

impl SyncGroupKeypair {
    pub fn new(private_key: Vec<u8>, public_key: Vec<u8>) -> Self {
        Self {
            private_key: Zeroizing::new(private_key),
            public_key,
        }
    }

    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

impl PartialEq for SyncGroupKeypair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl Eq for SyncGroupKeypair {}

impl std::fmt::Debug for SyncGroupKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncGroupKeypair")
            .field("private_key", &"[REDACTED]")
            .field("public_key_len", &self.public_key.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_the_private_half() {
        let a = SyncGroupKeypair::new(vec![1; 32], vec![9; 32]);
        let b = SyncGroupKeypair::new(vec![2; 32], vec![9; 32]);
        assert_eq!(a, b);
    }

    #[test]
    fn debug_never_prints_the_private_key() {
        let kp = SyncGroupKeypair::new(vec![7; 32], vec![9; 32]);
        let rendered = format!("{:?}", kp);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains('7'));
    }
}
