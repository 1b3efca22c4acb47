use sha2::{Digest, Sha256};

/// Identity of a file's contents at a point in time.
///
/// Two fingerprints are equal iff the byte length and the SHA-256 digest match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    len: u64,
    digest: [u8; 32],
}

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let digest: [u8; 32] = Sha256::digest(bytes).into();
        Self {
            len: bytes.len() as u64,
            digest,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lowercase hex of the digest, for log lines.
    pub fn short_hex(&self) -> String {
        self.digest[..6].iter().map(|b| format!("{b:02x}")).collect()
    }
}
