//! SHA3-256 block identities.

use sha3::{Digest, Sha3_256};
use std::fmt;

/// Length of a block identity in bytes.
pub const HASH_LEN: usize = 32;

/// SHA3-256 digest identifying a sealed block.
///
/// Identities flow through parent linkage, history lookup, and logs, so the
/// type is `Copy` and lives on the stack. Displayed as lowercase hex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    /// The all-zero identity, the parent sentinel of the genesis block.
    pub const ZERO: Hash = Hash([0u8; HASH_LEN]);

    /// Starts a digest whose preimage opens with `tag`.
    ///
    /// Every preimage in the crate is domain-tagged, so records of different
    /// kinds never hash equal just because their field bytes agree.
    pub fn tagged(tag: &'static [u8]) -> Hasher {
        let mut hasher = Sha3_256::new();
        hasher.update(tag);
        Hasher { hasher }
    }

    /// Returns the identity as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` for the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        *self == Hash::ZERO
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Streaming digest over a domain-tagged preimage.
///
/// Created by [`Hash::tagged`]; feed the record fields with [`Hasher::write`]
/// and close the preimage with [`Hasher::finish`].
pub struct Hasher {
    hasher: Sha3_256,
}

impl Hasher {
    /// Appends `bytes` to the preimage.
    pub fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Closes the preimage and returns the digest.
    pub fn finish(self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(tag: &'static [u8], payload: &[u8]) -> Hash {
        let mut h = Hash::tagged(tag);
        h.write(payload);
        h.finish()
    }

    #[test]
    fn equal_preimages_agree() {
        assert_eq!(digest(b"BLOCK", b"payload"), digest(b"BLOCK", b"payload"));
    }

    #[test]
    fn the_tag_is_part_of_the_preimage() {
        assert_ne!(digest(b"BLOCK", b"payload"), digest(b"OTHER", b"payload"));
    }

    #[test]
    fn writes_stream_like_one_preimage() {
        let mut split = Hash::tagged(b"BLOCK");
        split.write(b"one");
        split.write(b"two");
        assert_eq!(split.finish(), digest(b"BLOCK", b"onetwo"));
    }

    #[test]
    fn zero_sentinel_is_all_zero_bytes() {
        assert!(Hash::ZERO.is_zero());
        assert!(Hash::ZERO.as_slice().iter().all(|&b| b == 0));
        assert!(!digest(b"BLOCK", b"x").is_zero());
    }

    #[test]
    fn display_is_lowercase_hex() {
        let s = digest(b"BLOCK", b"display").to_string();
        assert_eq!(s.len(), HASH_LEN * 2);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
