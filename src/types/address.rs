//! 20-byte account addresses.

use std::fmt;

/// Address length in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Fixed-size 20-byte address identifying a ledger account.
///
/// This type is `Copy` for efficient passing in ordering and lookup operations.
/// Any non-zero value is a valid account; balances and allowances for addresses
/// never seen before simply read as zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address, rejected as a participant in ledger operations.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Creates an address carrying `value` big-endian in its lowest 8 bytes.
    ///
    /// Handy for fixtures and demos where addresses only need to be distinct
    /// and recognizable.
    pub fn from_low_u64_be(value: u64) -> Address {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 8..].copy_from_slice(&value.to_be_bytes());
        Address(bytes)
    }

    /// Returns the address as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` for the all-zero address.
    pub fn is_zero(&self) -> bool {
        *self == Address::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
