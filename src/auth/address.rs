//! Wallet address parsing and normalization.

use crate::auth::error::AuthError;
use std::fmt;

/// Number of raw bytes in an account address.
pub const ADDRESS_LEN: usize = 20;

/// A normalized account address: `0x` followed by 40 lowercase hex digits.
///
/// Checksum-cased input (EIP-55) is accepted and lowercased, never rejected.
/// The lowercase form is the storage key and the form rendered into the
/// sign-in message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse a caller-supplied address.
    ///
    /// Surrounding whitespace is ignored. Anything other than `0x` + 40 hex
    /// digits fails with `AuthError::InvalidAddress`.
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let trimmed = raw.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or(AuthError::InvalidAddress)?;

        if hex_part.len() != ADDRESS_LEN * 2 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AuthError::InvalidAddress);
        }

        Ok(WalletAddress(format!("0x{}", hex_part.to_ascii_lowercase())))
    }

    /// Build an address from the 20 bytes derived from a public key.
    pub fn from_bytes(bytes: &[u8; ADDRESS_LEN]) -> Self {
        WalletAddress(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex digits without the `0x` prefix.
    pub fn hex_digits(&self) -> &str {
        &self.0[2..]
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
