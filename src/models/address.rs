//! Identifiers used throughout the workflow: account/contract addresses,
//! transaction hashes and chain ids.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// An account, contract or private-pool address.
///
/// Addresses are compared case-insensitively, so they are normalized to
/// lowercase on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// sentinel used by swap and balance APIs for a chain's native asset.
    pub const NATIVE_TOKEN: &'static str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

    pub fn new(address: impl AsRef<str>) -> Self {
        Self(address.as_ref().trim().to_lowercase())
    }

    pub fn native_token() -> Self {
        Self::new(Self::NATIVE_TOKEN)
    }

    pub fn is_native_token(&self) -> bool {
        self.0 == Self::NATIVE_TOKEN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// abbreviated form for menus and status lines, eg `0x1234…cdef`
    pub fn abbreviated(&self) -> String {
        let chars = self.0.chars().collect::<Vec<_>>();
        if chars.len() <= 14 {
            return self.0.clone();
        }
        let head = chars[..6].iter().collect::<String>();
        let tail = chars[chars.len() - 4..].iter().collect::<String>();
        format!("{head}…{tail}")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid address: {0:?}")]
pub struct InvalidAddress(String);

impl FromStr for Address {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // addresses are hex or pool identifiers; anything else is a typo
        if trimmed.len() < 3 || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InvalidAddress(s.to_string()));
        }
        Ok(Self::new(trimmed))
    }
}

/// hash of a submitted transaction
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: impl AsRef<str>) -> Self {
        Self(hash.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// EIP-155 chain id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
