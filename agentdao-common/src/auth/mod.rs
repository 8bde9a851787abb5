pub mod wallet;

pub use wallet::Wallet;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base58-encoded ed25519 public key identifying an account on the rail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn from_public_key(bytes: &[u8; 32]) -> Self {
        Address(bs58::encode(bytes).into_string())
    }

    /// Decodes the address back into raw public key bytes.
    pub fn public_key_bytes(&self) -> Option<[u8; 32]> {
        let raw = bs58::decode(&self.0).into_vec().ok()?;
        raw.as_slice().try_into().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, used in log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Address {
    type Error = crate::DaoError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let address = Address(s.to_string());
        match address.public_key_bytes() {
            Some(_) => Ok(address),
            None => Err(crate::DaoError::Wallet(format!("Invalid address: {}", s))),
        }
    }
}
