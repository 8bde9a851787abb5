use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use super::Address;
use crate::error::{DaoError, Result};

/// In-memory ed25519 keypair acting as the payer capability of an account.
///
/// Keys are generated fresh for every process and never written to disk.
pub struct Wallet {
    keypair: SigningKey,
}

impl Wallet {
    pub fn new(keypair: SigningKey) -> Self {
        Self { keypair }
    }

    pub fn generate() -> Self {
        let mut csprng = OsRng;
        Self::new(SigningKey::generate(&mut csprng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: &[u8; 32] = bytes
            .try_into()
            .map_err(|_| DaoError::Wallet("Invalid key length".to_string()))?;
        Ok(Self::new(SigningKey::from_bytes(seed)))
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.keypair.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.keypair.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet").field("address", &self.address()).finish()
    }
}

/// Checks `signature` over `message` against the key behind `address`.
pub fn verify_signature(address: &Address, message: &[u8], signature: &[u8]) -> bool {
    let Some(pk) = address.public_key_bytes() else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pk) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_signing_and_verification() {
        let wallet = Wallet::generate();
        let message = b"dao/join";
        let signature = wallet.sign(message);

        assert!(verify_signature(&wallet.address(), message, &signature));
        assert!(!verify_signature(&wallet.address(), b"dao/vote", &signature));
    }

    #[test]
    fn test_address_round_trips_through_base58() {
        let wallet = Wallet::from_bytes(&[7u8; 32]).unwrap();
        let address = wallet.address();
        let parsed = Address::try_from(address.as_str()).unwrap();
        assert_eq!(parsed, address);
        assert!(Address::try_from("not-base58-0OIl").is_err());
    }

    #[test]
    fn test_rejects_short_seed() {
        assert!(Wallet::from_bytes(&[1u8; 16]).is_err());
    }
}
