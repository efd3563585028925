// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use crate::stack::account::EthereumAccount;
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

pub struct EthereumKeyPair {
    signing_key: SigningKey,
}

impl EthereumKeyPair {
    pub fn generate() -> Self {
        EthereumKeyPair {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    pub fn from_private_key(bytes: &[u8]) -> Result<Self, OrchestratorError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|err| OrchestratorError::KeyGenerationFailure {
                message: format!("invalid secp256k1 private key: {err}"),
            })?;
        Ok(EthereumKeyPair { signing_key })
    }

    pub fn private_key_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.signing_key.to_bytes().to_vec())
    }

    /// Low 20 bytes of the keccak hash of the uncompressed public key (without the 0x04 tag).
    pub fn address_bytes(&self) -> [u8; 20] {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let hash = Keccak256::digest(&point.as_bytes()[1..]);

        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        address
    }

    pub fn address(&self) -> String {
        format!("0x{}", hex::encode(self.address_bytes()))
    }

    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.private_key_bytes().as_slice()))
    }

    pub fn to_account(&self) -> EthereumAccount {
        EthereumAccount {
            address: self.address(),
            private_key: self.private_key_hex(),
            ptm_public_key: None,
        }
    }
}

/// Strips the optional `0x` prefix of a hex encoded value.
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_the_well_known_address() {
        let private_key =
            hex::decode("4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318")
                .unwrap();
        let keypair = EthereumKeyPair::from_private_key(&private_key).unwrap();
        assert_eq!(
            keypair.address(),
            "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"
        );
        assert_eq!(
            keypair.private_key_hex(),
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
        );
    }

    #[test]
    fn generated_keys_are_well_formed_and_unique() {
        let a = EthereumKeyPair::generate();
        let b = EthereumKeyPair::generate();

        assert!(a.address().starts_with("0x"));
        assert_eq!(a.address().len(), 42);
        assert_eq!(a.private_key_hex().len(), 66);
        assert_ne!(a.address(), b.address());
        assert_ne!(a.private_key_hex(), b.private_key_hex());
    }

    #[test]
    fn strips_prefix() {
        assert_eq!(strip_hex_prefix("0xabcd"), "abcd");
        assert_eq!(strip_hex_prefix("abcd"), "abcd");
    }
}
