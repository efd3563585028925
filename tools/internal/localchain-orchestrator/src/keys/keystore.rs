// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use crate::helpers::write_file;
use crate::keys::ethereum::{strip_hex_prefix, EthereumKeyPair};
use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Keccak256};
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

const DERIVED_KEY_LEN: usize = 32;
const SALT_LEN: usize = 32;
const IV_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherParams {
    pub iv: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub c: u32,
    pub dklen: u32,
    pub prf: String,
    pub salt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoSection {
    pub cipher: String,
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    pub kdf: String,
    pub kdfparams: KdfParams,
    pub mac: String,
}

/// Web3 secret storage (keystore v3) document, as consumed by geth, quorum and ethsigner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletFile {
    pub address: String,
    pub crypto: CryptoSection,
    pub id: String,
    pub version: u32,
}

fn derive_key(password: &str, salt: &[u8], rounds: u32) -> Zeroizing<[u8; DERIVED_KEY_LEN]> {
    let mut derived = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, derived.as_mut());
    derived
}

fn apply_cipher(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), OrchestratorError> {
    let mut cipher = Aes128Ctr::new_from_slices(key, iv).map_err(|err| {
        OrchestratorError::KeyGenerationFailure {
            message: format!("invalid keystore cipher parameters: {err}"),
        }
    })?;
    cipher.apply_keystream(buf);
    Ok(())
}

fn mac(derived: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(&derived[16..32]);
    hasher.update(ciphertext);
    hasher.finalize().into()
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, OrchestratorError> {
    hex::decode(value).map_err(|err| OrchestratorError::KeyGenerationFailure {
        message: format!("keystore field '{field}' is not valid hex: {err}"),
    })
}

impl WalletFile {
    pub fn encrypt(
        keypair: &EthereumKeyPair,
        password: &str,
        kdf_rounds: u32,
    ) -> Result<Self, OrchestratorError> {
        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let derived = derive_key(password, &salt, kdf_rounds);
        let mut ciphertext = keypair.private_key_bytes().to_vec();
        apply_cipher(&derived[..16], &iv, &mut ciphertext)?;
        let mac = mac(derived.as_ref(), &ciphertext);

        Ok(WalletFile {
            address: hex::encode(keypair.address_bytes()),
            crypto: CryptoSection {
                cipher: "aes-128-ctr".to_string(),
                ciphertext: hex::encode(&ciphertext),
                cipherparams: CipherParams {
                    iv: hex::encode(iv),
                },
                kdf: "pbkdf2".to_string(),
                kdfparams: KdfParams {
                    c: kdf_rounds,
                    dklen: DERIVED_KEY_LEN as u32,
                    prf: "hmac-sha256".to_string(),
                    salt: hex::encode(salt),
                },
                mac: hex::encode(mac),
            },
            id: uuid::Uuid::new_v4().to_string(),
            version: 3,
        })
    }

    pub fn decrypt(&self, password: &str) -> Result<EthereumKeyPair, OrchestratorError> {
        let salt = decode_hex("salt", &self.crypto.kdfparams.salt)?;
        let iv = decode_hex("iv", &self.crypto.cipherparams.iv)?;
        let mut plaintext = Zeroizing::new(decode_hex("ciphertext", &self.crypto.ciphertext)?);

        let derived = derive_key(password, &salt, self.crypto.kdfparams.c);
        let expected = decode_hex("mac", &self.crypto.mac)?;
        if mac(derived.as_ref(), &plaintext) != expected.as_slice() {
            return Err(OrchestratorError::KeyGenerationFailure {
                message: "keystore mac mismatch, wrong password?".to_string(),
            });
        }
        apply_cipher(&derived[..16], &iv, &mut plaintext)?;
        EthereumKeyPair::from_private_key(&plaintext)
    }
}

/// Generates a fresh keypair and stores it as an encrypted wallet file inside `output_dir`.
///
/// The file is named after the address (without `0x`), optionally preceded by `prefix_`.
pub fn create_wallet_file(
    output_dir: &Path,
    prefix: Option<&str>,
    password: &str,
    kdf_rounds: u32,
) -> Result<(EthereumKeyPair, PathBuf), OrchestratorError> {
    let keypair = EthereumKeyPair::generate();
    let wallet = WalletFile::encrypt(&keypair, password, kdf_rounds)?;

    let address = keypair.address();
    let bare_address = strip_hex_prefix(&address);
    let filename = match prefix {
        Some(prefix) => format!("{prefix}_{bare_address}"),
        None => bare_address.to_string(),
    };
    let path = output_dir.join(filename);
    write_file(&path, serde_json::to_vec(&wallet)?)?;
    debug!("wrote wallet file for {address} to {}", path.display());

    Ok((keypair, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypted_wallet_decrypts_with_the_right_password_only() {
        let keypair = EthereumKeyPair::generate();
        let wallet = WalletFile::encrypt(&keypair, "correcthorsebatterystaple", 2).unwrap();

        assert_eq!(wallet.version, 3);
        assert_eq!(wallet.crypto.kdf, "pbkdf2");
        assert_eq!(wallet.crypto.kdfparams.c, 2);
        assert_eq!(wallet.address, strip_hex_prefix(&keypair.address()));

        let recovered = wallet.decrypt("correcthorsebatterystaple").unwrap();
        assert_eq!(recovered.address(), keypair.address());
        assert!(wallet.decrypt("wrong").is_err());
    }

    #[test]
    fn wallet_file_is_named_after_the_address() {
        let dir = tempfile::tempdir().unwrap();
        let (keypair, path) = create_wallet_file(dir.path(), Some("123"), "pw", 2).unwrap();

        let expected = format!("123_{}", strip_hex_prefix(&keypair.address()));
        assert_eq!(path, dir.path().join(expected));

        let stored: WalletFile =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored.decrypt("pw").unwrap().address(), keypair.address());
    }
}
