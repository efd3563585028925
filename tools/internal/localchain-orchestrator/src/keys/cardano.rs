// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Shelley era wallets: BIP39 mnemonic, Icarus master key and BIP32-Ed25519 (V2) derivation
//! along the CIP-1852 paths.

use crate::error::OrchestratorError;
use crate::stack::account::CardanoAccount;
use bech32::{Bech32, Hrp};
use blake2::digest::consts::U28;
use blake2::{Blake2b, Digest};
use curve25519_dalek::{EdwardsPoint, Scalar};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

type Blake2b224 = Blake2b<U28>;
type HmacSha512 = Hmac<Sha512>;

const HARDENED: u32 = 0x8000_0000;
const PURPOSE: u32 = 1852;
const COIN_TYPE: u32 = 1815;
const ICARUS_ROUNDS: u32 = 4096;

const EXTERNAL_CHAIN: u32 = 0;
const STAKING_CHAIN: u32 = 2;

pub const MAINNET: &str = "mainnet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardanoNetwork {
    Mainnet,
    Testnet,
}

impl CardanoNetwork {
    /// Every network other than mainnet shares the testnet network id.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case(MAINNET) {
            CardanoNetwork::Mainnet
        } else {
            CardanoNetwork::Testnet
        }
    }

    fn network_id(&self) -> u8 {
        match self {
            CardanoNetwork::Mainnet => 1,
            CardanoNetwork::Testnet => 0,
        }
    }

    fn address_hrp(&self) -> &'static str {
        match self {
            CardanoNetwork::Mainnet => "addr",
            CardanoNetwork::Testnet => "addr_test",
        }
    }
}

fn key_failure(message: impl Into<String>) -> OrchestratorError {
    OrchestratorError::KeyGenerationFailure {
        message: message.into(),
    }
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ExtendedSecretKey {
    kl: [u8; 32],
    kr: [u8; 32],
    chain_code: [u8; 32],
}

fn add_28_mul8(x: &[u8; 32], y: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let y_part = if i < 28 { u16::from(y[i]) << 3 } else { 0 };
        let r = u16::from(x[i]) + y_part + carry;
        out[i] = (r & 0xff) as u8;
        carry = r >> 8;
    }
    out
}

fn add_256bits(x: &[u8; 32], y: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let r = u16::from(x[i]) + u16::from(y[i]) + carry;
        out[i] = (r & 0xff) as u8;
        carry = r >> 8;
    }
    out
}

impl ExtendedSecretKey {
    /// Icarus master key generation from the mnemonic entropy (empty passphrase).
    pub fn from_entropy(entropy: &[u8]) -> Self {
        let mut seed = [0u8; 96];
        pbkdf2::pbkdf2_hmac::<Sha512>(b"", entropy, ICARUS_ROUNDS, &mut seed);

        let mut kl = [0u8; 32];
        let mut kr = [0u8; 32];
        let mut chain_code = [0u8; 32];
        kl.copy_from_slice(&seed[..32]);
        kr.copy_from_slice(&seed[32..64]);
        chain_code.copy_from_slice(&seed[64..]);
        seed.zeroize();

        kl[0] &= 0b1111_1000;
        kl[31] &= 0b0001_1111;
        kl[31] |= 0b0100_0000;

        ExtendedSecretKey { kl, kr, chain_code }
    }

    pub fn public_key(&self) -> [u8; 32] {
        // the base point has prime order so reducing the clamped scalar does not change the result
        EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(self.kl))
            .compress()
            .to_bytes()
    }

    fn mac(&self) -> Result<HmacSha512, OrchestratorError> {
        HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|err| key_failure(format!("invalid chain code: {err}")))
    }

    pub fn derive(&self, index: u32) -> Result<Self, OrchestratorError> {
        let index_bytes = index.to_le_bytes();
        let mut z_mac = self.mac()?;
        let mut c_mac = self.mac()?;

        if index >= HARDENED {
            z_mac.update(&[0x00]);
            z_mac.update(&self.kl);
            z_mac.update(&self.kr);
            c_mac.update(&[0x01]);
            c_mac.update(&self.kl);
            c_mac.update(&self.kr);
        } else {
            let public_key = self.public_key();
            z_mac.update(&[0x02]);
            z_mac.update(&public_key);
            c_mac.update(&[0x03]);
            c_mac.update(&public_key);
        }
        z_mac.update(&index_bytes);
        c_mac.update(&index_bytes);

        let z = z_mac.finalize().into_bytes();
        let c = c_mac.finalize().into_bytes();

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&c[32..]);

        Ok(ExtendedSecretKey {
            kl: add_28_mul8(&self.kl, &z[..28]),
            kr: add_256bits(&self.kr, &z[32..]),
            chain_code,
        })
    }

    pub fn derive_path(&self, path: &[u32]) -> Result<Self, OrchestratorError> {
        let mut key = self.clone();
        for index in path {
            key = key.derive(*index)?;
        }
        Ok(key)
    }

    /// `xprv || public key || chain code`, the layout cardano-cli stores in signing key envelopes.
    pub fn to_signing_key_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(&self.kl);
        out.extend_from_slice(&self.kr);
        out.extend_from_slice(&self.public_key());
        out.extend_from_slice(&self.chain_code);
        out
    }
}

/// cardano-cli text envelope around a payment signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub cbor_hex: String,
}

pub struct CardanoWallet {
    pub mnemonic: bip39::Mnemonic,
    pub network: CardanoNetwork,
    payment: ExtendedSecretKey,
    stake: ExtendedSecretKey,
}

impl CardanoWallet {
    pub fn generate(network: CardanoNetwork) -> Result<Self, OrchestratorError> {
        let mnemonic = bip39::Mnemonic::generate(24)
            .map_err(|err| key_failure(format!("failed to generate mnemonic: {err}")))?;
        Self::from_mnemonic(mnemonic, network)
    }

    pub fn from_mnemonic(
        mnemonic: bip39::Mnemonic,
        network: CardanoNetwork,
    ) -> Result<Self, OrchestratorError> {
        let root = ExtendedSecretKey::from_entropy(&mnemonic.to_entropy());
        let account =
            root.derive_path(&[PURPOSE | HARDENED, COIN_TYPE | HARDENED, HARDENED])?;

        Ok(CardanoWallet {
            payment: account.derive_path(&[EXTERNAL_CHAIN, 0])?,
            stake: account.derive_path(&[STAKING_CHAIN, 0])?,
            mnemonic,
            network,
        })
    }

    /// Shelley base address: payment key hash followed by the stake key hash.
    pub fn address(&self) -> Result<String, OrchestratorError> {
        let mut bytes = Vec::with_capacity(57);
        bytes.push(self.network.network_id());
        bytes.extend_from_slice(&Blake2b224::digest(self.payment.public_key()));
        bytes.extend_from_slice(&Blake2b224::digest(self.stake.public_key()));

        let hrp = Hrp::parse(self.network.address_hrp())
            .map_err(|err| key_failure(format!("invalid address prefix: {err}")))?;
        bech32::encode::<Bech32>(hrp, &bytes)
            .map_err(|err| key_failure(format!("failed to encode address: {err}")))
    }

    /// CBOR encoding (byte string of length 128) of the extended payment signing key, as hex.
    pub fn payment_signing_key_cbor_hex(&self) -> String {
        format!("5880{}", hex::encode(self.payment.to_signing_key_bytes()))
    }

    pub fn payment_signing_key_envelope(&self) -> TextEnvelope {
        TextEnvelope {
            kind: "PaymentExtendedSigningKeyShelley_ed25519_bip32".to_string(),
            description: "Payment Signing Key".to_string(),
            cbor_hex: self.payment_signing_key_cbor_hex(),
        }
    }

    pub fn to_account(&self) -> Result<CardanoAccount, OrchestratorError> {
        Ok(CardanoAccount {
            address: self.address()?,
            private_key: self.payment_signing_key_cbor_hex(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_wallet(network: CardanoNetwork) -> CardanoWallet {
        let mnemonic = bip39::Mnemonic::from_entropy(&[0x42; 32]).unwrap();
        CardanoWallet::from_mnemonic(mnemonic, network).unwrap()
    }

    #[test]
    fn master_key_is_clamped() {
        let root = ExtendedSecretKey::from_entropy(&[0x11; 32]);
        assert_eq!(root.kl[0] & 0b0000_0111, 0);
        assert_eq!(root.kl[31] & 0b1110_0000, 0b0100_0000);
    }

    #[test]
    fn derivation_is_deterministic_and_path_sensitive() {
        let a = fixed_wallet(CardanoNetwork::Mainnet);
        let b = fixed_wallet(CardanoNetwork::Mainnet);
        assert_eq!(
            a.payment_signing_key_cbor_hex(),
            b.payment_signing_key_cbor_hex()
        );
        assert_ne!(a.payment.public_key(), a.stake.public_key());
    }

    #[test]
    fn soft_and_hardened_children_differ() {
        let root = ExtendedSecretKey::from_entropy(&[0x33; 32]);
        let soft = root.derive(0).unwrap();
        let hard = root.derive(HARDENED).unwrap();
        assert_ne!(soft.public_key(), hard.public_key());
    }

    #[test]
    fn signing_key_envelope_has_the_cli_layout() {
        let wallet = fixed_wallet(CardanoNetwork::Testnet);
        let cbor = wallet.payment_signing_key_cbor_hex();
        assert!(cbor.starts_with("5880"));
        assert_eq!(cbor.len(), 4 + 128 * 2);

        let envelope = wallet.payment_signing_key_envelope();
        assert_eq!(envelope.cbor_hex, cbor);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json["type"],
            "PaymentExtendedSigningKeyShelley_ed25519_bip32"
        );
        assert!(json.get("cborHex").is_some());
    }

    #[test]
    fn address_prefix_follows_the_network() {
        let mainnet = fixed_wallet(CardanoNetwork::Mainnet).address().unwrap();
        let testnet = fixed_wallet(CardanoNetwork::Testnet).address().unwrap();
        assert!(mainnet.starts_with("addr1"));
        assert!(testnet.starts_with("addr_test1"));

        let (hrp, data) = bech32::decode(&mainnet).unwrap();
        assert_eq!(hrp.as_str(), "addr");
        assert_eq!(data.len(), 57);
        assert_eq!(data[0], 0x01);
    }

    #[test]
    fn network_names_map_to_ids() {
        assert_eq!(CardanoNetwork::from_name("mainnet"), CardanoNetwork::Mainnet);
        assert_eq!(CardanoNetwork::from_name("preview"), CardanoNetwork::Testnet);
        assert_eq!(CardanoNetwork::from_name("preprod"), CardanoNetwork::Testnet);
    }

    #[test]
    fn generated_wallets_have_24_words() {
        let wallet = CardanoWallet::generate(CardanoNetwork::Mainnet).unwrap();
        assert_eq!(wallet.mnemonic.word_count(), 24);
    }
}
