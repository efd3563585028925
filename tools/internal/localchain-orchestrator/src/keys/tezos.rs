// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::stack::account::TezosAccount;
use blake2::digest::consts::U20;
use blake2::{Blake2b, Digest};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

type Blake2b160 = Blake2b<U20>;

// base58check prefixes of the tezos encoding scheme
const TZ1_PREFIX: [u8; 3] = [6, 161, 159];
const EDPK_PREFIX: [u8; 4] = [13, 15, 37, 217];
const EDSK_PREFIX: [u8; 4] = [43, 246, 78, 7];

fn encode_check(prefix: &[u8], payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(prefix.len() + payload.len());
    data.extend_from_slice(prefix);
    data.extend_from_slice(payload);
    bs58::encode(data).with_check().into_string()
}

pub struct TezosKeyPair {
    signing_key: SigningKey,
}

impl TezosKeyPair {
    pub fn generate() -> Self {
        TezosKeyPair {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        TezosKeyPair {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// `tz1` address: blake2b-160 digest of the public key.
    pub fn address(&self) -> String {
        let digest = Blake2b160::digest(self.signing_key.verifying_key().as_bytes());
        encode_check(&TZ1_PREFIX, &digest)
    }

    pub fn public_key(&self) -> String {
        encode_check(
            &EDPK_PREFIX,
            self.signing_key.verifying_key().as_bytes(),
        )
    }

    /// `edsk` secret key holding the full 64 byte keypair.
    pub fn secret_key(&self) -> String {
        encode_check(&EDSK_PREFIX, &self.signing_key.to_keypair_bytes())
    }

    pub fn to_account(&self) -> TezosAccount {
        TezosAccount {
            address: self.address(),
            private_key: self.secret_key(),
        }
    }
}
