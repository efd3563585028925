// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

//! Key material generation for every supported chain family.
//!
//! Everything in here is pure computation over fresh OS entropy. Persisting the results
//! is left to the callers.

pub mod cardano;
pub mod ethereum;
pub mod keystore;
pub mod tezos;
