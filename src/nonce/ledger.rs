// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use rand::{distributions::Alphanumeric, Rng};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, PoisonError};

// Tokens carry the nonce as base64 in either alphabet, with or without padding
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A single-use challenge value drawn from `[A-Za-z0-9]`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URL-safe, unpadded base64 encoding of the nonce.  This is the form
    /// a Play Integrity client passes on to the attestation authority.
    pub fn to_base64url(&self) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(self.0.as_bytes())
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Nonce> for String {
    fn from(n: Nonce) -> Self {
        n.0
    }
}

/// Outcome of a [`NonceLedger::check_and_consume()`] call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonceStatus {
    /// The nonce was active and is now retired
    Accepted,
    /// The nonce was already consumed: a token is being resubmitted
    Replayed,
    /// The nonce was never issued by this ledger
    Unknown,
}

impl NonceStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, NonceStatus::Accepted)
    }
}

#[derive(Debug, Default)]
struct Sets {
    active: HashSet<String>,
    retired: HashSet<String>,
}

/// Issues nonces and tracks them from active to retired.  Entries are never
/// removed, and a retired nonce never becomes active again.
#[derive(Debug, Default)]
pub struct NonceLedger {
    sets: Mutex<Sets>,
}

impl NonceLedger {
    /// Returns a new, empty ledger
    pub fn new() -> Self {
        Self {
            sets: Default::default(),
        }
    }

    /// Generate a random alphanumeric nonce of `length` characters and
    /// register it as active
    pub fn issue(&self, length: usize) -> Nonce {
        let v: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();

        let mut sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);

        // a freshly drawn value colliding with a retired one must not revive it
        if !sets.retired.contains(&v) {
            sets.active.insert(v.clone());
        }

        drop(sets);

        tracing::info!(nonce = %v, "generated nonce");

        Nonce(v)
    }

    /// Accept `nonce` if it is active, retiring it in the same critical
    /// section.  Of any number of concurrent calls carrying the same value,
    /// exactly one observes [`NonceStatus::Accepted`].
    pub fn check_and_consume(&self, nonce: &str) -> NonceStatus {
        let status = {
            let mut sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);

            if sets.active.remove(nonce) {
                sets.retired.insert(nonce.to_string());
                NonceStatus::Accepted
            } else if sets.retired.contains(nonce) {
                NonceStatus::Replayed
            } else {
                NonceStatus::Unknown
            }
        };

        match status {
            NonceStatus::Accepted => tracing::info!(nonce, "correct nonce received"),
            NonceStatus::Replayed => {
                tracing::warn!(nonce, "duplicated use of nonce, potential replay attack")
            }
            NonceStatus::Unknown => {
                tracing::warn!(nonce, "nonce was not previously generated on the server")
            }
        }

        status
    }

    /// Number of nonces issued and not yet consumed
    pub fn active_len(&self) -> usize {
        self.sets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .len()
    }

    /// Number of nonces consumed so far
    pub fn retired_len(&self) -> usize {
        self.sets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retired
            .len()
    }
}

/// Map the base64 nonce found in a token back to the alphabet nonces are
/// issued in, so it can be looked up in the ledger
pub fn decode_token_nonce(v: &str) -> Result<String, Error> {
    let normalised: String = v
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    let raw = LENIENT
        .decode(normalised.trim_end_matches('='))
        .map_err(|e| Error::Encoding(e.to_string()))?;

    let s = String::from_utf8(raw).map_err(|e| Error::Utf8(e.to_string()))?;

    Ok(s.replace('+', "-")
        .replace('/', "_")
        .trim_end_matches('=')
        .to_string())
}
