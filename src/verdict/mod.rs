// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Appraisal of decoded claims against the attestation policy.
//!
//! Each failed check goes through a [`PolicyGate`], which either lets the
//! evaluator carry on (error level `log`) or stops it (`abort`).  Either way
//! the resulting [`Verdict`] only passes if no check failed.

pub use self::evaluation::Verdict;
pub use self::gate::{Check, Failure, Gate, PolicyGate};
pub use self::integrity::IntegrityEvaluator;
pub use self::safetynet::SafetyNetEvaluator;

use std::time::{SystemTime, UNIX_EPOCH};

mod evaluation;
mod gate;
mod integrity;
mod safetynet;

/// Whether the token's nonce must have been issued by this server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NonceCheckMode {
    #[default]
    Server,
    /// The nonce was generated on the device
    Skip,
}

impl From<&str> for NonceCheckMode {
    fn from(v: &str) -> Self {
        match v {
            "server" => NonceCheckMode::Server,
            _ => NonceCheckMode::Skip,
        }
    }
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
