// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The nonce module provides a [`NonceLedger`] that issues single-use
//! challenge values and tracks them through their lifecycle: a nonce is
//! *active* from issuance until its first successful check, and *retired*
//! afterwards.  Retired nonces are kept for the lifetime of the ledger so that
//! a resubmitted token can be told apart from one carrying a nonce this server
//! never issued.
//!
//! # Example
//!
//! ```
//! use integritytoken::nonce::{NonceLedger, NonceStatus, DEFAULT_NONCE_LENGTH};
//!
//! let ledger = NonceLedger::new();
//!
//! let n = ledger.issue(DEFAULT_NONCE_LENGTH);
//!
//! assert_eq!(ledger.check_and_consume(n.as_str()), NonceStatus::Accepted);
//! assert_eq!(ledger.check_and_consume(n.as_str()), NonceStatus::Replayed);
//! assert_eq!(ledger.check_and_consume("never-issued"), NonceStatus::Unknown);
//! ```

pub use self::errors::Error;
pub use self::ledger::{decode_token_nonce, Nonce, NonceLedger, NonceStatus};

mod errors;
mod ledger;

/// Length of the nonces handed out to clients unless configured otherwise
pub const DEFAULT_NONCE_LENGTH: usize = 50;
