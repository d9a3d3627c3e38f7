// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::gate::{Check, Failure, Gate, PolicyGate};
use super::NonceCheckMode;
use crate::nonce::{decode_token_nonce, NonceLedger, NonceStatus};
use serde::Serialize;

/// The outcome of appraising one claims-set
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// True only if no check failed
    pub passed: bool,
    /// Every failed check, in evaluation order
    pub failures: Vec<Failure>,
    /// The failure that stopped evaluation, if any
    pub aborted: Option<Failure>,
}

impl Verdict {
    pub fn failed(&self, check: Check) -> bool {
        self.failures.iter().any(|f| f.check == check)
    }
}

/// Signals that the policy gate stopped evaluation
#[derive(Debug)]
pub(crate) struct Aborted;

/// Collects failures while a claims-set is evaluated
pub(crate) struct Evaluation<'a> {
    gate: &'a PolicyGate,
    failures: Vec<Failure>,
    aborted: Option<Failure>,
}

impl<'a> Evaluation<'a> {
    pub(crate) fn new(gate: &'a PolicyGate) -> Self {
        Self {
            gate,
            failures: Vec::new(),
            aborted: None,
        }
    }

    pub(crate) fn fail(&mut self, check: Check, message: impl Into<String>) -> Result<(), Aborted> {
        let f = Failure::new(check, message);

        let g = self.gate.gate(&f);
        self.failures.push(f);

        match g {
            Gate::Continue => Ok(()),
            Gate::Abort => {
                self.aborted = self.failures.last().cloned();
                Err(Aborted)
            }
        }
    }

    /// Fail `check` unless `ok` holds.  Returns whether the check passed.
    pub(crate) fn require(
        &mut self,
        ok: bool,
        check: Check,
        message: impl Into<String>,
    ) -> Result<bool, Aborted> {
        if !ok {
            self.fail(check, message)?;
        }

        Ok(ok)
    }

    /// Match the nonce carried in the token against the ledger
    pub(crate) fn nonce(
        &mut self,
        ledger: &NonceLedger,
        mode: NonceCheckMode,
        claimed: Option<&str>,
    ) -> Result<bool, Aborted> {
        if mode == NonceCheckMode::Skip {
            return Ok(true);
        }

        let nonce = match claimed.map(decode_token_nonce) {
            Some(Ok(n)) => n,
            _ => {
                self.fail(Check::MalformedNonce, "Invalid Nonce")?;
                return Ok(false);
            }
        };

        match ledger.check_and_consume(&nonce) {
            NonceStatus::Accepted => Ok(true),
            NonceStatus::Replayed => {
                self.fail(Check::ReplayedNonce, "Invalid Nonce")?;
                Ok(false)
            }
            NonceStatus::Unknown => {
                self.fail(Check::UnknownNonce, "Invalid Nonce")?;
                Ok(false)
            }
        }
    }

    /// A token older than `window` milliseconds, or without a timestamp, is
    /// stale.  Timestamps ahead of `now` are not rejected.
    pub(crate) fn freshness(
        &mut self,
        timestamp: Option<i64>,
        now: i64,
        window: i64,
    ) -> Result<bool, Aborted> {
        let fresh = matches!(timestamp, Some(t) if now.saturating_sub(t) <= window);

        self.require(fresh, Check::Timestamp, "Request too old")
    }

    pub(crate) fn finish(self, outcome: Result<(), Aborted>) -> Verdict {
        debug_assert!(outcome.is_ok() == self.aborted.is_none());

        Verdict {
            passed: self.failures.is_empty(),
            failures: self.failures,
            aborted: self.aborted,
        }
    }
}
