// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::token;

/// Why a check request did not produce a passing verdict.  The display form is
/// what the caller gets back in the `Error` member of the response body.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("No token was provided")]
    MissingToken,
    #[error("Unknown mode {0}")]
    UnknownMode(String),
    #[error("{0}")]
    Decode(token::Error),
    #[error("A Google API error occurred: {0}")]
    Authority(String),
    /// A check failed and the error level stopped evaluation
    #[error("{0}")]
    Rejected(String),
    /// Checks failed under the `log` error level
    #[error("Attestation checks failed: {0}")]
    ChecksFailed(String),
    #[error("Service setup failed: {0}")]
    Setup(String),
}

impl From<token::Error> for Error {
    fn from(e: token::Error) -> Self {
        match e {
            token::Error::Authority(m) => Error::Authority(m),
            e => Error::Decode(e),
        }
    }
}
