// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::token::Claims;
use serde::Deserialize;
use serde_json::{json, Value};

/// The two supported token formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Play Integrity
    Integrity,
    /// SafetyNet attestation
    #[value(name = "safetynet")]
    SafetyNet,
}

/// How a Play Integrity token is decoded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// With the app's own decryption and verification keys
    Local,
    /// By the remote authority
    #[default]
    Delegated,
}

impl DecodeMode {
    /// `local`/`server` or `delegated`/`google`; absent means delegated
    pub fn parse(v: Option<&str>) -> Result<Self, Error> {
        match v {
            None => Ok(DecodeMode::default()),
            Some("local" | "server") => Ok(DecodeMode::Local),
            Some("delegated" | "google") => Ok(DecodeMode::Delegated),
            Some(other) => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

/// A check request, as received in the query of a check endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CheckRequest {
    pub token: Option<String>,
    /// Decode mode, Play Integrity only
    pub mode: Option<String>,
    /// Nonce check mode: `server` (default) or anything else to skip
    pub nonce: Option<String>,
}

impl CheckRequest {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Default::default()
        }
    }
}

/// What a router sends back for a check request
#[derive(Clone, Debug, PartialEq)]
pub struct CheckResponse {
    pub verdict: bool,
    pub status: u16,
    pub body: Value,
}

impl CheckResponse {
    pub(crate) fn from_outcome(outcome: Result<Claims, Error>) -> Self {
        match outcome {
            Ok(claims) => Self {
                verdict: true,
                status: 200,
                body: serde_json::to_value(&claims).unwrap_or_default(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "check request failed");

                Self {
                    verdict: false,
                    status: 400,
                    body: json!({ "Error": e.to_string() }),
                }
            }
        }
    }

    /// The message of an error response
    pub fn error(&self) -> Option<&str> {
        self.body.get("Error").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_modes() {
        assert_eq!(DecodeMode::parse(None).unwrap(), DecodeMode::Delegated);
        assert_eq!(DecodeMode::parse(Some("server")).unwrap(), DecodeMode::Local);
        assert_eq!(DecodeMode::parse(Some("local")).unwrap(), DecodeMode::Local);
        assert_eq!(DecodeMode::parse(Some("google")).unwrap(), DecodeMode::Delegated);
        assert_eq!(
            DecodeMode::parse(Some("bogus")).unwrap_err(),
            Error::UnknownMode("bogus".to_string())
        );
    }

    #[test]
    fn request_from_query() {
        let r: CheckRequest =
            serde_json::from_str(r#"{ "token": "t", "nonce": "device" }"#).unwrap();

        assert_eq!(r.token.as_deref(), Some("t"));
        assert!(r.mode.is_none());
        assert_eq!(r.nonce.as_deref(), Some("device"));
    }

    #[test]
    fn error_response() {
        let r = CheckResponse::from_outcome(Err(Error::MissingToken));

        assert!(!r.verdict);
        assert_eq!(r.status, 400);
        assert_eq!(r.body, json!({ "Error": "No token was provided" }));
        assert_eq!(r.error(), Some("No token was provided"));
    }
}
