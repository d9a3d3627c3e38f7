// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::config::ErrorLevel;
use serde::Serialize;
use std::fmt;

/// The individual attestation checks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Check {
    MissingRequestDetails,
    MissingAppIntegrity,
    MissingDeviceIntegrity,
    MissingAccountDetails,
    /// The nonce was consumed by an earlier request
    ReplayedNonce,
    /// The nonce was never issued by this server
    UnknownNonce,
    /// The nonce is absent or not valid base64
    MalformedNonce,
    RequestPackageName,
    Timestamp,
    AppRecognition,
    AppPackageName,
    CertificateDigest,
    Emulator,
    DeviceRecognition,
    Licensing,
    PackageName,
    BasicIntegrity,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::MissingRequestDetails => "missingRequestDetails",
            Check::MissingAppIntegrity => "missingAppIntegrity",
            Check::MissingDeviceIntegrity => "missingDeviceIntegrity",
            Check::MissingAccountDetails => "missingAccountDetails",
            Check::ReplayedNonce => "replayedNonce",
            Check::UnknownNonce => "unknownNonce",
            Check::MalformedNonce => "malformedNonce",
            Check::RequestPackageName => "requestPackageName",
            Check::Timestamp => "timestamp",
            Check::AppRecognition => "appRecognition",
            Check::AppPackageName => "appPackageName",
            Check::CertificateDigest => "certificateDigest",
            Check::Emulator => "emulator",
            Check::DeviceRecognition => "deviceRecognition",
            Check::Licensing => "licensing",
            Check::PackageName => "packageName",
            Check::BasicIntegrity => "basicIntegrity",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed check and the message reported for it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub check: Check,
    pub message: String,
}

impl Failure {
    pub fn new(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            message: message.into(),
        }
    }
}

/// What the evaluator does after a failed check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Continue,
    Abort,
}

/// Decides, per failed check, whether evaluation goes on
#[derive(Clone, Debug)]
pub struct PolicyGate {
    level: ErrorLevel,
}

impl PolicyGate {
    pub fn new(level: ErrorLevel) -> Self {
        Self { level }
    }

    /// Record `failure` and tell the caller whether to keep evaluating
    pub fn gate(&self, failure: &Failure) -> Gate {
        tracing::warn!(check = %failure.check, "{}", failure.message);

        match &self.level {
            ErrorLevel::Log => Gate::Continue,
            ErrorLevel::Abort => Gate::Abort,
            ErrorLevel::Unrecognized(v) => {
                tracing::warn!(error_level = %v, "unrecognized error level, aborting");
                Gate::Abort
            }
        }
    }
}
