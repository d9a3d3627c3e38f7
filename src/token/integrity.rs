// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

pub const PLAY_RECOGNIZED: &str = "PLAY_RECOGNIZED";
pub const LICENSED: &str = "LICENSED";
pub const MEETS_VIRTUAL_INTEGRITY: &str = "MEETS_VIRTUAL_INTEGRITY";
pub const MEETS_BASIC_INTEGRITY: &str = "MEETS_BASIC_INTEGRITY";
pub const MEETS_DEVICE_INTEGRITY: &str = "MEETS_DEVICE_INTEGRITY";
pub const MEETS_STRONG_INTEGRITY: &str = "MEETS_STRONG_INTEGRITY";

/// Details about the integrity request itself
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_package_name: Option<String>,

    /// The challenge, base64 encoded as handed to the authority by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Request time in epoch milliseconds.  The authority serialises it as a
    /// decimal string, which is kept when re-encoding; plain numbers are
    /// accepted too.
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    #[serde(
        default,
        alias = "timestampMs",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp_millis: Option<i64>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Information about the app binary
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIntegrity {
    /// One of `PLAY_RECOGNIZED`, `UNRECOGNIZED_VERSION`, `UNEVALUATED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_recognition_verdict: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,

    /// base64url SHA-256 digests of the app signing certificates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_sha256_digest: Option<Vec<String>>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Information about the device the app runs on
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIntegrity {
    /// Zero or more `MEETS_*` labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_recognition_verdict: Option<Vec<String>>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl DeviceIntegrity {
    pub fn has_label(&self, label: &str) -> bool {
        self.device_recognition_verdict
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|l| l == label)
    }
}

/// Licensing status of the user account
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    /// One of `LICENSED`, `UNLICENSED`, `UNEVALUATED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_licensing_verdict: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// The claims-set of a Play Integrity token.  Every section is optional at
/// decode time; a missing section is a failed check at appraisal time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_details: Option<RequestDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_integrity: Option<AppIntegrity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_integrity: Option<DeviceIntegrity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_details: Option<AccountDetails>,

    /// Sections this crate does not appraise, e.g. `environmentDetails`
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl IntegrityClaims {
    /// Decode a JSON encoded Play Integrity claims-set
    pub fn decode(buf: &[u8]) -> Result<IntegrityClaims, Error> {
        serde_json::from_slice(buf).map_err(|e| Error::Claims(e.to_string()))
    }
}
