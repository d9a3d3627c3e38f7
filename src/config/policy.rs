// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::nonce::DEFAULT_NONCE_LENGTH;
use serde::Deserialize;

/// Maximum age of a token's own timestamp, in milliseconds
pub const DEFAULT_FRESHNESS_MILLIS: i64 = 10_000;

const DEFAULT_AUTHORITY_ENDPOINT: &str = "https://playintegrity.googleapis.com";
const DEFAULT_AUTHORITY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ATTESTATION_HOSTNAME: &str = "attest.android.com";

/// What happens when an attestation check fails
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ErrorLevel {
    /// Stop at the first failed check and report it to the caller
    Abort,
    /// Log every failed check and keep evaluating
    Log,
    /// Any other configured value.  Treated like [`ErrorLevel::Abort`].
    Unrecognized(String),
}

impl From<String> for ErrorLevel {
    fn from(v: String) -> Self {
        match v.as_str() {
            "error" | "abort" => ErrorLevel::Abort,
            "log" => ErrorLevel::Log,
            _ => ErrorLevel::Unrecognized(v),
        }
    }
}

/// How the certificate digests claimed in a Play Integrity token are matched
/// against the trusted set
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DigestPolicy {
    /// At least one claimed digest must be trusted
    #[default]
    RequireTrusted,
    /// At least one claimed digest must be absent from the trusted set.  This
    /// is the rule deployed by earlier releases of this service; it rejects
    /// apps signed exclusively with trusted certificates.
    RequireUntrusted,
}

impl DigestPolicy {
    /// Apply the policy.  A missing or empty claimed set never passes.
    pub fn accepts(&self, claimed: Option<&[String]>, trusted: &[String]) -> bool {
        let claimed = match claimed {
            Some(c) if !c.is_empty() => c,
            _ => return false,
        };

        match self {
            DigestPolicy::RequireTrusted => claimed.iter().any(|d| trusted.contains(d)),
            DigestPolicy::RequireUntrusted => claimed.iter().any(|d| !trusted.contains(d)),
        }
    }
}

/// Settings for the delegated (remote) decode of Play Integrity tokens
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorityConfig {
    /// Base URL of the Play Integrity API
    pub endpoint: String,
    /// Upper bound on a whole round trip to the authority
    pub timeout_secs: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_AUTHORITY_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_AUTHORITY_TIMEOUT_SECS,
        }
    }
}

/// Settings for decoding SafetyNet attestation statements
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SafetyNetConfig {
    /// Verify the JWS signature using the `x5c` leaf certificate
    pub verify_signature: bool,
    /// Subject CN the leaf certificate must carry
    pub attestation_hostname: String,
    /// PEM encoded roots the `x5c` chain must lead to.  While signatures are
    /// verified, an empty set rejects every statement.
    pub trusted_roots: Vec<String>,
}

impl Default for SafetyNetConfig {
    fn default() -> Self {
        Self {
            verify_signature: true,
            attestation_hostname: DEFAULT_ATTESTATION_HOSTNAME.to_string(),
            trusted_roots: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPolicy {
    package_name: Option<String>,
    valid_certificate_sha256_digest: Option<Vec<String>>,
    error_level: Option<ErrorLevel>,
    #[serde(default)]
    certificate_digest_policy: DigestPolicy,
    nonce_length: Option<usize>,
    freshness_millis: Option<i64>,
    #[serde(default)]
    authority: AuthorityConfig,
    #[serde(default)]
    safety_net: SafetyNetConfig,
}

/// The process-wide attestation policy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyConfig {
    /// The Android application id tokens must be issued for
    pub package_name: String,
    /// SHA-256 digests of the trusted app signing certificates
    pub valid_certificate_sha256_digest: Vec<String>,
    pub error_level: ErrorLevel,
    pub certificate_digest_policy: DigestPolicy,
    pub nonce_length: usize,
    pub freshness_millis: i64,
    pub authority: AuthorityConfig,
    pub safety_net: SafetyNetConfig,
}

impl PolicyConfig {
    /// Load the policy from its JSON file.  The package name may be left out
    /// of the file and supplied by the environment instead (see
    /// [`crate::config::Settings`]).
    pub fn load_json(j: &str) -> Result<Self, Error> {
        let raw: RawPolicy = serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        let digests = raw
            .valid_certificate_sha256_digest
            .ok_or_else(|| Error::Missing("validCertificateSha256Digest".to_string()))?;

        if digests.is_empty() {
            return Err(Error::Sema(
                "validCertificateSha256Digest has to be a non-empty array of strings".to_string(),
            ));
        }

        let error_level = raw
            .error_level
            .ok_or_else(|| Error::Missing("errorLevel".to_string()))?;

        let nonce_length = raw.nonce_length.unwrap_or(DEFAULT_NONCE_LENGTH);

        if nonce_length == 0 {
            return Err(Error::Sema("nonceLength must be positive".to_string()));
        }

        let freshness_millis = raw.freshness_millis.unwrap_or(DEFAULT_FRESHNESS_MILLIS);

        if freshness_millis < 0 {
            return Err(Error::Sema("freshnessMillis must not be negative".to_string()));
        }

        Ok(Self {
            package_name: raw.package_name.unwrap_or_default(),
            valid_certificate_sha256_digest: digests,
            error_level,
            certificate_digest_policy: raw.certificate_digest_policy,
            nonce_length,
            freshness_millis,
            authority: raw.authority,
            safety_net: raw.safety_net,
        })
    }
}
