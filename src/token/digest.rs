// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use base64::{engine::general_purpose, Engine as _};
use openssl::hash::MessageDigest;
use openssl::x509::X509;
use serde::Serialize;

/// The SHA-256 digest of an app signing certificate, in the encodings the two
/// token formats use
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDigest {
    /// As found in Play Integrity `certificateSha256Digest`
    pub base64url: String,
    /// As found in SafetyNet `apkCertificateDigestSha256`
    pub base64: String,
    pub hex: String,
}

impl CertificateDigest {
    /// Digest a PEM or DER encoded X.509 certificate
    pub fn from_certificate(buf: &[u8]) -> Result<Self, Error> {
        let start = buf
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(buf.len());

        let cert = if buf[start..].starts_with(b"-----BEGIN") {
            X509::from_pem(buf)
        } else {
            X509::from_der(buf)
        }
        .map_err(|e| Error::Certificate(e.to_string()))?;

        let d = cert
            .digest(MessageDigest::sha256())
            .map_err(|e| Error::Certificate(e.to_string()))?;

        Ok(Self {
            base64url: general_purpose::URL_SAFE_NO_PAD.encode(&d),
            base64: general_purpose::STANDARD.encode(&d),
            hex: hex::encode(&d),
        })
    }
}
