// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::base64;
use super::errors::Error;
use crate::config::SafetyNetConfig;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use openssl::nid::Nid;
use openssl::stack::Stack;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::{X509StoreContext, X509};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The claims-set of a SafetyNet attestation statement
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyNetClaims {
    /// The challenge, base64 encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apk_package_name: Option<String>,

    /// base64 SHA-256 digests of the app signing certificates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apk_certificate_digest_sha256: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_integrity: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cts_profile_match: Option<bool>,

    /// `BASIC` and/or `HARDWARE_BACKED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl SafetyNetClaims {
    /// Decode a JSON encoded SafetyNet claims-set
    pub fn decode(buf: &[u8]) -> Result<SafetyNetClaims, Error> {
        serde_json::from_slice(buf).map_err(|e| Error::Claims(e.to_string()))
    }
}

/// Decodes SafetyNet attestation statements (compact JWS with an `x5c`
/// certificate chain in the protected header)
pub struct SafetyNetDecoder {
    verify_signature: bool,
    hostname: String,
    roots: Option<X509Store>,
}

impl SafetyNetDecoder {
    pub fn new(cfg: &SafetyNetConfig) -> Result<Self, Error> {
        let roots = if cfg.trusted_roots.is_empty() {
            if cfg.verify_signature {
                tracing::warn!(
                    "no SafetyNet trusted roots configured, attestation statements will be rejected"
                );
            }
            None
        } else {
            let mut builder =
                X509StoreBuilder::new().map_err(|e| Error::Certificate(e.to_string()))?;

            for (i, pem) in cfg.trusted_roots.iter().enumerate() {
                let root = X509::from_pem(pem.as_bytes())
                    .map_err(|e| Error::Certificate(format!("trusted root {i}: {e}")))?;

                builder
                    .add_cert(root)
                    .map_err(|e| Error::Certificate(format!("trusted root {i}: {e}")))?;
            }

            Some(builder.build())
        };

        Ok(Self {
            verify_signature: cfg.verify_signature,
            hostname: cfg.attestation_hostname.clone(),
            roots,
        })
    }

    /// Decode a SafetyNet JWS.  Unless signature verification is disabled,
    /// the statement must be signed by the `x5c` leaf certificate, which must
    /// be issued to the attestation hostname and chain up to one of the
    /// trusted roots.  With no trusted roots configured every statement is
    /// rejected.
    pub fn decode(&self, token: &str) -> Result<SafetyNetClaims, Error> {
        if !self.verify_signature {
            return Self::decode_unverified(token);
        }

        let roots = self.roots.as_ref().ok_or_else(|| {
            Error::Certificate("no trusted roots configured for the x5c chain".to_string())
        })?;

        let token = token.trim();

        let header = jsonwebtoken::decode_header(token)?;

        let chain = header
            .x5c
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Certificate("missing x5c header parameter".to_string()))?;

        let certs = chain
            .iter()
            .map(|c| {
                X509::from_der(&base64::decode_std(c)?)
                    .map_err(|e| Error::Certificate(format!("x5c: {e}")))
            })
            .collect::<Result<Vec<X509>, Error>>()?;

        let leaf = &certs[0];

        self.check_hostname(leaf)?;

        verify_chain(roots, leaf, &certs[1..])?;

        let key = decoding_key(leaf, header.alg)?;

        let mut validation = Validation::new(header.alg);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<SafetyNetClaims>(token, &key, &validation)?;

        Ok(data.claims)
    }

    /// Extract the payload without looking at the signature
    pub fn decode_unverified(token: &str) -> Result<SafetyNetClaims, Error> {
        let segments = base64::split_compact(token, 3)?;

        let payload = base64::decode_str(segments[1])?;

        SafetyNetClaims::decode(&payload)
    }

    fn check_hostname(&self, leaf: &X509) -> Result<(), Error> {
        // raw bytes, so that an embedded NUL cannot truncate the name
        let matched = leaf
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .any(|e| e.data().as_slice() == self.hostname.as_bytes());

        if !matched {
            return Err(Error::Certificate(format!(
                "leaf certificate is not issued to {}",
                self.hostname
            )));
        }

        Ok(())
    }
}

fn verify_chain(roots: &X509Store, leaf: &X509, intermediates: &[X509]) -> Result<(), Error> {
    let mut untrusted = Stack::new().map_err(|e| Error::Certificate(e.to_string()))?;

    for c in intermediates {
        untrusted
            .push(c.clone())
            .map_err(|e| Error::Certificate(e.to_string()))?;
    }

    let mut ctx = X509StoreContext::new().map_err(|e| Error::Certificate(e.to_string()))?;

    let failure = ctx
        .init(roots, leaf, &untrusted, |c| {
            let ok = c.verify_cert()?;
            Ok((!ok).then(|| c.error().error_string().to_string()))
        })
        .map_err(|e| Error::Certificate(e.to_string()))?;

    match failure {
        Some(reason) => Err(Error::Certificate(format!(
            "x5c chain verification failed: {reason}"
        ))),
        None => Ok(()),
    }
}

fn decoding_key(leaf: &X509, alg: Algorithm) -> Result<DecodingKey, Error> {
    let pkey = leaf
        .public_key()
        .map_err(|e| Error::Certificate(e.to_string()))?;

    match alg {
        Algorithm::RS256 => {
            let der = pkey
                .rsa()
                .and_then(|rsa| rsa.public_key_to_der_pkcs1())
                .map_err(|e| Error::Key(e.to_string()))?;

            Ok(DecodingKey::from_rsa_der(&der))
        }
        Algorithm::ES256 => {
            let pem = pkey
                .public_key_to_pem()
                .map_err(|e| Error::Key(e.to_string()))?;

            Ok(DecodingKey::from_ec_pem(&pem)?)
        }
        a => Err(Error::Signature(format!("unsupported algorithm {a:?}"))),
    }
}
