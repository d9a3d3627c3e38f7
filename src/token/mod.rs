// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The token module decodes the two supported attestation token formats into
//! their claims-sets:
//!
//! * Play Integrity tokens, either locally with the app's key material
//!   ([`LocalDecoder`]) or through the remote authority ([`IAuthority`]);
//! * SafetyNet attestation statements ([`SafetyNetDecoder`]).
//!
//! Decoding establishes authenticity only.  Whether the claims are acceptable
//! is decided by [`crate::verdict`].
//!
//! # Example
//!
//! ```
//! use integritytoken::config::KeyMaterial;
//! use integritytoken::token::{Error, LocalDecoder};
//!
//! fn nonce_of(keys: &KeyMaterial, token: &str) -> Result<Option<String>, Error> {
//!     let claims = LocalDecoder::new(keys)?.decode(token)?;
//!
//!     Ok(claims.request_details.and_then(|rd| rd.nonce))
//! }
//! ```

pub use self::claims::Claims;
pub use self::digest::CertificateDigest;
pub use self::errors::Error;
pub use self::iauthority::IAuthority;
pub use self::integrity::*;
pub use self::local::LocalDecoder;
pub use self::play_authority::PlayIntegrityAuthority;
pub use self::safetynet::{SafetyNetClaims, SafetyNetDecoder};

mod base64;
mod claims;
mod digest;
mod errors;
mod iauthority;
mod integrity;
mod jwe;
mod local;
mod play_authority;
mod safetynet;

#[cfg(test)]
pub(crate) mod testutil;
