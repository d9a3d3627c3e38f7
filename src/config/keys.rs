// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use base64::{engine::general_purpose, Engine as _};
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey};

const DECRYPTION_KEY_LEN: usize = 32;

/// Key material for decoding Play Integrity tokens locally, as downloaded
/// from the Play Console
#[derive(Clone)]
pub struct KeyMaterial {
    /// AES-256 key wrapping the per-token content encryption key
    pub decryption_key: Vec<u8>,
    /// P-256 public key verifying the inner JWS, PEM encoded
    pub verification_key: Vec<u8>,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("decryption_key", &"<redacted>")
            .field("verification_key", &String::from_utf8_lossy(&self.verification_key))
            .finish()
    }
}

impl KeyMaterial {
    /// Build the key material from its base64 transport form: the raw AES
    /// key, and the DER SubjectPublicKeyInfo of the verification key
    pub fn from_base64(decryption: &str, verification: &str) -> Result<Self, Error> {
        let decryption_key = general_purpose::STANDARD
            .decode(decryption.trim())
            .map_err(|e| Error::Key(format!("decryption key: {e}")))?;

        if decryption_key.len() != DECRYPTION_KEY_LEN {
            return Err(Error::Key(format!(
                "decryption key: expecting {DECRYPTION_KEY_LEN} bytes, got {}",
                decryption_key.len()
            )));
        }

        let der = general_purpose::STANDARD
            .decode(verification.trim())
            .map_err(|e| Error::Key(format!("verification key: {e}")))?;

        let pkey = PKey::public_key_from_der(&der)
            .map_err(|e| Error::Key(format!("verification key: {e}")))?;

        if pkey.id() != Id::EC {
            return Err(Error::Key(
                "verification key: expecting an EC public key".to_string(),
            ));
        }

        let curve = pkey
            .ec_key()
            .map_err(|e| Error::Key(format!("verification key: {e}")))?
            .group()
            .curve_name();

        if curve != Some(Nid::X9_62_PRIME256V1) {
            return Err(Error::Key(format!(
                "verification key: expecting a P-256 key, got {curve:?}"
            )));
        }

        let verification_key = pkey
            .public_key_to_pem()
            .map_err(|e| Error::Key(format!("verification key: {e}")))?;

        Ok(Self {
            decryption_key,
            verification_key,
        })
    }
}
