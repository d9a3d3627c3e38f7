// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::integrity::IntegrityClaims;
use super::jwe;
use crate::config::KeyMaterial;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

/// Decodes Play Integrity tokens with the app's own key material: unwrap the
/// JWE with the AES key, then verify the nested ES256 JWS
pub struct LocalDecoder {
    decryption_key: Vec<u8>,
    verification_key: DecodingKey,
    validation: Validation,
}

impl LocalDecoder {
    pub fn new(keys: &KeyMaterial) -> Result<Self, Error> {
        let verification_key = DecodingKey::from_ec_pem(&keys.verification_key)?;

        let mut validation = Validation::new(Algorithm::ES256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        Ok(Self {
            decryption_key: keys.decryption_key.clone(),
            verification_key,
            validation,
        })
    }

    pub fn decode(&self, token: &str) -> Result<IntegrityClaims, Error> {
        let plaintext = jwe::decrypt(token, &self.decryption_key)?;

        let jws = std::str::from_utf8(&plaintext)
            .map_err(|e| Error::Syntax(format!("nested JWS: {e}")))?;

        let data = jsonwebtoken::decode::<IntegrityClaims>(
            jws.trim(),
            &self.verification_key,
            &self.validation,
        )?;

        Ok(data.claims)
    }
}
