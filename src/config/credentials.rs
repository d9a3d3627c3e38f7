// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::Deserialize;
use std::fs;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a Google service-account key file needed to call the Play
/// Integrity API
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    /// PKCS#8 PEM encoded RSA private key
    pub private_key: String,
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// Parse a service-account key file
    pub fn from_json(j: &str) -> Result<Self, Error> {
        let sa: ServiceAccount =
            serde_json::from_str(j).map_err(|e| Error::Syntax(format!("service account: {e}")))?;

        if sa.client_email.is_empty() {
            return Err(Error::Missing("client_email".to_string()));
        }

        if sa.private_key.is_empty() {
            return Err(Error::Missing("private_key".to_string()));
        }

        Ok(sa)
    }

    /// Accept either the key file contents or a path to the key file
    pub fn load(v: &str) -> Result<Self, Error> {
        let v = v.trim();

        if v.starts_with('{') {
            return Self::from_json(v);
        }

        let j = fs::read_to_string(v).map_err(|e| Error::Syntax(format!("reading {v}: {e}")))?;

        Self::from_json(&j)
    }
}
