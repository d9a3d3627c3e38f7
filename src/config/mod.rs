// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Process-wide configuration, loaded once at startup.  The attestation policy
//! comes from a JSON file, key material and credentials from the environment.
//! Anything missing or malformed is reported as an [`Error`] and is meant to
//! stop the process before it serves a request.

pub use self::credentials::ServiceAccount;
pub use self::errors::Error;
pub use self::keys::KeyMaterial;
pub use self::policy::{
    AuthorityConfig, DigestPolicy, ErrorLevel, PolicyConfig, SafetyNetConfig,
    DEFAULT_FRESHNESS_MILLIS,
};

mod credentials;
mod errors;
mod keys;
mod policy;

pub const PACKAGE_NAME_VAR: &str = "PACKAGE_NAME";
pub const CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const DECRYPTION_KEY_VAR: &str = "BASE64_OF_ENCODED_DECRYPTION_KEY";
pub const VERIFICATION_KEY_VAR: &str = "BASE64_OF_ENCODED_VERIFICATION_KEY";

/// Everything the verification service needs at startup
#[derive(Clone, Debug)]
pub struct Settings {
    pub policy: PolicyConfig,
    pub keys: KeyMaterial,
    /// Only needed when tokens are decoded by the remote authority
    pub credentials: Option<ServiceAccount>,
}

impl Settings {
    /// Combine the JSON policy file with the process environment
    pub fn from_env(policy_json: &str) -> Result<Self, Error> {
        Self::from_lookup(policy_json, |k| std::env::var(k).ok())
    }

    /// Combine the JSON policy file with variables obtained from `lookup`.
    /// `PACKAGE_NAME` overrides the file's `packageName`.
    pub fn from_lookup<F>(policy_json: &str, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut policy = PolicyConfig::load_json(policy_json)?;

        if let Some(p) = lookup(PACKAGE_NAME_VAR).filter(|p| !p.is_empty()) {
            policy.package_name = p;
        }

        if policy.package_name.is_empty() {
            return Err(Error::Missing(PACKAGE_NAME_VAR.to_string()));
        }

        let decryption =
            lookup(DECRYPTION_KEY_VAR).ok_or_else(|| Error::Missing(DECRYPTION_KEY_VAR.to_string()))?;
        let verification = lookup(VERIFICATION_KEY_VAR)
            .ok_or_else(|| Error::Missing(VERIFICATION_KEY_VAR.to_string()))?;

        let keys = KeyMaterial::from_base64(&decryption, &verification)?;

        let credentials = lookup(CREDENTIALS_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(|v| ServiceAccount::load(&v))
            .transpose()?;

        Ok(Self {
            policy,
            keys,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use openssl::ec::{EcGroup, EcKey};
    use openssl::nid::Nid;
    use openssl::pkey::PKey;
    use std::collections::HashMap;

    const TEST_POLICY: &str = r#"{
        "packageName": "com.example.file",
        "validCertificateSha256Digest": ["d"],
        "errorLevel": "log"
    }"#;

    fn env() -> HashMap<&'static str, String> {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let pkey = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

        HashMap::from([
            (
                DECRYPTION_KEY_VAR,
                general_purpose::STANDARD.encode([1u8; 32]),
            ),
            (
                VERIFICATION_KEY_VAR,
                general_purpose::STANDARD.encode(pkey.public_key_to_der().unwrap()),
            ),
        ])
    }

    #[test]
    fn package_name_from_file() {
        let vars = env();

        let s = Settings::from_lookup(TEST_POLICY, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(s.policy.package_name, "com.example.file");
        assert!(s.credentials.is_none());
    }

    #[test]
    fn package_name_from_env_wins() {
        let mut vars = env();
        vars.insert(PACKAGE_NAME_VAR, "com.example.env".to_string());

        let s = Settings::from_lookup(TEST_POLICY, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(s.policy.package_name, "com.example.env");
    }

    #[test]
    fn package_name_missing() {
        let vars = env();
        let policy = r#"{ "validCertificateSha256Digest": ["d"], "errorLevel": "log" }"#;

        let r = Settings::from_lookup(policy, |k| vars.get(k).cloned());

        assert_eq!(r.unwrap_err(), Error::Missing(PACKAGE_NAME_VAR.to_string()));
    }

    #[test]
    fn decryption_key_missing() {
        let mut vars = env();
        vars.remove(DECRYPTION_KEY_VAR);

        let r = Settings::from_lookup(TEST_POLICY, |k| vars.get(k).cloned());

        assert_eq!(r.unwrap_err(), Error::Missing(DECRYPTION_KEY_VAR.to_string()));
    }

    #[test]
    fn credentials_inline() {
        let mut vars = env();
        vars.insert(
            CREDENTIALS_VAR,
            r#"{ "client_email": "a@b", "private_key": "pem" }"#.to_string(),
        );

        let s = Settings::from_lookup(TEST_POLICY, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(s.credentials.unwrap().client_email, "a@b");
    }
}
