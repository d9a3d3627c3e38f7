// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Token minting helpers shared by unit tests

use crate::config::{KeyMaterial, PolicyConfig};
use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use openssl::aes::{wrap_key, AesKey};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rand::rand_bytes;
use openssl::rsa::Rsa;
use openssl::symm::{encrypt_aead, Cipher};
use openssl::x509::extension::BasicConstraints;
use openssl::x509::{X509NameBuilder, X509};
use serde_json::{json, Value};

pub const TEST_PACKAGE: &str = "com.example.app";
pub const TEST_DIGEST: &str = "p7hGQpMaE1UjeYo2RUpKcYYWOVIzC-QLT0gnsm-k0Qc";

pub fn test_policy(error_level: &str) -> PolicyConfig {
    let j = json!({
        "packageName": TEST_PACKAGE,
        "validCertificateSha256Digest": [TEST_DIGEST],
        "errorLevel": error_level,
    });

    PolicyConfig::load_json(&j.to_string()).unwrap()
}

/// Play Integrity claims that pass every check against [`test_policy`]
pub fn integrity_payload(nonce: &str, timestamp_millis: i64) -> Value {
    json!({
        "requestDetails": {
            "requestPackageName": TEST_PACKAGE,
            "timestampMillis": timestamp_millis.to_string(),
            "nonce": nonce,
        },
        "appIntegrity": {
            "appRecognitionVerdict": "PLAY_RECOGNIZED",
            "packageName": TEST_PACKAGE,
            "certificateSha256Digest": [TEST_DIGEST],
            "versionCode": "7",
        },
        "deviceIntegrity": {
            "deviceRecognitionVerdict": ["MEETS_DEVICE_INTEGRITY"],
        },
        "accountDetails": {
            "appLicensingVerdict": "LICENSED",
        },
    })
}

pub fn safetynet_payload(nonce: &str, timestamp_ms: i64, package: &str, digest: &str) -> Value {
    json!({
        "nonce": nonce,
        "timestampMs": timestamp_ms,
        "apkPackageName": package,
        "apkCertificateDigestSha256": [digest],
        "basicIntegrity": true,
        "ctsProfileMatch": true,
        "evaluationType": "BASIC,HARDWARE_BACKED",
    })
}

/// Wrap `plaintext` in a compact A256KW/A256GCM JWE
pub fn encrypt_a256kw(plaintext: &[u8], key: &[u8]) -> String {
    let mut cek = [0u8; 32];
    rand_bytes(&mut cek).unwrap();

    let mut iv = [0u8; 12];
    rand_bytes(&mut iv).unwrap();

    let kek = AesKey::new_encrypt(key).unwrap();
    let mut wrapped = [0u8; 40];
    wrap_key(&kek, None, &mut wrapped, &cek).unwrap();

    let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"A256KW","enc":"A256GCM"}"#);

    let mut tag = [0u8; 16];
    let ct = encrypt_aead(
        Cipher::aes_256_gcm(),
        &cek,
        Some(&iv),
        header.as_bytes(),
        plaintext,
        &mut tag,
    )
    .unwrap();

    [
        header,
        general_purpose::URL_SAFE_NO_PAD.encode(wrapped),
        general_purpose::URL_SAFE_NO_PAD.encode(iv),
        general_purpose::URL_SAFE_NO_PAD.encode(ct),
        general_purpose::URL_SAFE_NO_PAD.encode(tag),
    ]
    .join(".")
}

/// An app's Play Integrity key pair: the AES wrapping key and the P-256
/// signing key
pub struct TestKeys {
    pub aes: [u8; 32],
    ec: PKey<Private>,
}

impl TestKeys {
    pub fn new() -> Self {
        let mut aes = [0u8; 32];
        rand_bytes(&mut aes).unwrap();

        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

        Self { aes, ec }
    }

    pub fn material(&self) -> KeyMaterial {
        KeyMaterial {
            decryption_key: self.aes.to_vec(),
            verification_key: self.ec.public_key_to_pem().unwrap(),
        }
    }

    pub fn sign_es256(&self, payload: &Value) -> String {
        let pem = self.ec.private_key_to_pem_pkcs8().unwrap();

        jsonwebtoken::encode(
            &Header::new(Algorithm::ES256),
            payload,
            &EncodingKey::from_ec_pem(&pem).unwrap(),
        )
        .unwrap()
    }

    pub fn integrity_token(&self, payload: &Value) -> String {
        encrypt_a256kw(self.sign_es256(payload).as_bytes(), &self.aes)
    }
}

/// A self-signed RSA certificate and its key, standing in for the SafetyNet
/// attestation signer
pub struct CertSigner {
    key: PKey<Private>,
    cert: X509,
}

impl CertSigner {
    pub fn new(common_name: &str) -> Self {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::COMMONNAME, common_name)
            .unwrap();
        let name = name.build();

        let mut b = X509::builder().unwrap();
        b.set_version(2).unwrap();
        let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
        b.set_serial_number(&serial).unwrap();
        b.set_subject_name(&name).unwrap();
        b.set_issuer_name(&name).unwrap();
        b.set_pubkey(&key).unwrap();
        b.set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        b.set_not_after(&Asn1Time::days_from_now(1).unwrap())
            .unwrap();
        b.append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        b.sign(&key, MessageDigest::sha256()).unwrap();

        Self {
            key,
            cert: b.build(),
        }
    }

    pub fn cert_pem(&self) -> String {
        String::from_utf8(self.cert.to_pem().unwrap()).unwrap()
    }

    pub fn cert_der(&self) -> Vec<u8> {
        self.cert.to_der().unwrap()
    }

    /// PKCS#8 PEM, the form found in service-account key files
    pub fn private_key_pem(&self) -> String {
        String::from_utf8(self.key.private_key_to_pem_pkcs8().unwrap()).unwrap()
    }

    pub fn public_key_pem(&self) -> Vec<u8> {
        self.key.public_key_to_pem().unwrap()
    }

    pub fn sign(&self, payload: &Value) -> String {
        self.sign_with_chain_of(self, payload)
    }

    /// Sign with this key but advertise `other`'s certificate in `x5c`
    pub fn sign_with_chain_of(&self, other: &CertSigner, payload: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.x5c = Some(vec![general_purpose::STANDARD.encode(other.cert_der())]);

        self.encode(&header, payload)
    }

    pub fn sign_without_chain(&self, payload: &Value) -> String {
        self.encode(&Header::new(Algorithm::RS256), payload)
    }

    fn encode(&self, header: &Header, payload: &Value) -> String {
        let pem = self.key.rsa().unwrap().private_key_to_pem().unwrap();

        jsonwebtoken::encode(header, payload, &EncodingKey::from_rsa_pem(&pem).unwrap()).unwrap()
    }
}
