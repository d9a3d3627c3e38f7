// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::base64;
use super::errors::Error;
use openssl::aes::{unwrap_key, AesKey};
use openssl::symm::{decrypt_aead, Cipher};
use serde::Deserialize;

const KEY_LEN: usize = 32;
const WRAPPED_KEY_LEN: usize = KEY_LEN + 8;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Deserialize)]
struct ProtectedHeader {
    alg: String,
    enc: String,
    zip: Option<String>,
}

/// Decrypt a compact JWE protected with `A256KW` key wrapping and `A256GCM`
/// content encryption, returning the plaintext
pub fn decrypt(token: &str, key: &[u8]) -> Result<Vec<u8>, Error> {
    let segments = base64::split_compact(token, 5)?;

    let header: ProtectedHeader = serde_json::from_slice(&base64::decode_str(segments[0])?)
        .map_err(|e| Error::Syntax(format!("JWE protected header: {e}")))?;

    if header.alg != "A256KW" {
        return Err(Error::Decrypt(format!(
            "unsupported key management algorithm {}",
            header.alg
        )));
    }

    if header.enc != "A256GCM" {
        return Err(Error::Decrypt(format!(
            "unsupported content encryption {}",
            header.enc
        )));
    }

    if let Some(zip) = header.zip {
        return Err(Error::Decrypt(format!("unsupported compression {zip}")));
    }

    let wrapped = base64::decode_str(segments[1])?;
    let iv = base64::decode_str(segments[2])?;
    let ciphertext = base64::decode_str(segments[3])?;
    let tag = base64::decode_str(segments[4])?;

    if key.len() != KEY_LEN {
        return Err(Error::Key(format!(
            "expecting a {KEY_LEN} bytes key-wrapping key, got {}",
            key.len()
        )));
    }

    if wrapped.len() != WRAPPED_KEY_LEN {
        return Err(Error::Decrypt(format!(
            "expecting a {WRAPPED_KEY_LEN} bytes encrypted key, got {}",
            wrapped.len()
        )));
    }

    if iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(Error::Decrypt(format!(
            "bad IV ({}) or tag ({}) length",
            iv.len(),
            tag.len()
        )));
    }

    let kek = AesKey::new_decrypt(key).map_err(|_| Error::Key("bad AES key".to_string()))?;

    let mut cek = [0u8; KEY_LEN];
    unwrap_key(&kek, None, &mut cek, &wrapped)
        .map_err(|_| Error::Decrypt("content encryption key unwrap failed".to_string()))?;

    // the AAD is the ASCII protected header segment as transmitted
    decrypt_aead(
        Cipher::aes_256_gcm(),
        &cek,
        Some(&iv),
        segments[0].as_bytes(),
        &ciphertext,
        &tag,
    )
    .map_err(|e| Error::Decrypt(format!("content decryption failed: {e}")))
}
