// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use base64::{self, engine::general_purpose, Engine as _};

use super::errors::Error;

/// decodes bytes from a base64url-encoded, unpadded JOSE segment
pub fn decode_str(v: &str) -> Result<Vec<u8>, Error> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(v)
        .map_err(|e| Error::Syntax(e.to_string()))
}

/// decodes bytes from a standard base64 string, as used in `x5c` headers
pub fn decode_std(v: &str) -> Result<Vec<u8>, Error> {
    general_purpose::STANDARD
        .decode(v)
        .map_err(|e| Error::Syntax(e.to_string()))
}

/// splits a compact JOSE serialisation into exactly `n` segments
pub fn split_compact(token: &str, n: usize) -> Result<Vec<&str>, Error> {
    let segments: Vec<&str> = token.trim().split('.').collect();

    if segments.len() != n {
        return Err(Error::Syntax(format!(
            "expecting {n} compact segments, got {}",
            segments.len()
        )));
    }

    Ok(segments)
}
