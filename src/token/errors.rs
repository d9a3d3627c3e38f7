// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Decryption failed: {0}")]
    Decrypt(String),
    #[error("Signature verification failed: {0}")]
    Signature(String),
    #[error("Certificate error: {0}")]
    Certificate(String),
    #[error("Malformed claims: {0}")]
    Claims(String),
    #[error("Key error: {0}")]
    Key(String),
    #[error("Attestation authority error: {0}")]
    Authority(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Syntax(e)
            | Error::Decrypt(e)
            | Error::Signature(e)
            | Error::Certificate(e)
            | Error::Claims(e)
            | Error::Key(e)
            | Error::Authority(e) => {
                write!(f, "{}", e)
            }
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => Error::Signature(e.to_string()),
            ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Error::Key(e.to_string())
            }
            ErrorKind::Json(_) => Error::Claims(e.to_string()),
            _ => Error::Syntax(e.to_string()),
        }
    }
}
