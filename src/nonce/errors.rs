// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("nonce is not valid base64: {0}")]
    Encoding(String),
    #[error("nonce is not valid UTF-8: {0}")]
    Utf8(String),
}
