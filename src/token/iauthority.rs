// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::integrity::IntegrityClaims;
use async_trait::async_trait;

/// Interface to the remote service able to decrypt and verify Play Integrity
/// tokens on behalf of an app.
#[async_trait]
pub trait IAuthority: Send + Sync {
    /// Exchange an opaque integrity token issued for `package_name` for its
    /// decoded claims-set.  Any failure (transport, credentials, rejection) is
    /// reported as [`Error::Authority`].
    async fn decode_integrity_token(
        &self,
        package_name: &str,
        token: &str,
    ) -> Result<IntegrityClaims, Error>;
}
