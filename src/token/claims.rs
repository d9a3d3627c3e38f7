// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::integrity::IntegrityClaims;
use super::safetynet::SafetyNetClaims;
use serde::Serialize;

/// A decoded claims-set of either supported format
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Claims {
    Integrity(IntegrityClaims),
    SafetyNet(SafetyNetClaims),
}

impl From<IntegrityClaims> for Claims {
    fn from(c: IntegrityClaims) -> Self {
        Claims::Integrity(c)
    }
}

impl From<SafetyNetClaims> for Claims {
    fn from(c: SafetyNetClaims) -> Self {
        Claims::SafetyNet(c)
    }
}
