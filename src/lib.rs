// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Android device and app attestation token verification and appraisal.
//!
//! This crate provides an API to decode, verify and appraise the attestation
//! tokens a backend receives from Android clients: Play Integrity tokens and
//! the older SafetyNet attestation JWS.
//!
//! The API allows:
//! * Issuing single-use challenge nonces and detecting their replay
//! * Decrypting and verifying a Play Integrity token locally, or delegating
//!   its verification to the Play Integrity service
//! * Decoding (and verifying the signing chain of) a SafetyNet JWS
//! * Appraising the decoded claims against a policy, aborting on the first
//!   failure or logging every failure depending on the configured error level

pub mod config;
pub mod nonce;
pub mod service;
pub mod token;
pub mod verdict;
