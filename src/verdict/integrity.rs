// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::evaluation::{Aborted, Evaluation, Verdict};
use super::gate::{Check, PolicyGate};
use super::NonceCheckMode;
use crate::config::PolicyConfig;
use crate::nonce::NonceLedger;
use crate::token::{
    AccountDetails, AppIntegrity, DeviceIntegrity, IntegrityClaims, RequestDetails, LICENSED,
    MEETS_BASIC_INTEGRITY, MEETS_DEVICE_INTEGRITY, MEETS_STRONG_INTEGRITY,
    MEETS_VIRTUAL_INTEGRITY, PLAY_RECOGNIZED,
};

/// Appraises Play Integrity claims against the attestation policy
pub struct IntegrityEvaluator<'a> {
    policy: &'a PolicyConfig,
    ledger: &'a NonceLedger,
    gate: PolicyGate,
}

impl<'a> IntegrityEvaluator<'a> {
    pub fn new(policy: &'a PolicyConfig, ledger: &'a NonceLedger) -> Self {
        Self {
            policy,
            ledger,
            gate: PolicyGate::new(policy.error_level.clone()),
        }
    }

    /// Run every check on `claims` as of `now` (epoch milliseconds).  Under
    /// the `abort` error level, evaluation stops at the first failure.
    pub fn evaluate(&self, claims: &IntegrityClaims, mode: NonceCheckMode, now: i64) -> Verdict {
        let mut eval = Evaluation::new(&self.gate);

        let outcome = self.run(&mut eval, claims, mode, now);

        let verdict = eval.finish(outcome);

        if verdict.passed {
            tracing::info!("Play Integrity checks passed");
        } else {
            tracing::warn!(failures = verdict.failures.len(), "Play Integrity checks failed");
        }

        verdict
    }

    fn run(
        &self,
        eval: &mut Evaluation,
        claims: &IntegrityClaims,
        mode: NonceCheckMode,
        now: i64,
    ) -> Result<(), Aborted> {
        match &claims.request_details {
            Some(rd) => self.request_details(eval, rd, mode, now)?,
            None => eval.fail(
                Check::MissingRequestDetails,
                "requestDetails not found in received token",
            )?,
        }

        match &claims.app_integrity {
            Some(ai) => self.app_integrity(eval, ai)?,
            None => eval.fail(
                Check::MissingAppIntegrity,
                "appIntegrity not found in received token",
            )?,
        }

        match &claims.device_integrity {
            Some(di) => self.device_integrity(eval, di)?,
            None => eval.fail(
                Check::MissingDeviceIntegrity,
                "deviceIntegrity not found in received token",
            )?,
        }

        match &claims.account_details {
            Some(ad) => self.account_details(eval, ad)?,
            None => eval.fail(
                Check::MissingAccountDetails,
                "accountDetails not found in received token",
            )?,
        }

        Ok(())
    }

    fn request_details(
        &self,
        eval: &mut Evaluation,
        rd: &RequestDetails,
        mode: NonceCheckMode,
        now: i64,
    ) -> Result<(), Aborted> {
        let mut ok = eval.nonce(self.ledger, mode, rd.nonce.as_deref())?;

        ok &= eval.require(
            rd.request_package_name.as_deref() == Some(self.policy.package_name.as_str()),
            Check::RequestPackageName,
            "Invalid package name",
        )?;

        ok &= eval.freshness(rd.timestamp_millis, now, self.policy.freshness_millis)?;

        if ok {
            tracing::info!("Attested Device has valid requestDetails");
        }

        Ok(())
    }

    fn app_integrity(&self, eval: &mut Evaluation, ai: &AppIntegrity) -> Result<(), Aborted> {
        let verdict = ai.app_recognition_verdict.as_deref();

        let mut ok = eval.require(
            verdict == Some(PLAY_RECOGNIZED),
            Check::AppRecognition,
            format!("appRecognitionVerdict is {}.", verdict.unwrap_or("missing")),
        )?;

        ok &= eval.require(
            ai.package_name.as_deref() == Some(self.policy.package_name.as_str()),
            Check::AppPackageName,
            "Invalid package name",
        )?;

        ok &= eval.require(
            self.policy.certificate_digest_policy.accepts(
                ai.certificate_sha256_digest.as_deref(),
                &self.policy.valid_certificate_sha256_digest,
            ),
            Check::CertificateDigest,
            "Invalid certificateSha256Digest",
        )?;

        if ok {
            tracing::info!("Attested Device has valid appIntegrity");
        }

        Ok(())
    }

    fn device_integrity(&self, eval: &mut Evaluation, di: &DeviceIntegrity) -> Result<(), Aborted> {
        // a virtual device is rejected whatever else it claims
        if di.has_label(MEETS_VIRTUAL_INTEGRITY) {
            return eval.fail(Check::Emulator, "Emulator got attested");
        }

        let recognized = [
            MEETS_DEVICE_INTEGRITY,
            MEETS_BASIC_INTEGRITY,
            MEETS_STRONG_INTEGRITY,
        ]
        .iter()
        .any(|l| di.has_label(l));

        if !recognized {
            return eval.fail(
                Check::DeviceRecognition,
                "Attested Device doesn't meet requirements. deviceRecognitionVerdict field is empty",
            );
        }

        tracing::info!(
            labels = ?di.device_recognition_verdict.as_deref().unwrap_or_default(),
            "Attested Device has valid deviceRecognitionVerdict"
        );

        Ok(())
    }

    fn account_details(&self, eval: &mut Evaluation, ad: &AccountDetails) -> Result<(), Aborted> {
        let verdict = ad.app_licensing_verdict.as_deref();

        if eval.require(
            verdict == Some(LICENSED),
            Check::Licensing,
            format!("appLicensingVerdict is {}", verdict.unwrap_or("missing")),
        )? {
            tracing::info!("Attested Device uses a licensed version of the Android App");
        }

        Ok(())
    }
}
