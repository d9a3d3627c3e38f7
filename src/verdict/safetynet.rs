// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::evaluation::{Aborted, Evaluation, Verdict};
use super::gate::{Check, PolicyGate};
use super::NonceCheckMode;
use crate::config::PolicyConfig;
use crate::nonce::NonceLedger;
use crate::token::SafetyNetClaims;

/// Appraises SafetyNet claims against the attestation policy
pub struct SafetyNetEvaluator<'a> {
    policy: &'a PolicyConfig,
    ledger: &'a NonceLedger,
    gate: PolicyGate,
}

impl<'a> SafetyNetEvaluator<'a> {
    pub fn new(policy: &'a PolicyConfig, ledger: &'a NonceLedger) -> Self {
        Self {
            policy,
            ledger,
            gate: PolicyGate::new(policy.error_level.clone()),
        }
    }

    pub fn evaluate(&self, claims: &SafetyNetClaims, mode: NonceCheckMode, now: i64) -> Verdict {
        let mut eval = Evaluation::new(&self.gate);

        let outcome = self.run(&mut eval, claims, mode, now);

        let verdict = eval.finish(outcome);

        if verdict.passed {
            tracing::info!("SafetyNet checks passed");
        } else {
            tracing::warn!(failures = verdict.failures.len(), "SafetyNet checks failed");
        }

        verdict
    }

    fn run(
        &self,
        eval: &mut Evaluation,
        c: &SafetyNetClaims,
        mode: NonceCheckMode,
        now: i64,
    ) -> Result<(), Aborted> {
        eval.nonce(self.ledger, mode, c.nonce.as_deref())?;

        eval.freshness(c.timestamp_ms, now, self.policy.freshness_millis)?;

        eval.require(
            c.apk_package_name.as_deref() == Some(self.policy.package_name.as_str()),
            Check::PackageName,
            "Invalid package name",
        )?;

        tracing::info!(
            evaluation_type = c.evaluation_type.as_deref().unwrap_or("unknown"),
            "Using {} to evaluate device integrity.",
            c.evaluation_type.as_deref().unwrap_or("unknown")
        );

        eval.require(
            c.basic_integrity == Some(true),
            Check::BasicIntegrity,
            "Basic integrity check failed",
        )?;

        if c.cts_profile_match != Some(true) {
            tracing::info!("Evaluation type is BASIC, skipping CTS profile check");
            return Ok(());
        }

        // digests are only meaningful once the CTS profile matched
        eval.require(
            self.policy.valid_certificate_sha256_digest.iter().any(|t| {
                c.apk_certificate_digest_sha256
                    .as_deref()
                    .unwrap_or_default()
                    .contains(t)
            }),
            Check::CertificateDigest,
            "Invalid apk certificate digest",
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::testutil::{safetynet_payload, test_policy, TEST_DIGEST, TEST_PACKAGE};
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::{json, Value};
    use tracing_test::traced_test;

    const NOW: i64 = 1_700_000_000_000;

    fn claims(v: &Value) -> SafetyNetClaims {
        serde_json::from_value(v.clone()).unwrap()
    }

    // SafetyNet echoes the raw nonce bytes back in standard base64
    fn fresh(ledger: &NonceLedger) -> Value {
        let n = ledger.issue(50);
        let echoed = general_purpose::STANDARD.encode(n.as_str());

        safetynet_payload(&echoed, NOW - 500, TEST_PACKAGE, TEST_DIGEST)
    }

    #[test]
    fn genuine_statement_passes() {
        let policy = test_policy("error");
        let ledger = NonceLedger::new();
        let e = SafetyNetEvaluator::new(&policy, &ledger);

        let v = e.evaluate(&claims(&fresh(&ledger)), NonceCheckMode::Server, NOW);

        assert!(v.passed, "{:?}", v.failures);
    }

    #[test]
    fn basic_integrity_false_aborts() {
        let policy = test_policy("error");
        let ledger = NonceLedger::new();
        let e = SafetyNetEvaluator::new(&policy, &ledger);
        let mut p = fresh(&ledger);
        p["basicIntegrity"] = json!(false);
        p["apkCertificateDigestSha256"] = json!(["untrusted"]);

        let v = e.evaluate(&claims(&p), NonceCheckMode::Server, NOW);

        assert!(!v.passed);
        assert_eq!(v.failures.len(), 1);
        assert_eq!(v.aborted.unwrap().message, "Basic integrity check failed");
    }

    #[traced_test]
    #[test]
    fn basic_integrity_false_logs_the_rest() {
        let policy = test_policy("log");
        let ledger = NonceLedger::new();
        let e = SafetyNetEvaluator::new(&policy, &ledger);
        let mut p = fresh(&ledger);
        p["basicIntegrity"] = json!(false);
        p["apkCertificateDigestSha256"] = json!(["untrusted"]);

        let v = e.evaluate(&claims(&p), NonceCheckMode::Server, NOW);

        assert!(!v.passed);
        assert!(v.aborted.is_none());
        let checks: Vec<Check> = v.failures.iter().map(|f| f.check).collect();
        assert_eq!(checks, vec![Check::BasicIntegrity, Check::CertificateDigest]);
        assert!(logs_contain("Invalid apk certificate digest"));
        assert!(logs_contain("SafetyNet checks failed"));
    }

    #[test]
    fn basic_integrity_missing_fails() {
        for level in ["error", "log"] {
            let policy = test_policy(level);
            let ledger = NonceLedger::new();
            let e = SafetyNetEvaluator::new(&policy, &ledger);
            let mut p = fresh(&ledger);
            p.as_object_mut().unwrap().remove("basicIntegrity");

            let v = e.evaluate(&claims(&p), NonceCheckMode::Server, NOW);

            assert!(!v.passed, "{level}");
            assert!(v.failed(Check::BasicIntegrity), "{level}");
            assert_eq!(v.failures.len(), 1, "{level}");
            assert_eq!(v.aborted.is_some(), level == "error");
        }
    }

    #[traced_test]
    #[test]
    fn cts_mismatch_skips_digest_check() {
        let policy = test_policy("error");
        let ledger = NonceLedger::new();
        let e = SafetyNetEvaluator::new(&policy, &ledger);
        let mut p = fresh(&ledger);
        p["ctsProfileMatch"] = json!(false);
        p["evaluationType"] = json!("BASIC");
        p["apkCertificateDigestSha256"] = json!(["untrusted"]);

        let v = e.evaluate(&claims(&p), NonceCheckMode::Server, NOW);

        assert!(v.passed, "{:?}", v.failures);
        assert!(logs_contain("skipping CTS profile check"));
        assert!(logs_contain("Using BASIC to evaluate device integrity."));
    }

    #[test]
    fn cts_missing_skips_digest_check() {
        let policy = test_policy("error");
        let ledger = NonceLedger::new();
        let e = SafetyNetEvaluator::new(&policy, &ledger);
        let mut p = fresh(&ledger);
        p.as_object_mut().unwrap().remove("ctsProfileMatch");
        p.as_object_mut().unwrap().remove("apkCertificateDigestSha256");

        assert!(e.evaluate(&claims(&p), NonceCheckMode::Server, NOW).passed);
    }

    #[test]
    fn untrusted_digest_fails() {
        let policy = test_policy("error");
        let ledger = NonceLedger::new();
        let e = SafetyNetEvaluator::new(&policy, &ledger);
        let mut p = fresh(&ledger);
        p["apkCertificateDigestSha256"] = json!(["untrusted"]);

        let v = e.evaluate(&claims(&p), NonceCheckMode::Server, NOW);

        assert_eq!(v.aborted.unwrap().check, Check::CertificateDigest);
    }

    #[test]
    fn stale_wrong_package_and_replay() {
        let policy = test_policy("log");
        let ledger = NonceLedger::new();
        let e = SafetyNetEvaluator::new(&policy, &ledger);
        let mut p = fresh(&ledger);
        p["timestampMs"] = json!(NOW - 60_000);
        p["apkPackageName"] = json!("com.example.other");

        let first = e.evaluate(&claims(&p), NonceCheckMode::Server, NOW);
        let checks: Vec<Check> = first.failures.iter().map(|f| f.check).collect();
        assert_eq!(checks, vec![Check::Timestamp, Check::PackageName]);

        let again = e.evaluate(&claims(&p), NonceCheckMode::Server, NOW);
        assert!(again.failed(Check::ReplayedNonce));
    }

    #[test]
    fn device_nonce_skipped() {
        let policy = test_policy("error");
        let ledger = NonceLedger::new();
        let e = SafetyNetEvaluator::new(&policy, &ledger);
        let p = safetynet_payload("bm90LWlzc3VlZA==", NOW, TEST_PACKAGE, TEST_DIGEST);

        assert!(!e.evaluate(&claims(&p), NonceCheckMode::Server, NOW).passed);
        assert!(e.evaluate(&claims(&p), NonceCheckMode::Skip, NOW).passed);
    }
}
