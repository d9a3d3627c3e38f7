// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The request boundary of the verifier.  A [`Service`] owns the nonce ledger
//! and the token decoders, and turns check requests into the status and body a
//! router would return.

pub use self::errors::Error;
pub use self::request::{CheckRequest, CheckResponse, DecodeMode, Format};

mod errors;
mod request;

use crate::config::{PolicyConfig, Settings};
use crate::nonce::NonceLedger;
use crate::token::{
    Claims, IAuthority, IntegrityClaims, LocalDecoder, PlayIntegrityAuthority, SafetyNetDecoder,
};
use crate::verdict::{self, IntegrityEvaluator, NonceCheckMode, SafetyNetEvaluator, Verdict};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Instrument;

pub struct Service {
    policy: PolicyConfig,
    ledger: NonceLedger,
    local: LocalDecoder,
    safetynet: SafetyNetDecoder,
    authority: Option<Box<dyn IAuthority>>,
    requests: AtomicU64,
}

impl Service {
    /// Build the service from the startup settings.  The remote authority is
    /// only available if service-account credentials were configured.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        let local =
            LocalDecoder::new(&settings.keys).map_err(|e| Error::Setup(e.to_string()))?;

        let safetynet = SafetyNetDecoder::new(&settings.policy.safety_net)
            .map_err(|e| Error::Setup(e.to_string()))?;

        let authority = match settings.credentials {
            Some(sa) => {
                let a = PlayIntegrityAuthority::new(sa, &settings.policy.authority)
                    .map_err(|e| Error::Setup(e.to_string()))?;
                Some(Box::new(a) as Box<dyn IAuthority>)
            }
            None => None,
        };

        Ok(Self {
            policy: settings.policy,
            ledger: NonceLedger::new(),
            local,
            safetynet,
            authority,
            requests: AtomicU64::new(0),
        })
    }

    /// Replace the remote authority
    pub fn with_authority(mut self, authority: impl IAuthority + 'static) -> Self {
        self.authority = Some(Box::new(authority));
        self
    }

    pub fn ledger(&self) -> &NonceLedger {
        &self.ledger
    }

    /// Issue a nonce in the form the client hands to the attestation API
    pub fn issue_nonce(&self, format: Format) -> String {
        let n = self.ledger.issue(self.policy.nonce_length);

        match format {
            Format::Integrity => n.to_base64url(),
            Format::SafetyNet => n.into(),
        }
    }

    pub async fn check_integrity(&self, req: &CheckRequest) -> CheckResponse {
        self.check_integrity_at(req, verdict::now_millis()).await
    }

    /// Decode and appraise a Play Integrity token as of `now` (epoch ms)
    pub async fn check_integrity_at(&self, req: &CheckRequest, now: i64) -> CheckResponse {
        let span = tracing::info_span!("check", request = self.next_request(), format = "integrity");

        let outcome = self.integrity(req, now).instrument(span).await;

        CheckResponse::from_outcome(outcome)
    }

    pub fn check_safetynet(&self, req: &CheckRequest) -> CheckResponse {
        self.check_safetynet_at(req, verdict::now_millis())
    }

    /// Decode and appraise a SafetyNet attestation statement as of `now`
    pub fn check_safetynet_at(&self, req: &CheckRequest, now: i64) -> CheckResponse {
        let span = tracing::info_span!("check", request = self.next_request(), format = "safetynet");
        let _entered = span.enter();

        CheckResponse::from_outcome(self.safetynet(req, now))
    }

    fn next_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn integrity(&self, req: &CheckRequest, now: i64) -> Result<Claims, Error> {
        let token = required_token(req)?;
        let mode = DecodeMode::parse(req.mode.as_deref())?;
        let check = nonce_check_mode(req);

        let claims = match mode {
            DecodeMode::Local => self.local.decode(token)?,
            DecodeMode::Delegated => self.delegated(token).await?,
        };

        audit(&claims);

        let verdict = IntegrityEvaluator::new(&self.policy, &self.ledger).evaluate(&claims, check, now);

        conclude(verdict, claims.into())
    }

    async fn delegated(&self, token: &str) -> Result<IntegrityClaims, Error> {
        let authority = self
            .authority
            .as_ref()
            .ok_or_else(|| Error::Authority("no service account credentials configured".to_string()))?;

        Ok(authority
            .decode_integrity_token(&self.policy.package_name, token)
            .await?)
    }

    fn safetynet(&self, req: &CheckRequest, now: i64) -> Result<Claims, Error> {
        let token = required_token(req)?;
        let check = nonce_check_mode(req);

        let claims = self.safetynet.decode(token)?;

        audit(&claims);

        let verdict = SafetyNetEvaluator::new(&self.policy, &self.ledger).evaluate(&claims, check, now);

        conclude(verdict, claims.into())
    }
}

fn required_token(req: &CheckRequest) -> Result<&str, Error> {
    req.token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or(Error::MissingToken)
}

fn nonce_check_mode(req: &CheckRequest) -> NonceCheckMode {
    req.nonce
        .as_deref()
        .map(NonceCheckMode::from)
        .unwrap_or_default()
}

fn audit<T: serde::Serialize>(claims: &T) {
    let j = serde_json::to_string(claims).unwrap_or_default();

    tracing::info!(claims = %j, "client request processed");
}

fn conclude(verdict: Verdict, claims: Claims) -> Result<Claims, Error> {
    if verdict.passed {
        return Ok(claims);
    }

    if let Some(f) = verdict.aborted {
        return Err(Error::Rejected(f.message));
    }

    let messages: Vec<String> = verdict.failures.into_iter().map(|f| f.message).collect();

    Err(Error::ChecksFailed(messages.join("; ")))
}
