// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::iauthority::IAuthority;
use super::integrity::IntegrityClaims;
use crate::config::{AuthorityConfig, ServiceAccount};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

const SCOPE: &str = "https://www.googleapis.com/auth/playintegrity";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const REFRESH_MARGIN_SECS: u64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodeRequest<'a> {
    integrity_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecodeResponse {
    token_payload_external: IntegrityClaims,
}

struct AccessToken {
    value: String,
    expires_at: u64,
}

/// The Google Play Integrity API, authenticated with a service account.
/// OAuth2 access tokens are cached until shortly before they expire.
pub struct PlayIntegrityAuthority {
    account: ServiceAccount,
    signing_key: EncodingKey,
    endpoint: String,
    http: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl PlayIntegrityAuthority {
    pub fn new(account: ServiceAccount, cfg: &AuthorityConfig) -> Result<Self, Error> {
        let signing_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| Error::Key(format!("service account private key: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| Error::Authority(e.to_string()))?;

        Ok(Self {
            account,
            signing_key,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            http,
            cached: Mutex::new(None),
        })
    }

    fn assertion(&self, iat: u64) -> Result<String, Error> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.account.private_key_id.clone();

        let claims = AssertionClaims {
            iss: self.account.client_email.clone(),
            scope: SCOPE.to_string(),
            aud: self.account.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| Error::Authority(format!("signing assertion: {e}")))
    }

    async fn access_token(&self) -> Result<String, Error> {
        let mut cached = self.cached.lock().await;
        let now = now_secs();

        if let Some(t) = cached.as_ref() {
            if now.saturating_add(REFRESH_MARGIN_SECS) < t.expires_at {
                return Ok(t.value.clone());
            }
        }

        tracing::debug!(token_uri = %self.account.token_uri, "requesting access token");

        let assertion = self.assertion(now)?;

        let rsp = self
            .http
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Error::Authority(format!("token exchange: {e}")))?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(Error::Authority(format!(
                "token exchange: {status}: {body}"
            )));
        }

        let t: TokenResponse = rsp
            .json()
            .await
            .map_err(|e| Error::Authority(format!("token exchange: {e}")))?;

        *cached = Some(AccessToken {
            value: t.access_token.clone(),
            expires_at: now.saturating_add(t.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS)),
        });

        Ok(t.access_token)
    }
}

#[async_trait]
impl IAuthority for PlayIntegrityAuthority {
    async fn decode_integrity_token(
        &self,
        package_name: &str,
        token: &str,
    ) -> Result<IntegrityClaims, Error> {
        let bearer = self.access_token().await?;

        let url = format!(
            "{}/v1/{}:decodeIntegrityToken",
            self.endpoint, package_name
        );

        let rsp = self
            .http
            .post(&url)
            .bearer_auth(bearer)
            .json(&DecodeRequest {
                integrity_token: token,
            })
            .send()
            .await
            .map_err(|e| Error::Authority(e.to_string()))?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(Error::Authority(format!("{status}: {body}")));
        }

        let d: DecodeResponse = rsp
            .json()
            .await
            .map_err(|e| Error::Authority(e.to_string()))?;

        Ok(d.token_payload_external)
    }
}
