use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{AuthApi, QuotationApi};
use crate::errors::CoreError;
use crate::models::quotation::{CryptoQuotationSet, Quotation};
use crate::models::session::UserProfile;

/// Default backend address, matching the development server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8888";

/// HTTP client for the Cotação backend.
///
/// Implements both [`QuotationApi`] and [`AuthApi`] against the same base
/// URL. All non-success responses are converted to `CoreError` values
/// carrying a user-facing message; nothing propagates as a panic or an
/// unclassified failure.
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let builder = Client::builder().timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for HttpApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<&'a str>,
}

// ── Error mapping ───────────────────────────────────────────────────

/// Convert a non-success response into a `CoreError`.
///
/// Structured bodies surface the server's `detail`; a 502 whose detail
/// mentions "429" is the upstream rate limit. Non-JSON bodies get a
/// message inferred from the status code.
async fn error_from_response(resp: Response) -> CoreError {
    let status = resp.status().as_u16();
    match resp.json::<ErrorBody>().await {
        Ok(body) => {
            if status == 502 && body.detail.contains("429") {
                CoreError::RateLimited { detail: body.detail }
            } else {
                CoreError::Server {
                    status,
                    detail: body.detail,
                }
            }
        }
        Err(_) => {
            let detail = match status {
                400 => "Invalid currency. Use 3-letter codes (e.g., USD, EUR, BRL).".to_string(),
                502 => "Error reaching the external quotation API. Try again shortly.".to_string(),
                _ => format!("Request failed with status {status}"),
            };
            CoreError::Server { status, detail }
        }
    }
}

// ── QuotationApi ────────────────────────────────────────────────────

#[async_trait]
impl QuotationApi for HttpApi {
    async fn fetch_quotation(&self, source: &str, target: &str) -> Result<Quotation, CoreError> {
        let url = format!("{}/cotacao", self.base_url);
        debug!(source, target, "fetching fiat quotation");

        let resp = self
            .client
            .get(&url)
            .query(&[("moeda_origem", source), ("moeda_destino", target)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = error_from_response(resp).await;
            warn!(source, target, %err, "fiat quotation fetch failed");
            return Err(err);
        }

        let quotation: Quotation = resp.json().await?;
        quotation.validate()?;
        Ok(quotation)
    }

    async fn fetch_history(&self) -> Result<Vec<Quotation>, CoreError> {
        let url = format!("{}/cotacao/historico", self.base_url);
        debug!("fetching quotation history");

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        Ok(resp.json().await?)
    }

    async fn fetch_crypto_quotations(&self) -> Result<CryptoQuotationSet, CoreError> {
        let url = format!("{}/cripto/ambas-brl", self.base_url);
        debug!("fetching crypto quotation batch");

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            let err = error_from_response(resp).await;
            warn!(%err, "crypto quotation fetch failed");
            return Err(err);
        }

        Ok(resp.json().await?)
    }
}

// ── AuthApi ─────────────────────────────────────────────────────────

#[async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, email: &str, password: &str) -> Result<String, CoreError> {
        let url = format!("{}/auth/login", self.base_url);
        debug!(email, "logging in");

        let resp = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let token: TokenResponse = resp.json().await?;
        Ok(token.access_token)
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<UserProfile, CoreError> {
        let url = format!("{}/auth/register", self.base_url);
        debug!(email, "registering account");

        let resp = self
            .client
            .post(&url)
            .json(&RegisterRequest {
                email,
                password,
                full_name,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        Ok(resp.json().await?)
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, CoreError> {
        let url = format!("{}/auth/me", self.base_url);
        debug!("loading profile");

        let resp = self.client.get(&url).bearer_auth(token).send().await?;

        // Any non-success here means the token no longer identifies a
        // session, whatever the exact status was.
        if !resp.status().is_success() {
            warn!(status = resp.status().as_u16(), "profile load rejected");
            return Err(CoreError::AuthInvalid);
        }

        Ok(resp.json().await?)
    }
}
