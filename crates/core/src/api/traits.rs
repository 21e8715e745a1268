use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::quotation::{CryptoQuotationSet, Quotation};
use crate::models::session::UserProfile;

/// Trait abstraction for the quotation endpoints of the backend.
///
/// The sync engines depend on this seam instead of the concrete HTTP
/// client, so tests drive them with canned responses and the transport
/// can be swapped without touching engine code.
#[async_trait]
pub trait QuotationApi: Send + Sync {
    /// Fetch the current quotation for a fiat pair (`GET /cotacao`).
    async fn fetch_quotation(&self, source: &str, target: &str) -> Result<Quotation, CoreError>;

    /// Fetch previously served quotations, ordered (`GET /cotacao/historico`).
    async fn fetch_history(&self) -> Result<Vec<Quotation>, CoreError>;

    /// Fetch the USDT/USDC→BRL batch (`GET /cripto/ambas-brl`).
    async fn fetch_crypto_quotations(&self) -> Result<CryptoQuotationSet, CoreError>;
}

/// Trait abstraction for the auth endpoints of the backend.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login` — returns the bearer token on success.
    async fn login(&self, email: &str, password: &str) -> Result<String, CoreError>;

    /// `POST /auth/register` — creates the account. Does NOT establish a
    /// session; `SessionManager::register` chains into `login` afterwards.
    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<UserProfile, CoreError>;

    /// `GET /auth/me` with the bearer token. Any non-success response is
    /// an invalid session.
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, CoreError>;
}
