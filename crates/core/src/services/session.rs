use std::sync::Arc;

use tracing::{info, warn};

use crate::api::traits::AuthApi;
use crate::errors::CoreError;
use crate::models::session::{Session, UserProfile};
use crate::storage::token::TokenStore;

/// Token acquisition, persistence, profile load, and expiry handling.
///
/// Holds the single active session for the application instance. The
/// persisted token is the only durable record; the in-memory session
/// mirrors it together with the loaded profile. Every failure path that
/// loses a previously valid token lands deterministically in the
/// logged-out state — there is no token-without-profile limbo.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    session: Option<Session>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            store,
            session: None,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Restore the session from the persisted token at startup.
    ///
    /// No stored token means staying logged out. A stored token is
    /// validated by loading the profile; ANY failure there — network or
    /// rejection — is treated exactly like a logout: the token is
    /// discarded and no session is established. No retry.
    pub async fn restore(&mut self) {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(e) => {
                warn!(%e, "could not read persisted token");
                return;
            }
        };

        match self.api.fetch_profile(&token).await {
            Ok(user) => {
                info!(email = %user.email, "session restored");
                self.session = Some(Session { token, user });
            }
            Err(e) => {
                warn!(%e, "persisted token rejected, logging out");
                self.logout();
            }
        }
    }

    /// Authenticate with the backend and establish a session.
    ///
    /// On success the token is persisted first, then the profile is loaded
    /// immediately. If the profile load fails the half-built state is torn
    /// down via `logout` before the error is surfaced — a failed login
    /// always leaves token and user both unset.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), CoreError> {
        let token = self.api.login(email, password).await?;

        if let Err(e) = self.store.save(&token) {
            self.logout();
            return Err(e);
        }

        match self.api.fetch_profile(&token).await {
            Ok(user) => {
                info!(email = %user.email, "logged in");
                self.session = Some(Session { token, user });
                Ok(())
            }
            Err(e) => {
                self.logout();
                Err(e)
            }
        }
    }

    /// Create an account, then chain into [`login`](Self::login) with the
    /// same credentials — registration by itself does not establish a
    /// session. Returns login's result.
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<(), CoreError> {
        self.api.register(email, password, full_name).await?;
        self.login(email, password).await
    }

    /// Synchronously clear the persisted token and the in-memory session.
    /// Idempotent; a storage error is logged but cannot keep us logged in.
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(%e, "failed to clear persisted token");
        }
        self.session = None;
    }

    // ── Views ───────────────────────────────────────────────────────

    /// Derived from the presence of the loaded user — never stored as a
    /// separate flag, so it cannot desync from the token/profile pair.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.user)
    }

    /// The bearer token of the active session, for request-issuing callers.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}
