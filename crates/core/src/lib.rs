pub mod api;
pub mod errors;
pub mod models;
pub mod services;
pub mod storage;

use std::sync::Arc;

use tokio::sync::Mutex;

use api::http::HttpApi;
use api::traits::QuotationApi;
use errors::CoreError;
use models::quotation::Quotation;
use services::crypto_sync::{self, CryptoSync, PollSubscription};
use services::quotation_sync::{self, QuotationSync};
use services::session::SessionManager;
use storage::token::TokenStore;

/// Main entry point for the Cotação core library.
///
/// Wires the HTTP client, the session manager, and factories for the two
/// sync engines. Views create engines on demand and own their lifetimes;
/// the app owns the shared client and the single session.
#[must_use]
pub struct CotacaoApp {
    api: Arc<HttpApi>,
    session: SessionManager,
}

impl CotacaoApp {
    /// Build the app against a backend base URL and a token store.
    pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Self {
        let api = Arc::new(HttpApi::new(base_url));
        let session = SessionManager::new(api.clone(), store);
        Self { api, session }
    }

    // ── Session ─────────────────────────────────────────────────────

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    // ── Sync engines ────────────────────────────────────────────────

    /// Create a fiat sync engine for the given pair and, unless it is a
    /// self-pair, kick off the initial fetch in the background.
    /// Must be called within a tokio runtime.
    pub fn start_fiat_sync(
        &self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Arc<Mutex<QuotationSync>> {
        let mut sync = QuotationSync::new(source, target);
        let ticket = sync.refresh();
        let engine = Arc::new(Mutex::new(sync));
        if let Some(ticket) = ticket {
            tokio::spawn(quotation_sync::run_fetch(
                engine.clone(),
                self.quotation_api(),
                ticket,
            ));
        }
        engine
    }

    /// Create a crypto sync engine and start its polling subscription
    /// (immediate fetch, then every 30 seconds). Dropping or cancelling
    /// the returned subscription stops both of its timers.
    pub fn start_crypto_sync(&self) -> (Arc<Mutex<CryptoSync>>, PollSubscription) {
        let engine = Arc::new(Mutex::new(CryptoSync::new()));
        let subscription = crypto_sync::start_polling(engine.clone(), self.quotation_api());
        (engine, subscription)
    }

    // ── History ─────────────────────────────────────────────────────

    /// Previously served quotations, in the order the backend returns them.
    pub async fn fetch_history(&self) -> Result<Vec<Quotation>, CoreError> {
        self.api.fetch_history().await
    }

    // ── Internal ────────────────────────────────────────────────────

    fn quotation_api(&self) -> Arc<dyn QuotationApi> {
        self.api.clone()
    }
}
