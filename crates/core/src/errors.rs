use thiserror::Error;

/// Unified error type for the entire cotacao-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Network / API ───────────────────────────────────────────────
    /// The request never completed (DNS, connect, timeout, body read).
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response with a structured or inferred `detail` message.
    #[error("{detail}")]
    Server { status: u16, detail: String },

    /// 502 wrapping an upstream 429 — the quotation provider throttled us.
    #[error("Request limit reached — the next automatic refresh will retry")]
    RateLimited { detail: String },

    // ── Auth / Session ──────────────────────────────────────────────
    /// Token rejected or profile load failed. Always collapses to logout.
    #[error("Session expired or invalid — please sign in again")]
    AuthInvalid,

    // ── Token storage ───────────────────────────────────────────────
    #[error("Token storage error: {0}")]
    Storage(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Invalid currency code '{0}': must be exactly 3 ASCII letters (e.g., USD, EUR, BRL)")]
    InvalidCurrency(String),

    #[error("Invalid quotation: {0}")]
    InvalidQuotation(String),
}

impl CoreError {
    /// Whether this error is the throttling special case. The crypto engine
    /// uses this to pick a distinct message and hint without changing its
    /// retained-quotation policy.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CoreError::RateLimited { .. })
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::Network(e.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}
