use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Fiat currencies offered by the conversion UI (the backend accepts any
/// valid 3-letter code; this is the curated menu).
pub const KNOWN_CURRENCIES: [&str; 8] = ["USD", "EUR", "BRL", "JPY", "GBP", "AUD", "CAD", "CHF"];

/// Validate and normalize a 3-letter currency code (e.g., "usd" → "USD").
pub fn validate_currency_code(code: &str) -> Result<String, CoreError> {
    let trimmed = code.trim().to_uppercase();
    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::InvalidCurrency(code.to_string()));
    }
    Ok(trimmed)
}

/// An ordered (source, target) currency tuple for fiat conversion.
///
/// Codes are normalized to uppercase. A pair with `source == target` is
/// representable (the UI allows selecting it) but never fetched — the sync
/// engine guards against self-pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyPair {
    pub source: String,
    pub target: String,
}

impl CurrencyPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into().to_uppercase(),
            target: target.into().to_uppercase(),
        }
    }

    /// True when both endpoints name the same currency.
    #[must_use]
    pub fn is_self_pair(&self) -> bool {
        self.source == self.target
    }
}

impl std::fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.source, self.target)
    }
}

/// Provenance of a fiat quotation: served from the backend's in-memory
/// cache or freshly fetched from the external rate API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteSource {
    #[serde(rename = "cache")]
    Cache,
    #[serde(rename = "api_externa", alias = "api")]
    External,
}

/// A rate snapshot for a fiat currency pair at a point in time.
///
/// Field names follow the backend's wire format (`/cotacao` response).
/// Invariants: `source_currency != target_currency`, `exchange_rate > 0`.
/// Both are enforced at the API boundary, not re-checked by consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    #[serde(rename = "moeda_origem")]
    pub source_currency: String,

    #[serde(rename = "moeda_destino")]
    pub target_currency: String,

    #[serde(rename = "taxa_cambio")]
    pub exchange_rate: f64,

    /// Backend timestamps are naive local time, no offset on the wire.
    #[serde(rename = "data_cotacao")]
    pub quoted_at: NaiveDateTime,

    #[serde(rename = "fonte")]
    pub source: QuoteSource,
}

impl Quotation {
    /// Check the data-model invariants. The HTTP layer rejects quotations
    /// that fail this before they ever reach a sync engine.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.source_currency == self.target_currency {
            return Err(CoreError::InvalidQuotation(format!(
                "source and target are both {}",
                self.source_currency
            )));
        }
        if !self.exchange_rate.is_finite() || self.exchange_rate <= 0.0 {
            return Err(CoreError::InvalidQuotation(format!(
                "exchange rate {} must be finite and positive",
                self.exchange_rate
            )));
        }
        Ok(())
    }
}

/// The two stablecoins tracked by the crypto view. The batch endpoint
/// quotes both against BRL in a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StableAsset {
    Usdt,
    Usdc,
}

impl StableAsset {
    /// All tracked assets, in display order.
    pub const ALL: [StableAsset; 2] = [StableAsset::Usdt, StableAsset::Usdc];

    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            StableAsset::Usdt => "USDT",
            StableAsset::Usdc => "USDC",
        }
    }
}

impl std::fmt::Display for StableAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A rate snapshot for one stablecoin against BRL (`/cripto/ambas-brl`
/// entry). Unlike fiat quotations, `fonte` is a free-form provider label
/// (e.g., "Binance API").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoQuotation {
    #[serde(rename = "simbolo")]
    pub symbol: String,

    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Always "BRL" for this endpoint.
    #[serde(rename = "moeda_destino")]
    pub target_currency: String,

    #[serde(rename = "taxa_cambio")]
    pub exchange_rate: f64,

    #[serde(rename = "data_cotacao")]
    pub quoted_at: NaiveDateTime,

    #[serde(rename = "fonte")]
    pub source: String,
}

/// The batched multi-asset response. Either asset may be absent when the
/// upstream provider could only resolve one of the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CryptoQuotationSet {
    #[serde(rename = "USDT", default, skip_serializing_if = "Option::is_none")]
    pub usdt: Option<CryptoQuotation>,

    #[serde(rename = "USDC", default, skip_serializing_if = "Option::is_none")]
    pub usdc: Option<CryptoQuotation>,
}

impl CryptoQuotationSet {
    #[must_use]
    pub fn get(&self, asset: StableAsset) -> Option<&CryptoQuotation> {
        match asset {
            StableAsset::Usdt => self.usdt.as_ref(),
            StableAsset::Usdc => self.usdc.as_ref(),
        }
    }

    /// Provider label for display, taken from whichever asset is present.
    #[must_use]
    pub fn provider_label(&self) -> Option<&str> {
        self.usdt
            .as_ref()
            .or(self.usdc.as_ref())
            .map(|q| q.source.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.usdt.is_none() && self.usdc.is_none()
    }
}
