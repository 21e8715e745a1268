use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::traits::QuotationApi;
use crate::errors::CoreError;
use crate::models::quotation::{CurrencyPair, Quotation};
use crate::services::conversion::ConversionState;

/// How long the "quotation updated" notice stays visible after a
/// successful fetch.
pub const SUCCESS_NOTICE_MS: u64 = 4000;

/// Phase of the per-pair fetch state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Fetching,
    Settled,
    Failed,
}

/// Identifies one issued fetch. The generation counter is how the engine
/// recognizes late-arriving responses for superseded requests: only the
/// ticket matching the current generation may touch visible state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub pair: CurrencyPair,
}

/// Transient success notice with restart semantics: raising it again before
/// the 4-second window elapses bumps the epoch, so the expiry scheduled for
/// the older epoch becomes a no-op and the window effectively restarts.
#[derive(Debug, Default)]
pub(crate) struct SuccessNotice {
    visible: bool,
    epoch: u64,
}

impl SuccessNotice {
    pub(crate) fn raise(&mut self) -> u64 {
        self.epoch += 1;
        self.visible = true;
        self.epoch
    }

    pub(crate) fn expire(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.visible = false;
        }
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Fetch orchestration for one fiat currency pair.
///
/// Explicit state machine: `Idle -> Fetching -> {Settled, Failed}`,
/// re-entering `Fetching` whenever the pair changes or a manual refresh is
/// requested. The engine itself is synchronous; [`run_fetch`] is the thin
/// async driver that performs the network call and feeds the outcome back.
///
/// Failure policy (fiat): a failed fetch clears the displayed quotation and
/// both conversion fields. The crypto engine deliberately differs — see
/// `CryptoSync`.
pub struct QuotationSync {
    pair: CurrencyPair,
    phase: FetchPhase,
    quotation: Option<Quotation>,
    error: Option<String>,
    conversion: ConversionState,
    notice: SuccessNotice,
    generation: u64,
}

impl QuotationSync {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            pair: CurrencyPair::new(source, target),
            phase: FetchPhase::Idle,
            quotation: None,
            error: None,
            conversion: ConversionState::new(),
            notice: SuccessNotice::default(),
            generation: 0,
        }
    }

    // ── Views ───────────────────────────────────────────────────────

    #[must_use]
    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    #[must_use]
    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    #[must_use]
    pub fn quotation(&self) -> Option<&Quotation> {
        self.quotation.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn conversion(&self) -> &ConversionState {
        &self.conversion
    }

    #[must_use]
    pub fn notice_visible(&self) -> bool {
        self.notice.is_visible()
    }

    // ── Pair changes & refresh ──────────────────────────────────────

    /// Change the source currency. Returns the ticket for the fetch this
    /// triggers, or `None` when the resulting pair is a self-pair.
    pub fn set_source(&mut self, code: &str) -> Option<FetchTicket> {
        self.pair = CurrencyPair::new(code, self.pair.target.clone());
        self.request_fetch()
    }

    /// Change the target currency. Same self-pair guard as `set_source`.
    pub fn set_target(&mut self, code: &str) -> Option<FetchTicket> {
        self.pair = CurrencyPair::new(self.pair.source.clone(), code);
        self.request_fetch()
    }

    /// Manual refresh of the current pair.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        self.request_fetch()
    }

    /// Enter `Fetching` for the current pair, superseding any in-flight
    /// request by bumping the generation. Self-pairs never fetch.
    fn request_fetch(&mut self) -> Option<FetchTicket> {
        if self.pair.is_self_pair() {
            debug!(pair = %self.pair, "self-pair, not fetching");
            return None;
        }
        self.generation += 1;
        self.phase = FetchPhase::Fetching;
        self.error = None;
        Some(FetchTicket {
            generation: self.generation,
            pair: self.pair.clone(),
        })
    }

    // ── Settlement ──────────────────────────────────────────────────

    /// Apply a successful response for the given ticket generation.
    ///
    /// Stale generations (a newer request was issued meanwhile) are
    /// discarded without touching state. On apply, the conversion fields
    /// are re-derived from the new rate and the success notice is raised;
    /// the returned epoch is what the expiry timer must present to clear it.
    pub fn settle(&mut self, generation: u64, quotation: Quotation) -> Option<u64> {
        if generation != self.generation {
            warn!(
                generation,
                current = self.generation,
                "discarding stale quotation response"
            );
            return None;
        }
        info!(pair = %self.pair, rate = quotation.exchange_rate, "quotation settled");
        self.phase = FetchPhase::Settled;
        self.error = None;
        self.conversion.rederive(quotation.exchange_rate);
        self.quotation = Some(quotation);
        Some(self.notice.raise())
    }

    /// Apply a failed response for the given ticket generation.
    ///
    /// Stale generations are discarded. On apply, the fiat policy is to
    /// clear the displayed quotation and both conversion fields, leaving
    /// only the error message. Returns whether the failure was applied.
    pub fn fail(&mut self, generation: u64, error: &CoreError) -> bool {
        if generation != self.generation {
            warn!(
                generation,
                current = self.generation,
                "discarding stale quotation failure"
            );
            return false;
        }
        self.phase = FetchPhase::Failed;
        self.error = Some(error.to_string());
        self.quotation = None;
        self.conversion.clear();
        true
    }

    /// Clear the success notice if `epoch` is still the one it was raised
    /// with. A newer success restarts the window, so older expiries no-op.
    pub fn expire_notice(&mut self, epoch: u64) {
        self.notice.expire(epoch);
    }

    // ── Conversion edits ────────────────────────────────────────────

    /// User edited the source-amount field.
    pub fn edit_source_amount(&mut self, raw: &str) {
        let rate = self.rate();
        self.conversion.edit_source(raw, rate);
    }

    /// User edited the target-amount field.
    pub fn edit_target_amount(&mut self, raw: &str) {
        let rate = self.rate();
        self.conversion.edit_target(raw, rate);
    }

    fn rate(&self) -> Option<f64> {
        self.quotation.as_ref().map(|q| q.exchange_rate)
    }
}

// ── Async driver ────────────────────────────────────────────────────

/// Execute one issued fetch and feed the outcome back into the engine.
///
/// There is no cancellation of the request itself; if the engine moved on
/// to a newer generation while this was in flight, `settle`/`fail` discard
/// the result. On success the 4-second notice expiry is scheduled.
pub async fn run_fetch(
    engine: Arc<Mutex<QuotationSync>>,
    api: Arc<dyn QuotationApi>,
    ticket: FetchTicket,
) {
    let result = api
        .fetch_quotation(&ticket.pair.source, &ticket.pair.target)
        .await;
    let mut guard = engine.lock().await;
    match result {
        Ok(quotation) => {
            if let Some(epoch) = guard.settle(ticket.generation, quotation) {
                drop(guard);
                spawn_notice_expiry(engine, epoch);
            }
        }
        Err(e) => {
            guard.fail(ticket.generation, &e);
        }
    }
}

fn spawn_notice_expiry(engine: Arc<Mutex<QuotationSync>>, epoch: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(SUCCESS_NOTICE_MS)).await;
        engine.lock().await.expire_notice(epoch);
    });
}
