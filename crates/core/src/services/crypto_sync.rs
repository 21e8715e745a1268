use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::traits::QuotationApi;
use crate::errors::CoreError;
use crate::models::quotation::{CryptoQuotation, CryptoQuotationSet, StableAsset};
use crate::services::conversion::ConversionState;
use crate::services::quotation_sync::{SuccessNotice, SUCCESS_NOTICE_MS};

/// Interval between automatic refreshes of the crypto batch. Chosen to
/// stay under the free tier's rate limit.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Where the visual countdown starts, in seconds (= the refresh interval).
pub const COUNTDOWN_START: u32 = 30;

/// Extra hint shown alongside the rate-limit message.
const RATE_LIMIT_HINT: &str =
    "The free quotation provider throttles requests. Rates refresh automatically once the limit resets.";

/// A surfaced fetch failure. Rate-limit failures get a distinct message
/// and hint but follow the same retained-quotation policy as any other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub message: String,
    pub rate_limited: bool,
}

impl SyncFailure {
    fn from_error(error: &CoreError) -> Self {
        Self {
            message: error.to_string(),
            rate_limited: error.is_rate_limited(),
        }
    }

    /// Hint text for rate-limit failures, `None` otherwise.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        self.rate_limited.then_some(RATE_LIMIT_HINT)
    }
}

/// Multi-asset quotation engine for the fixed USDT→BRL / USDC→BRL batch.
///
/// Same settle/fail/generation semantics as `QuotationSync`, specialized
/// for a recurring batched request with one independent [`ConversionState`]
/// per asset. Two policies differ from the fiat engine, on purpose:
/// - a failed fetch **retains** the last quotation set (stale-but-present);
/// - fetches are driven by a timer, not by pair changes.
///
/// The countdown is display state only: it mirrors the time until the next
/// poll but never triggers the fetch itself.
pub struct CryptoSync {
    quotations: Option<CryptoQuotationSet>,
    usdt_conversion: ConversionState,
    usdc_conversion: ConversionState,
    failure: Option<SyncFailure>,
    fetching: bool,
    notice: SuccessNotice,
    generation: u64,
    countdown: u32,
}

impl CryptoSync {
    pub fn new() -> Self {
        Self {
            quotations: None,
            usdt_conversion: ConversionState::new(),
            usdc_conversion: ConversionState::new(),
            failure: None,
            fetching: false,
            notice: SuccessNotice::default(),
            generation: 0,
            countdown: COUNTDOWN_START,
        }
    }

    // ── Views ───────────────────────────────────────────────────────

    #[must_use]
    pub fn quotations(&self) -> Option<&CryptoQuotationSet> {
        self.quotations.as_ref()
    }

    #[must_use]
    pub fn quotation(&self, asset: StableAsset) -> Option<&CryptoQuotation> {
        self.quotations.as_ref().and_then(|set| set.get(asset))
    }

    #[must_use]
    pub fn conversion(&self, asset: StableAsset) -> &ConversionState {
        match asset {
            StableAsset::Usdt => &self.usdt_conversion,
            StableAsset::Usdc => &self.usdc_conversion,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&SyncFailure> {
        self.failure.as_ref()
    }

    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    #[must_use]
    pub fn notice_visible(&self) -> bool {
        self.notice.is_visible()
    }

    /// Seconds shown next to "refreshes in …".
    #[must_use]
    pub fn countdown_seconds(&self) -> u32 {
        self.countdown
    }

    // ── Fetch lifecycle ─────────────────────────────────────────────

    /// Mark a new batch fetch as in flight and return its generation.
    pub fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.fetching = true;
        self.failure = None;
        self.generation
    }

    /// Apply a successful batch for the given generation; stale
    /// generations are discarded. Resets the countdown, re-derives every
    /// per-asset conversion whose rate is present, and raises the success
    /// notice (returned epoch feeds the expiry timer).
    pub fn settle(&mut self, generation: u64, set: CryptoQuotationSet) -> Option<u64> {
        if generation != self.generation {
            warn!(
                generation,
                current = self.generation,
                "discarding stale crypto batch"
            );
            return None;
        }
        info!(
            provider = set.provider_label().unwrap_or("?"),
            "crypto batch settled"
        );
        self.fetching = false;
        self.failure = None;
        for asset in StableAsset::ALL {
            let rate = set
                .get(asset)
                .map(|q| q.exchange_rate)
                .filter(|r| r.is_finite() && *r > 0.0);
            if let Some(rate) = rate {
                match asset {
                    StableAsset::Usdt => self.usdt_conversion.rederive(rate),
                    StableAsset::Usdc => self.usdc_conversion.rederive(rate),
                }
            }
        }
        self.quotations = Some(set);
        self.countdown = COUNTDOWN_START;
        Some(self.notice.raise())
    }

    /// Apply a failed batch for the given generation; stale generations
    /// are discarded. The previous quotation set stays visible.
    pub fn fail(&mut self, generation: u64, error: &CoreError) -> bool {
        if generation != self.generation {
            warn!(
                generation,
                current = self.generation,
                "discarding stale crypto failure"
            );
            return false;
        }
        self.fetching = false;
        self.failure = Some(SyncFailure::from_error(error));
        true
    }

    /// Clear the success notice if `epoch` is still current.
    pub fn expire_notice(&mut self, epoch: u64) {
        self.notice.expire(epoch);
    }

    /// One second of countdown: 30 → 1, then autonomously wraps back to 30.
    /// Does not trigger a fetch — the poll timer owns that.
    pub fn tick_countdown(&mut self) {
        self.countdown = if self.countdown <= 1 {
            COUNTDOWN_START
        } else {
            self.countdown - 1
        };
    }

    // ── Conversion edits ────────────────────────────────────────────

    /// User edited the asset-side field (USDT or USDC amount).
    pub fn edit_asset_amount(&mut self, asset: StableAsset, raw: &str) {
        let rate = self.rate(asset);
        match asset {
            StableAsset::Usdt => self.usdt_conversion.edit_source(raw, rate),
            StableAsset::Usdc => self.usdc_conversion.edit_source(raw, rate),
        }
    }

    /// User edited the BRL-side field for the given asset.
    pub fn edit_brl_amount(&mut self, asset: StableAsset, raw: &str) {
        let rate = self.rate(asset);
        match asset {
            StableAsset::Usdt => self.usdt_conversion.edit_target(raw, rate),
            StableAsset::Usdc => self.usdc_conversion.edit_target(raw, rate),
        }
    }

    fn rate(&self, asset: StableAsset) -> Option<f64> {
        self.quotation(asset).map(|q| q.exchange_rate)
    }
}

impl Default for CryptoSync {
    fn default() -> Self {
        Self::new()
    }
}

// ── Polling subscription ────────────────────────────────────────────

/// Scoped owner of the two repeating timers behind a crypto view: the
/// 30-second poll and the 1-second countdown. They are independent tasks
/// but share a lifetime — `cancel` tears both down together, and dropping
/// the subscription guarantees the same on every exit path, so no timer
/// outlives the view it updates.
pub struct PollSubscription {
    poll: JoinHandle<()>,
    countdown: JoinHandle<()>,
}

impl PollSubscription {
    pub fn cancel(&self) {
        self.poll.abort();
        self.countdown.abort();
    }
}

impl Drop for PollSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start polling: fetch immediately, then every [`REFRESH_INTERVAL`],
/// independent of user interaction. Must be called within a tokio runtime.
pub fn start_polling(
    engine: Arc<Mutex<CryptoSync>>,
    api: Arc<dyn QuotationApi>,
) -> PollSubscription {
    let poll = tokio::spawn({
        let engine = engine.clone();
        let api = api.clone();
        async move {
            let mut interval = tokio::time::interval(REFRESH_INTERVAL);
            loop {
                // first tick fires immediately: the startup fetch
                interval.tick().await;
                debug!("crypto poll tick");
                run_refresh(&engine, &api).await;
            }
        }
    });

    let countdown = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await; // consume the immediate tick
        loop {
            interval.tick().await;
            engine.lock().await.tick_countdown();
        }
    });

    PollSubscription { poll, countdown }
}

/// One refresh cycle: begin, fetch, settle or fail. Also used by the
/// "refresh now" action outside the timer.
pub async fn run_refresh(engine: &Arc<Mutex<CryptoSync>>, api: &Arc<dyn QuotationApi>) {
    let generation = engine.lock().await.begin_fetch();
    let result = api.fetch_crypto_quotations().await;
    let mut guard = engine.lock().await;
    match result {
        Ok(set) => {
            if let Some(epoch) = guard.settle(generation, set) {
                drop(guard);
                spawn_notice_expiry(engine.clone(), epoch);
            }
        }
        Err(e) => {
            guard.fail(generation, &e);
        }
    }
}

fn spawn_notice_expiry(engine: Arc<Mutex<CryptoSync>>, epoch: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(SUCCESS_NOTICE_MS)).await;
        engine.lock().await.expire_notice(epoch);
    });
}
