/// Round a value to 2 decimal places using half-up rounding, the
/// display-grade precision for currency amounts.
///
/// **Note on precision**: amounts are `f64`; half-up here means "half away
/// from zero", which coincides with half-up for the non-negative amounts
/// the conversion UI accepts.
#[must_use]
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Source-to-target conversion: `amount * rate`, rounded to 2 decimals.
#[must_use]
pub fn convert_forward(amount: f64, rate: f64) -> f64 {
    round_currency(amount * rate)
}

/// Target-to-source conversion: `amount / rate`, rounded to 2 decimals.
///
/// Undefined for `rate == 0` — callers must guard before calling. Quotation
/// rates are validated positive at the API boundary, so a zero rate never
/// reaches this through the sync engines.
#[must_use]
pub fn convert_backward(amount: f64, rate: f64) -> f64 {
    debug_assert!(rate != 0.0, "convert_backward called with zero rate");
    round_currency(amount / rate)
}

/// Parse a user-entered amount. Empty, non-numeric, and non-finite input
/// all yield `None` — the paired field is cleared, never an error state.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format a derived amount for display with exactly 2 decimals ("510.00").
#[must_use]
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// A pair of editable amount fields bound to one quotation rate.
///
/// At most one field is authoritative per edit: editing a field makes the
/// other one derived (forward or backward conversion), never both at once.
/// That single-direction rule is what prevents the two fields from feeding
/// back into each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionState {
    source_amount: String,
    target_amount: String,
}

impl ConversionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The source-side field as the user sees it.
    #[must_use]
    pub fn source_amount(&self) -> &str {
        &self.source_amount
    }

    /// The target-side field as the user sees it.
    #[must_use]
    pub fn target_amount(&self) -> &str {
        &self.target_amount
    }

    /// User edited the source field: keep the raw text, derive the target
    /// via forward conversion. Without a rate or a parseable amount the
    /// target is cleared.
    pub fn edit_source(&mut self, raw: &str, rate: Option<f64>) {
        self.source_amount = raw.to_string();
        match (rate, parse_amount(raw)) {
            (Some(r), Some(v)) if r != 0.0 => {
                self.target_amount = format_amount(convert_forward(v, r));
            }
            _ => self.target_amount.clear(),
        }
    }

    /// User edited the target field: keep the raw text, derive the source
    /// via backward conversion. The `rate != 0` guard keeps the division
    /// unreachable for degenerate rates.
    pub fn edit_target(&mut self, raw: &str, rate: Option<f64>) {
        self.target_amount = raw.to_string();
        match (rate, parse_amount(raw)) {
            (Some(r), Some(v)) if r != 0.0 => {
                self.source_amount = format_amount(convert_backward(v, r));
            }
            _ => self.source_amount.clear(),
        }
    }

    /// Re-derive after a new quotation settles:
    /// 1. source field holds a valid positive number → recompute target;
    /// 2. else if the target field holds one → recompute source;
    /// 3. else leave both fields untouched.
    pub fn rederive(&mut self, rate: f64) {
        if let Some(v) = parse_amount(&self.source_amount).filter(|v| *v > 0.0) {
            self.target_amount = format_amount(convert_forward(v, rate));
        } else if let Some(v) = parse_amount(&self.target_amount).filter(|v| *v > 0.0) {
            if rate != 0.0 {
                self.source_amount = format_amount(convert_backward(v, rate));
            }
        }
    }

    /// Clear both fields (fiat engine does this when a fetch fails).
    pub fn clear(&mut self) {
        self.source_amount.clear();
        self.target_amount.clear();
    }
}
