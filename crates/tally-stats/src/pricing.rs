//! Model pricing and session cost estimation.
//!
//! Rates are USD per million tokens. A model name is resolved to a
//! [`PricingRecord`] by exact key, then by prefix or substring match, then
//! to the [`DEFAULT_PRICING_MODEL`] tier.

use tracing::debug;

use crate::models::Statistics;

/// Pricing for one model family, in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingRecord {
    /// Table key the record is matched by
    pub model: &'static str,
    pub input_per_million: f64,
    pub output_per_million: f64,
    pub cache_read_per_million: f64,
    pub cache_write_per_million: f64,
}

impl PricingRecord {
    pub const fn new(
        model: &'static str,
        input: f64,
        output: f64,
        cache_write: f64,
        cache_read: f64,
    ) -> Self {
        Self {
            model,
            input_per_million: input,
            output_per_million: output,
            cache_read_per_million: cache_read,
            cache_write_per_million: cache_write,
        }
    }

    /// Cost of the given token counts, truncated to six decimal places.
    pub fn cost(&self, input: u64, output: u64, cache_read: u64, cache_write: u64) -> f64 {
        // tokens * (USD per million tokens) is the cost in micro-dollars
        let micros = input as f64 * self.input_per_million
            + output as f64 * self.output_per_million
            + cache_read as f64 * self.cache_read_per_million
            + cache_write as f64 * self.cache_write_per_million;
        truncate_micros(micros)
    }
}

/// Key of the record used when a model name matches nothing.
pub const DEFAULT_PRICING_MODEL: &str = "claude-opus-4-1";

/// Known model pricing (Anthropic list prices, late 2025).
///
/// Row order here has no effect on matching. [`resolve_pricing`] tries an
/// exact key first, then keys by descending length with ties broken
/// alphabetically, so a new row needs no particular position.
pub const PRICING_TABLE: &[PricingRecord] = &[
    PricingRecord::new("claude-opus-4-5", 5.0, 25.0, 6.25, 0.50),
    PricingRecord::new("claude-opus-4-1", 15.0, 75.0, 18.75, 1.50),
    PricingRecord::new("claude-opus-4", 15.0, 75.0, 18.75, 1.50),
    PricingRecord::new("claude-sonnet-4-5", 3.0, 15.0, 3.75, 0.30),
    PricingRecord::new("claude-sonnet-4", 3.0, 15.0, 3.75, 0.30),
    PricingRecord::new("claude-haiku-4-5", 1.0, 5.0, 1.25, 0.10),
    PricingRecord::new("claude-3-7-sonnet", 3.0, 15.0, 3.75, 0.30),
    PricingRecord::new("claude-3-5-sonnet", 3.0, 15.0, 3.75, 0.30),
    PricingRecord::new("claude-3-5-haiku", 0.80, 4.0, 1.0, 0.08),
    PricingRecord::new("claude-3-opus", 15.0, 75.0, 18.75, 1.50),
    PricingRecord::new("claude-3-haiku", 0.25, 1.25, 0.30, 0.03),
];

/// Resolve the pricing record for a model name.
///
/// Order of resolution:
/// 1. a table key equal to `model`;
/// 2. the first key that is a prefix of, or contained in, `model`, trying
///    longer keys first and breaking length ties alphabetically, so that
///    `claude-opus-4-5-…` picks `claude-opus-4-5` over `claude-opus-4`;
/// 3. [`DEFAULT_PRICING_MODEL`].
///
/// # Arguments
///
/// * `model` - Model name as recorded in the transcript, possibly empty or
///   carrying a date or provider decoration
///
/// # Returns
///
/// The matching record from [`PRICING_TABLE`]. Never fails; unknown names
/// get the default record and a `debug` log line.
///
/// # Example
///
/// ```
/// use tally_stats::resolve_pricing;
///
/// assert_eq!(resolve_pricing("claude-opus-4-5-20251101").model, "claude-opus-4-5");
/// assert_eq!(resolve_pricing("gpt-4o").model, "claude-opus-4-1");
/// ```
pub fn resolve_pricing(model: &str) -> &'static PricingRecord {
    if let Some(record) = PRICING_TABLE.iter().find(|r| r.model == model) {
        return record;
    }

    if !model.is_empty() {
        let mut candidates: Vec<&'static PricingRecord> = PRICING_TABLE.iter().collect();
        candidates.sort_by(|a, b| {
            b.model
                .len()
                .cmp(&a.model.len())
                .then_with(|| a.model.cmp(b.model))
        });
        if let Some(record) = candidates
            .into_iter()
            .find(|r| model.starts_with(r.model) || model.contains(r.model))
        {
            return record;
        }
    }

    debug!(model, fallback = DEFAULT_PRICING_MODEL, "Unknown model, using default pricing");
    default_pricing()
}

/// The fallback pricing record.
pub fn default_pricing() -> &'static PricingRecord {
    PRICING_TABLE
        .iter()
        .find(|r| r.model == DEFAULT_PRICING_MODEL)
        .unwrap_or(&PRICING_TABLE[0])
}

/// Estimate the cost of a finished session in USD.
///
/// Thinking tokens are not billed separately and are excluded.
pub fn estimate_cost(stats: &Statistics) -> f64 {
    resolve_pricing(&stats.model).cost(
        stats.input_tokens,
        stats.output_tokens,
        stats.cache_read_tokens,
        stats.cache_write_tokens,
    )
}

/// Convert micro-dollars to dollars, truncating toward zero.
///
/// Float error below a millionth of a micro-dollar is rounded away first, so
/// an exact sum such as 2775 µ$ does not truncate to 2774 µ$.
fn truncate_micros(micros: f64) -> f64 {
    let cleaned = (micros * 1e6).round() / 1e6;
    cleaned.trunc() / 1_000_000.0
}
