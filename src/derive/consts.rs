//! Shared constants and arithmetic helpers for the derivation engine.
//!
//! `NotAvailable` is a sentinel rather than an `Option<f64>` wrapper so that
//! row types stay flat and sortable by primitive comparison — the sort
//! functions and formatters are the only places aware of it, and they treat
//! it uniformly (spec.md §9 "Sentinel value choice").

pub const MIN_INTERVAL_SEC: f64 = 1.0;
pub const MAX_RATE_PER_SEC: f64 = 50_000_000.0;
pub const MAX_LATENCY_MS: f64 = 300_000.0;
pub const NOT_AVAILABLE: f64 = -1.0;

/// `true` for any sentinel value — the sole negative value a rate/latency
/// field may hold.
pub fn is_not_available(v: f64) -> bool {
    v < 0.0
}

/// Huge values are treated as counter wraps and suppressed rather than
/// propagated as spurious spikes.
pub fn clamp_rate(r: f64) -> f64 {
    if r > MAX_RATE_PER_SEC { 0.0 } else { r }
}

pub fn clamp_latency(l: f64) -> f64 {
    l.min(MAX_LATENCY_MS)
}

pub fn safe_divide(a: f64, b: f64) -> f64 {
    if b == 0.0 { 0.0 } else { a / b }
}

/// Counter-reset protection: a decreasing counter yields zero, never a
/// negative delta.
pub fn non_neg_delta(curr: u64, prev: u64) -> u64 {
    curr.saturating_sub(prev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_rate_passes_through_below_cap() {
        assert_eq!(clamp_rate(1000.0), 1000.0);
    }

    #[test]
    fn clamp_rate_suppresses_above_cap() {
        assert_eq!(clamp_rate(MAX_RATE_PER_SEC + 1.0), 0.0);
    }

    #[test]
    fn clamp_rate_idempotent() {
        let x = MAX_RATE_PER_SEC + 1.0;
        assert_eq!(clamp_rate(clamp_rate(x)), clamp_rate(x));
        let y = 42.0;
        assert_eq!(clamp_rate(clamp_rate(y)), clamp_rate(y));
    }

    #[test]
    fn clamp_latency_idempotent() {
        let x = MAX_LATENCY_MS + 500.0;
        assert_eq!(clamp_latency(clamp_latency(x)), clamp_latency(x));
    }

    #[test]
    fn safe_divide_by_zero_is_zero() {
        assert_eq!(safe_divide(10.0, 0.0), 0.0);
    }

    #[test]
    fn non_neg_delta_on_counter_reset_is_zero() {
        assert_eq!(non_neg_delta(50, 5000), 0);
    }
}
