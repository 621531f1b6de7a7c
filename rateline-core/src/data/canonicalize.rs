use crate::terminal::RawRate;
use tracing::debug;

/// Canonicalizer for raw terminal rates
pub struct Canonicalizer;

impl Canonicalizer {
    /// Canonicalize rates: stable sort by time, drop repeated timestamps keeping the first
    pub fn order(mut rates: Vec<RawRate>) -> Vec<RawRate> {
        let received = rates.len();
        rates.sort_by_key(|r| r.time);
        rates.dedup_by_key(|r| r.time);
        let dropped = received - rates.len();
        if dropped > 0 {
            debug!(received, dropped, "dropped bars with duplicate timestamps");
        }
        rates
    }

    /// True when times are strictly increasing
    pub fn is_ordered(rates: &[RawRate]) -> bool {
        rates.windows(2).all(|w| w[0].time < w[1].time)
    }

    /// Count closes that are NaN or not above zero (their log-returns are not finite)
    pub fn non_positive_closes(rates: &[RawRate]) -> usize {
        rates
            .iter()
            .filter(|r| r.close.is_nan() || r.close <= 0.0)
            .count()
    }
}
