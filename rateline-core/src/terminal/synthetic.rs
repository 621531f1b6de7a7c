//! Synthetic terminal for demos and tests.
//!
//! Produces a deterministic random walk per symbol. The data is clearly fake:
//! prices start at 100.0 and the terminal is named `synthetic`.

use super::memory::MemoryTerminal;
use super::RawRate;
use crate::domain::{SymbolInfo, Timeframe};
use chrono::{DateTime, Datelike, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Symbols used when the caller doesn't name any.
pub const DEFAULT_SYMBOLS: [&str; 6] = ["EURUSD", "GBPUSD", "USDJPY", "EURGBP", "XAUUSD", "US500"];

/// Build a terminal holding one random-walk series per symbol over `[start, end]`.
pub fn generate<S: AsRef<str>>(
    symbols: &[S],
    timeframe: Timeframe,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> MemoryTerminal {
    let mut terminal = MemoryTerminal::new("synthetic");
    for symbol in symbols {
        let symbol = symbol.as_ref();
        terminal.insert_symbol(SymbolInfo::named(symbol).with_description("synthetic random walk"));
        terminal.insert_rates(symbol, timeframe, random_walk(symbol, timeframe, start, end));
    }
    terminal
}

/// Random walk for one symbol. Seeded from the symbol name, so repeatable.
pub fn random_walk(
    symbol: &str,
    timeframe: Timeframe,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<RawRate> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let step = timeframe.nominal_duration();
    let skip_weekends = timeframe.is_intraday_or_daily();

    let mut rates = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if skip_weekends && matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += step;
            continue;
        }

        let bar_return: f64 = rng.gen_range(-0.02..0.02);
        let open = price;
        let close = price * (1.0 + bar_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));

        rates.push(RawRate {
            time: current.timestamp(),
            open,
            high,
            low,
            close,
            tick_volume: rng.gen_range(1_000..50_000u64),
            spread: rng.gen_range(1..30),
            real_volume: 0,
        });

        price = close;
        current += step;
    }

    rates
}
