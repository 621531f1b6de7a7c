//! Session — a thin façade over one terminal.
//!
//! A session fixes a time window and timeframe at construction, resolves the
//! instrument universe once, and then fetches per-symbol history into
//! [`BarTable`]s on demand. Every retrieval call builds a fresh
//! [`ResultCollection`]; nothing is cached between calls.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::{BarTable, Canonicalizer, DataError};
use crate::domain::{Symbol, SymbolInfo, TimeWindow, Timeframe, DEFAULT_LOOKBACK_DAYS};
use crate::terminal::{exclusion_filter, Terminal, TerminalError};

/// Upper bound on bars requested per symbol in [`FetchMode::FromAnchor`].
pub const MAX_BARS: usize = 100_000;

/// Per-symbol tables keyed by name, in the order symbols were requested.
pub type ResultCollection = IndexMap<Symbol, BarTable>;

/// How history is requested from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Up to [`MAX_BARS`] bars moving forward from the window start.
    #[default]
    FromAnchor,
    /// Every bar inside the window, both ends inclusive.
    Range,
}

impl FetchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::FromAnchor => "from_anchor",
            FetchMode::Range => "range",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "from_anchor" | "from-anchor" | "anchor" => Ok(FetchMode::FromAnchor),
            "range" => Ok(FetchMode::Range),
            other => Err(format!(
                "unknown fetch mode '{other}' (expected 'from_anchor' or 'range')"
            )),
        }
    }
}

/// Construction parameters for a [`Session`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub start: Option<DateTime<Utc>>,
    pub lookback_days: u32,
    pub timeframe: Timeframe,
    pub end: Option<DateTime<Utc>>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            start: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            timeframe: Timeframe::default(),
            end: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("instrument universe unavailable: the terminal returned no symbol list")]
    UniverseUnavailable,
}

/// Ask `terminal` for every symbol not matching one of `exclusions`.
///
/// The answer is returned exactly as the terminal gave it.
pub fn resolve_universe<T, S>(
    terminal: &T,
    exclusions: &[S],
) -> Result<Option<Vec<SymbolInfo>>, TerminalError>
where
    T: Terminal + ?Sized,
    S: AsRef<str>,
{
    let expr = exclusion_filter(exclusions);
    debug!(terminal = terminal.name(), group = %expr, "symbol lookup");
    terminal.symbols_by_group(&expr)
}

pub struct Session<T: Terminal> {
    terminal: T,
    window: TimeWindow,
    timeframe: Timeframe,
    lookback_days: u32,
    universe: Option<Vec<SymbolInfo>>,
}

impl<T: Terminal> Session<T> {
    /// Build a session, resolving the window against the current time.
    pub fn new(terminal: T, options: SessionOptions) -> Result<Self, SessionError> {
        Self::with_clock(terminal, options, Utc::now())
    }

    /// Build a session with an explicit "now".
    pub fn with_clock(
        terminal: T,
        options: SessionOptions,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let window = TimeWindow::resolve(options.start, options.end, options.lookback_days, now);
        if window.is_degenerate() {
            warn!(start = %window.start, end = %window.end, "window start lies after end");
        }

        let universe = resolve_universe::<T, &str>(&terminal, &[])?;
        match &universe {
            Some(symbols) => info!(
                terminal = terminal.name(),
                start = %window.start,
                end = %window.end,
                timeframe = %options.timeframe,
                universe = symbols.len(),
                "session ready"
            ),
            None => warn!(
                terminal = terminal.name(),
                start = %window.start,
                end = %window.end,
                timeframe = %options.timeframe,
                "session ready without a universe"
            ),
        }

        Ok(Self {
            terminal,
            window,
            timeframe: options.timeframe,
            lookback_days: options.lookback_days,
            universe,
        })
    }

    pub fn resolve_universe<S: AsRef<str>>(
        &self,
        exclusions: &[S],
    ) -> Result<Option<Vec<SymbolInfo>>, TerminalError> {
        resolve_universe(&self.terminal, exclusions)
    }

    /// Fetch history for each instrument, in order.
    ///
    /// Instruments for which the terminal has no bars are left out of the
    /// collection. Terminal and data errors abort the whole batch.
    pub fn fetch_history(
        &self,
        instruments: &[SymbolInfo],
        mode: FetchMode,
    ) -> Result<ResultCollection, SessionError> {
        let mut out = ResultCollection::with_capacity(instruments.len());

        for info in instruments {
            let symbol = info.name.as_str();
            let response = match mode {
                FetchMode::FromAnchor => {
                    self.terminal
                        .rates_from(symbol, self.timeframe, self.window.start, MAX_BARS)?
                }
                FetchMode::Range => self.terminal.rates_range(
                    symbol,
                    self.timeframe,
                    self.window.start,
                    self.window.end,
                )?,
            };

            let rates = match response {
                Some(rates) if !rates.is_empty() => rates,
                _ => {
                    debug!(symbol, %mode, "no history returned; skipping");
                    continue;
                }
            };
            debug!(symbol, %mode, bars = rates.len(), "history received");

            let bad = Canonicalizer::non_positive_closes(&rates);
            if bad > 0 {
                warn!(symbol, count = bad, "non-positive closes; log-returns will not be finite");
            }

            let table = BarTable::from_rates(symbol, rates)?;
            out.insert(info.name.clone(), table);
        }

        info!(
            requested = instruments.len(),
            returned = out.len(),
            %mode,
            "history fetch complete"
        );
        Ok(out)
    }

    /// [`fetch_history`](Self::fetch_history) over the universe resolved at construction.
    pub fn fetch_universe_history(&self, mode: FetchMode) -> Result<ResultCollection, SessionError> {
        let universe = self
            .universe
            .as_deref()
            .ok_or(SessionError::UniverseUnavailable)?;
        self.fetch_history(universe, mode)
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.window.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.window.end
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// The universe resolved at construction; `None` if the terminal had none.
    pub fn universe(&self) -> Option<&[SymbolInfo]> {
        self.universe.as_deref()
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::{MemoryTerminal, RawRate};
    use chrono::{Duration, TimeZone};

    const DAY: i64 = 86_400;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn terminal() -> MemoryTerminal {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp();
        let closes = [100.0, 110.0, 99.0];
        let rates: Vec<RawRate> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| RawRate::flat(base + i as i64 * DAY, c))
            .collect();
        MemoryTerminal::new("test")
            .with_symbol(SymbolInfo::named("EURUSD"))
            .with_symbol(SymbolInfo::named("GBPUSD"))
            .with_symbol(SymbolInfo::named("USDJPY"))
            .with_rates("EURUSD", Timeframe::D1, rates.clone())
            .with_rates("USDJPY", Timeframe::D1, rates)
    }

    #[test]
    fn default_options_use_250_day_lookback() {
        let s = Session::with_clock(terminal(), SessionOptions::default(), now()).unwrap();
        assert_eq!(s.end(), now());
        assert_eq!(s.start(), now() - Duration::days(250));
        assert_eq!(s.timeframe(), Timeframe::D1);
        assert_eq!(s.lookback_days(), 250);
    }

    #[test]
    fn explicit_start_wins_over_lookback() {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let opts = SessionOptions {
            start: Some(start),
            lookback_days: 5,
            ..Default::default()
        };
        let s = Session::with_clock(terminal(), opts, now()).unwrap();
        assert_eq!(s.start(), start);
        assert_eq!(s.lookback_days(), 5);
    }

    #[test]
    fn degenerate_window_is_kept() {
        let opts = SessionOptions {
            start: Some(now() + Duration::days(1)),
            ..Default::default()
        };
        let s = Session::with_clock(terminal(), opts, now()).unwrap();
        assert!(s.window().is_degenerate());
    }

    #[test]
    fn universe_is_resolved_at_construction() {
        let s = Session::with_clock(terminal(), SessionOptions::default(), now()).unwrap();
        let names: Vec<&str> = s.universe().unwrap().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["EURUSD", "GBPUSD", "USDJPY"]);
    }

    #[test]
    fn resolve_universe_applies_exclusions() {
        let s = Session::with_clock(terminal(), SessionOptions::default(), now()).unwrap();
        let names: Vec<String> = s
            .resolve_universe(&["JPY"])
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["EURUSD", "GBPUSD"]);
    }

    #[test]
    fn fetch_universe_skips_symbols_without_history() {
        let opts = SessionOptions {
            start: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let s = Session::with_clock(terminal(), opts, now()).unwrap();
        let out = s.fetch_universe_history(FetchMode::FromAnchor).unwrap();
        let keys: Vec<&str> = out.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["EURUSD", "USDJPY"]);
        assert_eq!(out["EURUSD"].close(), &[100.0, 110.0, 99.0]);
    }

    #[test]
    fn range_mode_respects_window_end() {
        let opts = SessionOptions {
            start: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let s = Session::with_clock(terminal(), opts, now()).unwrap();
        let out = s
            .fetch_history(&[SymbolInfo::named("EURUSD")], FetchMode::Range)
            .unwrap();
        assert_eq!(out["EURUSD"].close(), &[100.0, 110.0]);
    }

    #[test]
    fn fetch_mode_parses_and_displays() {
        assert_eq!("range".parse::<FetchMode>().unwrap(), FetchMode::Range);
        assert_eq!("from-anchor".parse::<FetchMode>().unwrap(), FetchMode::FromAnchor);
        assert_eq!("Anchor".parse::<FetchMode>().unwrap(), FetchMode::FromAnchor);
        assert!("sideways".parse::<FetchMode>().is_err());
        assert_eq!(FetchMode::default().to_string(), "from_anchor");
    }
}
