//! Terminal client trait and structured error types.
//!
//! The Terminal trait abstracts over the market-data terminal a session talks
//! to, so a live connection, an in-memory snapshot, and test doubles can be
//! swapped freely. There is no process-wide connection: every session is
//! handed its terminal explicitly.

pub mod group;
pub mod memory;
pub mod synthetic;

pub use group::{exclusion_filter, GroupFilter};
pub use memory::{MemoryTerminal, Snapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{SymbolInfo, Timeframe};

/// One bar exactly as the terminal delivers it.
///
/// `time` is the bar open in epoch seconds. Only `time` and `close` feed the
/// return tables; the other fields are carried so the boundary matches the
/// terminal's record shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRate {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub tick_volume: u64,
    #[serde(default)]
    pub spread: i32,
    #[serde(default)]
    pub real_volume: u64,
}

impl RawRate {
    /// A flat bar where every price equals `close`.
    pub fn flat(time: i64, close: f64) -> Self {
        Self {
            time,
            open: close,
            high: close,
            low: close,
            close,
            tick_volume: 0,
            spread: 0,
            real_volume: 0,
        }
    }
}

/// Errors raised by a terminal client.
///
/// A terminal that merely has nothing to say answers `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("terminal not initialized: {0}")]
    NotInitialized(String),

    #[error("terminal disconnected: {0}")]
    Disconnected(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("terminal error: {0}")]
    Other(String),
}

/// A market-data terminal.
///
/// All calls are blocking. `Ok(None)` is the terminal's "null" answer and is
/// distinct from an error raised by the client itself.
pub trait Terminal: Send + Sync {
    /// Human-readable name of this terminal.
    fn name(&self) -> &str;

    /// Look up symbols selected by a group filter expression (see [`group`]).
    fn symbols_by_group(&self, group: &str) -> Result<Option<Vec<SymbolInfo>>, TerminalError>;

    /// Up to `count` bars starting at `from` and moving forward.
    fn rates_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        count: usize,
    ) -> Result<Option<Vec<RawRate>>, TerminalError>;

    /// All bars with `from <= time <= to`.
    fn rates_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Vec<RawRate>>, TerminalError>;
}

impl<T: Terminal + ?Sized> Terminal for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn symbols_by_group(&self, group: &str) -> Result<Option<Vec<SymbolInfo>>, TerminalError> {
        (**self).symbols_by_group(group)
    }

    fn rates_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        count: usize,
    ) -> Result<Option<Vec<RawRate>>, TerminalError> {
        (**self).rates_from(symbol, timeframe, from, count)
    }

    fn rates_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Vec<RawRate>>, TerminalError> {
        (**self).rates_range(symbol, timeframe, from, to)
    }
}

impl<T: Terminal + ?Sized> Terminal for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn symbols_by_group(&self, group: &str) -> Result<Option<Vec<SymbolInfo>>, TerminalError> {
        (**self).symbols_by_group(group)
    }

    fn rates_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        count: usize,
    ) -> Result<Option<Vec<RawRate>>, TerminalError> {
        (**self).rates_from(symbol, timeframe, from, count)
    }

    fn rates_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Vec<RawRate>>, TerminalError> {
        (**self).rates_range(symbol, timeframe, from, to)
    }
}
