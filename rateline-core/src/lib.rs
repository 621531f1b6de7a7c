//! Rateline Core — instrument universe resolution and history retrieval.
//!
//! This crate turns a market-data terminal into analysis-ready tables:
//! - Domain types (time windows, timeframes, symbol descriptors)
//! - The `Terminal` trait, its group-filter language, and in-memory terminals
//! - Bar tables holding close prices and log-returns per symbol
//! - Multi-symbol alignment onto a common timeline
//! - The `Session` façade tying a window and timeframe to one terminal
//! - TOML session configuration

pub mod config;
pub mod data;
pub mod domain;
pub mod session;
pub mod terminal;

pub use config::{ConfigError, SessionConfig};
pub use data::{align_returns, AlignedReturns, BarTable, DataError};
pub use domain::{SymbolInfo, TimeWindow, Timeframe, DEFAULT_LOOKBACK_DAYS};
pub use session::{
    resolve_universe, FetchMode, ResultCollection, Session, SessionError, SessionOptions, MAX_BARS,
};
pub use terminal::{exclusion_filter, GroupFilter, MemoryTerminal, RawRate, Terminal, TerminalError};
