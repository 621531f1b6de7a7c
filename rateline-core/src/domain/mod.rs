//! Domain types for rateline

pub mod symbol;
pub mod timeframe;
pub mod window;

pub use symbol::SymbolInfo;
pub use timeframe::Timeframe;
pub use window::{TimeWindow, DEFAULT_LOOKBACK_DAYS};

/// Symbol name alias
pub type Symbol = String;
