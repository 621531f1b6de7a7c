//! In-memory terminal backed by a symbol list and per-timeframe rate series.
//!
//! Used for offline runs (JSON snapshots), the synthetic generator, and tests.

use super::group::GroupFilter;
use super::{RawRate, Terminal, TerminalError};
use crate::domain::{SymbolInfo, Timeframe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Serialized form of a [`MemoryTerminal`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbols: Vec<SymbolInfo>,
    #[serde(default)]
    pub series: Vec<SnapshotSeries>,
}

/// Rates for one symbol at one timeframe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSeries {
    pub symbol: String,
    #[serde(default)]
    pub timeframe: Timeframe,
    pub rates: Vec<RawRate>,
}

/// Terminal answering from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTerminal {
    name: String,
    symbols: Vec<SymbolInfo>,
    rates: HashMap<(String, Timeframe), Vec<RawRate>>,
}

impl MemoryTerminal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register a symbol. Re-registering a name replaces its descriptor in place.
    pub fn with_symbol(mut self, info: SymbolInfo) -> Self {
        self.insert_symbol(info);
        self
    }

    /// Attach rates for a symbol and timeframe. Rates are stored ascending by time.
    pub fn with_rates(
        mut self,
        symbol: impl Into<String>,
        timeframe: Timeframe,
        rates: Vec<RawRate>,
    ) -> Self {
        self.insert_rates(symbol, timeframe, rates);
        self
    }

    pub fn insert_symbol(&mut self, info: SymbolInfo) {
        match self.symbols.iter_mut().find(|s| s.name == info.name) {
            Some(existing) => *existing = info,
            None => self.symbols.push(info),
        }
    }

    pub fn insert_rates(
        &mut self,
        symbol: impl Into<String>,
        timeframe: Timeframe,
        mut rates: Vec<RawRate>,
    ) {
        rates.sort_by_key(|r| r.time);
        self.rates.insert((symbol.into(), timeframe), rates);
    }

    pub fn symbols(&self) -> &[SymbolInfo] {
        &self.symbols
    }

    /// Stored rates for a symbol and timeframe, if any.
    pub fn series(&self, symbol: &str, timeframe: Timeframe) -> Option<&[RawRate]> {
        self.rates
            .get(&(symbol.to_string(), timeframe))
            .map(|v| v.as_slice())
    }

    /// Build from a snapshot.
    pub fn from_snapshot(name: impl Into<String>, snapshot: Snapshot) -> Self {
        let mut terminal = Self::new(name);
        for info in snapshot.symbols {
            terminal.insert_symbol(info);
        }
        for s in snapshot.series {
            terminal.insert_rates(s.symbol, s.timeframe, s.rates);
        }
        terminal
    }

    /// Parse a JSON snapshot string.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, TerminalError> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| TerminalError::Snapshot(format!("parse snapshot: {e}")))?;
        Ok(Self::from_snapshot(name, snapshot))
    }

    /// Load a JSON snapshot file. The terminal is named after the file.
    pub fn from_snapshot_file(path: &Path) -> Result<Self, TerminalError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TerminalError::Snapshot(format!("read snapshot {}: {e}", path.display()))
        })?;
        Self::from_json(path.display().to_string(), &content)
    }

    /// Export the current contents. Series are ordered by symbol list, then timeframe.
    pub fn to_snapshot(&self) -> Snapshot {
        let mut keys: Vec<&(String, Timeframe)> = self.rates.keys().collect();
        keys.sort_by_key(|(symbol, tf)| {
            let pos = self
                .symbols
                .iter()
                .position(|s| &s.name == symbol)
                .unwrap_or(usize::MAX);
            (pos, symbol.clone(), *tf)
        });

        Snapshot {
            symbols: self.symbols.clone(),
            series: keys
                .into_iter()
                .map(|key| SnapshotSeries {
                    symbol: key.0.clone(),
                    timeframe: key.1,
                    rates: self.rates[key].clone(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, TerminalError> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| TerminalError::Snapshot(format!("serialize snapshot: {e}")))
    }
}

impl Terminal for MemoryTerminal {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbols_by_group(&self, group: &str) -> Result<Option<Vec<SymbolInfo>>, TerminalError> {
        let filter = GroupFilter::parse(group);
        Ok(Some(
            self.symbols
                .iter()
                .filter(|s| filter.matches(&s.name))
                .cloned()
                .collect(),
        ))
    }

    fn rates_from(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        count: usize,
    ) -> Result<Option<Vec<RawRate>>, TerminalError> {
        let from = from.timestamp();
        Ok(self.series(symbol, timeframe).map(|rates| {
            rates
                .iter()
                .filter(|r| r.time >= from)
                .take(count)
                .copied()
                .collect()
        }))
    }

    fn rates_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Vec<RawRate>>, TerminalError> {
        let (from, to) = (from.timestamp(), to.timestamp());
        Ok(self.series(symbol, timeframe).map(|rates| {
            rates
                .iter()
                .filter(|r| from <= r.time && r.time <= to)
                .copied()
                .collect()
        }))
    }
}
