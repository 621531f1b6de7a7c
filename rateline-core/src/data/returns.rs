//! Bar table — per-symbol close prices and their log-returns.
//!
//! Raw terminal rates are converted here, at the boundary, into the only
//! shape the rest of the crate sees: a chronological, timestamp-indexed table
//! with exactly two value columns.

use super::canonicalize::Canonicalizer;
use super::schema::{ReturnSchema, SchemaError};
use crate::terminal::RawRate;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use thiserror::Error;

/// Name of the timestamp column in frames.
pub const TIME_COLUMN: &str = "time";
/// Name of the close-price column.
pub const CLOSE_COLUMN: &str = "close";
/// Name of the log-return column.
pub const LOG_RETURN_COLUMN: &str = "log_return";

/// Errors building or exporting tables.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid timestamp {time} for symbol '{symbol}'")]
    InvalidTimestamp { symbol: String, time: i64 },

    #[error("column length mismatch: {index} timestamps, {close} closes")]
    LengthMismatch { index: usize, close: usize },

    #[error("frame error: {0}")]
    Frame(String),

    #[error("frame schema: {0}")]
    Schema(#[from] SchemaError),
}

/// Decode epoch seconds into a UTC timestamp.
pub fn decode_time(epoch_secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(epoch_secs, 0)
}

/// `ln(close_t / close_{t-1})` for every row; the first row is NaN.
pub fn log_returns(closes: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(f64::NAN);
    out.extend(closes.windows(2).map(|w| (w[1] / w[0]).ln()));
    out
}

/// One row of a [`BarTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRow {
    pub time: DateTime<Utc>,
    pub close: f64,
    pub log_return: f64,
}

/// Close and log-return series for one symbol, indexed by bar time.
#[derive(Debug, Clone)]
pub struct BarTable {
    index: Vec<DateTime<Utc>>,
    close: Vec<f64>,
    log_return: Vec<f64>,
}

impl BarTable {
    /// Value columns, in order. Open/high/low/volume/spread never make it in.
    pub const COLUMNS: [&'static str; 2] = [CLOSE_COLUMN, LOG_RETURN_COLUMN];

    /// Build from raw terminal rates.
    ///
    /// Rates are put in chronological order (duplicate timestamps keep the
    /// first bar) before returns are computed.
    pub fn from_rates(symbol: &str, rates: Vec<RawRate>) -> Result<Self, DataError> {
        let rates = Canonicalizer::order(rates);

        let mut index = Vec::with_capacity(rates.len());
        let mut close = Vec::with_capacity(rates.len());
        for r in &rates {
            let time = decode_time(r.time).ok_or_else(|| DataError::InvalidTimestamp {
                symbol: symbol.to_string(),
                time: r.time,
            })?;
            index.push(time);
            close.push(r.close);
        }

        Self::from_closes(index, close)
    }

    /// Build from an already chronological index and matching closes.
    pub fn from_closes(index: Vec<DateTime<Utc>>, close: Vec<f64>) -> Result<Self, DataError> {
        if index.len() != close.len() {
            return Err(DataError::LengthMismatch {
                index: index.len(),
                close: close.len(),
            });
        }
        let log_return = log_returns(&close);
        Ok(Self {
            index,
            close,
            log_return,
        })
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &Self::COLUMNS
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn log_return(&self) -> &[f64] {
        &self.log_return
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.index.first().copied()
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.index.last().copied()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.close.last().copied()
    }

    /// Mean of the finite log-returns, if there are any.
    pub fn mean_log_return(&self) -> Option<f64> {
        let finite: Vec<f64> = self
            .log_return
            .iter()
            .copied()
            .filter(|r| r.is_finite())
            .collect();
        if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = BarRow> + '_ {
        self.index
            .iter()
            .zip(&self.close)
            .zip(&self.log_return)
            .map(|((&time, &close), &log_return)| BarRow {
                time,
                close,
                log_return,
            })
    }

    /// Export as a polars frame: `time` (ms datetime), `close`, `log_return`.
    ///
    /// The frame is checked against [`ReturnSchema`] before it is handed out.
    pub fn to_frame(&self) -> Result<DataFrame, DataError> {
        let millis: Vec<i64> = self.index.iter().map(|t| t.timestamp_millis()).collect();

        let df = DataFrame::new(vec![
            Column::new(TIME_COLUMN.into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .map_err(|e| DataError::Frame(format!("time cast: {e}")))?,
            Column::new(CLOSE_COLUMN.into(), self.close.clone()),
            Column::new(LOG_RETURN_COLUMN.into(), self.log_return.clone()),
        ])
        .map_err(|e| DataError::Frame(format!("dataframe creation: {e}")))?;

        ReturnSchema::validate(&df)?;
        Ok(df)
    }
}

/// Tables are equal when index and closes match and log-returns match,
/// with NaN equal to NaN.
impl PartialEq for BarTable {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.close == other.close
            && self.log_return.len() == other.log_return.len()
            && self
                .log_return
                .iter()
                .zip(&other.log_return)
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}
