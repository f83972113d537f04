//! Merges independently sampled series into timestamp-aligned chart rows.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::SeriesError;
use crate::model::{MoistureSeries, TempSeries, TimeSeriesPoint};
use crate::time_range::parse_instant;

/// Name of the time column in a serialized row; no series may use it.
pub const TIME_COLUMN: &str = "t";

/// Charts draw at most this many lines; the rest are reported as hidden.
pub const MAX_VISIBLE_SERIES: usize = 8;

pub const MOISTURE_PALETTE: [&str; 8] = [
    "#2d8659", "#27ae60", "#f39c12", "#e74c3c", "#3498db", "#9b59b6", "#1abc9c", "#e67e22",
];

pub const TEMPERATURE_PALETTE: [&str; 8] = [
    "#e74c3c", "#f39c12", "#3498db", "#9b59b6", "#1abc9c", "#e67e22", "#2d8659", "#27ae60",
];

// ------------------------------------------------------------------ //
//  Input                                                              //
// ------------------------------------------------------------------ //

/// A series that can name itself uniquely within one chart.
pub trait KeyedSeries {
    fn series_key(&self) -> String;
    fn points(&self) -> &[TimeSeriesPoint];
}

impl KeyedSeries for MoistureSeries {
    fn series_key(&self) -> String {
        format!("{}@{}cm", self.device_name, self.depth_cm)
    }

    fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }
}

impl KeyedSeries for TempSeries {
    fn series_key(&self) -> String {
        self.device_name.clone()
    }

    fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }
}

// ------------------------------------------------------------------ //
//  Output                                                             //
// ------------------------------------------------------------------ //

/// All values observed at one instant, keyed by series.
///
/// A series with no point at `t` has no entry; it is never zero-filled.
/// Values serialize next to `t`, which [`align`] keeps free of collisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    pub t: DateTime<Utc>,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignedSeries {
    /// Ascending by `t`.
    pub rows: Vec<AlignedRow>,
    /// Distinct series keys in first-encountered order.
    pub keys: Vec<String>,
    /// Points dropped because their timestamp did not parse.
    pub skipped_points: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub key: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
    pub hidden: usize,
}

impl AlignedSeries {
    /// The first [`MAX_VISIBLE_SERIES`] keys with their line colours.
    pub fn legend(&self, palette: &[&'static str]) -> Legend {
        let entries = self
            .keys
            .iter()
            .take(MAX_VISIBLE_SERIES)
            .enumerate()
            .map(|(i, key)| LegendEntry {
                key: key.clone(),
                color: palette.get(i % palette.len().max(1)).copied().unwrap_or("#6b7280"),
            })
            .collect();
        Legend {
            entries,
            hidden: self.keys.len().saturating_sub(MAX_VISIBLE_SERIES),
        }
    }
}

// ------------------------------------------------------------------ //
//  Alignment                                                          //
// ------------------------------------------------------------------ //

/// Merge `series` into rows ordered by instant.
///
/// Rows are keyed by the parsed instant, so two spellings of the same moment
/// share a row. When one series has several points at the same instant the
/// last one processed wins. Points whose timestamp does not parse are skipped
/// and counted. Two series producing the same key is a caller error and fails
/// the whole call, as does a key equal to [`TIME_COLUMN`].
pub fn align<S: KeyedSeries>(series: &[S]) -> Result<AlignedSeries, SeriesError> {
    let mut keys = Vec::with_capacity(series.len());
    let mut seen = HashSet::with_capacity(series.len());
    let mut by_instant: BTreeMap<DateTime<Utc>, BTreeMap<String, f64>> = BTreeMap::new();
    let mut skipped_points = 0;

    for s in series {
        let key = s.series_key();
        if key == TIME_COLUMN {
            return Err(SeriesError::ReservedKey(key));
        }
        if !seen.insert(key.clone()) {
            return Err(SeriesError::DuplicateKey(key));
        }

        for point in s.points() {
            match parse_instant(&point.t) {
                Some(t) => {
                    by_instant.entry(t).or_default().insert(key.clone(), point.v);
                }
                None => {
                    skipped_points += 1;
                    debug!(series = %key, t = %point.t, "skipping point with unparseable timestamp");
                }
            }
        }
        keys.push(key);
    }

    let rows = by_instant
        .into_iter()
        .map(|(t, values)| AlignedRow { t, values })
        .collect();

    Ok(AlignedSeries {
        rows,
        keys,
        skipped_points,
    })
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
