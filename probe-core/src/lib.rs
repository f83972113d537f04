//! Telemetry aggregation and classification for the soil-probe dashboard.
//!
//! Everything except [`source`] is pure and synchronous: callers pass the
//! current instant in explicitly and get plain values back.

pub mod attention;
pub mod error;
pub mod model;
pub mod query;
pub mod series;
pub mod source;
pub mod status;
pub mod time_range;

pub use attention::{select_and_order, AttentionCounts};
pub use error::{SeriesError, SourceError};
pub use query::{build, ParameterBag, Selection};
pub use series::{align, AlignedRow, AlignedSeries, KeyedSeries};
pub use status::{BatteryHint, ColorCategory, DeviceStatus};
pub use time_range::{resolve, Preset, TimeRange};
