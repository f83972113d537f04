//! Response models for the gateway's REST API.

use serde::Serialize;

use probe_core::attention::AttentionCounts;
use probe_core::model::{AttentionDevice, Device, Farm, FarmDetail, Summary};
use probe_core::series::{AlignedRow, AlignedSeries, Legend};
use probe_core::status::{ColorCategory, DeviceStatus};
use probe_core::time_range::Preset;

// ------------------------------------------------------------------ //
//  Range / summary                                                    //
// ------------------------------------------------------------------ //

/// Response for `GET /dashboard/range`.
#[derive(Debug, Serialize)]
pub struct RangeResponse {
    pub preset: Preset,
    pub from: String,
    pub to: String,
    /// False when a custom range is missing a bound.
    pub complete: bool,
}

/// Response for `GET /dashboard/summary`.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: Summary,
    pub attention: AttentionCounts,
}

// ------------------------------------------------------------------ //
//  Attention                                                          //
// ------------------------------------------------------------------ //

#[derive(Debug, Serialize)]
pub struct AttentionEntry {
    #[serde(flatten)]
    pub device: AttentionDevice,
    pub rank: u8,
    pub category: ColorCategory,
    pub battery_bars: u8,
}

impl From<AttentionDevice> for AttentionEntry {
    fn from(device: AttentionDevice) -> Self {
        Self {
            rank: device.status.rank(),
            category: device.status.color_category(),
            battery_bars: device.battery_hint.map(|b| b.bars()).unwrap_or(4),
            device,
        }
    }
}

/// Response for `GET /dashboard/attention`.
#[derive(Debug, Serialize)]
pub struct AttentionResponse {
    pub devices: Vec<AttentionEntry>,
    pub counts: AttentionCounts,
}

// ------------------------------------------------------------------ //
//  Charts                                                             //
// ------------------------------------------------------------------ //

/// Response for `GET /dashboard/moisture` and `GET /dashboard/temperature`.
#[derive(Debug, Default, Serialize)]
pub struct ChartResponse {
    pub rows: Vec<AlignedRow>,
    pub keys: Vec<String>,
    pub legend: Option<Legend>,
    pub skipped_points: usize,
}

impl ChartResponse {
    pub fn new(aligned: AlignedSeries, palette: &[&'static str]) -> Self {
        let legend = aligned.legend(palette);
        Self {
            rows: aligned.rows,
            keys: aligned.keys,
            legend: Some(legend),
            skipped_points: aligned.skipped_points,
        }
    }
}

// ------------------------------------------------------------------ //
//  Farms and devices                                                  //
// ------------------------------------------------------------------ //

#[derive(Debug, Serialize)]
pub struct FarmView {
    #[serde(flatten)]
    pub farm: Farm,
    pub category: ColorCategory,
    pub marker_color: &'static str,
}

impl From<Farm> for FarmView {
    fn from(farm: Farm) -> Self {
        Self {
            category: farm.status.color_category(),
            marker_color: farm.status.marker_color(),
            farm,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeviceView {
    #[serde(flatten)]
    pub device: Device,
    pub resolved_status: DeviceStatus,
    pub category: ColorCategory,
    pub marker_color: &'static str,
}

impl From<Device> for DeviceView {
    fn from(device: Device) -> Self {
        let status = device.status_or_gray();
        Self {
            device,
            resolved_status: status,
            category: status.color_category(),
            marker_color: status.marker_color(),
        }
    }
}

/// Response for `GET /dashboard/farms/:id`.
#[derive(Debug, Serialize)]
pub struct FarmDetailResponse {
    pub id: String,
    pub name: String,
    pub device_count: u32,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub devices: Vec<DeviceView>,
    pub attention: AttentionCounts,
}

impl From<FarmDetail> for FarmDetailResponse {
    fn from(farm: FarmDetail) -> Self {
        let attention = AttentionCounts::tally(farm.devices.iter().map(Device::status_or_gray));
        Self {
            id: farm.id,
            name: farm.name,
            device_count: farm.device_count,
            lat: farm.lat,
            lon: farm.lon,
            devices: farm.devices.into_iter().map(DeviceView::from).collect(),
            attention,
        }
    }
}
