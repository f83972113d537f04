//! Records returned by the backend API.

use serde::{Deserialize, Serialize};

use crate::status::{BatteryHint, DeviceStatus};

// ------------------------------------------------------------------ //
//  Series                                                             //
// ------------------------------------------------------------------ //

/// One raw observation. `t` is ISO-8601 and is parsed during alignment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimeSeriesPoint {
    pub t: String,
    pub v: f64,
}

/// Soil moisture at one depth of one device.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MoistureSeries {
    pub device_name: String,
    pub depth_cm: i32,
    #[serde(default)]
    pub points: Vec<TimeSeriesPoint>,
}

/// Soil temperature of one device.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TempSeries {
    pub device_name: String,
    #[serde(default)]
    pub points: Vec<TimeSeriesPoint>,
}

// ------------------------------------------------------------------ //
//  Devices and farms                                                  //
// ------------------------------------------------------------------ //

/// A device in the attention feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AttentionDevice {
    pub device_id: i64,
    pub alias: String,
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_hint: Option<BatteryHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Device {
    pub id: i64,
    pub alias: String,
    #[serde(default)]
    pub status: Option<DeviceStatus>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Moisture at 30 cm, the reference depth.
    #[serde(default)]
    pub moisture30: Option<f64>,
    #[serde(default)]
    pub battery_hint: Option<BatteryHint>,
}

impl Device {
    /// Devices without a reported status are drawn as "no data".
    pub fn status_or_gray(&self) -> DeviceStatus {
        self.status.unwrap_or(DeviceStatus::Gray)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Farm {
    pub id: String,
    pub name: String,
    pub device_count: u32,
    pub status: DeviceStatus,
    pub attention_count: u32,
    #[serde(default)]
    pub last_reading: Option<String>,
    #[serde(default)]
    pub last_reading_at: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FarmDetail {
    pub id: String,
    pub name: String,
    pub device_count: u32,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Entry of [`Summary::devices_needing_attention`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SummaryDevice {
    pub status: DeviceStatus,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub device_id: Option<i64>,
}

/// KPI summary for the selected window.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Summary {
    #[serde(default)]
    pub devices_needing_attention: Option<Vec<SummaryDevice>>,
    #[serde(default)]
    pub avg_moisture: Option<f64>,
    #[serde(default)]
    pub avg_temp: Option<f64>,
    #[serde(default)]
    pub last_reading_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farm_with_nulls_and_unknown_status() {
        let farm: Farm = serde_json::from_value(serde_json::json!({
            "id": "north-field",
            "name": "North Field",
            "device_count": 4,
            "status": "teal",
            "attention_count": 1,
            "last_reading": null,
            "last_reading_at": null,
            "lat": null,
            "lon": null
        }))
        .unwrap();
        assert_eq!(farm.status, DeviceStatus::Unknown);
        assert_eq!(farm.lat, None);
    }

    #[test]
    fn device_without_status_is_gray() {
        let device: Device =
            serde_json::from_value(serde_json::json!({"id": 3, "alias": "probe-3"})).unwrap();
        assert_eq!(device.status_or_gray(), DeviceStatus::Gray);
    }

    #[test]
    fn series_points_default_to_empty() {
        let s: MoistureSeries =
            serde_json::from_value(serde_json::json!({"device_name": "p1", "depth_cm": 30}))
                .unwrap();
        assert!(s.points.is_empty());
    }
}
