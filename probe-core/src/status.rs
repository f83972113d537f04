//! Device and farm health-status classification.

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------ //
//  Types                                                              //
// ------------------------------------------------------------------ //

/// Health status reported by the backend for a device or a whole farm.
///
/// `red` needs irrigation now, `amber` soon, `green` is optimal and `blue`
/// is over-saturated. `stale`, `offline` and `gray` mean no recent data.
/// Codes this build does not know deserialize to [`DeviceStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Red,
    Amber,
    Green,
    Blue,
    Stale,
    Offline,
    Gray,
    #[serde(other)]
    Unknown,
}

impl DeviceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceStatus::Red     => "red",
            DeviceStatus::Amber   => "amber",
            DeviceStatus::Green   => "green",
            DeviceStatus::Blue    => "blue",
            DeviceStatus::Stale   => "stale",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Gray    => "gray",
            DeviceStatus::Unknown => "unknown",
        }
    }

    pub fn from_code(s: &str) -> Self {
        match s {
            "red"     => DeviceStatus::Red,
            "amber"   => DeviceStatus::Amber,
            "green"   => DeviceStatus::Green,
            "blue"    => DeviceStatus::Blue,
            "stale"   => DeviceStatus::Stale,
            "offline" => DeviceStatus::Offline,
            "gray"    => DeviceStatus::Gray,
            _         => DeviceStatus::Unknown,
        }
    }

    /// Triage priority, lower first: red, amber, no-data, blue, green.
    pub fn rank(self) -> u8 {
        match self {
            DeviceStatus::Red => 1,
            DeviceStatus::Amber => 2,
            DeviceStatus::Stale | DeviceStatus::Offline | DeviceStatus::Gray => 3,
            DeviceStatus::Blue => 4,
            DeviceStatus::Green => 5,
            DeviceStatus::Unknown => 6,
        }
    }

    /// Whether a device in this state belongs in the attention feed.
    ///
    /// Green and blue devices never do, whatever else is wrong with them.
    pub fn is_alert_worthy(self) -> bool {
        matches!(
            self,
            DeviceStatus::Red
                | DeviceStatus::Amber
                | DeviceStatus::Stale
                | DeviceStatus::Offline
                | DeviceStatus::Gray
        )
    }

    pub fn color_category(self) -> ColorCategory {
        match self {
            DeviceStatus::Red => ColorCategory {
                bg: "bg-red-50",
                border: "border-red-300",
                text: "text-red-700",
                label: "Needs Attention",
            },
            DeviceStatus::Amber => ColorCategory {
                bg: "bg-amber-50",
                border: "border-amber-300",
                text: "text-amber-700",
                label: "Monitor",
            },
            DeviceStatus::Stale | DeviceStatus::Offline => ColorCategory {
                bg: "bg-gray-50",
                border: "border-gray-300",
                text: "text-gray-600",
                label: "Offline",
            },
            DeviceStatus::Gray => ColorCategory {
                bg: "bg-gray-50",
                border: "border-gray-300",
                text: "text-gray-600",
                label: "No Data",
            },
            DeviceStatus::Blue => ColorCategory {
                bg: "bg-blue-50",
                border: "border-blue-300",
                text: "text-blue-700",
                label: "Too Wet",
            },
            DeviceStatus::Green | DeviceStatus::Unknown => ColorCategory {
                bg: "bg-emerald-50",
                border: "border-emerald-300",
                text: "text-emerald-700",
                label: "Healthy",
            },
        }
    }

    /// Pin colour for map markers.
    pub fn marker_color(self) -> &'static str {
        match self {
            DeviceStatus::Red   => "#dc2626",
            DeviceStatus::Amber => "#d97706",
            DeviceStatus::Green => "#059669",
            DeviceStatus::Blue  => "#2563eb",
            _                   => "#6b7280",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Presentation descriptor for a status badge or card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorCategory {
    pub bg: &'static str,
    pub border: &'static str,
    pub text: &'static str,
    pub label: &'static str,
}

/// Battery level hint attached to attention entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryHint {
    Ok,
    Low,
    Critical,
    #[serde(other)]
    Unknown,
}

impl BatteryHint {
    /// Filled bars out of four.
    pub fn bars(self) -> u8 {
        match self {
            BatteryHint::Critical => 1,
            BatteryHint::Low => 2,
            BatteryHint::Ok | BatteryHint::Unknown => 4,
        }
    }
}

// ------------------------------------------------------------------ //
//  Free-function surface                                              //
// ------------------------------------------------------------------ //

pub fn rank(status: DeviceStatus) -> u8 {
    status.rank()
}

pub fn color_category(status: DeviceStatus) -> ColorCategory {
    status.color_category()
}

pub fn is_alert_worthy(status: DeviceStatus) -> bool {
    status.is_alert_worthy()
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: [DeviceStatus; 7] = [
        DeviceStatus::Red,
        DeviceStatus::Amber,
        DeviceStatus::Green,
        DeviceStatus::Blue,
        DeviceStatus::Stale,
        DeviceStatus::Offline,
        DeviceStatus::Gray,
    ];

    #[test]
    fn rank_orders_red_amber_nodata_blue_green() {
        assert!(rank(DeviceStatus::Red) < rank(DeviceStatus::Amber));
        assert!(rank(DeviceStatus::Amber) < rank(DeviceStatus::Stale));
        assert_eq!(rank(DeviceStatus::Stale), rank(DeviceStatus::Offline));
        assert_eq!(rank(DeviceStatus::Offline), rank(DeviceStatus::Gray));
        assert!(rank(DeviceStatus::Gray) < rank(DeviceStatus::Blue));
        assert!(rank(DeviceStatus::Blue) < rank(DeviceStatus::Green));
    }

    #[test]
    fn unknown_sorts_last() {
        for s in KNOWN {
            assert!(rank(s) < rank(DeviceStatus::Unknown), "{s}");
        }
        assert_eq!(rank(DeviceStatus::Unknown), 6);
    }

    #[test]
    fn alert_worthy_set() {
        let alerting: Vec<_> = KNOWN.into_iter().filter(|s| is_alert_worthy(*s)).collect();
        assert_eq!(
            alerting,
            vec![
                DeviceStatus::Red,
                DeviceStatus::Amber,
                DeviceStatus::Stale,
                DeviceStatus::Offline,
                DeviceStatus::Gray,
            ]
        );
        assert!(!is_alert_worthy(DeviceStatus::Green));
        assert!(!is_alert_worthy(DeviceStatus::Blue));
        assert!(!is_alert_worthy(DeviceStatus::Unknown));
    }

    #[test]
    fn labels_per_status() {
        assert_eq!(color_category(DeviceStatus::Red).label, "Needs Attention");
        assert_eq!(color_category(DeviceStatus::Amber).label, "Monitor");
        assert_eq!(color_category(DeviceStatus::Stale).label, "Offline");
        assert_eq!(color_category(DeviceStatus::Offline).label, "Offline");
        assert_eq!(color_category(DeviceStatus::Gray).label, "No Data");
        assert_eq!(color_category(DeviceStatus::Blue).label, "Too Wet");
        assert_eq!(color_category(DeviceStatus::Green).label, "Healthy");
    }

    #[test]
    fn unknown_falls_back_to_healthy_descriptor() {
        assert_eq!(
            color_category(DeviceStatus::Unknown),
            color_category(DeviceStatus::Green)
        );
    }

    #[test]
    fn unrecognised_wire_code_deserializes_to_unknown() {
        let s: DeviceStatus = serde_json::from_str("\"purple\"").unwrap();
        assert_eq!(s, DeviceStatus::Unknown);
        let s: DeviceStatus = serde_json::from_str("\"amber\"").unwrap();
        assert_eq!(s, DeviceStatus::Amber);
        assert_eq!(DeviceStatus::from_code("purple"), DeviceStatus::Unknown);
    }

    #[test]
    fn code_round_trip() {
        for s in KNOWN {
            assert_eq!(DeviceStatus::from_code(s.as_str()), s);
            assert_eq!(serde_json::to_string(&s).unwrap(), format!("\"{s}\""));
        }
    }

    #[test]
    fn no_data_statuses_share_grey_marker() {
        assert_eq!(DeviceStatus::Stale.marker_color(), "#6b7280");
        assert_eq!(DeviceStatus::Gray.marker_color(), "#6b7280");
        assert_ne!(DeviceStatus::Red.marker_color(), DeviceStatus::Amber.marker_color());
    }

    #[test]
    fn battery_bars() {
        assert_eq!(BatteryHint::Critical.bars(), 1);
        assert_eq!(BatteryHint::Low.bars(), 2);
        assert_eq!(BatteryHint::Ok.bars(), 4);
        let hint: BatteryHint = serde_json::from_str("\"charging\"").unwrap();
        assert_eq!(hint, BatteryHint::Unknown);
        assert_eq!(hint.bars(), 4);
    }
}
