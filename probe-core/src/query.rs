//! Dashboard selection state and the query parameters derived from it.

use chrono::{DateTime, TimeZone};
use sha2::{Digest, Sha256};

use crate::time_range::{resolve, Preset};

pub const FROM: &str = "from";
pub const TO: &str = "to";
pub const DEVICE_IDS: &str = "device_ids[]";
pub const DEPTHS: &str = "depths[]";

// ------------------------------------------------------------------ //
//  Selection                                                          //
// ------------------------------------------------------------------ //

/// What the operator has selected: a window plus optional device and depth
/// filters.
///
/// Values are immutable; every update returns a new `Selection`. Device ids
/// and depths stay duplicate-free in the order they were first selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    preset: Preset,
    explicit_from: Option<String>,
    explicit_to: Option<String>,
    device_ids: Vec<i64>,
    depths: Vec<i32>,
}

impl Selection {
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Read selection state from URL-style pairs: `preset`, `from`, `to` and
    /// comma-separated `devices` / `depths`.
    ///
    /// Without a `preset`, stored `from`/`to` bounds imply a custom range.
    /// List entries that do not parse are dropped.
    pub fn from_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut preset = None;
        let mut from = None;
        let mut to = None;
        let mut devices = Vec::new();
        let mut depths = Vec::new();

        for (k, v) in pairs {
            let v = v.as_ref();
            match k.as_ref() {
                "preset" => preset = Some(Preset::from_code(v)),
                "from" => from = Some(v.to_string()),
                "to" => to = Some(v.to_string()),
                "devices" => devices.extend(parse_list::<i64>(v)),
                "depths" => depths.extend(parse_list::<i32>(v)),
                _ => {}
            }
        }

        let preset = preset.unwrap_or(if from.is_some() || to.is_some() {
            Preset::Custom
        } else {
            Preset::default()
        });

        Self {
            preset,
            explicit_from: from,
            explicit_to: to,
            ..Self::default()
        }
        .with_devices(devices)
        .with_depths(depths)
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn explicit_from(&self) -> Option<&str> {
        self.explicit_from.as_deref()
    }

    pub fn explicit_to(&self) -> Option<&str> {
        self.explicit_to.as_deref()
    }

    pub fn device_ids(&self) -> &[i64] {
        &self.device_ids
    }

    pub fn depths(&self) -> &[i32] {
        &self.depths
    }

    /// Switch window. Stored custom bounds are kept for a later switch back.
    pub fn with_preset(self, preset: Preset) -> Self {
        Self { preset, ..self }
    }

    pub fn with_custom_bounds(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            preset: Preset::Custom,
            explicit_from: Some(from.into()),
            explicit_to: Some(to.into()),
            ..self
        }
    }

    pub fn with_devices(self, ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            device_ids: dedup(ids),
            ..self
        }
    }

    pub fn with_depths(self, depths: impl IntoIterator<Item = i32>) -> Self {
        Self {
            depths: dedup(depths),
            ..self
        }
    }

    /// Focus on `id` alone, or drop the device filter when `id` already is
    /// the only selected device.
    pub fn toggle_device(self, id: i64) -> Self {
        if self.device_ids == [id] {
            self.with_devices([])
        } else {
            self.with_devices([id])
        }
    }
}

fn parse_list<T: std::str::FromStr>(raw: &str) -> impl Iterator<Item = T> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

// ------------------------------------------------------------------ //
//  Parameter bag                                                      //
// ------------------------------------------------------------------ //

/// Ordered query parameters; a key may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBag {
    pairs: Vec<(String, String)>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one more parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Both bounds present and non-empty. An incomplete custom range should
    /// not be sent to the backend.
    pub fn is_complete(&self) -> bool {
        matches!(
            (self.get(FROM), self.get(TO)),
            (Some(from), Some(to)) if !from.is_empty() && !to.is_empty()
        )
    }

    /// Stable hex SHA-256 over `path` and every pair, in order. Each field
    /// is length-prefixed, so no choice of keys and values can shift bytes
    /// from one field into another.
    pub fn cache_key(&self, path: &str) -> String {
        fn field(hasher: &mut Sha256, bytes: &[u8]) {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }

        let mut hasher = Sha256::new();
        field(&mut hasher, path.as_bytes());
        for (k, v) in &self.pairs {
            field(&mut hasher, k.as_bytes());
            field(&mut hasher, v.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

// ------------------------------------------------------------------ //
//  Builder                                                            //
// ------------------------------------------------------------------ //

/// Turn a selection into backend query parameters.
///
/// Custom bounds pass through verbatim, as `""` when unset. The device and
/// depth filters repeat once per selected value and are left out entirely
/// when nothing is selected: an absent filter means "all", an empty one
/// would mean "none".
pub fn build<Tz: TimeZone>(selection: &Selection, now: &DateTime<Tz>) -> ParameterBag {
    let (from, to) = match resolve(selection.preset, now) {
        Some(range) => (range.from_iso(), range.to_iso()),
        None => (
            selection.explicit_from.clone().unwrap_or_default(),
            selection.explicit_to.clone().unwrap_or_default(),
        ),
    };

    let mut bag = ParameterBag::new().with(FROM, from).with(TO, to);
    for id in &selection.device_ids {
        bag = bag.with(DEVICE_IDS, id);
    }
    for depth in &selection.depths {
        bag = bag.with(DEPTHS, depth);
    }
    bag
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
