//! DataSource trait and implementations.
//!
//! The backend API is the only I/O the dashboard does. A 404 from it means
//! "nothing to show" and comes back as an empty result; every other failure
//! is a [`SourceError`] the caller must surface.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::model::{
    AttentionDevice, Device, Farm, FarmDetail, MoistureSeries, Summary, TempSeries,
};
use crate::query::{ParameterBag, DEPTHS};

pub const SUMMARY_PATH: &str = "/v1/metrics/summary";
pub const MOISTURE_PATH: &str = "/v1/metrics/moisture-series";
pub const TEMPERATURE_PATH: &str = "/v1/metrics/temp-series";
pub const ATTENTION_PATH: &str = "/v1/devices/attention";
pub const DEVICES_PATH: &str = "/v1/devices";
pub const FARMS_PATH: &str = "/v1/farms";

pub const DEFAULT_MAX_POINTS: u32 = 800;

// ------------------------------------------------------------------ //
//  Trait                                                              //
// ------------------------------------------------------------------ //

/// Async source of dashboard records.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn summary(&self, params: &ParameterBag) -> Result<Option<Summary>, SourceError>;
    async fn moisture_series(
        &self,
        params: &ParameterBag,
    ) -> Result<Vec<MoistureSeries>, SourceError>;
    async fn temperature_series(
        &self,
        params: &ParameterBag,
    ) -> Result<Vec<TempSeries>, SourceError>;
    async fn attention(&self, limit: u32) -> Result<Vec<AttentionDevice>, SourceError>;
    async fn devices(&self, farm_id: Option<&str>) -> Result<Vec<Device>, SourceError>;
    async fn farms(&self) -> Result<Vec<Farm>, SourceError>;
    async fn farm(&self, farm_id: &str) -> Result<Option<FarmDetail>, SourceError>;
}

// ------------------------------------------------------------------ //
//  FakeDataSource (for tests)                                         //
// ------------------------------------------------------------------ //

/// In-memory source serving canned records and recording every request.
#[derive(Debug, Default, Clone)]
pub struct FakeDataSource {
    pub farms: Vec<Farm>,
    pub farm_details: Vec<FarmDetail>,
    pub devices: Vec<Device>,
    pub attention: Vec<AttentionDevice>,
    pub moisture: Vec<MoistureSeries>,
    pub temperature: Vec<TempSeries>,
    pub summary: Option<Summary>,
    /// When set, every call fails with this server status.
    pub failure: Option<u16>,
    pub requests: Arc<Mutex<Vec<(String, ParameterBag)>>>,
}

impl FakeDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-destructive snapshot of the requests seen so far.
    pub fn recorded(&self) -> Vec<(String, ParameterBag)> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, path: &str, params: ParameterBag) -> Result<(), SourceError> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push((path.to_string(), params));
        match self.failure {
            Some(status) => Err(SourceError::Server {
                status,
                body: "injected failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataSource for FakeDataSource {
    async fn summary(&self, params: &ParameterBag) -> Result<Option<Summary>, SourceError> {
        self.record(SUMMARY_PATH, params.clone())?;
        Ok(self.summary.clone())
    }

    async fn moisture_series(
        &self,
        params: &ParameterBag,
    ) -> Result<Vec<MoistureSeries>, SourceError> {
        self.record(MOISTURE_PATH, params.clone())?;
        let depths: Vec<i32> = params
            .get_all(DEPTHS)
            .into_iter()
            .filter_map(|d| d.parse().ok())
            .collect();
        Ok(self
            .moisture
            .iter()
            .filter(|s| depths.is_empty() || depths.contains(&s.depth_cm))
            .cloned()
            .collect())
    }

    async fn temperature_series(
        &self,
        params: &ParameterBag,
    ) -> Result<Vec<TempSeries>, SourceError> {
        self.record(TEMPERATURE_PATH, params.clone())?;
        Ok(self.temperature.clone())
    }

    async fn attention(&self, limit: u32) -> Result<Vec<AttentionDevice>, SourceError> {
        self.record(ATTENTION_PATH, ParameterBag::new().with("limit", limit))?;
        Ok(self.attention.iter().take(limit as usize).cloned().collect())
    }

    async fn devices(&self, farm_id: Option<&str>) -> Result<Vec<Device>, SourceError> {
        let params = match farm_id {
            Some(id) => ParameterBag::new().with("farm_id", id),
            None => ParameterBag::new(),
        };
        self.record(DEVICES_PATH, params)?;
        Ok(self.devices.clone())
    }

    async fn farms(&self) -> Result<Vec<Farm>, SourceError> {
        self.record(FARMS_PATH, ParameterBag::new())?;
        Ok(self.farms.clone())
    }

    async fn farm(&self, farm_id: &str) -> Result<Option<FarmDetail>, SourceError> {
        self.record(&format!("{FARMS_PATH}/{farm_id}"), ParameterBag::new())?;
        Ok(self.farm_details.iter().find(|f| f.id == farm_id).cloned())
    }
}

// ------------------------------------------------------------------ //
//  Response cache                                                     //
// ------------------------------------------------------------------ //

/// Decoded JSON bodies keyed by [`ParameterBag::cache_key`], expiring after
/// `ttl`. A zero `ttl` disables caching.
struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, serde_json::Value)>>,
}

impl ResponseCache {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: &str) -> Option<serde_json::Value> {
        if self.ttl.is_zero() {
            return None;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = entries
            .get(key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, value)| value.clone());
        if fresh.is_none() {
            entries.remove(key);
        }
        fresh
    }

    fn put(&self, key: String, value: serde_json::Value) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        entries.retain(|_, (stored, _)| stored.elapsed() < ttl);
        entries.insert(key, (Instant::now(), value));
    }
}

// ------------------------------------------------------------------ //
//  HttpDataSource (production)                                        //
// ------------------------------------------------------------------ //

/// Backend API client over `reqwest`.
pub struct HttpDataSource {
    http: reqwest::Client,
    base_url: Url,
    max_points: u32,
    cache: ResponseCache,
}

impl HttpDataSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let parsed = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| SourceError::BaseUrl(base_url.to_string()))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: parsed,
            max_points: DEFAULT_MAX_POINTS,
            cache: ResponseCache::new(Duration::ZERO),
        })
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ResponseCache::new(ttl);
        self
    }

    /// Downsampling hint sent with series requests.
    pub fn with_max_points(mut self, max_points: u32) -> Self {
        self.max_points = max_points;
        self
    }

    /// Append `path` and any extra `segments` to the base URL. Each extra
    /// segment is percent-encoded, so `/`, `?` and `#` stay inside it.
    fn endpoint(&self, path: &str, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()))
            .extend(segments);
        Ok(url)
    }

    async fn get_json(
        &self,
        url: Url,
        params: &ParameterBag,
    ) -> Result<Option<serde_json::Value>, SourceError> {
        let path = url.path().to_owned();
        let key = params.cache_key(&path);
        if let Some(hit) = self.cache.get(&key) {
            debug!(%path, "backend cache hit");
            return Ok(Some(hit));
        }

        let resp = self.http.get(url).query(params.pairs()).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%path, "backend returned 404, treating as empty");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%path, status = status.as_u16(), "backend request failed");
            return Err(SourceError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        self.cache.put(key, value.clone());
        Ok(Some(value))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ParameterBag,
    ) -> Result<Option<T>, SourceError> {
        self.fetch_at(self.endpoint(path, &[])?, params).await
    }

    async fn fetch_at<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &ParameterBag,
    ) -> Result<Option<T>, SourceError> {
        match self.get_json(url, params).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ParameterBag,
    ) -> Result<Vec<T>, SourceError> {
        Ok(self.fetch(path, params).await?.unwrap_or_default())
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn summary(&self, params: &ParameterBag) -> Result<Option<Summary>, SourceError> {
        self.fetch(SUMMARY_PATH, params).await
    }

    async fn moisture_series(
        &self,
        params: &ParameterBag,
    ) -> Result<Vec<MoistureSeries>, SourceError> {
        let params = params.clone().with("max_points", self.max_points);
        self.fetch_list(MOISTURE_PATH, &params).await
    }

    async fn temperature_series(
        &self,
        params: &ParameterBag,
    ) -> Result<Vec<TempSeries>, SourceError> {
        let params = params.clone().with("max_points", self.max_points);
        self.fetch_list(TEMPERATURE_PATH, &params).await
    }

    async fn attention(&self, limit: u32) -> Result<Vec<AttentionDevice>, SourceError> {
        let params = ParameterBag::new().with("limit", limit);
        self.fetch_list(ATTENTION_PATH, &params).await
    }

    async fn devices(&self, farm_id: Option<&str>) -> Result<Vec<Device>, SourceError> {
        let params = match farm_id {
            Some(id) => ParameterBag::new().with("farm_id", id),
            None => ParameterBag::new(),
        };
        self.fetch_list(DEVICES_PATH, &params).await
    }

    async fn farms(&self) -> Result<Vec<Farm>, SourceError> {
        self.fetch_list(FARMS_PATH, &ParameterBag::new()).await
    }

    async fn farm(&self, farm_id: &str) -> Result<Option<FarmDetail>, SourceError> {
        // Dot segments would be dropped from the URL and hit the farm list.
        if matches!(farm_id, "" | "." | "..") {
            return Ok(None);
        }
        let url = self.endpoint(FARMS_PATH, &[farm_id])?;
        self.fetch_at(url, &ParameterBag::new()).await
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
