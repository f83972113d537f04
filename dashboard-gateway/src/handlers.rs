//! Axum HTTP handlers for the dashboard gateway.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use probe_core::attention::{select_and_order, AttentionCounts};
use probe_core::error::{SeriesError, SourceError};
use probe_core::query::{self, build, ParameterBag, Selection};
use probe_core::series::{align, KeyedSeries, MOISTURE_PALETTE, TEMPERATURE_PALETTE};

use crate::models::{
    AttentionEntry, AttentionResponse, ChartResponse, DeviceView, FarmDetailResponse,
    FarmView, RangeResponse, SummaryResponse,
};
use crate::AppState;

// ------------------------------------------------------------------ //
//  Errors                                                             //
// ------------------------------------------------------------------ //

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Series(#[from] SeriesError),
    #[error("{0} not found")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Source(_) => StatusCode::BAD_GATEWAY,
            ApiError::Series(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        if status != StatusCode::NOT_FOUND {
            error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Resolve the selection in the query string against the request clock.
fn selection_params(state: &AppState, pairs: Vec<(String, String)>) -> ParameterBag {
    let selection = Selection::from_query(pairs);
    build(&selection, &(state.clock)())
}

fn chart<S: KeyedSeries>(series: &[S], palette: &[&'static str]) -> ApiResult<ChartResponse> {
    let aligned = align(series)?;
    if aligned.skipped_points > 0 {
        warn!(skipped = aligned.skipped_points, "dropped points with bad timestamps");
    }
    Ok(Json(ChartResponse::new(aligned, palette)))
}

// ------------------------------------------------------------------ //
//  Range / summary                                                    //
// ------------------------------------------------------------------ //

/// GET /dashboard/range
pub async fn range(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<RangeResponse> {
    let selection = Selection::from_query(pairs);
    let params = build(&selection, &(state.clock)());
    Json(RangeResponse {
        preset: selection.preset(),
        from: params.get(query::FROM).unwrap_or_default().to_string(),
        to: params.get(query::TO).unwrap_or_default().to_string(),
        complete: params.is_complete(),
    })
}

/// GET /dashboard/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<SummaryResponse> {
    let params = selection_params(&state, pairs);
    let summary = if params.is_complete() {
        state.source.summary(&params).await?.unwrap_or_default()
    } else {
        Default::default()
    };

    let attention = AttentionCounts::tally(
        summary
            .devices_needing_attention
            .iter()
            .flatten()
            .map(|d| d.status),
    );
    Ok(Json(SummaryResponse { summary, attention }))
}

// ------------------------------------------------------------------ //
//  Attention                                                          //
// ------------------------------------------------------------------ //

/// GET /dashboard/attention
pub async fn attention(State(state): State<Arc<AppState>>) -> ApiResult<AttentionResponse> {
    let raw = state.source.attention(state.attention_limit).await?;
    let ordered = select_and_order(raw);
    let counts = AttentionCounts::tally(ordered.iter().map(|d| d.status));

    info!(alerts = ordered.len(), "attention feed built");
    Ok(Json(AttentionResponse {
        devices: ordered.into_iter().map(AttentionEntry::from).collect(),
        counts,
    }))
}

// ------------------------------------------------------------------ //
//  Charts                                                             //
// ------------------------------------------------------------------ //

/// GET /dashboard/moisture
pub async fn moisture(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<ChartResponse> {
    let params = selection_params(&state, pairs);
    if !params.is_complete() {
        return Ok(Json(ChartResponse::default()));
    }
    let series = state.source.moisture_series(&params).await?;
    chart(&series, &MOISTURE_PALETTE)
}

/// GET /dashboard/temperature
pub async fn temperature(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<ChartResponse> {
    let params = selection_params(&state, pairs);
    if !params.is_complete() {
        return Ok(Json(ChartResponse::default()));
    }
    let series = state.source.temperature_series(&params).await?;
    chart(&series, &TEMPERATURE_PALETTE)
}

// ------------------------------------------------------------------ //
//  Farms                                                              //
// ------------------------------------------------------------------ //

/// GET /dashboard/farms
pub async fn farms(State(state): State<Arc<AppState>>) -> ApiResult<Vec<FarmView>> {
    let farms = state.source.farms().await?;
    Ok(Json(farms.into_iter().map(FarmView::from).collect()))
}

/// GET /dashboard/farms/:id
pub async fn farm_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<FarmDetailResponse> {
    match state.source.farm(&id).await? {
        Some(farm) => Ok(Json(FarmDetailResponse::from(farm))),
        None => Err(ApiError::NotFound(format!("farm '{id}'"))),
    }
}

// ------------------------------------------------------------------ //
//  Devices                                                            //
// ------------------------------------------------------------------ //

#[derive(Debug, Default, Deserialize)]
pub struct DevicesQuery {
    pub farm_id: Option<String>,
}

/// GET /dashboard/devices?farm_id=
pub async fn devices(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DevicesQuery>,
) -> ApiResult<Vec<DeviceView>> {
    let farm_id = q.farm_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    let devices = state.source.devices(farm_id).await?;
    Ok(Json(devices.into_iter().map(DeviceView::from).collect()))
}

// ------------------------------------------------------------------ //
//  Health                                                             //
// ------------------------------------------------------------------ //

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{DateTime, Local, TimeZone};
    use probe_core::model::{
        AttentionDevice, Device, FarmDetail, MoistureSeries, SummaryDevice, Summary,
        TempSeries, TimeSeriesPoint,
    };
    use probe_core::source::{FakeDataSource, DEVICES_PATH, MOISTURE_PATH};
    use probe_core::status::DeviceStatus;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::router;

    fn fixed_clock() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).earliest().unwrap()
    }

    fn app(fake: FakeDataSource) -> axum::Router {
        let mut state = AppState::new(Arc::new(fake), 20);
        state.clock = fixed_clock;
        router(Arc::new(state))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn pt(t: &str, v: f64) -> TimeSeriesPoint {
        TimeSeriesPoint { t: t.into(), v }
    }

    fn attention_dev(id: i64, status: DeviceStatus) -> AttentionDevice {
        AttentionDevice {
            device_id: id,
            alias: format!("probe-{id}"),
            status,
            battery_hint: None,
            last_seen: None,
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get(app(FakeDataSource::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn attention_is_filtered_and_ordered() {
        let mut fake = FakeDataSource::new();
        fake.attention = vec![
            attention_dev(1, DeviceStatus::Green),
            attention_dev(2, DeviceStatus::Offline),
            attention_dev(3, DeviceStatus::Red),
            attention_dev(4, DeviceStatus::Blue),
            attention_dev(5, DeviceStatus::Amber),
        ];

        let (status, body) = get(app(fake), "/dashboard/attention").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body["devices"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["device_id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 5, 2]);
        assert_eq!(body["devices"][0]["category"]["label"], "Needs Attention");
        assert_eq!(body["devices"][0]["battery_bars"], 4);
        assert_eq!(body["counts"]["needs_water"], 1);
        assert_eq!(body["counts"]["offline"], 1);
    }

    #[tokio::test]
    async fn backend_failure_is_bad_gateway() {
        let mut fake = FakeDataSource::new();
        fake.failure = Some(500);
        let (status, body) = get(app(fake), "/dashboard/attention").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn moisture_chart_is_aligned() {
        let mut fake = FakeDataSource::new();
        fake.moisture = vec![
            MoistureSeries {
                device_name: "p1".into(),
                depth_cm: 10,
                points: vec![pt("2024-06-10T00:00:00Z", 30.0), pt("2024-06-10T01:00:00Z", 29.0)],
            },
            MoistureSeries {
                device_name: "p1".into(),
                depth_cm: 30,
                points: vec![pt("2024-06-10T00:30:00Z", 25.0)],
            },
        ];
        let requests = fake.requests.clone();

        let (status, body) = get(app(fake), "/dashboard/moisture?preset=7d&devices=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().unwrap().len(), 3);
        assert_eq!(body["keys"], serde_json::json!(["p1@10cm", "p1@30cm"]));
        assert_eq!(body["rows"][1]["p1@30cm"], 25.0);
        assert_eq!(body["legend"]["hidden"], 0);

        let recorded = requests.lock().unwrap();
        assert_eq!(recorded[0].0, MOISTURE_PATH);
        assert_eq!(recorded[0].1.get_all(query::DEVICE_IDS), vec!["1"]);
        assert!(!recorded[0].1.contains(query::DEPTHS));
    }

    #[tokio::test]
    async fn duplicate_series_key_is_server_error() {
        let mut fake = FakeDataSource::new();
        fake.temperature = vec![
            TempSeries { device_name: "p1".into(), points: vec![] },
            TempSeries { device_name: "p1".into(), points: vec![] },
        ];
        let (status, body) = get(app(fake), "/dashboard/temperature").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("p1"));
    }

    #[tokio::test]
    async fn device_named_t_is_server_error_not_corrupt_row() {
        let mut fake = FakeDataSource::new();
        fake.temperature = vec![TempSeries {
            device_name: "t".into(),
            points: vec![pt("2024-06-10T00:00:00Z", 21.5)],
        }];
        let (status, body) = get(app(fake), "/dashboard/temperature").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("time column"));
    }

    #[tokio::test]
    async fn incomplete_custom_range_skips_backend() {
        let fake = FakeDataSource::new();
        let requests = fake.requests.clone();

        let (status, body) = get(app(fake), "/dashboard/temperature?preset=custom").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["rows"].as_array().unwrap().is_empty());
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_resolves_relative_and_passes_custom_through() {
        let (_, body) = get(app(FakeDataSource::new()), "/dashboard/range?preset=24h").await;
        assert_eq!(body["preset"], "24h");
        assert_eq!(body["complete"], true);

        let (_, body) = get(
            app(FakeDataSource::new()),
            "/dashboard/range?preset=custom&from=2024-01-01T00:00:00Z",
        )
        .await;
        assert_eq!(body["from"], "2024-01-01T00:00:00Z");
        assert_eq!(body["to"], "");
        assert_eq!(body["complete"], false);
    }

    #[tokio::test]
    async fn summary_counts_attention() {
        let mut fake = FakeDataSource::new();
        fake.summary = Some(Summary {
            devices_needing_attention: Some(vec![
                SummaryDevice { status: DeviceStatus::Red, alias: None, device_id: Some(1) },
                SummaryDevice { status: DeviceStatus::Amber, alias: None, device_id: Some(2) },
                SummaryDevice { status: DeviceStatus::Amber, alias: None, device_id: Some(3) },
            ]),
            avg_moisture: Some(27.4),
            avg_temp: None,
            last_reading_at: None,
        });

        let (status, body) = get(app(fake), "/dashboard/summary?preset=30d").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["avg_moisture"], 27.4);
        assert_eq!(body["attention"]["needs_water"], 1);
        assert_eq!(body["attention"]["monitor"], 2);
    }

    #[tokio::test]
    async fn missing_summary_is_empty_not_error() {
        let (status, body) = get(app(FakeDataSource::new()), "/dashboard/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["attention"]["needs_water"], 0);
    }

    #[tokio::test]
    async fn farm_detail_and_not_found() {
        let mut fake = FakeDataSource::new();
        fake.farm_details = vec![FarmDetail {
            id: "north".into(),
            name: "North Field".into(),
            device_count: 2,
            devices: vec![
                Device {
                    id: 1,
                    alias: "p1".into(),
                    status: Some(DeviceStatus::Red),
                    last_seen: None,
                    lat: Some(-33.9),
                    lon: Some(18.4),
                    moisture30: Some(18.0),
                    battery_hint: None,
                },
                Device {
                    id: 2,
                    alias: "p2".into(),
                    status: None,
                    last_seen: None,
                    lat: None,
                    lon: None,
                    moisture30: None,
                    battery_hint: None,
                },
            ],
            lat: None,
            lon: None,
        }];
        let app = app(fake);

        let (status, body) = get(app.clone(), "/dashboard/farms/north").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["devices"][0]["marker_color"], "#dc2626");
        assert_eq!(body["devices"][1]["resolved_status"], "gray");
        assert_eq!(body["attention"]["needs_water"], 1);
        assert_eq!(body["attention"]["offline"], 1);

        let (status, _) = get(app, "/dashboard/farms/south").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    fn device(id: i64, status: Option<DeviceStatus>) -> Device {
        Device {
            id,
            alias: format!("probe-{id}"),
            status,
            last_seen: None,
            lat: Some(-33.9),
            lon: Some(18.4),
            moisture30: None,
            battery_hint: None,
        }
    }

    #[tokio::test]
    async fn device_map_resolves_status_and_markers() {
        let mut fake = FakeDataSource::new();
        fake.devices = vec![
            device(1, Some(DeviceStatus::Blue)),
            device(2, None),
        ];
        let requests = fake.requests.clone();

        let (status, body) = get(app(fake), "/dashboard/devices?farm_id=north").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["marker_color"], "#2563eb");
        assert_eq!(body[0]["category"]["label"], "Too Wet");
        assert_eq!(body[1]["resolved_status"], "gray");
        assert_eq!(body[1]["marker_color"], "#6b7280");

        let recorded = requests.lock().unwrap();
        assert_eq!(recorded[0].0, DEVICES_PATH);
        assert_eq!(recorded[0].1.get("farm_id"), Some("north"));
    }

    #[tokio::test]
    async fn device_map_without_farm_asks_for_whole_fleet() {
        let fake = FakeDataSource::new();
        let requests = fake.requests.clone();

        let (status, body) = get(app(fake), "/dashboard/devices?farm_id=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
        assert!(!requests.lock().unwrap()[0].1.contains("farm_id"));
    }

    #[tokio::test]
    async fn device_map_backend_failure_is_bad_gateway() {
        let mut fake = FakeDataSource::new();
        fake.failure = Some(503);
        let (status, _) = get(app(fake), "/dashboard/devices").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn empty_farm_list_is_ok() {
        let (status, body) = get(app(FakeDataSource::new()), "/dashboard/farms").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }
}
