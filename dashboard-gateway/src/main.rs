//! Dashboard gateway service entry point.
//!
//! Serves chart-, map- and alert-ready JSON to the dashboard front end,
//! backed by the soil-probe backend API.
//!
//! # Environment variables
//! | Var                       | Default                 |
//! |---------------------------|-------------------------|
//! | `GATEWAY_ADDR`            | `0.0.0.0:8080`          |
//! | `BACKEND_API_BASE`        | `http://127.0.0.1:8000` |
//! | `BACKEND_TIMEOUT_SECS`    | `10`                    |
//! | `BACKEND_CACHE_TTL_SECS`  | `60` (`0` disables)     |
//! | `ATTENTION_LIMIT`         | `20`                    |
//! | `SERIES_MAX_POINTS`       | `800`                   |

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use dashboard_gateway::config::GatewayConfig;
use dashboard_gateway::{router, AppState};
use probe_core::source::HttpDataSource;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dashboard_gateway=info".parse()?),
        )
        .json()
        .init();

    let cfg = GatewayConfig::from_env();

    let source = HttpDataSource::new(&cfg.backend_base, cfg.backend_timeout)
        .context("Failed to build backend HTTP client")?
        .with_cache_ttl(cfg.cache_ttl)
        .with_max_points(cfg.max_points);

    info!(
        backend = %cfg.backend_base,
        cache_ttl_secs = cfg.cache_ttl.as_secs(),
        "backend data source ready"
    );

    let state = Arc::new(AppState::new(Arc::new(source), cfg.attention_limit));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.addr))?;
    info!(addr = %cfg.addr, "dashboard-gateway listening");

    axum::serve(listener, app).await?;

    Ok(())
}
