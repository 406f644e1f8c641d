// Per-tile percentage annotations fetched from the rounds REST endpoint.
//
// One-shot GET per trigger (startup, new prediction round, manual refresh).
// A failed fetch is non-fatal: the store records `Unavailable` and the
// sidebar says so; the render path is never touched by the error.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::game::cell::CELL_COUNT;

/// Path of the winning-tiles endpoint, relative to the API base URL.
pub const WINNING_TILES_PATH: &str = "/api/rounds/winning-tiles";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Current annotation data held by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationState {
    /// No fetch has completed yet.
    Pending,
    /// Percentages for each of the 25 cells, positional.
    Available(Vec<f64>),
    /// The last fetch failed; annotations are absent but the dashboard
    /// keeps rendering.
    Unavailable,
}

impl AnnotationState {
    /// Positional percentages, when data is available.
    pub fn percentages(&self) -> Option<&[f64]> {
        match self {
            AnnotationState::Available(tiles) => Some(tiles),
            _ => None,
        }
    }

    pub fn health(&self) -> AnnotationHealth {
        match self {
            AnnotationState::Pending => AnnotationHealth::Pending,
            AnnotationState::Available(_) => AnnotationHealth::Available,
            AnnotationState::Unavailable => AnnotationHealth::Unavailable,
        }
    }
}

/// Render-facing summary of the annotation fetch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationHealth {
    Pending,
    Available,
    Unavailable,
}

/// Result of one fetch task, delivered to the orchestrator loop.
///
/// `generation` identifies the fetch that produced the event so a slow
/// response cannot clobber the result of a newer request.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationEvent {
    Loaded { tiles: Vec<f64>, generation: u64 },
    Failed { generation: u64 },
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TilesResponse {
    tiles: Vec<TileAnnotation>,
}

#[derive(Debug, Deserialize)]
struct TileAnnotation {
    #[serde(default)]
    percentage: f64,
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// HTTP client for the winning-tiles endpoint. Cookie storage is enabled
/// because the endpoint authenticates via session cookies.
pub struct AnnotationFetcher {
    http: reqwest::Client,
    url: String,
}

impl AnnotationFetcher {
    pub fn new(api_base: &str) -> Self {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap_or_default();
        AnnotationFetcher {
            http,
            url: format!("{}{}", api_base.trim_end_matches('/'), WINNING_TILES_PATH),
        }
    }

    /// Fetch the annotation list once. No retry, no caching.
    pub async fn fetch(&self) -> anyhow::Result<Vec<f64>> {
        let response = self.http.get(&self.url).send().await?.error_for_status()?;
        let body: TilesResponse = response.json().await?;
        Ok(body.tiles.into_iter().map(|t| t.percentage).collect())
    }
}

/// Spawn a one-shot fetch task that reports back over `tx`.
pub fn spawn_fetch(
    fetcher: Arc<AnnotationFetcher>,
    tx: mpsc::Sender<AnnotationEvent>,
    generation: u64,
) {
    tokio::spawn(async move {
        let event = match fetcher.fetch().await {
            Ok(tiles) => {
                if tiles.len() != CELL_COUNT {
                    debug!(
                        got = tiles.len(),
                        expected = CELL_COUNT,
                        "annotation list length differs from grid size"
                    );
                }
                AnnotationEvent::Loaded { tiles, generation }
            }
            Err(err) => {
                warn!(%err, "annotation fetch failed");
                AnnotationEvent::Failed { generation }
            }
        };
        let _ = tx.send(event).await;
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
