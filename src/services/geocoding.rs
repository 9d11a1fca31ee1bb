//! Geocoding client for address autocompletion.
//!
//! Talks to a Mapbox-compatible places endpoint:
//! `GET {endpoint}/{query}.json?access_token=..&autocomplete=true&types=address,place&limit=5`.
//! Failures never reach the caller; they degrade to an empty suggestion
//! list and are logged.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::services::debounce::{Debounced, Debouncer};

/// Queries shorter than this (in characters, after trimming) never hit the network.
pub const MIN_QUERY_CHARS: usize = 3;

pub const DEFAULT_LIMIT: usize = 5;

/// A place the user can pick to fill in an address and its coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("geocoding access token is not configured")]
    MissingToken,

    #[error("geocoding endpoint is not a valid base URL")]
    InvalidEndpoint,

    #[error("geocoding request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("geocoding service returned {0}")]
    Upstream(StatusCode),

    #[error("geocoding response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Upstream response: a GeoJSON feature collection.
#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: String,
    place_name: String,
    /// `[longitude, latitude]`
    center: [f64; 2],
}

impl From<Feature> for Suggestion {
    fn from(f: Feature) -> Self {
        let [longitude, latitude] = f.center;
        Self {
            id: f.id,
            label: f.place_name,
            latitude,
            longitude,
        }
    }
}

/// Client for the geocoding service.
#[derive(Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    limit: usize,
}

impl GeocodingClient {
    /// Create a new geocoding client. A missing token is allowed; every
    /// lookup then returns no suggestions.
    pub fn new(base_url: &str, token: Option<String>, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid geocoding URL {base_url:?}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Geocoding URL {base_url} cannot carry a path");
        }

        if token.is_none() {
            warn!("MAPBOX_TOKEN not set, address suggestions are disabled");
        }
        tracing::info!(base_url = %base_url, "Geocoding client initialized");

        Ok(Self {
            client,
            base_url,
            token,
            limit: DEFAULT_LIMIT,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Whether `query` is long enough to be worth a network call.
    pub fn is_eligible(query: &str) -> bool {
        query.trim().chars().count() >= MIN_QUERY_CHARS
    }

    fn request_url(&self, query: &str) -> Result<Url, SuggestionError> {
        let token = self.token.as_deref().ok_or(SuggestionError::MissingToken)?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SuggestionError::InvalidEndpoint)?
            .push(&format!("{query}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", token)
            .append_pair("autocomplete", "true")
            .append_pair("types", "address,place")
            .append_pair("limit", &self.limit.to_string());
        Ok(url)
    }

    /// Ranked suggestions for `query`, in upstream order.
    pub async fn try_suggest(&self, query: &str) -> Result<Vec<Suggestion>, SuggestionError> {
        let query = query.trim();
        if !Self::is_eligible(query) {
            return Ok(Vec::new());
        }

        let url = self.request_url(query)?;
        debug!(path = url.path(), "Geocoding request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SuggestionError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestionError::Upstream(status));
        }

        let collection: FeatureCollection =
            response.json().await.map_err(SuggestionError::Decode)?;

        Ok(collection
            .features
            .into_iter()
            .take(self.limit)
            .map(Suggestion::from)
            .collect())
    }

    /// Like [`try_suggest`](Self::try_suggest) but never fails.
    #[instrument(skip(self))]
    pub async fn suggest(&self, query: &str) -> Vec<Suggestion> {
        match self.try_suggest(query).await {
            Ok(suggestions) => {
                debug!(count = suggestions.len(), "Geocoding suggestions");
                suggestions
            }
            Err(SuggestionError::MissingToken) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Geocoding lookup failed, returning no suggestions");
                Vec::new()
            }
        }
    }

    /// Suggestions for the latest query typed into one input session.
    /// Short queries still take a ticket, so they supersede older pending
    /// lookups the same way typing does.
    pub async fn suggest_debounced(
        &self,
        debouncer: &Debouncer,
        query: &str,
    ) -> Debounced<Vec<Suggestion>> {
        debouncer.run(|| self.suggest(query)).await
    }

    /// Check the geocoding service answers.
    pub async fn health_check(&self) -> Result<()> {
        let url = self.request_url("health")?;

        self.client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Geocoding health check failed")?
            .error_for_status()
            .context("Geocoding service unhealthy")?;

        Ok(())
    }
}
