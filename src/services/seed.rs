//! Default dataset used when the persistence slot has never been written.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::domain::profiles::{new_profile_id, Profile, ProfileDraft};

#[derive(Debug, Clone)]
pub enum SeedSource {
    /// Nothing to seed from; an empty slot stays empty.
    None,
    File(PathBuf),
    Http {
        client: reqwest::Client,
        url: String,
        timeout: Duration,
    },
}

/// Seed records are looser than stored profiles: ids may be numbers or
/// missing, and coordinates may be absent.
#[derive(Debug, Deserialize)]
struct SeedRecord {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(flatten)]
    draft: ProfileDraft,
}

impl SeedSource {
    /// `http://` and `https://` locations are fetched, anything else is a path.
    pub fn from_location(location: &str, client: reqwest::Client, timeout: Duration) -> Self {
        let location = location.trim();
        if location.is_empty() {
            Self::None
        } else if location.starts_with("http://") || location.starts_with("https://") {
            Self::Http {
                client,
                url: location.to_string(),
                timeout,
            }
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Vec<Profile>> {
        let document: serde_json::Value = match self {
            Self::None => return Ok(Vec::new()),
            Self::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read seed data {}", path.display()))?;
                serde_json::from_slice(&bytes).context("Seed data is not valid JSON")?
            }
            Self::Http {
                client,
                url,
                timeout,
            } => client
                .get(url)
                .timeout(*timeout)
                .send()
                .await
                .context("Seed data request failed")?
                .error_for_status()
                .context("Seed data endpoint returned an error")?
                .json()
                .await
                .context("Seed data is not valid JSON")?,
        };

        let profiles = parse_seed_document(document);
        info!(count = profiles.len(), "Fetched seed profiles");
        Ok(profiles)
    }
}

/// Accept a JSON array of profile-like records. Any other document shape
/// yields an empty collection. Records without a coordinate pair or
/// required field are skipped, as are repeated ids.
pub fn parse_seed_document(document: serde_json::Value) -> Vec<Profile> {
    let serde_json::Value::Array(items) = document else {
        warn!("Seed data is not an array, ignoring it");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut profiles = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let record: SeedRecord = match serde_json::from_value(item) {
            Ok(record) => record,
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable seed record");
                continue;
            }
        };

        let id = match record.id {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => new_profile_id(),
        };

        if !seen.insert(id.clone()) {
            warn!(index, profile_id = %id, "Skipping seed record with duplicate id");
            continue;
        }

        match record.draft.into_profile(id) {
            Ok(profile) => profiles.push(profile),
            Err(e) => warn!(index, error = %e, "Skipping invalid seed record"),
        }
    }

    profiles
}
