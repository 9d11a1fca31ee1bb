//! Profile store: the single authoritative collection of profiles.
//!
//! Every mutation goes through here. Mutations are serialized by an async
//! mutex held across apply + write-through, so they hit the slot in the
//! order they were issued. The collection itself sits behind a
//! `parking_lot::RwLock` that is never held across an `.await`.

use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::domain::profiles::{new_profile_id, Profile, ProfileDraft, ProfileFilter};
use crate::error::ProfileError;
use crate::services::persistence::ProfileSlot;
use crate::services::seed::SeedSource;

/// Result of a mutation that was applied in memory. `persist_warning` is
/// set when the write-through failed after retries; the mutation stands.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub value: T,
    pub persist_warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub profile_count: usize,
    pub selected_id: Option<String>,
    pub slot: String,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_persisted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_warning: Option<String>,
}

/// Selection and filtered profiles read under one lock, so a map scene
/// never pairs a selection with a collection it is not part of.
#[derive(Debug, Clone)]
pub struct StoreView {
    pub selected: Option<Profile>,
    pub profiles: Vec<Profile>,
}

#[derive(Debug)]
struct StoreState {
    phase: LoadPhase,
    profiles: Vec<Profile>,
    /// Weak reference: an id looked up on read, cleared when its profile goes.
    selected: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
    last_persisted_at: Option<DateTime<Utc>>,
    persist_warning: Option<String>,
}

impl StoreState {
    fn position(&self, id: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.id == id)
    }

    fn selected_profile(&self) -> Option<&Profile> {
        let id = self.selected.as_deref()?;
        self.profiles.iter().find(|p| p.id == id)
    }
}

struct Inner {
    slot: Arc<dyn ProfileSlot>,
    seed: SeedSource,
    persist_retry_window: Duration,
    state: RwLock<StoreState>,
    mutations: tokio::sync::Mutex<()>,
}

/// Cheaply cloneable handle to the shared store.
#[derive(Clone)]
pub struct ProfileStore {
    inner: Arc<Inner>,
}

impl ProfileStore {
    /// A store over `slot` with no seed dataset and a single write attempt
    /// per mutation.
    pub fn new(slot: Arc<dyn ProfileSlot>) -> Self {
        Self::with_options(slot, SeedSource::None, Duration::ZERO)
    }

    pub fn with_options(
        slot: Arc<dyn ProfileSlot>,
        seed: SeedSource,
        persist_retry_window: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                slot,
                seed,
                persist_retry_window,
                state: RwLock::new(StoreState {
                    phase: LoadPhase::Loading,
                    profiles: Vec::new(),
                    selected: None,
                    loaded_at: None,
                    last_persisted_at: None,
                    persist_warning: None,
                }),
                mutations: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Hydrate from the slot, falling back to the seed dataset (which is
    /// then persisted). Never fails: when both sources fail the store ends
    /// up in the `failed` phase with an empty collection.
    #[instrument(skip(self), fields(slot = %self.inner.slot.describe()))]
    pub async fn load(&self) {
        let _guard = self.inner.mutations.lock().await;
        self.inner.state.write().phase = LoadPhase::Loading;

        let from_slot = match self.inner.slot.read().await {
            Ok(Some(profiles)) => Some(dedupe_ids(profiles)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = ?e, "Persisted profiles unreadable, falling back to seed data");
                None
            }
        };

        let (profiles, needs_persist) = match from_slot {
            Some(profiles) => (profiles, false),
            None => match self.inner.seed.fetch().await {
                Ok(profiles) => (profiles, true),
                Err(e) => {
                    error!(error = ?e, "Failed to load profiles");
                    let mut state = self.inner.state.write();
                    state.profiles.clear();
                    state.selected = None;
                    state.phase = LoadPhase::Failed("Failed to load profiles".to_string());
                    return;
                }
            },
        };

        let count = profiles.len();
        let snapshot = needs_persist.then(|| profiles.clone());
        {
            let mut state = self.inner.state.write();
            state.profiles = profiles;
            state.selected = None;
            state.phase = LoadPhase::Ready;
            state.loaded_at = Some(Utc::now());
        }

        if let Some(snapshot) = snapshot {
            self.persist(&snapshot).await;
        }

        info!(count, seeded = needs_persist, "Profiles loaded");
    }

    pub fn phase(&self) -> LoadPhase {
        self.inner.state.read().phase.clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.inner.state.read().phase, LoadPhase::Ready)
    }

    /// Profiles passing `filter`, in insertion order. Recomputed on every call.
    pub fn list(&self, filter: &ProfileFilter) -> Vec<Profile> {
        let state = self.inner.state.read();
        filter.apply(&state.profiles).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Result<Profile, ProfileError> {
        let state = self.inner.state.read();
        state
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ProfileError::profile_not_found(id))
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn view(&self, filter: &ProfileFilter) -> StoreView {
        let state = self.inner.state.read();
        StoreView {
            selected: state.selected_profile().cloned(),
            profiles: filter.apply(&state.profiles).cloned().collect(),
        }
    }

    /// Validate `draft`, give it a fresh id and append it.
    #[instrument(skip(self, draft))]
    pub async fn add(&self, draft: ProfileDraft) -> Result<Committed<Profile>, ProfileError> {
        let _guard = self.lock_mutations().await?;

        let (profile, snapshot) = {
            let mut state = self.inner.state.write();
            ensure_ready(&state.phase)?;

            let id = loop {
                let candidate = new_profile_id();
                if state.position(&candidate).is_none() {
                    break candidate;
                }
            };
            let profile = draft.into_profile(id)?;
            state.profiles.push(profile.clone());
            (profile, state.profiles.clone())
        };

        info!(profile_id = %profile.id, "Profile added");
        let persist_warning = self.persist(&snapshot).await;
        Ok(Committed {
            value: profile,
            persist_warning,
        })
    }

    /// Replace the profile with the same id.
    #[instrument(skip(self, profile), fields(profile_id = %profile.id))]
    pub async fn update(&self, profile: Profile) -> Result<Committed<Profile>, ProfileError> {
        profile.validate()?;
        let _guard = self.lock_mutations().await?;

        let snapshot = {
            let mut state = self.inner.state.write();
            ensure_ready(&state.phase)?;

            let index = state
                .position(&profile.id)
                .ok_or_else(|| ProfileError::profile_not_found(&profile.id))?;
            state.profiles[index] = profile.clone();
            state.profiles.clone()
        };

        info!("Profile updated");
        let persist_warning = self.persist(&snapshot).await;
        Ok(Committed {
            value: profile,
            persist_warning,
        })
    }

    /// Remove the profile with `id`, clearing the selection if it pointed
    /// there. Removing an unknown id is a no-op that returns `false` and
    /// does not touch the slot.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<Committed<bool>, ProfileError> {
        let _guard = self.lock_mutations().await?;

        let snapshot = {
            let mut state = self.inner.state.write();
            ensure_ready(&state.phase)?;

            let Some(index) = state.position(id) else {
                return Ok(Committed {
                    value: false,
                    persist_warning: None,
                });
            };
            state.profiles.remove(index);
            if state.selected.as_deref() == Some(id) {
                state.selected = None;
            }
            state.profiles.clone()
        };

        info!("Profile removed");
        let persist_warning = self.persist(&snapshot).await;
        Ok(Committed {
            value: true,
            persist_warning,
        })
    }

    /// Select the profile with `id`, or clear the selection with `None`.
    pub fn select(&self, id: Option<&str>) -> Result<Option<Profile>, ProfileError> {
        let mut state = self.inner.state.write();
        match id {
            None => {
                state.selected = None;
                Ok(None)
            }
            Some(id) => {
                let index = state
                    .position(id)
                    .ok_or_else(|| ProfileError::profile_not_found(id))?;
                state.selected = Some(id.to_string());
                Ok(Some(state.profiles[index].clone()))
            }
        }
    }

    pub fn selected(&self) -> Option<Profile> {
        self.inner.state.read().selected_profile().cloned()
    }

    pub fn status(&self) -> StoreStatus {
        let state = self.inner.state.read();
        let (label, error) = match &state.phase {
            LoadPhase::Loading => ("loading", None),
            LoadPhase::Ready => ("ready", None),
            LoadPhase::Failed(msg) => ("failed", Some(msg.clone())),
        };

        StoreStatus {
            state: label,
            error,
            profile_count: state.profiles.len(),
            selected_id: state.selected.clone(),
            slot: self.inner.slot.describe(),
            loaded_at: state.loaded_at,
            last_persisted_at: state.last_persisted_at,
            persist_warning: state.persist_warning.clone(),
        }
    }

    /// Fails fast while a load is running instead of queueing behind it.
    async fn lock_mutations(&self) -> Result<tokio::sync::MutexGuard<'_, ()>, ProfileError> {
        ensure_ready(&self.inner.state.read().phase)?;
        Ok(self.inner.mutations.lock().await)
    }

    /// Write the whole collection, retrying with exponential backoff
    /// within the configured window. Returns the warning recorded when
    /// every attempt failed.
    async fn persist(&self, snapshot: &[Profile]) -> Option<String> {
        let policy = ExponentialBackoff {
            current_interval: Duration::from_millis(50),
            initial_interval: Duration::from_millis(50),
            max_interval: Duration::from_millis(500),
            max_elapsed_time: Some(self.inner.persist_retry_window),
            ..Default::default()
        };

        let slot = &self.inner.slot;
        let result = backoff::future::retry(policy, || async move {
            slot.write(snapshot).await.map_err(|e| {
                warn!(error = %e, "Profile write failed, retrying");
                backoff::Error::transient(e)
            })
        })
        .await;

        let mut state = self.inner.state.write();
        match result {
            Ok(()) => {
                state.last_persisted_at = Some(Utc::now());
                state.persist_warning = None;
                None
            }
            Err(e) => {
                error!(error = ?e, count = snapshot.len(), "Failed to persist profiles");
                let warning = format!("Changes are kept in memory but could not be saved: {e}");
                state.persist_warning = Some(warning.clone());
                Some(warning)
            }
        }
    }
}

fn ensure_ready(phase: &LoadPhase) -> Result<(), ProfileError> {
    match phase {
        LoadPhase::Ready => Ok(()),
        LoadPhase::Loading => Err(ProfileError::NotReady),
        LoadPhase::Failed(msg) => Err(ProfileError::Load(msg.clone())),
    }
}

/// Keep the first profile for each id.
fn dedupe_ids(profiles: Vec<Profile>) -> Vec<Profile> {
    let mut seen = HashSet::new();
    let before = profiles.len();
    let kept: Vec<Profile> = profiles
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect();

    if kept.len() != before {
        warn!(dropped = before - kept.len(), "Dropped profiles with duplicate ids");
    }
    kept
}
