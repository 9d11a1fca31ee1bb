//! Durable slot holding the JSON-serialized profile collection.
//!
//! The slot is deliberately dumb: one ordered array, no version field.
//! `read` returns `None` until something has been written.

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::domain::profiles::Profile;

#[async_trait]
pub trait ProfileSlot: Send + Sync {
    /// The last written collection, or `None` if nothing was ever written.
    async fn read(&self) -> Result<Option<Vec<Profile>>>;

    /// Replace the whole collection.
    async fn write(&self, profiles: &[Profile]) -> Result<()>;

    /// Where the slot lives, for logs and status output.
    fn describe(&self) -> String;
}

/// File-backed slot. Writes go to a sibling temp file that is renamed over
/// the target, so a crash mid-write leaves the previous collection intact.
#[derive(Debug, Clone)]
pub struct JsonFileSlot {
    path: PathBuf,
}

impl JsonFileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "profiles.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ProfileSlot for JsonFileSlot {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn read(&self) -> Result<Option<Vec<Profile>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Profile slot is empty");
                return Ok(None);
            }
            Err(e) => return Err(e).context("Failed to read profile slot"),
        };

        let profiles: Vec<Profile> =
            serde_json::from_slice(&bytes).context("Profile slot holds malformed JSON")?;

        debug!(count = profiles.len(), "Read profile slot");
        Ok(Some(profiles))
    }

    #[instrument(skip(self, profiles), fields(path = %self.path.display(), count = profiles.len()))]
    async fn write(&self, profiles: &[Profile]) -> Result<()> {
        let data = serde_json::to_vec_pretty(profiles).context("Failed to serialize profiles")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &data)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(bytes = data.len(), "Wrote profile slot");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory slot. Used by tests and when running without a data directory.
#[derive(Debug, Default)]
pub struct MemorySlot {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    profiles: Option<Vec<Profile>>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemorySlot {
    /// A slot that has never been written.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A slot that already holds `profiles`.
    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        let slot = Self::default();
        slot.state.lock().profiles = Some(profiles);
        slot
    }

    /// Make every subsequent read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    pub fn snapshot(&self) -> Option<Vec<Profile>> {
        self.state.lock().profiles.clone()
    }
}

#[async_trait]
impl ProfileSlot for MemorySlot {
    async fn read(&self) -> Result<Option<Vec<Profile>>> {
        let state = self.state.lock();
        if state.fail_reads {
            anyhow::bail!("memory slot read failure");
        }
        Ok(state.profiles.clone())
    }

    async fn write(&self, profiles: &[Profile]) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_writes {
            anyhow::bail!("memory slot write failure");
        }
        state.profiles = Some(profiles.to_vec());
        state.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profiles::fixtures::profile;

    #[tokio::test]
    async fn file_slot_reads_none_before_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let slot = JsonFileSlot::new(dir.path().join("profiles.json"));

        assert_eq!(slot.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_slot_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let slot = JsonFileSlot::new(dir.path().join("nested/dir/profiles.json"));
        let profiles = vec![
            profile("b", "Bea", "b", "Oslo"),
            profile("a", "Abe", "a", "Rome"),
            profile("c", "Cy", "c", "Lima"),
        ];

        slot.write(&profiles).await.unwrap();
        assert_eq!(slot.read().await.unwrap(), Some(profiles));
        assert!(!slot.temp_path().exists());
    }

    #[tokio::test]
    async fn file_slot_write_replaces_previous_collection() {
        let dir = tempfile::tempdir().unwrap();
        let slot = JsonFileSlot::new(dir.path().join("profiles.json"));

        slot.write(&[profile("1", "Ann", "a", "x")]).await.unwrap();
        slot.write(&[]).await.unwrap();

        assert_eq!(slot.read().await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn file_slot_reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(&path, b"{not json").unwrap();

        assert!(JsonFileSlot::new(path).read().await.is_err());
    }

    #[tokio::test]
    async fn memory_slot_counts_writes_and_simulates_failures() {
        let slot = MemorySlot::empty();
        assert_eq!(slot.read().await.unwrap(), None);

        slot.write(&[profile("1", "Ann", "a", "x")]).await.unwrap();
        slot.fail_writes(true);
        assert!(slot.write(&[]).await.is_err());

        assert_eq!(slot.write_count(), 1);
        assert_eq!(slot.snapshot().unwrap().len(), 1);
    }
}
