// seeding_service/src/checkpoint/checkpoint_store.rs
//! Single-writer persistence for the seeding checkpoint.
//!
//! One mutex guards both the in-memory checkpoint and the JSON document at
//! `parent(snapshot_dir)/.snomed-seed-checkpoint.json`. Disk write failures
//! are logged and swallowed; the in-memory view stays authoritative for the
//! running job. A corrupt file on load is treated as no checkpoint.

use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::sync::Mutex;

use crate::checkpoint::checkpoint::{
    SeedOptions, SeedPhase, SnomedSeedCheckpoint, SnomedSeedStatus, CHECKPOINT_FILE_NAME,
};

struct StoreState {
    active: bool,
    checkpoint: Option<SnomedSeedCheckpoint>,
}

pub struct CheckpointStore {
    snapshot_dir: PathBuf,
    state: Mutex<StoreState>,
}

impl CheckpointStore {
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
            state: Mutex::new(StoreState { active: false, checkpoint: None }),
        }
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.snapshot_dir
            .parent()
            .unwrap_or(&self.snapshot_dir)
            .join(CHECKPOINT_FILE_NAME)
    }

    /// Adopt the on-disk checkpoint when it belongs to this snapshot
    /// directory and is not completed; otherwise start a fresh job.
    /// Marks the store active either way.
    pub async fn get_or_create(&self, options: &SeedOptions) -> SnomedSeedCheckpoint {
        let mut state = self.state.lock().await;
        if state.active {
            if let Some(checkpoint) = &state.checkpoint {
                return checkpoint.clone();
            }
        }

        let checkpoint = match self.load_from_disk().await {
            Some(mut existing)
                if existing.phase != SeedPhase::Completed
                    && existing.rf2_directory == self.snapshot_dir =>
            {
                info!(
                    "Resuming SNOMED seed job {} from phase {:?}",
                    existing.job_id, existing.phase
                );
                existing.pause_requested = false;
                existing.error_message = None;
                existing
            }
            _ => {
                let fresh = SnomedSeedCheckpoint::new(self.snapshot_dir.clone(), options.clone());
                info!("Starting SNOMED seed job {}", fresh.job_id);
                self.write_to_disk(&fresh).await;
                fresh
            }
        };

        state.active = true;
        state.checkpoint = Some(checkpoint.clone());
        checkpoint
    }

    /// Apply `mutator`, stamp `lastUpdatedAt`, persist. No-op when inactive.
    pub async fn update<F>(&self, mutator: F)
    where
        F: FnOnce(&mut SnomedSeedCheckpoint),
    {
        let mut state = self.state.lock().await;
        if !state.active {
            return;
        }
        if let Some(checkpoint) = state.checkpoint.as_mut() {
            mutator(checkpoint);
            checkpoint.last_updated_at = chrono::Utc::now();
            let snapshot = checkpoint.clone();
            // the lock stays held across the write so documents reach disk
            // in mutation order
            self.write_to_disk(&snapshot).await;
        }
    }

    /// Enter `phase`, resetting the per-phase line cursor.
    pub async fn advance_phase(&self, phase: SeedPhase) {
        self.update(|checkpoint| {
            checkpoint.phase = phase;
            checkpoint.last_processed_line = 0;
        })
        .await;
    }

    /// Record the latest per-phase cursor and whichever counters moved.
    pub async fn update_progress(
        &self,
        line_number: u64,
        concepts_seeded: Option<u64>,
        descriptions_processed: Option<u64>,
        relationships_seeded: Option<u64>,
    ) {
        self.update(|checkpoint| {
            checkpoint.last_processed_line = line_number;
            if let Some(concepts) = concepts_seeded {
                checkpoint.concepts_seeded = concepts;
            }
            if let Some(descriptions) = descriptions_processed {
                checkpoint.descriptions_processed = descriptions;
            }
            if let Some(relationships) = relationships_seeded {
                checkpoint.relationships_seeded = relationships;
            }
        })
        .await;
    }

    /// Successful finish: the checkpoint file is erased and the store goes
    /// inactive.
    pub async fn mark_completed(&self, elapsed_seconds: f64) {
        let mut state = self.state.lock().await;
        if let Some(checkpoint) = &state.checkpoint {
            info!(
                "SNOMED seed job {} completed in {:.1}s",
                checkpoint.job_id, elapsed_seconds
            );
        }
        state.active = false;
        state.checkpoint = None;
        self.delete_file().await;
    }

    pub async fn mark_paused(&self, elapsed_seconds: f64) {
        let mut state = self.state.lock().await;
        if let Some(checkpoint) = state.checkpoint.as_mut() {
            checkpoint.phase = SeedPhase::Paused;
            checkpoint.pause_requested = false;
            checkpoint.elapsed_time = elapsed_seconds;
            checkpoint.last_updated_at = chrono::Utc::now();
            let snapshot = checkpoint.clone();
            state.active = false;
            self.write_to_disk(&snapshot).await;
        }
    }

    pub async fn mark_failed(&self, error: &str, elapsed_seconds: f64) {
        let mut state = self.state.lock().await;
        if let Some(checkpoint) = state.checkpoint.as_mut() {
            checkpoint.phase = SeedPhase::Failed;
            checkpoint.error_message = Some(error.to_string());
            checkpoint.elapsed_time = elapsed_seconds;
            checkpoint.last_updated_at = chrono::Utc::now();
            let snapshot = checkpoint.clone();
            state.active = false;
            self.write_to_disk(&snapshot).await;
        }
    }

    /// Memory-only flag flip; the running phases poll it at safe points.
    pub async fn request_pause(&self) -> bool {
        let mut state = self.state.lock().await;
        if !state.active {
            return false;
        }
        match state.checkpoint.as_mut() {
            Some(checkpoint) => {
                checkpoint.pause_requested = true;
                true
            }
            None => false,
        }
    }

    pub async fn is_pause_requested(&self) -> bool {
        let state = self.state.lock().await;
        state.active
            && state
                .checkpoint
                .as_ref()
                .map(|c| c.pause_requested)
                .unwrap_or(false)
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.active
    }

    /// The live checkpoint when a job is running, else whatever is on disk.
    pub async fn current(&self) -> Option<(SnomedSeedCheckpoint, bool)> {
        let state = self.state.lock().await;
        if state.active {
            if let Some(checkpoint) = &state.checkpoint {
                if checkpoint.rf2_directory == self.snapshot_dir {
                    return Some((checkpoint.clone(), true));
                }
            }
        }
        self.load_from_disk().await.map(|c| (c, false))
    }

    pub async fn get_status(&self) -> Option<SnomedSeedStatus> {
        self.current()
            .await
            .map(|(checkpoint, active)| SnomedSeedStatus::from_checkpoint(&checkpoint, active))
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.active = false;
        state.checkpoint = None;
        self.delete_file().await;
    }

    async fn load_from_disk(&self) -> Option<SnomedSeedCheckpoint> {
        let path = self.checkpoint_path();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(_) => return None,
        };
        match serde_json::from_str(&raw) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                warn!("Corrupt checkpoint at {}: {}; ignoring it", path.display(), e);
                None
            }
        }
    }

    async fn write_to_disk(&self, checkpoint: &SnomedSeedCheckpoint) {
        let path = self.checkpoint_path();
        let json = match serde_json::to_string_pretty(checkpoint) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize checkpoint: {}", e);
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&path, json).await {
            warn!("Failed to write checkpoint {}: {}", path.display(), e);
        }
    }

    async fn delete_file(&self) {
        let path = self.checkpoint_path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete checkpoint {}: {}", path.display(), e),
        }
    }
}
