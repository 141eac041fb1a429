// seeding_service/src/checkpoint/checkpoint.rs
//! The persisted seeding checkpoint and the status view derived from it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_DIALECT_REFSET_ID, DEFAULT_PROGRESS_LOG_INTERVAL};

pub const CHECKPOINT_FILE_NAME: &str = ".snomed-seed-checkpoint.json";

/// Pipeline phases in execution order, with `Paused`/`Failed` as sink states.
/// The derived `Ord` carries the resume comparison (`resume_phase <= phase`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeedPhase {
    NotStarted,
    Concepts,
    Descriptions,
    Relationships,
    Verification,
    Completed,
    Paused,
    Failed,
}

impl SeedPhase {
    /// Phases during which a live job is considered running.
    pub fn is_active_phase(&self) -> bool {
        matches!(
            self,
            SeedPhase::Concepts | SeedPhase::Descriptions | SeedPhase::Relationships | SeedPhase::Verification
        )
    }

    /// Sink states a later `/seed` or `/resume` may pick up from.
    pub fn is_resumable(&self) -> bool {
        matches!(self, SeedPhase::Paused | SeedPhase::Failed)
    }
}

fn default_active_only() -> bool {
    true
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_dialect_refset_id() -> String {
    DEFAULT_DIALECT_REFSET_ID.to_string()
}
fn default_progress_log_interval() -> u64 {
    DEFAULT_PROGRESS_LOG_INTERVAL
}
fn default_verify_after_seed() -> bool {
    true
}

/// Per-run options, persisted inside the checkpoint so a resume keeps the
/// behavior of the run it continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOptions {
    #[serde(default = "default_active_only")]
    pub active_only: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_dialect_refset_id")]
    pub dialect_refset_id: String,
    #[serde(default = "default_progress_log_interval")]
    pub progress_log_interval: u64,
    #[serde(default = "default_verify_after_seed")]
    pub verify_after_seed: bool,
    #[serde(default)]
    pub strict_edge_dedup: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            active_only: true,
            batch_size: DEFAULT_BATCH_SIZE,
            dialect_refset_id: DEFAULT_DIALECT_REFSET_ID.to_string(),
            progress_log_interval: DEFAULT_PROGRESS_LOG_INTERVAL,
            verify_after_seed: true,
            strict_edge_dedup: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnomedSeedCheckpoint {
    pub job_id: String,
    pub phase: SeedPhase,
    pub rf2_directory: PathBuf,
    pub last_processed_line: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_concept_id: Option<String>,
    pub concepts_seeded: u64,
    pub descriptions_processed: u64,
    pub relationships_seeded: u64,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    /// Accumulated wall-clock seconds across runs of this job.
    pub elapsed_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub pause_requested: bool,
    #[serde(default)]
    pub options: SeedOptions,
}

impl SnomedSeedCheckpoint {
    pub fn new(rf2_directory: PathBuf, options: SeedOptions) -> Self {
        let now = Utc::now();
        Self {
            // 128-bit random hex
            job_id: Uuid::new_v4().simple().to_string(),
            phase: SeedPhase::NotStarted,
            rf2_directory,
            last_processed_line: 0,
            last_concept_id: None,
            concepts_seeded: 0,
            descriptions_processed: 0,
            relationships_seeded: 0,
            started_at: now,
            last_updated_at: now,
            elapsed_time: 0.0,
            error_message: None,
            pause_requested: false,
            options,
        }
    }
}

/// Read-only job view served over HTTP, with the derived lifecycle flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnomedSeedStatus {
    pub job_id: String,
    pub phase: SeedPhase,
    pub rf2_directory: PathBuf,
    pub last_processed_line: u64,
    pub concepts_seeded: u64,
    pub descriptions_processed: u64,
    pub relationships_seeded: u64,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub elapsed_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub pause_requested: bool,
    pub is_running: bool,
    pub is_paused: bool,
    pub is_completed: bool,
    pub is_failed: bool,
}

impl SnomedSeedStatus {
    /// `active` reflects whether the checkpoint belongs to a live in-process
    /// job; a checkpoint read back from disk is never running.
    pub fn from_checkpoint(checkpoint: &SnomedSeedCheckpoint, active: bool) -> Self {
        Self {
            job_id: checkpoint.job_id.clone(),
            phase: checkpoint.phase,
            rf2_directory: checkpoint.rf2_directory.clone(),
            last_processed_line: checkpoint.last_processed_line,
            concepts_seeded: checkpoint.concepts_seeded,
            descriptions_processed: checkpoint.descriptions_processed,
            relationships_seeded: checkpoint.relationships_seeded,
            started_at: checkpoint.started_at,
            last_updated_at: checkpoint.last_updated_at,
            elapsed_time: checkpoint.elapsed_time,
            error_message: checkpoint.error_message.clone(),
            pause_requested: checkpoint.pause_requested,
            is_running: active && checkpoint.phase.is_active_phase(),
            is_paused: checkpoint.phase == SeedPhase::Paused,
            is_completed: checkpoint.phase == SeedPhase::Completed,
            is_failed: checkpoint.phase == SeedPhase::Failed,
        }
    }
}
