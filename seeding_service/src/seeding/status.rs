// seeding_service/src/seeding/status.rs
//! Result and response types for the seeding pipeline and its control API.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkpoint::{SeedPhase, SnomedSeedStatus};

/// Outcome of one `seed` invocation. `ok=true, error="Paused"` marks a
/// cooperative stop with a resumable checkpoint left behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnomedSeedResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub concepts: u64,
    pub descriptions: u64,
    pub relationships: u64,
    /// Relationship rows dropped because an endpoint vertex was absent.
    pub relationships_skipped: u64,
    /// Wall-clock seconds of this run (not cumulative across resumes).
    pub duration: f64,
}

impl SnomedSeedResult {
    pub fn is_paused(&self) -> bool {
        self.ok && self.error.as_deref() == Some("Paused")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnomedSeedVerification {
    pub total_concepts: u64,
    pub active_concepts: u64,
    /// Always 0: the consumed repository interface has no per-label edge counts.
    pub total_relationships: u64,
    pub active_relationships: u64,
    pub root_concept_present: bool,
    pub clinical_finding_present: bool,
    pub errors: Vec<String>,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnomedSeedStartedResponse {
    pub message: String,
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnomedFullStatusResponse {
    pub import_directory: PathBuf,
    pub snapshot_directory: PathBuf,
    pub snapshot_present: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub terminology_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<SnomedSeedStatus>,
}

/// Control-plane rejections; the HTTP layer maps these to status codes.
#[derive(Debug, Error)]
pub enum JobControlError {
    #[error("A seeding job is already running")]
    AlreadyRunning,
    #[error("Snapshot directory not found: {0}")]
    MissingSnapshot(String),
    #[error("No seeding job is currently running")]
    NoActiveJob,
    #[error("No seed checkpoint exists")]
    NoCheckpoint,
    #[error("Checkpoint phase {0:?} cannot be resumed")]
    NotResumable(SeedPhase),
}
