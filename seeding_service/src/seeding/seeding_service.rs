// seeding_service/src/seeding/seeding_service.rs
//! Three-phase RF2 Snapshot import: Concepts -> Descriptions ->
//! Relationships, then Verification. Progress is checkpointed at every
//! batch boundary so a pause, crash, or graph failure leaves a resumable
//! job behind.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use graph_engine::{GraphRepository, PropertyFilter};
use log::{error, info, warn};
use models::properties::{PropertyMap, PropertyValue};
use tokio::sync::OnceCell;

use crate::checkpoint::{CheckpointStore, SeedOptions, SeedPhase, SnomedSeedCheckpoint, SnomedSeedStatus};
use crate::config::SnomedConfig;
use crate::errors::SeedError;
use crate::rf2::{
    ConceptRow, DescriptionRow, LanguageRefsetRow, RelationshipRow, Rf2Reader, SnapshotFileSet,
    CLINICAL_FINDING_CONCEPT_ID, FSN_TYPE_ID, INFERRED_CHARACTERISTIC_TYPE_ID, IS_A_TYPE_ID,
    PREFERRED_ACCEPTABILITY_ID, SNOMED_ROOT_CONCEPT_ID, SYNONYM_TYPE_ID,
};
use crate::seeding::status::{
    JobControlError, SnomedFullStatusResponse, SnomedSeedResult, SnomedSeedStartedResponse,
    SnomedSeedVerification,
};
use crate::seeding::{
    CONCEPT_ID_PROPERTY, DEFINING_REL_LABEL, IS_A_LABEL, SNOMED_CONCEPT_LABEL, UPSERT_CONCURRENCY,
};

/// Global singleton
pub static SEEDING_SERVICE: OnceCell<Arc<SnomedSeedingService>> = OnceCell::const_new();

pub struct SnomedSeedingService {
    repository: Arc<dyn GraphRepository>,
    checkpoints: Arc<CheckpointStore>,
    config: SnomedConfig,
    shutdown: Arc<AtomicBool>,
    running: AtomicBool,
}

struct PhaseRun {
    processed: u64,
    paused: bool,
    skipped: u64,
}

struct Totals {
    concepts: u64,
    descriptions: u64,
    relationships: u64,
    skipped: u64,
}

impl Totals {
    fn into_result(self, ok: bool, error: Option<String>, duration: f64) -> SnomedSeedResult {
        SnomedSeedResult {
            ok,
            error,
            concepts: self.concepts,
            descriptions: self.descriptions,
            relationships: self.relationships,
            relationships_skipped: self.skipped,
            duration,
        }
    }
}

fn resume_phase_for(checkpoint: &SnomedSeedCheckpoint) -> SeedPhase {
    match checkpoint.phase {
        SeedPhase::NotStarted => SeedPhase::Concepts,
        SeedPhase::Paused | SeedPhase::Failed => {
            if checkpoint.relationships_seeded > 0 {
                SeedPhase::Relationships
            } else if checkpoint.descriptions_processed > 0 {
                SeedPhase::Descriptions
            } else {
                SeedPhase::Concepts
            }
        }
        phase => phase,
    }
}

impl SnomedSeedingService {
    pub fn new(
        repository: Arc<dyn GraphRepository>,
        checkpoints: Arc<CheckpointStore>,
        config: SnomedConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            repository,
            checkpoints,
            config,
            shutdown,
            running: AtomicBool::new(false),
        }
    }

    pub async fn global_init(
        repository: Arc<dyn GraphRepository>,
        checkpoints: Arc<CheckpointStore>,
        config: SnomedConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Result<(), &'static str> {
        let service = Arc::new(Self::new(repository, checkpoints, config, shutdown));
        SEEDING_SERVICE
            .set(service)
            .map_err(|_| "SnomedSeedingService already initialized")
    }

    pub async fn get() -> Arc<Self> {
        SEEDING_SERVICE.get().expect("SnomedSeedingService not initialised").clone()
    }

    pub fn config(&self) -> &SnomedConfig {
        &self.config
    }

    pub fn checkpoints(&self) -> &Arc<CheckpointStore> {
        &self.checkpoints
    }

    // =========================================================================
    // JOB CONTROL
    // =========================================================================

    fn try_begin_run(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn end_run(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Launch a seeding job on a detached task. The single-job invariant is
    /// enforced here: concurrent callers get exactly one acceptance.
    pub async fn start(
        self: &Arc<Self>,
        options: SeedOptions,
        force_restart: bool,
    ) -> Result<SnomedSeedStartedResponse, JobControlError> {
        let snapshot_dir = self.config.snapshot_directory();
        match tokio::fs::metadata(&snapshot_dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(JobControlError::MissingSnapshot(snapshot_dir.display().to_string())),
        }

        if !self.try_begin_run() {
            return Err(JobControlError::AlreadyRunning);
        }

        if force_restart {
            self.checkpoints.clear().await;
        }
        let checkpoint = self.checkpoints.get_or_create(&options).await;
        let job_id = checkpoint.job_id.clone();

        let service = Arc::clone(self);
        tokio::spawn(async move {
            let result = service.run_seed(options).await;
            match (&result.ok, &result.error) {
                (true, Some(reason)) => info!("Seeding job stopped: {}", reason),
                (true, None) => info!(
                    "Seeding job finished: {} concepts, {} descriptions, {} relationships",
                    result.concepts, result.descriptions, result.relationships
                ),
                (false, reason) => error!(
                    "Seeding job failed: {}",
                    reason.as_deref().unwrap_or("unknown error")
                ),
            }
            service.end_run();
        });

        Ok(SnomedSeedStartedResponse {
            message: "SNOMED CT seeding started".to_string(),
            job_id,
        })
    }

    /// Relaunch a paused or failed job with the options it was started with.
    pub async fn resume_job(self: &Arc<Self>) -> Result<SnomedSeedStartedResponse, JobControlError> {
        let Some((checkpoint, _)) = self.checkpoints.current().await else {
            return Err(JobControlError::NoCheckpoint);
        };
        if !checkpoint.phase.is_resumable() {
            return Err(JobControlError::NotResumable(checkpoint.phase));
        }
        self.start(checkpoint.options.clone(), false).await
    }

    /// Ask the running job to stop at its next safe point.
    pub async fn pause_job(&self) -> Result<SnomedSeedStartedResponse, JobControlError> {
        match self.checkpoints.get_status().await {
            Some(status) if status.is_running => {
                self.checkpoints.request_pause().await;
                Ok(SnomedSeedStartedResponse {
                    message: "Pause requested; the job stops at the next batch boundary".to_string(),
                    job_id: status.job_id,
                })
            }
            _ => Err(JobControlError::NoActiveJob),
        }
    }

    pub async fn status(&self) -> Option<SnomedSeedStatus> {
        self.checkpoints.get_status().await
    }

    pub async fn full_status(&self) -> SnomedFullStatusResponse {
        let snapshot_directory = self.config.snapshot_directory();
        let snapshot_present = tokio::fs::metadata(&snapshot_directory)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        SnomedFullStatusResponse {
            import_directory: self.config.import_directory.clone(),
            snapshot_directory,
            snapshot_present,
            terminology_version: self.config.terminology_version.clone(),
            job: self.checkpoints.get_status().await,
        }
    }

    pub async fn clear_checkpoint(&self) {
        self.checkpoints.clear().await;
    }

    // =========================================================================
    // PIPELINE
    // =========================================================================

    /// Run a seed synchronously on the caller's task. `start` is the
    /// fire-and-forget variant used by the HTTP layer.
    pub async fn seed(&self, options: SeedOptions, force_restart: bool) -> SnomedSeedResult {
        if !self.try_begin_run() {
            return SnomedSeedResult {
                ok: false,
                error: Some("A seeding job is already running".to_string()),
                concepts: 0,
                descriptions: 0,
                relationships: 0,
                relationships_skipped: 0,
                duration: 0.0,
            };
        }
        if force_restart {
            self.checkpoints.clear().await;
        }
        let result = self.run_seed(options).await;
        self.end_run();
        result
    }

    async fn run_seed(&self, options: SeedOptions) -> SnomedSeedResult {
        let run_started = Instant::now();
        let checkpoint = self.checkpoints.get_or_create(&options).await;
        let prior_elapsed = checkpoint.elapsed_time;

        let mut totals = Totals {
            concepts: checkpoint.concepts_seeded,
            descriptions: checkpoint.descriptions_processed,
            relationships: checkpoint.relationships_seeded,
            skipped: 0,
        };

        let outcome = self.run_phases(&checkpoint, &options, &mut totals).await;
        let duration = run_started.elapsed().as_secs_f64();
        let elapsed = prior_elapsed + duration;

        match outcome {
            Ok(true) => {
                self.checkpoints.mark_paused(elapsed).await;
                totals.into_result(true, Some("Paused".to_string()), duration)
            }
            Ok(false) => {
                self.checkpoints.mark_completed(elapsed).await;
                totals.into_result(true, None, duration)
            }
            // external cancellation takes the same path as a cooperative pause
            Err(SeedError::Cancelled) => {
                self.checkpoints.mark_paused(elapsed).await;
                totals.into_result(true, Some("Paused".to_string()), duration)
            }
            Err(e) => {
                let message = e.to_string();
                self.checkpoints.mark_failed(&message, elapsed).await;
                totals.into_result(false, Some(message), duration)
            }
        }
    }

    /// Returns `Ok(true)` when a pause interrupted the run.
    async fn run_phases(
        &self,
        checkpoint: &SnomedSeedCheckpoint,
        options: &SeedOptions,
        totals: &mut Totals,
    ) -> Result<bool, SeedError> {
        let resume_phase = resume_phase_for(checkpoint);
        info!("Seeding job {} entering phase {:?}", checkpoint.job_id, resume_phase);
        let files = SnapshotFileSet::locate(&self.config.snapshot_directory()).await?;

        if resume_phase <= SeedPhase::Concepts {
            let resume_line = if checkpoint.phase == SeedPhase::Concepts {
                checkpoint.last_processed_line
            } else {
                0
            };
            let initial = if resume_line > 0 { checkpoint.concepts_seeded } else { 0 };
            self.checkpoints.advance_phase(SeedPhase::Concepts).await;
            let run = self.seed_concepts(&files.concepts, resume_line, initial, options).await?;
            totals.concepts = run.processed;
            if run.paused {
                return Ok(true);
            }
        }

        if resume_phase <= SeedPhase::Descriptions {
            // never line-resumable: the in-memory join needs the whole file
            self.checkpoints.advance_phase(SeedPhase::Descriptions).await;
            let run = self.seed_descriptions(&files, options).await?;
            totals.descriptions = run.processed;
            if run.paused {
                return Ok(true);
            }
        }

        if resume_phase <= SeedPhase::Relationships {
            let resume_line = if checkpoint.phase == SeedPhase::Relationships {
                checkpoint.last_processed_line
            } else {
                0
            };
            let initial = if resume_line > 0 { checkpoint.relationships_seeded } else { 0 };
            self.checkpoints.advance_phase(SeedPhase::Relationships).await;
            let run = self
                .seed_relationships(&files.relationships, resume_line, initial, options)
                .await?;
            totals.relationships = run.processed;
            totals.skipped = run.skipped;
            if run.paused {
                return Ok(true);
            }
        }

        if options.verify_after_seed {
            self.checkpoints.advance_phase(SeedPhase::Verification).await;
            match self.verify().await {
                Ok(verification) => {
                    for issue in &verification.errors {
                        warn!("Verification: {}", issue);
                    }
                }
                Err(e) => warn!("Verification failed: {}", e),
            }
        }

        Ok(false)
    }

    async fn pause_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed) || self.checkpoints.is_pause_requested().await
    }

    // =========================================================================
    // PHASE 1: CONCEPTS
    // =========================================================================

    async fn seed_concepts(
        &self,
        path: &Path,
        resume_from_line: u64,
        initial_seeded: u64,
        options: &SeedOptions,
    ) -> Result<PhaseRun, SeedError> {
        info!("Phase 1: seeding concepts from {}", path.display());
        let mut reader = Rf2Reader::<ConceptRow>::open(path)
            .await?
            .with_shutdown(self.shutdown.clone());
        let mut batch: Vec<(String, PropertyMap)> = Vec::with_capacity(options.batch_size);
        let mut line: u64 = 0;
        let mut seeded = initial_seeded;
        let mut last_logged = seeded;
        let mut last_concept_id: Option<String> = None;

        loop {
            if self.pause_requested().await {
                seeded += self.flush_concept_batch(&mut batch).await?;
                self.record_concept_progress(line, seeded, &last_concept_id).await;
                info!("Concept phase pausing at line {} ({} seeded)", line, seeded);
                return Ok(PhaseRun { processed: seeded, paused: true, skipped: 0 });
            }

            let Some(row) = reader.next_record().await? else { break };
            line += 1;
            if line <= resume_from_line {
                continue;
            }
            if options.active_only && !row.active {
                continue;
            }

            let mut props = PropertyMap::new();
            props.insert(CONCEPT_ID_PROPERTY.to_string(), PropertyValue::from(row.id.as_str()));
            props.insert("active".to_string(), PropertyValue::from(row.active));
            props.insert("moduleId".to_string(), PropertyValue::from(row.module_id));
            props.insert("effectiveTime".to_string(), PropertyValue::from(row.effective_time));
            last_concept_id = Some(row.id.clone());
            batch.push((row.id, props));

            if batch.len() >= options.batch_size {
                seeded += self.flush_concept_batch(&mut batch).await?;
                self.record_concept_progress(line, seeded, &last_concept_id).await;
                if seeded - last_logged >= options.progress_log_interval {
                    info!("Seeded {} concepts (line {})", seeded, line);
                    last_logged = seeded;
                }
            }
        }

        seeded += self.flush_concept_batch(&mut batch).await?;
        self.record_concept_progress(line, seeded, &last_concept_id).await;
        info!("Concept phase complete: {} concepts seeded", seeded);
        Ok(PhaseRun { processed: seeded, paused: false, skipped: 0 })
    }

    async fn record_concept_progress(&self, line: u64, seeded: u64, last_concept_id: &Option<String>) {
        let last_concept_id = last_concept_id.clone();
        self.checkpoints
            .update(move |checkpoint| {
                checkpoint.last_processed_line = line;
                checkpoint.concepts_seeded = seeded;
                checkpoint.last_concept_id = last_concept_id;
            })
            .await;
    }

    /// Upsert the pending batch, at most `UPSERT_CONCURRENCY` calls in
    /// flight; each chunk is fully awaited before the next is dispatched.
    /// A failed upsert aborts the whole flush; upserts that already
    /// committed are safe to repeat on the retry.
    async fn flush_concept_batch(
        &self,
        batch: &mut Vec<(String, PropertyMap)>,
    ) -> Result<u64, SeedError> {
        let items = std::mem::take(batch);
        let count = items.len() as u64;
        for chunk in items.chunks(UPSERT_CONCURRENCY) {
            let upserts = chunk.iter().map(|(concept_id, props)| {
                self.repository.upsert_vertex_and_return_id(
                    SNOMED_CONCEPT_LABEL,
                    CONCEPT_ID_PROPERTY,
                    concept_id,
                    props.clone(),
                )
            });
            try_join_all(upserts).await?;
        }
        Ok(count)
    }

    // =========================================================================
    // PHASE 2: DESCRIPTIONS
    // =========================================================================

    async fn seed_descriptions(
        &self,
        files: &SnapshotFileSet,
        options: &SeedOptions,
    ) -> Result<PhaseRun, SeedError> {
        info!("Phase 2: resolving descriptions from {}", files.descriptions.display());

        // Pass A: description ids marked Preferred in the configured dialect
        let mut preferred_ids: HashSet<String> = HashSet::new();
        if let Some(refset_path) = &files.language_refset {
            let mut reader = Rf2Reader::<LanguageRefsetRow>::open(refset_path)
                .await?
                .with_shutdown(self.shutdown.clone());
            loop {
                if self.pause_requested().await {
                    return Ok(PhaseRun { processed: 0, paused: true, skipped: 0 });
                }
                let Some(member) = reader.next_record().await? else { break };
                if member.active
                    && member.refset_id == options.dialect_refset_id
                    && member.acceptability_id == PREFERRED_ACCEPTABILITY_ID
                {
                    preferred_ids.insert(member.referenced_component_id);
                }
            }
            info!("Language refset loaded: {} preferred description ids", preferred_ids.len());
        } else {
            info!("No language refset file; preferred terms will not be resolved");
        }

        // Pass B: join FSN and preferred synonym per concept.
        // Last write wins for each slot independently.
        let mut concept_descriptions: HashMap<String, (Option<String>, Option<String>)> =
            HashMap::new();
        let mut processed: u64 = 0;
        {
            let mut reader = Rf2Reader::<DescriptionRow>::open(&files.descriptions)
                .await?
                .with_shutdown(self.shutdown.clone());
            loop {
                if self.pause_requested().await {
                    self.checkpoints.update_progress(0, None, Some(processed), None).await;
                    return Ok(PhaseRun { processed, paused: true, skipped: 0 });
                }
                let Some(row) = reader.next_record().await? else { break };
                processed += 1;
                if options.active_only && !row.active {
                    continue;
                }

                if row.type_id == FSN_TYPE_ID {
                    concept_descriptions.entry(row.concept_id).or_default().0 = Some(row.term);
                } else if row.type_id == SYNONYM_TYPE_ID && preferred_ids.contains(&row.id) {
                    concept_descriptions.entry(row.concept_id).or_default().1 = Some(row.term);
                }
            }
        }

        // Pass C: write resolved names onto the concept vertices. Concepts
        // dropped upstream (e.g. by activeOnly) are silently skipped.
        let mut updated: u64 = 0;
        for (concept_id, (fsn, preferred_term)) in &concept_descriptions {
            if self.pause_requested().await {
                self.checkpoints.update_progress(0, None, Some(processed), None).await;
                return Ok(PhaseRun { processed, paused: true, skipped: 0 });
            }
            if fsn.is_none() && preferred_term.is_none() {
                continue;
            }

            let vertex_id = self
                .repository
                .get_vertex_id_by_label_and_property(SNOMED_CONCEPT_LABEL, CONCEPT_ID_PROPERTY, concept_id)
                .await?;
            let Some(vertex_id) = vertex_id else { continue };

            let mut props = PropertyMap::new();
            if let Some(fsn) = fsn {
                props.insert("fsn".to_string(), PropertyValue::from(fsn.as_str()));
            }
            if let Some(term) = preferred_term {
                props.insert("preferredTerm".to_string(), PropertyValue::from(term.as_str()));
            }
            self.repository.update_vertex_properties(vertex_id, props).await?;
            updated += 1;
        }

        self.checkpoints.update_progress(0, None, Some(processed), None).await;
        info!(
            "Description phase complete: {} descriptions processed, {} concepts updated",
            processed, updated
        );
        Ok(PhaseRun { processed, paused: false, skipped: 0 })
    }

    // =========================================================================
    // PHASE 3: RELATIONSHIPS
    // =========================================================================

    async fn seed_relationships(
        &self,
        path: &Path,
        resume_from_line: u64,
        initial_seeded: u64,
        options: &SeedOptions,
    ) -> Result<PhaseRun, SeedError> {
        info!("Phase 3: seeding relationships from {}", path.display());
        let mut reader = Rf2Reader::<RelationshipRow>::open(path)
            .await?
            .with_shutdown(self.shutdown.clone());
        let mut line: u64 = 0;
        let mut seeded = initial_seeded;
        let mut skipped: u64 = 0;
        // within-run suppression only; a resumed run starts a fresh set
        let mut seen_edges: Option<HashSet<(String, String, String)>> =
            options.strict_edge_dedup.then(HashSet::new);

        loop {
            if self.pause_requested().await {
                self.checkpoints.update_progress(line, None, None, Some(seeded)).await;
                info!("Relationship phase pausing at line {} ({} seeded)", line, seeded);
                return Ok(PhaseRun { processed: seeded, paused: true, skipped });
            }

            let Some(row) = reader.next_record().await? else { break };
            line += 1;
            if line <= resume_from_line {
                continue;
            }
            if options.active_only && !row.active {
                continue;
            }
            if row.characteristic_type_id != INFERRED_CHARACTERISTIC_TYPE_ID {
                continue;
            }

            let source = self
                .repository
                .get_vertex_id_by_label_and_property(SNOMED_CONCEPT_LABEL, CONCEPT_ID_PROPERTY, &row.source_id)
                .await?;
            let destination = self
                .repository
                .get_vertex_id_by_label_and_property(SNOMED_CONCEPT_LABEL, CONCEPT_ID_PROPERTY, &row.destination_id)
                .await?;
            let (Some(source), Some(destination)) = (source, destination) else {
                skipped += 1;
                continue;
            };

            if let Some(seen) = seen_edges.as_mut() {
                if !seen.insert((row.source_id.clone(), row.destination_id.clone(), row.type_id.clone())) {
                    continue;
                }
            }

            if row.type_id == IS_A_TYPE_ID {
                self.repository.add_edge(IS_A_LABEL, source, destination, None).await?;
            } else {
                let mut props = PropertyMap::new();
                props.insert(
                    "relationshipTypeId".to_string(),
                    PropertyValue::from(row.type_id.as_str()),
                );
                self.repository
                    .add_edge(DEFINING_REL_LABEL, source, destination, Some(props))
                    .await?;
            }
            seeded += 1;

            if options.progress_log_interval > 0 && seeded % options.progress_log_interval == 0 {
                self.checkpoints.update_progress(line, None, None, Some(seeded)).await;
                info!("Seeded {} relationships (line {})", seeded, line);
            }
        }

        self.checkpoints.update_progress(line, None, None, Some(seeded)).await;
        info!("Relationship phase complete: {} seeded, {} skipped", seeded, skipped);
        Ok(PhaseRun { processed: seeded, paused: false, skipped })
    }

    // =========================================================================
    // PHASE 4: VERIFICATION
    // =========================================================================

    /// Read-only sanity pass. Findings are reported, never fatal.
    pub async fn verify(&self) -> Result<SnomedSeedVerification, SeedError> {
        let total_concepts = self
            .repository
            .count_vertices_by_label(SNOMED_CONCEPT_LABEL, None)
            .await?;
        let active_concepts = self
            .repository
            .count_vertices_by_label(SNOMED_CONCEPT_LABEL, Some(PropertyFilter::new("active", true)))
            .await?;
        let root_concept_present = self
            .repository
            .get_vertex_id_by_label_and_property(SNOMED_CONCEPT_LABEL, CONCEPT_ID_PROPERTY, SNOMED_ROOT_CONCEPT_ID)
            .await?
            .is_some();
        let clinical_finding_present = self
            .repository
            .get_vertex_id_by_label_and_property(
                SNOMED_CONCEPT_LABEL,
                CONCEPT_ID_PROPERTY,
                CLINICAL_FINDING_CONCEPT_ID,
            )
            .await?
            .is_some();

        let mut errors = Vec::new();
        if !root_concept_present {
            errors.push(format!("SNOMED root concept {} not found", SNOMED_ROOT_CONCEPT_ID));
        }
        if !clinical_finding_present {
            errors.push(format!(
                "Clinical finding concept {} not found",
                CLINICAL_FINDING_CONCEPT_ID
            ));
        }

        Ok(SnomedSeedVerification {
            total_concepts,
            active_concepts,
            // the consumed interface has no per-label edge counts yet
            total_relationships: 0,
            active_relationships: 0,
            root_concept_present,
            clinical_finding_present,
            errors,
            verified_at: chrono::Utc::now(),
        })
    }
}
