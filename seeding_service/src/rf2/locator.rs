// seeding_service/src/rf2/locator.rs
//! Discovers the four RF2 Snapshot input files by filename prefix.

use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::SeedError;

const CONCEPT_PREFIX: &str = "sct2_Concept_Snapshot";
const DESCRIPTION_PREFIX: &str = "sct2_Description_Snapshot";
const RELATIONSHIP_PREFIX: &str = "sct2_Relationship_Snapshot";
const LANGUAGE_REFSET_PREFIX: &str = "der2_cRefset_LanguageSnapshot";

/// The resolved input files of one Snapshot distribution. The language
/// refset is optional; without it no preferred terms are resolved.
#[derive(Debug, Clone)]
pub struct SnapshotFileSet {
    pub concepts: PathBuf,
    pub descriptions: PathBuf,
    pub relationships: PathBuf,
    pub language_refset: Option<PathBuf>,
}

impl SnapshotFileSet {
    pub async fn locate(snapshot_dir: &Path) -> Result<Self, SeedError> {
        let terminology = snapshot_dir.join("Terminology");
        let language = snapshot_dir.join("Refset").join("Language");

        let concepts = find_by_prefix(&terminology, CONCEPT_PREFIX)
            .await?
            .ok_or_else(|| missing(CONCEPT_PREFIX, &terminology))?;
        let descriptions = find_by_prefix(&terminology, DESCRIPTION_PREFIX)
            .await?
            .ok_or_else(|| missing(DESCRIPTION_PREFIX, &terminology))?;
        let relationships = find_by_prefix(&terminology, RELATIONSHIP_PREFIX)
            .await?
            .ok_or_else(|| missing(RELATIONSHIP_PREFIX, &terminology))?;
        let language_refset = find_by_prefix(&language, LANGUAGE_REFSET_PREFIX)
            .await
            .unwrap_or(None);

        if language_refset.is_none() {
            debug!("No language refset found under {}; preferred terms disabled", language.display());
        }

        Ok(Self { concepts, descriptions, relationships, language_refset })
    }
}

fn missing(prefix: &str, dir: &Path) -> SeedError {
    SeedError::MissingInput(format!("No {}*.txt file found in {}", prefix, dir.display()))
}

/// First `*.txt` file in `dir` whose basename starts with `prefix`.
async fn find_by_prefix(dir: &Path, prefix: &str) -> Result<Option<PathBuf>, SeedError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return Ok(None),
    };

    let mut matches: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(prefix) && name.ends_with(".txt") {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}
