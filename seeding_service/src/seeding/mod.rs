// seeding_service/src/seeding/mod.rs

pub mod seeding_service;
pub mod status;

pub use seeding_service::{SnomedSeedingService, SEEDING_SERVICE};
pub use status::{
    JobControlError, SnomedFullStatusResponse, SnomedSeedResult, SnomedSeedStartedResponse,
    SnomedSeedVerification,
};

/// Vertex label for SNOMED CT concepts.
pub const SNOMED_CONCEPT_LABEL: &str = "SnomedConcept";
/// Property carrying the SCTID; the upsert identity key.
pub const CONCEPT_ID_PROPERTY: &str = "conceptId";
/// Edge label for subsumption relationships.
pub const IS_A_LABEL: &str = "IS_A";
/// Edge label for all other inferred relationships.
pub const DEFINING_REL_LABEL: &str = "DEFINING_REL";

/// Ceiling on parallel vertex upserts within one batch flush.
pub const UPSERT_CONCURRENCY: usize = 16;
