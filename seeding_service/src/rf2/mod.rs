// seeding_service/src/rf2/mod.rs
//! RF2 Snapshot input: typed records, the streaming reader, and file-set
//! discovery.

pub mod locator;
pub mod reader;
pub mod records;

pub use locator::SnapshotFileSet;
pub use reader::Rf2Reader;
pub use records::{ConceptRow, DescriptionRow, LanguageRefsetRow, RelationshipRow, Rf2Record};

/// characteristicTypeId of classifier-inferred relationships; the only kind
/// materialized as edges.
pub const INFERRED_CHARACTERISTIC_TYPE_ID: &str = "900000000000011006";
/// typeId of the SNOMED subsumption relationship.
pub const IS_A_TYPE_ID: &str = "116680003";
/// typeId of Fully Specified Name descriptions.
pub const FSN_TYPE_ID: &str = "900000000000003001";
/// typeId of Synonym descriptions.
pub const SYNONYM_TYPE_ID: &str = "900000000000013009";
/// acceptabilityId marking a description as Preferred in a language refset.
pub const PREFERRED_ACCEPTABILITY_ID: &str = "900000000000548007";
/// The SNOMED CT root concept.
pub const SNOMED_ROOT_CONCEPT_ID: &str = "138875005";
/// Clinical finding, the top of the clinical hierarchy.
pub const CLINICAL_FINDING_CONCEPT_ID: &str = "404684003";
