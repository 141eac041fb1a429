// seeding_service/src/rf2/records.rs
//! Typed rows for the four RF2 Snapshot file families.
//!
//! All RF2 files are tab-delimited with a header row. Rows that are too
//! short, or whose `active` column fails integer parse, are discarded by the
//! reader rather than surfaced as errors.

/// A record type parseable from one RF2 data line.
pub trait Rf2Record: Sized + Send {
    /// Minimum column count; shorter rows are discarded.
    const MIN_COLUMNS: usize;

    fn from_columns(columns: &[&str]) -> Option<Self>;

    fn parse_line(line: &str) -> Option<Self> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < Self::MIN_COLUMNS {
            return None;
        }
        Self::from_columns(&columns)
    }
}

/// RF2 encodes active as `"1"`/`"0"`; anything that is not an integer
/// invalidates the row.
fn parse_active(field: &str) -> Option<bool> {
    field.trim().parse::<i64>().ok().map(|v| v != 0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRow {
    pub id: String,
    pub effective_time: String,
    pub active: bool,
    pub module_id: String,
    pub definition_status_id: String,
}

impl Rf2Record for ConceptRow {
    const MIN_COLUMNS: usize = 5;

    fn from_columns(columns: &[&str]) -> Option<Self> {
        Some(ConceptRow {
            id: columns[0].to_string(),
            effective_time: columns[1].to_string(),
            active: parse_active(columns[2])?,
            module_id: columns[3].to_string(),
            definition_status_id: columns[4].to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionRow {
    pub id: String,
    pub effective_time: String,
    pub active: bool,
    pub module_id: String,
    pub concept_id: String,
    pub language_code: String,
    pub type_id: String,
    pub term: String,
    pub case_significance_id: String,
}

impl Rf2Record for DescriptionRow {
    const MIN_COLUMNS: usize = 9;

    fn from_columns(columns: &[&str]) -> Option<Self> {
        Some(DescriptionRow {
            id: columns[0].to_string(),
            effective_time: columns[1].to_string(),
            active: parse_active(columns[2])?,
            module_id: columns[3].to_string(),
            concept_id: columns[4].to_string(),
            language_code: columns[5].to_string(),
            type_id: columns[6].to_string(),
            term: columns[7].to_string(),
            case_significance_id: columns[8].to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRow {
    pub id: String,
    pub effective_time: String,
    pub active: bool,
    pub module_id: String,
    pub source_id: String,
    pub destination_id: String,
    pub relationship_group: i32,
    pub type_id: String,
    pub characteristic_type_id: String,
    pub modifier_id: String,
}

impl Rf2Record for RelationshipRow {
    const MIN_COLUMNS: usize = 10;

    fn from_columns(columns: &[&str]) -> Option<Self> {
        Some(RelationshipRow {
            id: columns[0].to_string(),
            effective_time: columns[1].to_string(),
            active: parse_active(columns[2])?,
            module_id: columns[3].to_string(),
            source_id: columns[4].to_string(),
            destination_id: columns[5].to_string(),
            // group defaults to 0 when unparseable
            relationship_group: columns[6].trim().parse().unwrap_or(0),
            type_id: columns[7].to_string(),
            characteristic_type_id: columns[8].to_string(),
            modifier_id: columns[9].to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRefsetRow {
    pub id: String,
    pub effective_time: String,
    pub active: bool,
    pub module_id: String,
    pub refset_id: String,
    pub referenced_component_id: String,
    pub acceptability_id: String,
}

impl Rf2Record for LanguageRefsetRow {
    const MIN_COLUMNS: usize = 7;

    fn from_columns(columns: &[&str]) -> Option<Self> {
        Some(LanguageRefsetRow {
            id: columns[0].to_string(),
            effective_time: columns[1].to_string(),
            active: parse_active(columns[2])?,
            module_id: columns[3].to_string(),
            refset_id: columns[4].to_string(),
            referenced_component_id: columns[5].to_string(),
            acceptability_id: columns[6].to_string(),
        })
    }
}
