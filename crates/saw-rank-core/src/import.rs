use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A parsed bulk import: criteria header, alternative names, and values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedMatrix {
    #[serde(alias = "criteria_from_file")]
    pub criteria: Vec<String>,
    pub alternatives: Vec<String>,
    pub decision_matrix: Vec<Vec<f64>>,
}

/// Positional, exact comparison of the imported header against the session
/// criteria. Two lists holding the same names in a different order do not match.
pub fn validate_import(imported: &[String], session: &[String]) -> Result<(), ValidationError> {
    if imported == session {
        return Ok(());
    }
    Err(ValidationError::ImportMismatch {
        session: session.to_vec(),
        imported: imported.to_vec(),
    })
}
