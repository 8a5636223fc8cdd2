use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::autofill::MetadataRecord;
use crate::criteria::{classify_all, CriterionType};
use crate::engine::{rank, SawOutcome, ScoreRequest};
use crate::error::ValidationError;
use crate::import::{validate_import, ImportedMatrix};
use crate::matrix::{build, check_build_preconditions, DecisionMatrix};

/// State of one ranking session.
///
/// Criteria and weights are fixed when the session starts. Alternatives,
/// metadata, the matrix, and column types change only through the methods
/// below; any change to the alternative set drops the matrix so it has to be
/// generated again.
#[derive(Debug, Clone)]
pub struct RankingSession {
    criteria: Vec<String>,
    weights: Vec<f64>,
    alternatives: Vec<String>,
    metadata: HashMap<String, MetadataRecord>,
    matrix: Option<DecisionMatrix>,
    types: Vec<CriterionType>,
}

impl RankingSession {
    pub fn new(criteria: Vec<String>, weights: Vec<f64>) -> Result<Self, ValidationError> {
        if criteria.is_empty() {
            return Err(ValidationError::NoCriteria);
        }
        if weights.len() != criteria.len() {
            return Err(ValidationError::WeightsMismatch {
                weights: weights.len(),
                criteria: criteria.len(),
            });
        }
        let types = vec![CriterionType::Benefit; criteria.len()];
        Ok(Self {
            criteria,
            weights,
            alternatives: Vec::new(),
            metadata: HashMap::new(),
            matrix: None,
            types,
        })
    }

    pub fn criteria(&self) -> &[String] {
        &self.criteria
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn matrix(&self) -> Option<&DecisionMatrix> {
        self.matrix.as_ref()
    }

    pub fn types(&self) -> &[CriterionType] {
        &self.types
    }

    pub fn metadata_for(&self, alternative: &str) -> Option<&MetadataRecord> {
        self.metadata.get(alternative)
    }

    pub fn add_alternative(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = self.admit_name(name)?;
        self.alternatives.push(name);
        self.matrix = None;
        Ok(())
    }

    /// Add an alternative together with the catalog record it came from.
    pub fn add_catalog_record(
        &mut self,
        record: MetadataRecord,
    ) -> Result<String, ValidationError> {
        let name = self.admit_name(record.name.as_deref().unwrap_or_default())?;
        self.metadata.insert(name.clone(), record);
        self.alternatives.push(name.clone());
        self.matrix = None;
        Ok(name)
    }

    /// Replace every alternative and all metadata with a fetched catalog.
    /// Records without a name are skipped; repeated names keep the first record.
    pub fn replace_with_catalog(&mut self, records: Vec<MetadataRecord>) -> usize {
        let mut seen = HashSet::new();
        let mut alternatives = Vec::new();
        let mut metadata = HashMap::new();
        for record in records {
            let Some(name) = record
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
            else {
                continue;
            };
            if !seen.insert(name.clone()) {
                continue;
            }
            metadata.insert(name.clone(), record);
            alternatives.push(name);
        }
        self.alternatives = alternatives;
        self.metadata = metadata;
        self.matrix = None;
        self.alternatives.len()
    }

    pub fn remove_alternative(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        let before = self.alternatives.len();
        self.alternatives.retain(|a| a != name);
        if self.alternatives.len() == before {
            return Err(ValidationError::UnknownAlternative(name.to_string()));
        }
        self.matrix = None;
        Ok(())
    }

    /// Build the matrix from metadata defaults and reset column types to the
    /// classifier's guesses. Earlier manual edits are discarded.
    pub fn generate_matrix(&mut self) -> Result<&DecisionMatrix, ValidationError> {
        let built = build(&self.alternatives, &self.criteria, &self.metadata)?;
        debug!(
            alternatives = self.alternatives.len(),
            criteria = self.criteria.len(),
            "decision matrix generated"
        );
        self.types = built.default_types;
        Ok(self.matrix.insert(built.matrix))
    }

    pub fn set_cell(
        &mut self,
        row: usize,
        column: usize,
        input: &str,
    ) -> Result<f64, ValidationError> {
        self.matrix
            .as_mut()
            .ok_or(ValidationError::MatrixNotBuilt)?
            .set_input(row, column, input)
    }

    pub fn set_cell_value(
        &mut self,
        row: usize,
        column: usize,
        value: f64,
    ) -> Result<(), ValidationError> {
        self.matrix
            .as_mut()
            .ok_or(ValidationError::MatrixNotBuilt)?
            .set(row, column, value)
    }

    pub fn set_type(&mut self, column: usize, kind: CriterionType) -> Result<(), ValidationError> {
        let slot = self
            .types
            .get_mut(column)
            .ok_or(ValidationError::CriterionOutOfRange(column))?;
        *slot = kind;
        Ok(())
    }

    pub fn set_types(&mut self, types: Vec<CriterionType>) -> Result<(), ValidationError> {
        if types.len() != self.criteria.len() {
            return Err(ValidationError::TypesMismatch {
                types: types.len(),
                criteria: self.criteria.len(),
            });
        }
        self.types = types;
        Ok(())
    }

    /// Accept a bulk import. Every check runs before anything is replaced, so a
    /// rejected import leaves the session exactly as it was.
    pub fn apply_import(&mut self, imported: ImportedMatrix) -> Result<usize, ValidationError> {
        if let Err(err) = validate_import(&imported.criteria, &self.criteria) {
            warn!(error = %err, "import rejected");
            return Err(err);
        }
        check_build_preconditions(imported.alternatives.len(), self.criteria.len())?;

        let mut seen = HashSet::new();
        let mut alternatives = Vec::with_capacity(imported.alternatives.len());
        for raw in &imported.alternatives {
            let name = raw.trim();
            if name.is_empty() {
                return Err(ValidationError::EmptyAlternative);
            }
            if !seen.insert(name) {
                return Err(ValidationError::DuplicateAlternative(name.to_string()));
            }
            alternatives.push(name.to_string());
        }

        let matrix = DecisionMatrix::conformed(
            imported.decision_matrix,
            alternatives.len(),
            self.criteria.len(),
        );
        self.alternatives = alternatives;
        self.metadata.clear();
        self.matrix = Some(matrix);
        self.types = classify_all(&self.criteria);
        debug!(alternatives = self.alternatives.len(), "import applied");
        Ok(self.alternatives.len())
    }

    pub fn score_request(&self) -> Result<ScoreRequest, ValidationError> {
        let matrix = self.matrix.as_ref().ok_or(ValidationError::MatrixNotBuilt)?;
        let request = ScoreRequest {
            alternatives: self.alternatives.clone(),
            criteria: self.criteria.clone(),
            weights: self.weights.clone(),
            decision_matrix: matrix.clone(),
            criteria_types: self.types.clone(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn rank(&self) -> Result<SawOutcome, ValidationError> {
        rank(&self.score_request()?)
    }

    fn admit_name(&self, raw: &str) -> Result<String, ValidationError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyAlternative);
        }
        if self.alternatives.iter().any(|a| a == name) {
            return Err(ValidationError::DuplicateAlternative(name.to_string()));
        }
        Ok(name.to_string())
    }
}
