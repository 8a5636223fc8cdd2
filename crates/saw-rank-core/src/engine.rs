use serde::{Deserialize, Serialize};

use crate::criteria::CriterionType;
use crate::error::ValidationError;
use crate::matrix::DecisionMatrix;

/// Everything the engine needs for one ranking. This is also the body of a
/// remote scoring request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub alternatives: Vec<String>,
    pub criteria: Vec<String>,
    pub weights: Vec<f64>,
    pub decision_matrix: DecisionMatrix,
    pub criteria_types: Vec<CriterionType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAlternative {
    pub alternative: String,
    pub score: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SawOutcome {
    pub ranking: Vec<RankedAlternative>,
    pub normalized_matrix: Vec<Vec<f64>>,
}

impl ScoreRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let criteria = self.criteria.len();
        if self.weights.len() != criteria {
            return Err(ValidationError::WeightsMismatch {
                weights: self.weights.len(),
                criteria,
            });
        }
        if self.criteria_types.len() != criteria {
            return Err(ValidationError::TypesMismatch {
                types: self.criteria_types.len(),
                criteria,
            });
        }
        self.decision_matrix
            .check_shape(self.alternatives.len(), criteria)
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnBounds {
    max: f64,
    min: f64,
}

fn column_bounds(matrix: &DecisionMatrix, column: usize) -> ColumnBounds {
    let (max, min) = matrix
        .column(column)
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(max, min), v| {
            (max.max(v), min.min(v))
        });
    ColumnBounds {
        max: if max.is_finite() { max } else { 0.0 },
        min: if min.is_finite() { min } else { 0.0 },
    }
}

fn normalize_cell(value: f64, kind: CriterionType, bounds: ColumnBounds) -> f64 {
    match kind {
        CriterionType::Benefit => {
            if bounds.max == 0.0 {
                0.0
            } else {
                value / bounds.max
            }
        }
        // Guarded on the cell, not on the column minimum.
        CriterionType::Cost => {
            if value == 0.0 {
                0.0
            } else {
                bounds.min / value
            }
        }
    }
}

/// Per-column SAW normalization. Benefit columns divide by the column max,
/// cost columns divide the column min by the cell.
pub fn normalize(matrix: &DecisionMatrix, types: &[CriterionType]) -> Vec<Vec<f64>> {
    let bounds = types
        .iter()
        .enumerate()
        .map(|(j, kind)| (*kind, column_bounds(matrix, j)))
        .collect::<Vec<_>>();

    matrix
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&bounds)
                .map(|(value, (kind, b))| normalize_cell(*value, *kind, *b))
                .collect()
        })
        .collect()
}

pub fn weighted_scores(normalized: &[Vec<f64>], weights: &[f64]) -> Vec<f64> {
    normalized
        .iter()
        .map(|row| row.iter().zip(weights).map(|(n, w)| n * w).sum())
        .collect()
}

/// Normalize, aggregate, and rank. Ties keep their input order.
pub fn rank(request: &ScoreRequest) -> Result<SawOutcome, ValidationError> {
    request.validate()?;

    let normalized_matrix = normalize(&request.decision_matrix, &request.criteria_types);
    let scores = weighted_scores(&normalized_matrix, &request.weights);

    let mut order = request
        .alternatives
        .iter()
        .zip(scores)
        .collect::<Vec<_>>();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    let ranking = order
        .into_iter()
        .enumerate()
        .map(|(pos, (alternative, score))| RankedAlternative {
            alternative: alternative.clone(),
            score,
            rank: pos + 1,
        })
        .collect();

    Ok(SawOutcome {
        ranking,
        normalized_matrix,
    })
}
