use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::autofill::{resolve_default, MetadataRecord};
use crate::criteria::{classify_all, CriterionType};
use crate::error::ValidationError;

pub const MIN_ALTERNATIVES: usize = 2;

/// Raw alternative × criterion measurements. Rows follow the alternative
/// order, columns follow the criterion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionMatrix {
    rows: Vec<Vec<f64>>,
}

impl DecisionMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            rows: vec![vec![0.0; columns]; rows],
        }
    }

    /// Reshape `raw` to `rows × columns`: missing cells become 0, extra
    /// cells are dropped, non-finite values become 0.
    pub fn conformed(raw: Vec<Vec<f64>>, rows: usize, columns: usize) -> Self {
        let mut out = Self::zeros(rows, columns);
        for (target, source) in out.rows.iter_mut().zip(raw) {
            for (cell, value) in target.iter_mut().zip(source) {
                *cell = finite_or_zero(value);
            }
        }
        out
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn set(&mut self, row: usize, column: usize, value: f64) -> Result<(), ValidationError> {
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or(ValidationError::CellOutOfRange { row, column })?;
        *cell = finite_or_zero(value);
        Ok(())
    }

    /// Store a manually typed value; anything that does not parse becomes 0.
    pub fn set_input(
        &mut self,
        row: usize,
        column: usize,
        input: &str,
    ) -> Result<f64, ValidationError> {
        let value = coerce_cell(input);
        self.set(row, column, value)?;
        Ok(value)
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows
            .iter()
            .map(move |r| r.get(column).copied().unwrap_or(0.0))
    }

    pub fn check_shape(&self, alternatives: usize, criteria: usize) -> Result<(), ValidationError> {
        if self.rows.len() != alternatives {
            return Err(ValidationError::RowCountMismatch {
                rows: self.rows.len(),
                alternatives,
            });
        }
        for (row, cells) in self.rows.iter().enumerate() {
            if cells.len() != criteria {
                return Err(ValidationError::RowWidthMismatch {
                    row,
                    cells: cells.len(),
                    criteria,
                });
            }
        }
        Ok(())
    }
}

/// Parse a manually entered cell. Unparseable or non-finite input is 0.
pub fn coerce_cell(input: &str) -> f64 {
    input.trim().parse::<f64>().map_or(0.0, finite_or_zero)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Output of [`build`]: the prefilled matrix plus the classifier's default
/// type for every column.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltMatrix {
    pub matrix: DecisionMatrix,
    pub default_types: Vec<CriterionType>,
}

pub fn check_build_preconditions(
    alternatives: usize,
    criteria: usize,
) -> Result<(), ValidationError> {
    if alternatives < MIN_ALTERNATIVES {
        return Err(ValidationError::TooFewAlternatives {
            required: MIN_ALTERNATIVES,
            actual: alternatives,
        });
    }
    if criteria == 0 {
        return Err(ValidationError::NoCriteria);
    }
    Ok(())
}

pub fn build(
    alternatives: &[String],
    criteria: &[String],
    metadata: &HashMap<String, MetadataRecord>,
) -> Result<BuiltMatrix, ValidationError> {
    check_build_preconditions(alternatives.len(), criteria.len())?;

    let rows = alternatives
        .iter()
        .map(|alternative| {
            let record = metadata.get(alternative);
            criteria
                .iter()
                .map(|criterion| resolve_default(criterion, record))
                .collect()
        })
        .collect();

    Ok(BuiltMatrix {
        matrix: DecisionMatrix::new(rows),
        default_types: classify_all(criteria),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn build_prefills_from_metadata_and_classifies_columns() {
        let alternatives = names(&["Hades", "Unknown Game"]);
        let criteria = names(&["Price", "Rating", "Fun Factor"]);
        let mut metadata = HashMap::new();
        metadata.insert(
            "Hades".to_string(),
            MetadataRecord {
                price_minor: Some(2_499.0),
                rating_score: Some(4.8),
                ..MetadataRecord::default()
            },
        );

        let built = build(&alternatives, &criteria, &metadata).expect("build matrix");
        assert_eq!(built.matrix.rows()[0], vec![24.99, 4.8, 0.0]);
        assert_eq!(built.matrix.rows()[1], vec![0.0, 0.0, 0.0]);
        assert_eq!(
            built.default_types,
            vec![
                CriterionType::Cost,
                CriterionType::Benefit,
                CriterionType::Benefit
            ]
        );
    }

    #[test]
    fn build_rejects_too_few_alternatives_and_no_criteria() {
        let metadata = HashMap::new();
        let err = build(&names(&["Solo"]), &names(&["Price"]), &metadata).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooFewAlternatives {
                required: 2,
                actual: 1
            }
        );
        let err = build(&names(&["A", "B"]), &[], &metadata).unwrap_err();
        assert_eq!(err, ValidationError::NoCriteria);
    }

    #[test]
    fn manual_input_coerces_garbage_to_zero() {
        let mut m = DecisionMatrix::zeros(2, 2);
        assert_eq!(m.set_input(0, 1, " 12.5 ").expect("in range"), 12.5);
        assert_eq!(m.set_input(1, 0, "twelve").expect("in range"), 0.0);
        assert_eq!(m.set_input(1, 1, "NaN").expect("in range"), 0.0);
        assert_eq!(m.set_input(1, 1, "").expect("in range"), 0.0);
        assert_eq!(m.get(0, 1), Some(12.5));
        assert!(m.set_input(2, 0, "1").is_err());
    }

    #[test]
    fn conformed_pads_and_truncates() {
        let m = DecisionMatrix::conformed(vec![vec![1.0, 2.0, 3.0], vec![4.0]], 3, 2);
        assert_eq!(m.rows(), &[vec![1.0, 2.0], vec![4.0, 0.0], vec![0.0, 0.0]]);
        assert!(m.check_shape(3, 2).is_ok());
        assert!(m.check_shape(2, 2).is_err());
    }
}
