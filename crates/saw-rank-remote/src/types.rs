use saw_rank_core::{ImportedMatrix, MetadataRecord, RankedAlternative, SawOutcome};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Raw spreadsheet handed to the external import parser.
#[derive(Debug, Clone)]
pub struct ImportUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Every remote endpoint answers with a `success` flag; a missing or
/// non-boolean flag is an unexpected format, never an implicit success.
fn interpret<T>(
    success: Option<bool>,
    error: Option<String>,
    payload: Option<T>,
    what: &str,
) -> Result<T, ProviderError> {
    match success {
        Some(true) => payload.ok_or_else(|| {
            ProviderError::InvalidResponse(format!("{what} success response without payload"))
        }),
        Some(false) => Err(ProviderError::Remote(
            error.unwrap_or_else(|| "unknown error".to_string()),
        )),
        None => Err(ProviderError::InvalidResponse(
            "unexpected response format".to_string(),
        )),
    }
}

/// `{success, ranking, normalized_matrix}` or `{success: false, error}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<Vec<RankedAlternative>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_matrix: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreEnvelope {
    pub fn ok(outcome: SawOutcome) -> Self {
        Self {
            success: Some(true),
            ranking: Some(outcome.ranking),
            normalized_matrix: Some(outcome.normalized_matrix),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn into_outcome(self) -> Result<SawOutcome, ProviderError> {
        let payload = match (self.ranking, self.normalized_matrix) {
            (Some(ranking), Some(normalized_matrix)) => Some(SawOutcome {
                ranking,
                normalized_matrix,
            }),
            _ => None,
        };
        interpret(self.success, self.error, payload, "scoring")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogListEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub games: Option<Vec<MetadataRecord>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CatalogListEnvelope {
    pub fn into_records(self) -> Result<Vec<MetadataRecord>, ProviderError> {
        interpret(self.success, self.error, self.games, "catalog list")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogGameEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub game: Option<MetadataRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CatalogGameEnvelope {
    pub fn into_record(self) -> Result<MetadataRecord, ProviderError> {
        interpret(self.success, self.error, self.game, "catalog lookup")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub criteria_from_file: Option<Vec<String>>,
    #[serde(default)]
    pub alternatives: Option<Vec<String>>,
    #[serde(default)]
    pub decision_matrix: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ImportEnvelope {
    pub fn into_import(self) -> Result<ImportedMatrix, ProviderError> {
        let payload = match (self.criteria_from_file, self.alternatives) {
            (Some(criteria), Some(alternatives)) => Some(ImportedMatrix {
                criteria,
                alternatives,
                decision_matrix: self.decision_matrix.unwrap_or_default(),
            }),
            _ => None,
        };
        interpret(self.success, self.error, payload, "import")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_envelope_success_and_failure_parse() {
        let ok = r#"{"success":true,"ranking":[{"alternative":"A","score":0.75,"rank":1}],"normalized_matrix":[[0.5,1.0]]}"#;
        let parsed: ScoreEnvelope = serde_json::from_str(ok).expect("parse success");
        let outcome = parsed.into_outcome().expect("success outcome");
        assert_eq!(outcome.ranking[0].alternative, "A");
        assert_eq!(outcome.normalized_matrix, vec![vec![0.5, 1.0]]);

        let failed = r#"{"success":false,"error":"weights do not sum to one"}"#;
        let parsed: ScoreEnvelope = serde_json::from_str(failed).expect("parse failure");
        match parsed.into_outcome() {
            Err(ProviderError::Remote(msg)) => assert_eq!(msg, "weights do not sum to one"),
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn missing_success_flag_is_unexpected_format() {
        let parsed: ScoreEnvelope =
            serde_json::from_str(r#"{"ranking":[],"normalized_matrix":[]}"#).expect("parse");
        assert!(matches!(
            parsed.into_outcome(),
            Err(ProviderError::InvalidResponse(msg)) if msg == "unexpected response format"
        ));

        let parsed: ScoreEnvelope = serde_json::from_str(r#"{"success":true}"#).expect("parse");
        assert!(matches!(
            parsed.into_outcome(),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn import_envelope_reads_file_criteria() {
        let raw = r#"{"success":true,"criteria_from_file":["Price","Rating"],"alternatives":["A","B"],"decision_matrix":[[100,8],[50,4]]}"#;
        let parsed: ImportEnvelope = serde_json::from_str(raw).expect("parse import");
        let imported = parsed.into_import().expect("import payload");
        assert_eq!(imported.criteria, vec!["Price", "Rating"]);
        assert_eq!(imported.decision_matrix, vec![vec![100.0, 8.0], vec![50.0, 4.0]]);
    }

    #[test]
    fn catalog_failure_carries_remote_message() {
        let parsed: CatalogGameEnvelope =
            serde_json::from_str(r#"{"success":false,"error":"Game not found"}"#).expect("parse");
        assert!(matches!(
            parsed.into_record(),
            Err(ProviderError::Remote(msg)) if msg == "Game not found"
        ));
    }
}
