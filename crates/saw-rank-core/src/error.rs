use thiserror::Error;

/// Precondition failures. Every variant leaves the session as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least {required} alternatives are required, got {actual}")]
    TooFewAlternatives { required: usize, actual: usize },

    #[error("no criteria loaded; complete AHP weighting first")]
    NoCriteria,

    #[error("weights length {weights} does not match criteria length {criteria}")]
    WeightsMismatch { weights: usize, criteria: usize },

    #[error("criteria types length {types} does not match criteria length {criteria}")]
    TypesMismatch { types: usize, criteria: usize },

    #[error("decision matrix has {rows} rows but there are {alternatives} alternatives")]
    RowCountMismatch { rows: usize, alternatives: usize },

    #[error("decision matrix row {row} has {cells} cells but there are {criteria} criteria")]
    RowWidthMismatch {
        row: usize,
        cells: usize,
        criteria: usize,
    },

    #[error(
        "imported criteria do not match session criteria (session: {}; imported: {})",
        .session.join(", "),
        .imported.join(", ")
    )]
    ImportMismatch {
        session: Vec<String>,
        imported: Vec<String>,
    },

    #[error("alternative name cannot be empty")]
    EmptyAlternative,

    #[error("'{0}' is already in the list")]
    DuplicateAlternative(String),

    #[error("unknown alternative '{0}'")]
    UnknownAlternative(String),

    #[error("cell ({row}, {column}) is outside the decision matrix")]
    CellOutOfRange { row: usize, column: usize },

    #[error("criterion index {0} is outside the criteria list")]
    CriterionOutOfRange(usize),

    #[error("decision matrix has not been generated")]
    MatrixNotBuilt,
}
