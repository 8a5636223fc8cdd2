use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of preference for one criterion column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionType {
    /// Higher raw value is better.
    #[default]
    Benefit,
    /// Lower raw value is better.
    Cost,
}

impl CriterionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Benefit => "benefit",
            Self::Cost => "cost",
        }
    }
}

impl fmt::Display for CriterionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriterionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "benefit" => Ok(Self::Benefit),
            "cost" => Ok(Self::Cost),
            other => Err(format!("unknown criterion type '{other}'")),
        }
    }
}

// Hardware requirements count as cost: a higher requirement is worse for the buyer.
const COST_KEYWORDS: [&str; 7] = ["harga", "price", "cost", "biaya", "ram", "cpu", "gpu"];

/// Default type for a criterion, guessed from its display name.
///
/// Unmatched names are benefit. The guess is only a starting point; callers
/// keep whatever type the user confirms.
pub fn classify(name: &str) -> CriterionType {
    let lowered = name.to_lowercase();
    if COST_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        CriterionType::Cost
    } else {
        CriterionType::Benefit
    }
}

pub fn classify_all<S: AsRef<str>>(criteria: &[S]) -> Vec<CriterionType> {
    criteria.iter().map(|c| classify(c.as_ref())).collect()
}
