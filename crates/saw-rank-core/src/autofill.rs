use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// External catalog attributes for one alternative. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_number")]
    pub release_year_score: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub cpu_mark_score: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub gpu_g3d_score: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub rating_score: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub min_ram_gb: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub total_reviews: Option<f64>,
    #[serde(default, alias = "steamcharts_avg_30d", deserialize_with = "loose_number")]
    pub avg_players_30d: Option<f64>,
    #[serde(default, alias = "steamcharts_current", deserialize_with = "loose_number")]
    pub current_players: Option<f64>,
    /// Monetary amount in minor units (cents).
    #[serde(default, alias = "price_numeric", deserialize_with = "loose_number")]
    pub price_minor: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Numbers and numeric strings are kept; anything else reads as absent.
fn loose_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = match Option::<LooseValue>::deserialize(deserializer)? {
        Some(LooseValue::Number(n)) => Some(n),
        Some(LooseValue::Text(text)) => text.trim().parse::<f64>().ok(),
        Some(LooseValue::Other(_)) | None => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    ReleaseYear,
    CpuMark,
    Price,
    GpuG3d,
    Rating,
    MinRam,
    TotalReviews,
    AvgPlayers,
    CurrentPlayers,
}

impl MetadataField {
    /// Catalog field name this maps to.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReleaseYear => "release_year_score",
            Self::CpuMark => "cpu_mark_score",
            Self::Price => "price_numeric",
            Self::GpuG3d => "gpu_g3d_score",
            Self::Rating => "rating_score",
            Self::MinRam => "min_ram_gb",
            Self::TotalReviews => "total_reviews",
            Self::AvgPlayers => "steamcharts_avg_30d",
            Self::CurrentPlayers => "steamcharts_current",
        }
    }
}

struct Rule {
    all_of: &'static [&'static [&'static str]],
    field: MetadataField,
}

// Order is a contract: a name like "CPU Price Index" must resolve to the CPU score.
const RULES: [Rule; 9] = [
    Rule {
        all_of: &[&["tahun", "year"]],
        field: MetadataField::ReleaseYear,
    },
    Rule {
        all_of: &[&["cpu"]],
        field: MetadataField::CpuMark,
    },
    Rule {
        all_of: &[&["price", "harga"]],
        field: MetadataField::Price,
    },
    Rule {
        all_of: &[&["gpu", "grafis"]],
        field: MetadataField::GpuG3d,
    },
    Rule {
        all_of: &[&["rating"]],
        field: MetadataField::Rating,
    },
    Rule {
        all_of: &[&["ram"]],
        field: MetadataField::MinRam,
    },
    Rule {
        all_of: &[&["recommendations", "reviews"]],
        field: MetadataField::TotalReviews,
    },
    Rule {
        all_of: &[&["avg"], &["player"]],
        field: MetadataField::AvgPlayers,
    },
    Rule {
        all_of: &[&["current"], &["player"]],
        field: MetadataField::CurrentPlayers,
    },
];

/// Which metadata field feeds a criterion; the first matching rule wins.
pub fn field_for(criterion: &str) -> Option<MetadataField> {
    let lowered = criterion.to_lowercase();
    RULES
        .iter()
        .find(|rule| {
            rule.all_of
                .iter()
                .all(|any_of| any_of.iter().any(|kw| lowered.contains(kw)))
        })
        .map(|rule| rule.field)
}

impl MetadataRecord {
    pub fn value(&self, field: MetadataField) -> f64 {
        let raw = match field {
            MetadataField::ReleaseYear => self.release_year_score,
            MetadataField::CpuMark => self.cpu_mark_score,
            MetadataField::Price => self.price_minor.map(|minor| minor / 100.0),
            MetadataField::GpuG3d => self.gpu_g3d_score,
            MetadataField::Rating => self.rating_score,
            MetadataField::MinRam => self.min_ram_gb,
            MetadataField::TotalReviews => self.total_reviews,
            MetadataField::AvgPlayers => self.avg_players_30d,
            MetadataField::CurrentPlayers => self.current_players,
        };
        raw.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

/// Default cell value for `criterion` taken from an alternative's metadata.
///
/// Missing record, missing field, or an unmatched criterion all give 0.
pub fn resolve_default(criterion: &str, record: Option<&MetadataRecord>) -> f64 {
    match (record, field_for(criterion)) {
        (Some(record), Some(field)) => record.value(field),
        _ => 0.0,
    }
}
