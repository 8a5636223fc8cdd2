use std::fs;
use std::path::PathBuf;

use saw_rank_core::{rank, ScoreRequest};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    #[serde(flatten)]
    request: ScoreRequest,
    expected_order: Vec<String>,
    expected_scores: Vec<f64>,
}

#[test]
fn fixture_cases_pass() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let fixture = root
        .join("..")
        .join("..")
        .join("data")
        .join("fixtures")
        .join("saw_cases.json");

    let content = fs::read_to_string(&fixture)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", fixture.display()));
    let cases: Vec<Case> = serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", fixture.display()));

    for case in cases {
        let out = rank(&case.request).unwrap_or_else(|e| panic!("case {}: {e}", case.name));

        let order = out
            .ranking
            .iter()
            .map(|r| r.alternative.clone())
            .collect::<Vec<_>>();
        assert_eq!(order, case.expected_order, "case {} order", case.name);

        for (item, expected) in out.ranking.iter().zip(&case.expected_scores) {
            assert!(
                (item.score - expected).abs() < 1e-9,
                "case {}: {} scored {}, expected {}",
                case.name,
                item.alternative,
                item.score,
                expected
            );
        }

        let ranks = out.ranking.iter().map(|r| r.rank).collect::<Vec<_>>();
        let dense = (1..=case.request.alternatives.len()).collect::<Vec<_>>();
        assert_eq!(ranks, dense, "case {} ranks", case.name);
    }
}
