use std::fmt::Write;

use crate::engine::SawOutcome;

/// `Price: 50.00%` per criterion, one per line.
pub fn render_weights(criteria: &[String], weights: &[f64]) -> String {
    criteria
        .iter()
        .zip(weights)
        .map(|(criterion, weight)| format!("{criterion}: {:.2}%", weight * 100.0))
        .collect::<Vec<_>>()
        .join("\n")
}

fn podium(rank: usize) -> &'static str {
    match rank {
        1 => " [gold]",
        2 => " [silver]",
        3 => " [bronze]",
        _ => "",
    }
}

pub fn render_ranking(outcome: &SawOutcome) -> String {
    let width = outcome
        .ranking
        .iter()
        .map(|r| r.alternative.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::from("Final Ranking\n");
    for item in &outcome.ranking {
        let _ = writeln!(
            out,
            "{:>3}. {:<width$}  {:.4}{}",
            item.rank,
            item.alternative,
            item.score,
            podium(item.rank),
        );
    }
    out
}

pub fn render_normalized_matrix(
    alternatives: &[String],
    criteria: &[String],
    normalized: &[Vec<f64>],
) -> String {
    render_matrix("Normalized Decision Matrix", alternatives, criteria, normalized)
}

/// Fixed-width table with one row per alternative and 4-decimal cells.
pub fn render_matrix(
    title: &str,
    alternatives: &[String],
    criteria: &[String],
    rows: &[Vec<f64>],
) -> String {
    let first = alternatives
        .iter()
        .map(|a| a.chars().count())
        .max()
        .unwrap_or(0)
        .max("Alternative".len());
    let widths = criteria
        .iter()
        .map(|c| c.chars().count().max(6))
        .collect::<Vec<_>>();

    let mut out = format!("{title}\n");
    let _ = write!(out, "{:<first$}", "Alternative");
    for (criterion, w) in criteria.iter().zip(&widths) {
        let _ = write!(out, " | {criterion:>w$}");
    }
    out.push('\n');
    for (alternative, row) in alternatives.iter().zip(rows) {
        let _ = write!(out, "{alternative:<first$}");
        for (value, w) in row.iter().zip(&widths) {
            let _ = write!(out, " | {value:>w$.4}");
        }
        out.push('\n');
    }
    out
}
