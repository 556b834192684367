//! Precision / recall evaluation against hand-made relevance judgments.

use crate::engine::SearchEngine;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

/// A query and the ids (or labels) a perfect engine would return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub query: String,
    pub relevant: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryScore {
    pub query: String,
    pub returned: usize,
    pub relevant: usize,
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub queries: Vec<QueryScore>,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub mean_f_measure: f64,
}

/// Judgments stored as a JSON array of `{"query": ..., "relevant": [...]}`.
pub fn load_judgments<P: AsRef<Path>>(path: P) -> Result<Vec<Judgment>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Precision, recall and F-measure. Each is 0 when its denominator is.
pub fn score(relevant: &BTreeSet<String>, returned: &BTreeSet<String>) -> (f64, f64, f64) {
    let tp = relevant.intersection(returned).count() as f64;
    let precision = if returned.is_empty() { 0.0 } else { tp / returned.len() as f64 };
    let recall = if relevant.is_empty() { 0.0 } else { tp / relevant.len() as f64 };
    let f_measure = if precision + recall > 0.0 { 2.0 * precision * recall / (precision + recall) } else { 0.0 };
    (precision, recall, f_measure)
}

pub fn evaluate(engine: &SearchEngine, judgments: &[Judgment]) -> Result<EvaluationReport> {
    let mut queries = Vec::with_capacity(judgments.len());
    for judgment in judgments {
        let start = Instant::now();
        let result = engine.search(&judgment.query)?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let returned = result.ids.unwrap_or_default();
        let (precision, recall, f_measure) = score(&judgment.relevant, &returned);
        tracing::debug!(query = %judgment.query, precision, recall, f_measure, "evaluated");
        queries.push(QueryScore {
            query: judgment.query.clone(),
            returned: returned.len(),
            relevant: judgment.relevant.len(),
            precision,
            recall,
            f_measure,
            elapsed_ms,
        });
    }
    let mean = |f: fn(&QueryScore) -> f64| {
        if queries.is_empty() { 0.0 } else { queries.iter().map(f).sum::<f64>() / queries.len() as f64 }
    };
    let report = EvaluationReport {
        mean_precision: mean(|q| q.precision),
        mean_recall: mean(|q| q.recall),
        mean_f_measure: mean(|q| q.f_measure),
        queries,
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partial_overlap() {
        let (p, r, f) = score(&set(&["1", "2", "3", "4"]), &set(&["1", "2", "9"]));
        assert!((p - 2.0 / 3.0).abs() < 1e-9);
        assert!((r - 0.5).abs() < 1e-9);
        assert!((f - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn empty_sets_score_zero() {
        assert_eq!(score(&set(&[]), &set(&[])), (0.0, 0.0, 0.0));
        assert_eq!(score(&set(&["1"]), &set(&[])), (0.0, 0.0, 0.0));
    }
}
