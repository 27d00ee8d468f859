use crate::types::FeatureId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub id: FeatureId,
    pub name: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    pub rank: usize,
    #[serde(flatten)]
    pub item: RankedItem,
}

/// Highest value first, entities without a value last. Ties keep their
/// input order.
pub fn rank(items: Vec<RankedItem>) -> Vec<Ranked> {
    rank_by(items, |item| item.value)
        .into_iter()
        .map(|(rank, item)| Ranked { rank, item })
        .collect()
}

/// Orders any rows by the value `key` extracts, pairing each row with its
/// 1-based rank. Rows travel whole, so duplicate ids keep their own data.
pub fn rank_by<T, F>(mut rows: Vec<T>, key: F) -> Vec<(usize, T)>
where
    F: Fn(&T) -> Option<f64>,
{
    rows.sort_by(|a, b| match (key(a), key(b)) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| (i + 1, row))
        .collect()
}

/// One row of the analysis backend's simple correlation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    #[serde(rename = "COLUMN1")]
    pub column1: String,
    #[serde(rename = "COLUMN2")]
    pub column2: String,
    #[serde(rename = "CORRELATION")]
    pub correlation: f64,
    #[serde(rename = "Pvalue")]
    pub p_value: f64,
    #[serde(rename = "Score")]
    pub score: f64,
    #[serde(rename = "DatasetPair", default, skip_serializing_if = "Option::is_none")]
    pub dataset_pair: Option<String>,
}

pub fn top_correlations(mut results: Vec<CorrelationResult>, limit: usize) -> Vec<CorrelationResult> {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
    results
}
