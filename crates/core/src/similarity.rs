//! Cosine-similarity ranking over standardized fundamentals.

use crate::domain::{Fundamental, TickerRecord};
use crate::error::RankingError;
use crate::features::matrix::median;
use crate::features::{FeatureMatrix, FeatureProvider, RowId};
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTicker {
    pub ticker: String,
    pub score: f64,
}

/// Ranked tickers, most similar first. Never contains the query ticker.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SimilarityResult {
    entries: Vec<ScoredTicker>,
}

impl SimilarityResult {
    pub fn entries(&self) -> &[ScoredTicker] {
        &self.entries
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.ticker.as_str()).collect()
    }

    pub fn into_tickers(self) -> Vec<String> {
        self.entries.into_iter().map(|e| e.ticker).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone)]
pub struct SimilarityRanker {
    provider: FeatureProvider,
}

impl SimilarityRanker {
    pub fn new(provider: FeatureProvider) -> Self {
        Self { provider }
    }

    /// Ranks `matrix` against `query`, fetching the query's fundamentals only if the
    /// matrix has no row for it.
    pub async fn rank(
        &self,
        query: &str,
        matrix: FeatureMatrix,
        top_n: usize,
    ) -> Result<SimilarityResult, RankingError> {
        if let Some(row) = matrix.locate(query) {
            return rank_row(&matrix, row, top_n);
        }

        let record = self.provider.fetch_record(query).await;
        rank_with_record(&record, matrix, top_n)
    }
}

/// Insert-or-locate `record`, then rank against its row.
pub fn rank_with_record(
    record: &TickerRecord,
    matrix: FeatureMatrix,
    top_n: usize,
) -> Result<SimilarityResult, RankingError> {
    let (matrix, row) = matrix.insert_or_locate(record);
    rank_row(&matrix, row, top_n)
}

/// Ranks every other row of `matrix` by cosine similarity to `query`.
///
/// Rows with a non-finite value are dropped, except the query row, whose non-finite
/// values are replaced by the finite median of the other rows. Surviving rows are
/// z-scored per column, and ties keep matrix order.
pub fn rank_row(
    matrix: &FeatureMatrix,
    query: RowId,
    top_n: usize,
) -> Result<SimilarityResult, RankingError> {
    let query_ticker = matrix.ticker(query).ok_or(RankingError::UnknownRow {
        row: query.index(),
        rows: matrix.len(),
    })?;

    let columns: Vec<usize> = Fundamental::ALL
        .iter()
        .filter_map(|c| matrix.column_index(*c))
        .collect();
    if columns.is_empty() {
        return Err(RankingError::NoFeatureColumns);
    }

    if top_n == 0 {
        return Ok(SimilarityResult::default());
    }

    let query_vector = anchor_query_row(matrix, query, &columns);

    let mut ids = Vec::with_capacity(matrix.len());
    let mut vectors = Vec::with_capacity(matrix.len());
    let mut query_pos = 0;
    let mut dropped = 0usize;
    for (id, _, row) in matrix.rows() {
        if id == query {
            query_pos = ids.len();
            ids.push(id);
            vectors.push(query_vector.clone());
            continue;
        }

        let v: Vec<f64> = columns.iter().map(|c| row[*c]).collect();
        if v.iter().all(|x| x.is_finite()) {
            ids.push(id);
            vectors.push(v);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, kept = ids.len(), "dropped rows with non-finite fundamentals");
    }

    let scaled = standardize(&vectors);
    let scores: Vec<f64> = scaled
        .iter()
        .map(|v| cosine_similarity(&scaled[query_pos], v))
        .collect();

    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(top_n);
    for pos in order {
        if ids[pos] == query {
            continue;
        }
        let Some(ticker) = matrix.ticker(ids[pos]) else {
            continue;
        };
        if ticker == query_ticker || !seen.insert(ticker) {
            continue;
        }

        entries.push(ScoredTicker {
            ticker: ticker.to_string(),
            score: scores[pos],
        });
        if entries.len() == top_n {
            break;
        }
    }

    Ok(SimilarityResult { entries })
}

/// Query row restricted to `columns`, with non-finite cells replaced so the row always survives.
fn anchor_query_row(matrix: &FeatureMatrix, query: RowId, columns: &[usize]) -> Vec<f64> {
    let Some(row) = matrix.row(query) else {
        return vec![0.0; columns.len()];
    };

    columns
        .iter()
        .map(|&c| {
            if row[c].is_finite() {
                return row[c];
            }

            let mut finite: Vec<f64> = matrix
                .rows()
                .filter(|(id, _, _)| *id != query)
                .map(|(_, _, r)| r[c])
                .filter(|v| v.is_finite())
                .collect();
            let fill = median(&mut finite).unwrap_or(0.0);

            tracing::warn!(
                ticker = matrix.ticker(query).unwrap_or_default(),
                column = matrix.columns()[c].label(),
                fill,
                "query fundamental is not finite; substituting peer median"
            );
            fill
        })
        .collect()
}

/// Column-wise z-scores with population variance. Constant columns map to zero.
pub fn standardize(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let Some(width) = rows.first().map(Vec::len) else {
        return Vec::new();
    };
    let n = rows.len() as f64;

    let mut out: Vec<Vec<f64>> = rows.iter().map(|_| vec![0.0; width]).collect();
    for col in 0..width {
        let first = rows[0][col];
        if rows.iter().all(|r| r[col] == first) {
            continue;
        }

        let mean = rows.iter().map(|r| r[col]).sum::<f64>() / n;
        let var = rows.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        let scale = if std.is_finite() && std > 0.0 { std } else { 1.0 };

        for (dst, src) in out.iter_mut().zip(rows) {
            dst[col] = (src[col] - mean) / scale;
        }
    }
    out
}

/// Cosine of the angle between `a` and `b`; zero when either has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }

    let sim = dot / (na * nb);
    if sim.is_finite() {
        sim.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
