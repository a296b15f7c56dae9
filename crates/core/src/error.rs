use std::fmt;

/// Ranking failures that the pipeline turns into an empty recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankingError {
    /// None of the declared fundamentals are present in the matrix.
    NoFeatureColumns,
    /// The row id does not point into the matrix it was used with.
    UnknownRow { row: usize, rows: usize },
}

impl fmt::Display for RankingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingError::NoFeatureColumns => {
                write!(f, "ranking error: feature matrix has no fundamental columns")
            }
            RankingError::UnknownRow { row, rows } => {
                write!(f, "ranking error: row {row} out of range for matrix of {rows} rows")
            }
        }
    }
}

impl std::error::Error for RankingError {}
