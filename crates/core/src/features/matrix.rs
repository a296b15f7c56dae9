use crate::domain::{coerce_numeric, normalize_ticker, Fundamental, TickerRecord};

// Fill value for a column with no observation in the whole batch.
const EMPTY_COLUMN_FILL: f64 = 0.0;

/// Stable handle to a matrix row, returned by [`FeatureMatrix::insert_or_locate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub(crate) usize);

impl RowId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Coerced observations: `None` marks a missing or non-numeric source value.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<Fundamental>,
    tickers: Vec<String>,
    observed: Vec<Vec<Option<f64>>>,
}

impl RawTable {
    pub fn coerce(records: &[TickerRecord], columns: &[Fundamental]) -> Self {
        let mut table = Self {
            columns: columns.to_vec(),
            tickers: Vec::with_capacity(records.len()),
            observed: Vec::with_capacity(records.len()),
        };
        for record in records {
            table.push(record);
        }
        table
    }

    pub fn with_row(&self, record: &TickerRecord) -> Self {
        let mut out = self.clone();
        out.push(record);
        out
    }

    fn push(&mut self, record: &TickerRecord) {
        let row = self
            .columns
            .iter()
            .map(|c| record.raw(*c).and_then(coerce_numeric))
            .collect();
        self.tickers.push(normalize_ticker(&record.ticker));
        self.observed.push(row);
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Per-column median over observed values, in column order.
    pub fn column_medians(&self) -> Vec<f64> {
        (0..self.columns.len())
            .map(|col| {
                let mut seen: Vec<f64> = self.observed.iter().filter_map(|r| r[col]).collect();
                median(&mut seen)
                    .filter(|m| !m.is_nan())
                    .unwrap_or(EMPTY_COLUMN_FILL)
            })
            .collect()
    }

    /// Fills every missing cell with its column median.
    pub fn impute(&self) -> FeatureMatrix {
        let medians = self.column_medians();
        let values = self
            .observed
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&medians)
                    .map(|(cell, m)| cell.unwrap_or(*m))
                    .collect()
            })
            .collect();

        FeatureMatrix {
            raw: self.clone(),
            values,
        }
    }
}

/// Fully populated numeric table, one row per fetched ticker.
///
/// Values may still be infinite; the ranker filters those. The coerced observations are
/// kept so that inserting a row re-imputes over the enlarged batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    raw: RawTable,
    values: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn from_records(records: &[TickerRecord]) -> Self {
        Self::from_records_with_columns(records, &Fundamental::ALL)
    }

    pub fn from_records_with_columns(records: &[TickerRecord], columns: &[Fundamental]) -> Self {
        RawTable::coerce(records, columns).impute()
    }

    pub fn columns(&self) -> &[Fundamental] {
        &self.raw.columns
    }

    pub fn column_index(&self, column: Fundamental) -> Option<usize> {
        self.raw.columns.iter().position(|c| *c == column)
    }

    pub fn has_column(&self, column: Fundamental) -> bool {
        self.column_index(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn ticker(&self, row: RowId) -> Option<&str> {
        self.raw.tickers.get(row.0).map(String::as_str)
    }

    pub fn row(&self, row: RowId) -> Option<&[f64]> {
        self.values.get(row.0).map(Vec::as_slice)
    }

    pub fn value(&self, row: RowId, column: Fundamental) -> Option<f64> {
        let col = self.column_index(column)?;
        self.row(row).map(|r| r[col])
    }

    pub fn rows(&self) -> impl Iterator<Item = (RowId, &str, &[f64])> + '_ {
        self.raw
            .tickers
            .iter()
            .zip(&self.values)
            .enumerate()
            .map(|(i, (t, v))| (RowId(i), t.as_str(), v.as_slice()))
    }

    /// First row carrying `ticker`.
    pub fn locate(&self, ticker: &str) -> Option<RowId> {
        let ticker = normalize_ticker(ticker);
        self.raw.tickers.iter().position(|t| *t == ticker).map(RowId)
    }

    /// Returns the row for `record.ticker`, appending it when absent.
    ///
    /// Appending re-imputes the whole batch, so the new row's gaps are filled with medians
    /// that include it.
    pub fn insert_or_locate(self, record: &TickerRecord) -> (FeatureMatrix, RowId) {
        if let Some(id) = self.locate(&record.ticker) {
            return (self, id);
        }

        let id = RowId(self.raw.len());
        (self.raw.with_row(record).impute(), id)
    }
}

pub(crate) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}
