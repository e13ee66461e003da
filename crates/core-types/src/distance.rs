//! Directed distance table in the solver's CSV upload format.

use std::io;

use serde::Serialize;

use crate::error::TableError;

/// A pair of locations whose two directed distances differ.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Asymmetry {
    pub from: usize,
    pub to: usize,
    pub forward: f64,
    pub backward: f64,
}

impl Asymmetry {
    pub fn delta(&self) -> f64 {
        (self.forward - self.backward).abs()
    }
}

/// Square matrix of directed edge distances, indexed `[from][to]`.
///
/// Values are kept exactly as loaded. `M[i][j]` and `M[j][i]` may differ and
/// callers must not assume symmetry.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    names: Vec<String>,
    cells: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub fn new(names: Vec<String>, cells: Vec<Vec<f64>>) -> Result<Self, TableError> {
        if names.is_empty() {
            return Err(TableError::Empty);
        }
        if cells.len() != names.len() {
            return Err(TableError::RaggedRow {
                row: cells.len(),
                expected: names.len(),
                actual: 0,
            });
        }
        for (row, values) in cells.iter().enumerate() {
            if values.len() != names.len() {
                return Err(TableError::RaggedRow {
                    row,
                    expected: names.len(),
                    actual: values.len(),
                });
            }
            for (column, value) in values.iter().enumerate() {
                if !value.is_finite() || *value < 0.0 {
                    return Err(TableError::InvalidCell {
                        row,
                        column,
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(Self { names, cells })
    }

    /// Parses the upload format: the header row and the first column carry the
    /// location names, every other cell is a directed distance in meters.
    pub fn from_csv<R: io::Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = reader.records();

        let header = records.next().ok_or(TableError::Empty)??;
        let names: Vec<String> = header.iter().skip(1).map(str::to_string).collect();

        let mut cells = Vec::with_capacity(names.len());
        for (row, record) in records.enumerate() {
            let record = record?;
            if record.len() != names.len() + 1 {
                return Err(TableError::RaggedRow {
                    row,
                    expected: names.len(),
                    actual: record.len().saturating_sub(1),
                });
            }
            let label = record.get(0).unwrap_or_default();
            match names.get(row) {
                Some(expected) if expected == label => {}
                Some(expected) => {
                    return Err(TableError::LabelMismatch {
                        row,
                        expected: expected.clone(),
                        found: label.to_string(),
                    })
                }
                None => {
                    return Err(TableError::RaggedRow {
                        row,
                        expected: names.len(),
                        actual: record.len().saturating_sub(1),
                    })
                }
            }
            let mut values = Vec::with_capacity(names.len());
            for (column, raw) in record.iter().skip(1).enumerate() {
                let value = raw.parse::<f64>().map_err(|_| TableError::InvalidCell {
                    row,
                    column,
                    value: raw.to_string(),
                })?;
                values.push(value);
            }
            cells.push(values);
        }

        Self::new(names, cells)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.cells
    }

    /// Directed distance `from → to`.
    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        self.cells.get(from).and_then(|row| row.get(to)).copied()
    }

    /// Renders the table back into the CSV body uploaded to the GA endpoint.
    pub fn to_csv_string(&self) -> Result<String, TableError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let header = std::iter::once("").chain(self.names.iter().map(String::as_str));
        writer.write_record(header)?;
        for (name, row) in self.names.iter().zip(&self.cells) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(name.clone());
            record.extend(row.iter().map(|value| value.to_string()));
            writer.write_record(&record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| TableError::Io(err.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|err| TableError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }

    /// JSON array-of-rows form used by the search endpoints' query string.
    pub fn to_json(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string(&self.cells)?)
    }

    /// Every unordered pair whose two directions disagree.
    pub fn asymmetries(&self) -> Vec<Asymmetry> {
        let mut out = Vec::new();
        for from in 0..self.len() {
            for to in (from + 1)..self.len() {
                let forward = self.cells[from][to];
                let backward = self.cells[to][from];
                if forward != backward {
                    out.push(Asymmetry {
                        from,
                        to,
                        forward,
                        backward,
                    });
                }
            }
        }
        out
    }

    pub fn exhaustive_search_space(&self) -> u64 {
        exhaustive_search_space(self.len())
    }
}

/// Number of orderings an exhaustive search visits for `locations` stops
/// (`locations!`, saturating at `u64::MAX`).
pub fn exhaustive_search_space(locations: usize) -> u64 {
    (2..=locations as u64).fold(1u64, |acc, n| acc.saturating_mul(n))
}
