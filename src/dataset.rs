use serde::Serialize;

use crate::client::{RawCell, RawSetResponse};
use crate::domain::SetId;
use crate::error::IltError;

/// Number of numeric values carried by one logical column in the raw per-row
/// payload: 1 for a plain value, 2 for value plus delta (uncertainty).
///
/// The pattern is read from the first data row only; it defines the schema
/// every other row and the header must agree with.
pub fn infer_group_widths(data: &[Vec<Vec<RawCell>>]) -> Result<Vec<usize>, IltError> {
    let Some(first) = data.first() else {
        return Ok(Vec::new());
    };
    let mut widths = Vec::with_capacity(first.len());
    for group in first {
        match group.len() {
            width @ (1 | 2) => widths.push(width),
            width => {
                return Err(IltError::Decode(format!(
                    "column group of {width} values in row 0; expected a value or value+delta pair"
                )));
            }
        }
    }
    Ok(widths)
}

/// Dense row-major numeric matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataMatrix {
    values: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl DataMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.values[row * self.cols + col])
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.values[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.cols.max(1)).take(self.rows)
    }
}

/// Flattens the nested payload into a matrix of shape
/// (rows, sum of group widths).
///
/// Every row must repeat the group-width pattern of row 0; a divergent row
/// fails with `ShapeMismatch` instead of being truncated or padded.
pub fn build_matrix(data: &[Vec<Vec<RawCell>>], widths: &[usize]) -> Result<DataMatrix, IltError> {
    let cols: usize = widths.iter().sum();
    let mut values = Vec::with_capacity(data.len() * cols);
    for (row_index, row) in data.iter().enumerate() {
        if row.len() != widths.len() {
            return Err(IltError::ShapeMismatch {
                row: row_index,
                expected: widths.len(),
                found: row.len(),
            });
        }
        for (group, expected) in row.iter().zip(widths) {
            if group.len() != *expected {
                return Err(IltError::ShapeMismatch {
                    row: row_index,
                    expected: *expected,
                    found: group.len(),
                });
            }
            for cell in group {
                values.push(cell.value()?);
            }
        }
    }
    Ok(DataMatrix {
        values,
        rows: data.len(),
        cols,
    })
}

/// Semantic labels for one matrix column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMeta {
    /// Display label, e.g. `Specific_density[Liquid]/kg/m3`.
    pub description: String,
    /// Normalized property token (spaces replaced by underscores).
    pub property: String,
    /// Physical unit, if the header cell carried one after its last comma.
    pub unit: Option<String>,
    /// Phase qualifier, if the header descriptor carried one.
    pub phase: Option<String>,
}

/// Derives per-column metadata from the header descriptors, expanding each
/// width-2 source column with a `Delta(prev)` entry so the output aligns
/// one-to-one with the matrix columns.
pub fn derive_columns(
    dhead: &[Vec<Option<String>>],
    widths: &[usize],
) -> Result<Vec<ColumnMeta>, IltError> {
    if dhead.len() != widths.len() {
        return Err(IltError::Decode(format!(
            "header describes {} columns but the data body has {}",
            dhead.len(),
            widths.len()
        )));
    }

    let mut columns = Vec::new();
    for (descriptor, width) in dhead.iter().zip(widths) {
        let text = descriptor
            .first()
            .and_then(Option::as_deref)
            .ok_or_else(|| IltError::Decode("header descriptor without display text".to_string()))?;
        let phase = descriptor
            .get(1)
            .and_then(|slot| slot.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let stripped = text.replace("<SUP>", "").replace("</SUP>", "");
        // Everything after the LAST comma is the unit; internal commas in the
        // property name are dropped, matching the website rendering.
        let (property_raw, unit) = match stripped.rfind(',') {
            Some(index) => (
                stripped[..index].replace(',', ""),
                Some(stripped[index + 1..].trim().to_string()),
            ),
            None => (stripped, None),
        };
        let property = property_raw.replace(' ', "_");

        let mut description = property.clone();
        if let Some(phase) = &phase {
            description = format!("{description}[{phase}]");
        }
        if let Some(unit) = &unit {
            description = format!("{description}/{unit}");
        }

        columns.push(ColumnMeta {
            description,
            property: property.clone(),
            unit: unit.clone(),
            phase: phase.clone(),
        });
        if *width == 2 {
            columns.push(ColumnMeta {
                description: "Delta(prev)".to_string(),
                property: format!("Delta[{property}]"),
                unit,
                phase,
            });
        }
    }
    Ok(columns)
}

/// The full tabular measurement data plus metadata for one reference.
///
/// Built once from one retrieved payload, immutable afterwards. The column
/// metadata always has exactly one entry per matrix column.
#[derive(Debug, Clone)]
pub struct Dataset {
    setid: SetId,
    matrix: DataMatrix,
    columns: Vec<ColumnMeta>,
    title: String,
    ref_title: Option<String>,
    ref_full: Option<String>,
    components: Vec<String>,
    expmeth: Option<String>,
    phases: Vec<String>,
    solvent: Option<String>,
}

impl Dataset {
    pub fn from_raw(setid: SetId, raw: RawSetResponse) -> Result<Self, IltError> {
        // A payload with a header but no rows still gets aligned metadata:
        // every described column is taken as a plain (width 1) value.
        let widths = if raw.data.is_empty() {
            vec![1; raw.dhead.len()]
        } else {
            infer_group_widths(&raw.data)?
        };
        let matrix = build_matrix(&raw.data, &widths)?;
        let columns = derive_columns(&raw.dhead, &widths)?;

        Ok(Self {
            setid,
            matrix,
            columns,
            title: raw.title,
            ref_title: raw.reference.as_ref().map(|r| r.title.clone()),
            ref_full: raw.reference.map(|r| r.full),
            components: raw.components.into_iter().map(|c| c.name).collect(),
            expmeth: raw.expmeth.filter(|value| !value.is_empty()),
            phases: raw.phases,
            solvent: raw.solvent.filter(|value| !value.is_empty()),
        })
    }

    pub fn setid(&self) -> &SetId {
        &self.setid
    }

    pub fn matrix(&self) -> &DataMatrix {
        &self.matrix
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn column_descriptions(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.description.as_str()).collect()
    }

    pub fn column_properties(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.property.as_str()).collect()
    }

    pub fn column_units(&self) -> Vec<Option<&str>> {
        self.columns.iter().map(|c| c.unit.as_deref()).collect()
    }

    pub fn column_phases(&self) -> Vec<Option<&str>> {
        self.columns.iter().map(|c| c.phase.as_deref()).collect()
    }

    /// Matrix dimensions as (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    /// Number of data points (rows).
    pub fn points(&self) -> usize {
        self.matrix.rows()
    }

    /// Data set title, e.g. `Binary system: Specific density`.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Full citation, `"{title}", {full}`.
    pub fn full_cite(&self) -> Option<String> {
        match (&self.ref_title, &self.ref_full) {
            (Some(title), Some(full)) => Some(format!("\"{title}\", {full}")),
            _ => None,
        }
    }

    pub fn reference_title(&self) -> Option<&str> {
        self.ref_title.as_deref()
    }

    pub fn reference_full(&self) -> Option<&str> {
        self.ref_full.as_deref()
    }

    pub fn component_names(&self) -> &[String] {
        &self.components
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn expmeth(&self) -> Option<&str> {
        self.expmeth.as_deref()
    }

    pub fn phases(&self) -> &[String] {
        &self.phases
    }

    pub fn solvent(&self) -> Option<&str> {
        self.solvent.as_deref()
    }

    /// Column descriptions joined by two spaces, used as the data-file header.
    pub fn header_line(&self) -> String {
        self.column_descriptions().join("  ")
    }
}
