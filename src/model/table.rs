//! Table types.

use super::BoundingBox;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A table as rows of cell text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Identifier, unique within the document
    pub id: String,

    /// Table caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Label such as "Table 2"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Cell text, row-major
    #[serde(default)]
    pub rows: Vec<Vec<String>>,

    /// Row count claimed by the producer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_rows: Option<usize>,

    /// Column count claimed by the producer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_columns: Option<usize>,

    /// Location on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    /// Ids of content elements citing this table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_by: Vec<String>,
}

impl Table {
    /// Create a new empty table.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the rows.
    pub fn with_rows<R, C>(mut self, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Record the dimensions the producer claims.
    pub fn with_declared_shape(mut self, rows: usize, columns: usize) -> Self {
        self.declared_rows = Some(rows);
        self.declared_columns = Some(columns);
        self
    }

    /// Set the bounding box.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Whether every row has the same number of cells.
    pub fn is_rectangular(&self) -> bool {
        match self.rows.first() {
            Some(first) => self.rows.iter().all(|r| r.len() == first.len()),
            None => true,
        }
    }

    /// Fraction of rows whose width equals the most common width.
    pub fn row_consistency(&self) -> f64 {
        if self.rows.is_empty() {
            return 1.0;
        }
        let mut widths: HashMap<usize, usize> = HashMap::new();
        for row in &self.rows {
            *widths.entry(row.len()).or_default() += 1;
        }
        let most_common = widths.values().copied().max().unwrap_or(0);
        most_common as f64 / self.rows.len() as f64
    }

    /// Fraction of cells that are blank.
    pub fn empty_cell_ratio(&self) -> f64 {
        let total = self.cell_count();
        if total == 0 {
            return 0.0;
        }
        let empty = self
            .rows
            .iter()
            .flatten()
            .filter(|c| c.trim().is_empty())
            .count();
        empty as f64 / total as f64
    }

    /// Compare declared dimensions with the actual cells.
    ///
    /// Returns `None` when the producer declared nothing.
    pub fn matches_declared_shape(&self) -> Option<bool> {
        if self.declared_rows.is_none() && self.declared_columns.is_none() {
            return None;
        }
        let rows_ok = self.declared_rows.map_or(true, |r| r == self.row_count());
        let cols_ok = self
            .declared_columns
            .map_or(true, |c| self.rows.iter().all(|row| row.len() == c));
        Some(rows_ok && cols_ok)
    }

    /// Caption, else label.
    pub fn key_text(&self) -> Option<&str> {
        self.caption
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.label.as_deref())
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join(" | "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
