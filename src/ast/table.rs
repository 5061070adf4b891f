use crate::ast::RichText;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// One table row: column header -> cell value, in column order.
///
/// Columns missing from a short row are absent, not empty.
pub type TableRow = IndexMap<String, RichText>;

/// A pipe table (`{| ... |}`) as an ordered sequence of row records.
///
/// Serializes as a bare JSON array of row objects. The header row is not
/// part of `rows`; its cells became the keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableRow> {
        self.rows.iter()
    }

    /// Column headers in order, taken from the widest row.
    pub fn headers(&self) -> Vec<&str> {
        self.rows
            .iter()
            .max_by_key(|r| r.len())
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl Index<usize> for Table {
    type Output = TableRow;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a TableRow;
    type IntoIter = std::slice::Iter<'a, TableRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
