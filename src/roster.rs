use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::{CertError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub name: String,
    pub identification: String,
}

impl Row {
    pub fn new(name: impl Into<String>, identification: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identification: identification.into(),
        }
    }
}

/// Anything that can hand out the ordered list of certificate rows.
pub trait RowSource {
    fn rows(&self) -> Result<Vec<Row>>;
}

impl RowSource for Vec<Row> {
    fn rows(&self) -> Result<Vec<Row>> {
        Ok(self.clone())
    }
}

/// First worksheet of a spreadsheet, with a header row naming the columns.
pub struct ExcelRoster {
    pub path: PathBuf,
    pub name_column: String,
    pub id_column: String,
}

impl ExcelRoster {
    pub fn new(path: impl Into<PathBuf>, name_column: &str, id_column: &str) -> Self {
        Self {
            path: path.into(),
            name_column: name_column.to_string(),
            id_column: id_column.to_string(),
        }
    }
}

impl RowSource for ExcelRoster {
    fn rows(&self) -> Result<Vec<Row>> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| CertError::Roster(format!("{} has no worksheets", self.path.display())))??;

        let mut lines = range.rows();
        let header: Vec<String> = lines
            .next()
            .ok_or_else(|| CertError::Roster(format!("{} is empty", self.path.display())))?
            .iter()
            .map(|cell| cell_text(cell))
            .collect();

        let name_idx = column_index(&header, &self.name_column)?;
        let id_idx = column_index(&header, &self.id_column)?;

        let mut rows = Vec::new();
        for (n, line) in lines.enumerate() {
            let name = line.get(name_idx).map(cell_text).unwrap_or_default();
            let identification = line.get(id_idx).map(cell_text).unwrap_or_default();
            if name.is_empty() {
                // +2: one for the header, one for 1-based numbering
                warn!("Skipping row {} without a name", n + 2);
                continue;
            }
            rows.push(Row::new(name, identification));
        }

        info!("Loaded {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

fn column_index(header: &[String], column: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .ok_or_else(|| CertError::Roster(format!("Missing column '{}'", column)))
}

/// String form of a cell. Whole numbers lose their fractional part, so an
/// identification stored as 1234.0 reads back as "1234".
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}
