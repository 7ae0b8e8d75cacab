use std::fmt::{Display, Formatter};

use serde::Serialize;

/// One page of a loaded document: its text rendering plus the grids the
/// page source recognised as tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub page_number: u32,
    pub text: String,
    pub tables: Vec<CandidateTable>,
}

/// A grid of cells detected on a page, not yet confirmed to be the gatepass
/// summary table. Rows may be ragged and cells may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateTable {
    pub rows: Vec<Vec<Option<String>>>,
}

impl CandidateTable {
    #[must_use]
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Builds a table where every cell is present.
    #[must_use]
    pub fn from_cells<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|cell| Some(cell.into())).collect())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl CellValue {
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedRow {
    pub customer: String,
    pub crop: String,
    pub bags: CellValue,
    pub quantity_kg: CellValue,
}

impl ExtractedRow {
    pub(crate) fn to_record(&self) -> [String; 4] {
        [
            self.customer.clone(),
            self.crop.clone(),
            self.bags.to_string(),
            self.quantity_kg.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    pub rows: Vec<ExtractedRow>,
}

impl ResultTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub(crate) const OUTPUT_HEADERS: [&str; 4] = ["customer", "crop", "bags", "quantity_kg"];

/// Footer rows summarise the table and are never emitted as data.
pub(crate) fn is_footer_label(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("total") || value.eq_ignore_ascii_case("sub total")
}
