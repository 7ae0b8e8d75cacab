use crate::model::CandidateTable;
use crate::options::HeaderMatch;

pub(crate) const CROP_TITLE: &str = "Crop Name";
pub(crate) const BAGS_TITLE: &str = "Total Number of Bags/Boxes";
pub(crate) const QUANTITY_TITLE: &str = "Total Quantity (kgs)";

/// Column positions of the three gatepass roles within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub crop: usize,
    pub bags: usize,
    pub quantity: usize,
}

/// Resolves column roles from a normalized header row.
pub trait HeaderStrategy {
    fn name(&self) -> &'static str;

    fn resolve(&self, header: &[String]) -> Option<ColumnMap>;
}

fn resolve_with(header: &[String], matches: impl Fn(&str, Role) -> bool) -> Option<ColumnMap> {
    let find = |role| header.iter().position(|cell| matches(cell, role));
    Some(ColumnMap {
        crop: find(Role::Crop)?,
        bags: find(Role::Bags)?,
        quantity: find(Role::Quantity)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Crop,
    Bags,
    Quantity,
}

/// Header cell equals the literal column title.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactHeader;

impl HeaderStrategy for ExactHeader {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn resolve(&self, header: &[String]) -> Option<ColumnMap> {
        resolve_with(header, |cell, role| {
            cell == match role {
                Role::Crop => CROP_TITLE,
                Role::Bags => BAGS_TITLE,
                Role::Quantity => QUANTITY_TITLE,
            }
        })
    }
}

/// Header cell contains a role keyword, ignoring case.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordHeader;

impl HeaderStrategy for KeywordHeader {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn resolve(&self, header: &[String]) -> Option<ColumnMap> {
        resolve_with(header, |cell, role| {
            let cell = cell.to_lowercase();
            match role {
                Role::Crop => cell.contains("crop"),
                Role::Bags => cell.contains("bag"),
                Role::Quantity => cell.contains("qty") || cell.contains("quantity"),
            }
        })
    }
}

/// The table picked out of a page's candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedTable<'a> {
    pub index: usize,
    pub columns: ColumnMap,
    pub data_rows: &'a [Vec<Option<String>>],
    pub strategy: &'static str,
}

/// Ranked header strategies, most specific first.
pub struct TableClassifier {
    strategies: Vec<Box<dyn HeaderStrategy>>,
}

impl TableClassifier {
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn HeaderStrategy>>) -> Self {
        Self { strategies }
    }

    #[must_use]
    pub fn for_mode(mode: HeaderMatch) -> Self {
        match mode {
            HeaderMatch::Keyword => Self::new(vec![Box::new(ExactHeader), Box::new(KeywordHeader)]),
            HeaderMatch::Exact => Self::new(vec![Box::new(ExactHeader)]),
        }
    }

    #[must_use]
    pub fn classify(&self, table: &CandidateTable) -> Option<(ColumnMap, &'static str)> {
        if table.rows.len() < 2 {
            return None;
        }

        let header = normalize_header(&table.rows[0]);
        self.strategies
            .iter()
            .find_map(|strategy| strategy.resolve(&header).map(|map| (map, strategy.name())))
    }

    /// Returns the first candidate whose header resolves all three roles.
    #[must_use]
    pub fn locate<'a>(&self, tables: &'a [CandidateTable]) -> Option<LocatedTable<'a>> {
        tables.iter().enumerate().find_map(|(index, table)| {
            self.classify(table).map(|(columns, strategy)| LocatedTable {
                index,
                columns,
                data_rows: &table.rows[1..],
                strategy,
            })
        })
    }
}

impl Default for TableClassifier {
    fn default() -> Self {
        Self::for_mode(HeaderMatch::Keyword)
    }
}

pub(crate) fn normalize_header(row: &[Option<String>]) -> Vec<String> {
    row.iter()
        .map(|cell| {
            cell.as_deref()
                .unwrap_or_default()
                .split(['\r', '\n'])
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
