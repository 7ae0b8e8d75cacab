use crate::model::CandidateTable;
use crate::table_locate::{HeaderStrategy, KeywordHeader};

const MIN_COLS: usize = 2;

/// Splits a text line into cells on tabs and on runs of two or more spaces.
/// Single spaces stay inside a cell so titles like `Crop Name` survive.
pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut whitespace_run = 0_usize;

    for ch in trimmed.chars() {
        if ch == '\t' {
            if !current.trim().is_empty() {
                cells.push(current.trim().to_string());
                current.clear();
            }
            whitespace_run = 0;
            continue;
        }

        if ch.is_whitespace() {
            whitespace_run += 1;
            if whitespace_run >= 2 {
                if !current.trim().is_empty() {
                    cells.push(current.trim().to_string());
                    current.clear();
                }
                continue;
            }
            current.push(' ');
            continue;
        }

        whitespace_run = 0;
        current.push(ch);
    }

    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }

    cells
}

/// Groups consecutive multi-cell lines of a page into candidate tables.
/// A line that reads as a crop/bag/quantity header always opens a new
/// table, so lines printed just above the header never become row 0.
pub(crate) fn detect_candidate_tables(text: &str) -> Vec<CandidateTable> {
    let mut tables = Vec::new();
    let mut current_rows: Vec<Vec<Option<String>>> = Vec::new();

    let flush = |rows: &mut Vec<Vec<Option<String>>>, tables: &mut Vec<CandidateTable>| {
        if rows.len() >= 2 {
            tables.push(CandidateTable::new(std::mem::take(rows)));
        } else {
            rows.clear();
        }
    };

    for line in text.lines() {
        let cells = split_line_into_cells(line);
        if cells.len() >= MIN_COLS {
            if !current_rows.is_empty() && KeywordHeader.resolve(&cells).is_some() {
                flush(&mut current_rows, &mut tables);
            }
            current_rows.push(cells.into_iter().map(Some).collect());
        } else {
            flush(&mut current_rows, &mut tables);
        }
    }

    flush(&mut current_rows, &mut tables);
    tables
}

#[cfg(test)]
mod tests {
    use super::{detect_candidate_tables, split_line_into_cells};

    #[test]
    fn splits_double_space_separated_cells() {
        let cells = split_line_into_cells("Crop Name  Total Number of Bags/Boxes  Total Quantity (kgs)");
        assert_eq!(
            cells,
            vec!["Crop Name", "Total Number of Bags/Boxes", "Total Quantity (kgs)"]
        );
    }

    #[test]
    fn splits_tab_separated_cells() {
        let cells = split_line_into_cells("Tomato\t150\t3,000");
        assert_eq!(cells, vec!["Tomato", "150", "3,000"]);
    }

    #[test]
    fn groups_runs_of_multi_cell_lines() {
        let text = "\
GATE PASS
To: Acme Corp
Vehicle  KA-01-1234

Crop Name  Bags  Quantity
Tomato  150  3,000
Onion  20  400
For Buyer
Signature  Stamp
";
        let tables = detect_candidate_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(tables[0].rows[0][0].as_deref(), Some("Crop Name"));
        assert_eq!(tables[0].rows[2][2].as_deref(), Some("400"));
    }

    #[test]
    fn header_line_starts_a_new_table() {
        let text = "\
To: Acme Corp
Date  01/02/2025
Crop Name  Total Number of Bags/Boxes  Total Quantity (kgs)
Tomato  150  3,999.5
Onion  20  400
";
        let tables = detect_candidate_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(tables[0].rows[0][0].as_deref(), Some("Crop Name"));
    }
}
