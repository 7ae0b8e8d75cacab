mod csv_out;
mod customer;
mod error;
mod model;
mod options;
mod pdf_reader;
mod row_extract;
mod table_detect;
mod table_locate;
mod text_fallback;
mod warning;

use std::path::Path;

use tracing::{debug, warn};

use crate::csv_out::write_csv;
use crate::customer::find_customer;

pub use csv_out::{rows_to_json_string, write_csv_to_string};
pub use customer::extract_customer;
pub use error::ExtractError;
pub use model::{CandidateTable, CellValue, ExtractedRow, PageContent, ResultTable};
pub use options::{ExtractOptions, HeaderMatch, PageSelection};
pub use pdf_reader::{PageSource, PdfBytes};
pub use row_extract::extract_table_rows;
pub use table_locate::{
    ColumnMap, ExactHeader, HeaderStrategy, KeywordHeader, LocatedTable, TableClassifier,
};
pub use text_fallback::extract_rows_from_text;
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

use crate::warning::WarningCode;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub row_count: usize,
    pub page_count: usize,
    /// Pages whose rows came from a located table.
    pub table_pages: Vec<u32>,
    /// Pages whose rows came from the text fallback.
    pub fallback_pages: Vec<u32>,
    pub warnings: Vec<ExtractWarning>,
}

/// Rows of a document together with the report describing how they were found.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub table: ResultTable,
    pub report: ExtractionReport,
}

fn extract_page(
    page: &PageContent,
    classifier: &TableClassifier,
    options: &ExtractOptions,
    report: &mut ExtractionReport,
) -> Vec<crate::model::ExtractedRow> {
    let customer = find_customer(&page.text, options).unwrap_or_else(|| {
        report.warnings.push(
            ExtractWarning::new(WarningCode::CustomerNotFound, "no customer label found")
                .with_page(page.page_number),
        );
        options.customer_placeholder.clone()
    });

    if let Some(located) = classifier.locate(&page.tables) {
        debug!(
            page = page.page_number,
            table = located.index,
            strategy = located.strategy,
            "located gatepass table"
        );
        report.table_pages.push(page.page_number);
        return extract_table_rows(located.data_rows, located.columns, &customer);
    }

    report.warnings.push(
        ExtractWarning::new(
            WarningCode::NoMatchingTable,
            format!(
                "none of {} candidate table(s) has crop, bag and quantity columns",
                page.tables.len()
            ),
        )
        .with_page(page.page_number),
    );

    if !options.text_fallback {
        return Vec::new();
    }

    let rows = extract_rows_from_text(&page.text, &customer);
    if !rows.is_empty() {
        warn!(
            page = page.page_number,
            rows = rows.len(),
            "no usable table grid; rows were read from page text"
        );
        report.fallback_pages.push(page.page_number);
        report.warnings.push(
            ExtractWarning::new(
                WarningCode::TextFallbackUsed,
                "rows were parsed from plain page text",
            )
            .with_page(page.page_number),
        );
    }
    rows
}

/// Extracts gatepass rows from already loaded pages.
///
/// Each page contributes the rows of its first matching table, or, when no
/// table matches and the text fallback is enabled, the rows found in its
/// text. Rows keep page order, then table order.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidOption`] for unusable options.
pub fn extract_rows_from_pages(
    pages: &[PageContent],
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    options.validate()?;

    let classifier = TableClassifier::for_mode(options.header_match);
    let mut report = ExtractionReport {
        row_count: 0,
        page_count: pages.len(),
        table_pages: Vec::new(),
        fallback_pages: Vec::new(),
        warnings: Vec::new(),
    };

    let mut rows = Vec::new();
    for page in pages {
        let page_rows = extract_page(page, &classifier, options, &mut report);
        let non_numeric = page_rows
            .iter()
            .filter(|row| row.bags.is_text() || row.quantity_kg.is_text())
            .count();
        if non_numeric > 0 {
            report.warnings.push(
                ExtractWarning::new(
                    WarningCode::NonNumericValue,
                    format!("{non_numeric} row(s) kept a non-numeric bag or quantity value"),
                )
                .with_page(page.page_number),
            );
        }
        rows.extend(page_rows);
    }

    if rows.is_empty() {
        warn!(pages = pages.len(), "no gatepass rows found");
        report.warnings.push(ExtractWarning::new(
            WarningCode::NoRowsExtracted,
            "no gatepass table rows were found in the selected pages",
        ));
    }

    report.row_count = rows.len();
    Ok(Extraction {
        table: ResultTable { rows },
        report,
    })
}

/// Loads pages from `source` and extracts gatepass rows from them.
///
/// # Errors
///
/// Returns an error when the source cannot be read or the options are invalid.
pub fn extract_rows<S>(source: &S, options: &ExtractOptions) -> Result<Extraction, ExtractError>
where
    S: PageSource + ?Sized,
{
    let pages = source.load_pages(options.pages.as_ref())?;
    extract_rows_from_pages(&pages, options)
}

/// Parses one gatepass PDF held in memory.
///
/// # Errors
///
/// Returns [`ExtractError::PdfLoad`] for documents `lopdf` cannot read.
pub fn extract_rows_from_bytes(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    extract_rows(&PdfBytes(input_pdf), options)
}

/// Parses the PDF at `input_pdf` and writes the rows to `output_csv`.
///
/// # Errors
///
/// Returns an error when reading, parsing or writing fails.
pub fn extract_pdf_to_csv(
    input_pdf: &Path,
    output_csv: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    let bytes = std::fs::read(input_pdf)?;
    let extraction = extract_rows_from_bytes(&bytes, options)?;
    write_csv(output_csv, &extraction.table, options.delimiter)?;
    Ok(extraction.report)
}

/// Parses a PDF held in memory and renders the rows as CSV.
///
/// # Errors
///
/// Returns an error when parsing or CSV rendering fails.
pub fn extract_pdf_bytes_to_csv_string(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(String, ExtractionReport), ExtractError> {
    let extraction = extract_rows_from_bytes(input_pdf, options)?;
    let csv = write_csv_to_string(&extraction.table, options.delimiter)?;
    Ok((csv, extraction.report))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ExtractWarningCode, extract_rows_from_pages};
    use crate::model::{CandidateTable, CellValue, PageContent};
    use crate::options::{ExtractOptions, HeaderMatch};

    fn gatepass_table(rows: &[[&str; 3]]) -> CandidateTable {
        let mut all = vec![[
            "Crop Name",
            "Total Number of Bags/Boxes",
            "Total Quantity (kgs)",
        ]];
        all.extend_from_slice(rows);
        CandidateTable::from_cells(all)
    }

    #[test]
    fn rows_are_attributed_to_their_page_customer() {
        let pages = vec![
            PageContent {
                page_number: 1,
                text: "To: First Buyer\nTerms and conditions".to_string(),
                tables: vec![CandidateTable::from_cells([["Vehicle", "KA-01"], ["Driver", "Ravi"]])],
            },
            PageContent {
                page_number: 2,
                text: "To: Second Buyer".to_string(),
                tables: vec![gatepass_table(&[
                    ["Tomato", "150", "3,000"],
                    ["Onion", "20", "400.5"],
                    ["Total", "170", "3,400.5"],
                ])],
            },
        ];

        let extraction = extract_rows_from_pages(&pages, &ExtractOptions::default())
            .expect("extraction should succeed");
        let rows = &extraction.table.rows;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.customer == "Second Buyer"));
        assert_eq!(rows[1].quantity_kg, CellValue::Decimal(400.5));
        assert_eq!(extraction.report.table_pages, vec![2]);
        assert!(
            extraction
                .report
                .warnings
                .iter()
                .any(|w| w.code == ExtractWarningCode::NoMatchingTable && w.page == Some(1))
        );
    }

    #[test]
    fn empty_document_yields_empty_table() {
        let extraction = extract_rows_from_pages(&[], &ExtractOptions::default())
            .expect("empty input is not an error");
        assert!(extraction.table.is_empty());
        assert_eq!(extraction.report.warnings.len(), 1);
        assert_eq!(
            extraction.report.warnings[0].code,
            ExtractWarningCode::NoRowsExtracted
        );
    }

    #[test]
    fn falls_back_to_text_when_no_grid_matches() {
        let pages = vec![PageContent {
            page_number: 1,
            text: "To: Acme Corp\nCrop Name Total Number of Bags/Boxes Total Quantity (kgs)\nWheat 12 600\nFor Buyer".to_string(),
            tables: Vec::new(),
        }];

        let extraction = extract_rows_from_pages(&pages, &ExtractOptions::default())
            .expect("extraction should succeed");
        assert_eq!(extraction.table.len(), 1);
        assert_eq!(extraction.table.rows[0].customer, "Acme Corp");
        assert_eq!(extraction.report.fallback_pages, vec![1]);

        let options = ExtractOptions {
            text_fallback: false,
            ..ExtractOptions::default()
        };
        let extraction =
            extract_rows_from_pages(&pages, &options).expect("extraction should succeed");
        assert!(extraction.table.is_empty());
    }

    #[test]
    fn strict_headers_reject_reworded_tables() {
        let pages = vec![PageContent {
            page_number: 1,
            text: "To: Acme".to_string(),
            tables: vec![CandidateTable::from_cells([
                ["Crop", "Bags", "Qty"],
                ["Rice", "3", "90"],
            ])],
        }];

        let keyword = extract_rows_from_pages(&pages, &ExtractOptions::default())
            .expect("extraction should succeed");
        assert_eq!(keyword.table.len(), 1);

        let strict = ExtractOptions {
            header_match: HeaderMatch::Exact,
            ..ExtractOptions::default()
        };
        let extraction =
            extract_rows_from_pages(&pages, &strict).expect("extraction should succeed");
        assert!(extraction.table.is_empty());
    }

    #[test]
    fn reports_non_numeric_values_and_missing_customer() {
        let pages = vec![PageContent {
            page_number: 3,
            text: String::new(),
            tables: vec![gatepass_table(&[["Chilli", "N/A", "40"]])],
        }];

        let extraction = extract_rows_from_pages(&pages, &ExtractOptions::default())
            .expect("extraction should succeed");
        assert_eq!(extraction.table.rows[0].customer, "Unknown");
        assert_eq!(
            extraction.table.rows[0].bags,
            CellValue::Text("N/A".to_string())
        );
        let codes = extraction
            .report
            .warnings
            .iter()
            .map(|warning| warning.code)
            .collect::<Vec<_>>();
        assert_eq!(
            codes,
            vec![
                ExtractWarningCode::CustomerNotFound,
                ExtractWarningCode::NonNumericValue
            ]
        );
    }
}
