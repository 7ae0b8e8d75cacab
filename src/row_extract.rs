use crate::model::{CellValue, ExtractedRow, is_footer_label};
use crate::table_locate::ColumnMap;

fn cell_at(row: &[Option<String>], index: usize) -> &str {
    row.get(index)
        .and_then(Option::as_deref)
        .map_or("", str::trim)
}

fn is_blank_row(row: &[Option<String>]) -> bool {
    row.iter()
        .all(|cell| cell.as_deref().is_none_or(|value| value.trim().is_empty()))
}

fn strip_separators(value: &str) -> String {
    value.replace(',', "")
}

fn finite_float(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_integer(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

/// Bag counts are whole numbers; `"120.0"` is accepted and truncated.
pub(crate) fn parse_bags(raw: &str) -> CellValue {
    let cleaned = strip_separators(raw);
    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| finite_float(&cleaned).and_then(float_to_integer))
        .map_or_else(|| CellValue::Text(raw.to_string()), CellValue::Integer)
}

/// Quantities keep their fraction unless they are whole.
pub(crate) fn parse_quantity(raw: &str) -> CellValue {
    let cleaned = strip_separators(raw);
    if let Ok(value) = cleaned.parse::<i64>() {
        return CellValue::Integer(value);
    }
    match finite_float(&cleaned) {
        Some(value) if value.fract() == 0.0 => {
            float_to_integer(value).map_or(CellValue::Decimal(value), CellValue::Integer)
        }
        Some(value) => CellValue::Decimal(value),
        None => CellValue::Text(raw.to_string()),
    }
}

/// Turns the data rows of a located table into gatepass rows.
///
/// Blank rows, rows without a crop and footer rows are skipped. Bag and
/// quantity cells that do not parse as numbers are kept as text.
#[must_use]
pub fn extract_table_rows(
    data_rows: &[Vec<Option<String>>],
    columns: ColumnMap,
    customer: &str,
) -> Vec<ExtractedRow> {
    data_rows
        .iter()
        .filter(|row| !is_blank_row(row))
        .filter_map(|row| {
            let crop = cell_at(row, columns.crop);
            if crop.is_empty() || is_footer_label(crop) {
                return None;
            }

            Some(ExtractedRow {
                customer: customer.to_string(),
                crop: crop.to_string(),
                bags: parse_bags(cell_at(row, columns.bags)),
                quantity_kg: parse_quantity(cell_at(row, columns.quantity)),
            })
        })
        .collect()
}
