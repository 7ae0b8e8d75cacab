use crate::model::{CellValue, ExtractedRow, is_footer_label};

const HEADER_WINDOW: usize = 3;
const HEADER_PHRASES: [&str; 3] = ["cropname", "numberofbags", "quantity"];
const END_MARKERS: [&str; 2] = ["loose bags/boxes", "for buyer"];

fn squash(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Index of the first line after the header region, if a header exists.
/// Column titles may wrap, so up to three consecutive lines are joined.
fn find_data_start(lines: &[&str]) -> Option<usize> {
    (0..lines.len()).find_map(|start| {
        let mut joined = String::new();
        lines[start..]
            .iter()
            .take(HEADER_WINDOW)
            .enumerate()
            .find_map(|(offset, line)| {
                joined.push_str(&squash(line));
                HEADER_PHRASES
                    .iter()
                    .all(|phrase| joined.contains(phrase))
                    .then_some(start + offset + 1)
            })
    })
}

fn parse_count(token: &str) -> Option<i64> {
    token.replace(',', "").parse().ok()
}

fn parse_line(line: &str, customer: &str) -> Option<ExtractedRow> {
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    if tokens.len() < 3 {
        return None;
    }

    let (name, numbers) = tokens.split_at(tokens.len() - 2);
    let bags = parse_count(numbers[0])?;
    let quantity = parse_count(numbers[1])?;
    let crop = name.join(" ");
    if is_footer_label(&crop) {
        return None;
    }

    Some(ExtractedRow {
        customer: customer.to_string(),
        crop,
        bags: CellValue::Integer(bags),
        quantity_kg: CellValue::Integer(quantity),
    })
}

/// Reads gatepass rows straight from page text when no table grid is usable.
///
/// Each data line is `<crop words...> <bags> <quantity>`; lines that do not
/// fit that shape are ignored.
#[must_use]
pub fn extract_rows_from_text(text: &str, customer: &str) -> Vec<ExtractedRow> {
    let lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    let Some(start) = find_data_start(&lines) else {
        return Vec::new();
    };

    lines[start..]
        .iter()
        .take_while(|line| {
            !END_MARKERS
                .iter()
                .any(|marker| starts_with_ignore_case(line, marker))
        })
        .filter(|line| !starts_with_ignore_case(line, "total"))
        .filter_map(|line| parse_line(line, customer))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{extract_rows_from_text, find_data_start};
    use crate::model::CellValue;

    const PAGE: &str = "\
GATE PASS
To: Acme Corp
Crop Name Total Number of Bags/Boxes Total Quantity (kgs)
Tomato 150 3,000
Green Chilli 20 400
Total 170 3,400
Loose Bags/Boxes 2
Onion 1 1
";

    #[test]
    fn parses_rows_between_header_and_end_marker() {
        let rows = extract_rows_from_text(PAGE, "Acme Corp");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].crop, "Tomato");
        assert_eq!(rows[0].bags, CellValue::Integer(150));
        assert_eq!(rows[0].quantity_kg, CellValue::Integer(3000));
        assert_eq!(rows[1].crop, "Green Chilli");
        assert_eq!(rows[1].customer, "Acme Corp");
    }

    #[test]
    fn header_may_wrap_over_lines() {
        let lines = ["Crop Name Total Number of", "Bags/Boxes Total", "Quantity (kgs)", "Rice 5 250"];
        assert_eq!(find_data_start(&lines), Some(3));
    }

    #[test]
    fn skips_malformed_and_footer_lines() {
        let text = "\
Crop Name  Total Number of Bags/Boxes  Total Quantity (kgs)
Rice 5
Wheat five 100
Sub Total 5 100
Maize 7 1,400
For Buyer
Barley 1 1
";
        let rows = extract_rows_from_text(text, "X");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].crop, "Maize");
        assert_eq!(rows[0].quantity_kg, CellValue::Integer(1400));
    }

    #[test]
    fn no_header_yields_nothing() {
        assert!(extract_rows_from_text("Tomato 150 3000", "X").is_empty());
        assert!(extract_rows_from_text("", "X").is_empty());
    }
}
