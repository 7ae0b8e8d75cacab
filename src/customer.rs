use crate::options::ExtractOptions;

/// Finds the consignee named on a gatepass page.
///
/// Lines are trimmed and blank lines ignored. The first line carrying the
/// customer label wins; if the label has no value on its own line and
/// `customer_next_line` is set, the next non-empty line is used instead.
/// Known customer names are tried only when no label is present at all.
/// Returns `customer_placeholder` when nothing matches.
#[must_use]
pub fn extract_customer(text: &str, options: &ExtractOptions) -> String {
    find_customer(text, options).unwrap_or_else(|| options.customer_placeholder.clone())
}

pub(crate) fn find_customer(text: &str, options: &ExtractOptions) -> Option<String> {
    let label = options.customer_label.trim();
    let lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    for (index, line) in lines.iter().enumerate() {
        let Some(value) = value_after_label(line, label, options.customer_label_anywhere) else {
            continue;
        };

        if !value.is_empty() {
            return Some(value.to_string());
        }
        if options.customer_next_line {
            if let Some(next) = lines.get(index + 1) {
                return Some((*next).to_string());
            }
        }
        return None;
    }

    match_known_customer(&lines, &options.known_customers)
}

fn value_after_label<'a>(line: &'a str, label: &str, anywhere: bool) -> Option<&'a str> {
    if let Some(rest) = line.strip_prefix(label) {
        return Some(rest.trim());
    }
    if anywhere {
        return line
            .find(label)
            .map(|position| line[position + label.len()..].trim());
    }
    None
}

fn match_known_customer(lines: &[&str], known: &[String]) -> Option<String> {
    lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        known
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .find(|name| lower.contains(&name.to_lowercase()))
            .map(str::to_string)
    })
}
