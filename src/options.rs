use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::ExtractError;

/// How strictly table headers must match the gatepass column titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMatch {
    /// Exact titles first, then case-insensitive role keywords.
    Keyword,
    /// Exact titles only.
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub header_match: HeaderMatch,
    pub customer_label: String,
    /// Accept the customer label anywhere in a line, not only as a prefix.
    pub customer_label_anywhere: bool,
    /// Use the following line when the label carries no value.
    pub customer_next_line: bool,
    /// Last-resort names matched as case-insensitive substrings.
    pub known_customers: Vec<String>,
    pub customer_placeholder: String,
    pub text_fallback: bool,
    pub delimiter: u8,
}

impl ExtractOptions {
    pub(crate) fn validate(&self) -> Result<(), ExtractError> {
        if self.customer_label.trim().is_empty() {
            return Err(ExtractError::InvalidOption(
                "customer label cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            header_match: HeaderMatch::Keyword,
            customer_label: "To:".to_string(),
            customer_label_anywhere: false,
            customer_next_line: true,
            known_customers: Vec::new(),
            customer_placeholder: "Unknown".to_string(),
            text_fallback: true,
            delimiter: b',',
        }
    }
}
