use lazy_regex::regex;

use super::FoundFields;
use crate::error::ExtractError;
use crate::sanitize::cell_text;
use crate::utils::account_suffix;

/// Link cells that sit between label/value pairs
const BOILERPLATE: &[&str] = &["Review account", "View payment activity"];

const DEFAULT_VENDOR: &str = "Direct Deposit";

/// Text of every innermost `<td>`, boilerplate removed
///
/// Empty cells keep their place, except trailing ones.
pub(super) fn table_cells(html: &str) -> Vec<String> {
    let mut cells: Vec<String> = cell_bodies(html)
        .into_iter()
        .map(cell_text)
        .filter(|text| !BOILERPLATE.contains(&text.as_str()))
        .collect();

    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    if cells
        .last()
        .is_some_and(|c| c.to_ascii_lowercase().contains("incremental charge"))
    {
        cells.pop();
    }

    cells
}

/// Inner HTML of each cell that holds no other cell
///
/// A layout cell wrapping a nested table is skipped in favour of the cells inside it.
fn cell_bodies(html: &str) -> Vec<&str> {
    let mut bodies = Vec::new();
    let mut open = None;

    for tag in regex!(r"(?i)<td\b[^>]*>|</td\s*>").find_iter(html) {
        if tag.as_str().starts_with("</") {
            if let Some(start) = open.take() {
                bodies.push(&html[start..tag.start()]);
            }
        } else {
            open = Some(tag.end());
        }
    }

    bodies
}

/// Walks the cells as label, value, label, value...
///
/// Empty cells where a label is due are spacers and skipped. Where a value is
/// due, an empty cell is an empty value, and a cell starting with `<` is
/// leftover markup that is passed over. A label with nothing after it is an error.
fn pair_cells(cells: &[String]) -> Result<Vec<(String, &str)>, ExtractError> {
    let mut pairs = Vec::new();
    let mut label: Option<&str> = None;

    for cell in cells {
        match label {
            None if cell.is_empty() => {}
            None => label = Some(cell.as_str()),
            Some(_) if cell.starts_with('<') => {}
            Some(l) => {
                pairs.push((label_key(l), cell.as_str()));
                label = None;
            }
        }
    }

    match label {
        Some(l) => Err(ExtractError::MalformedTable(format!("label '{l}' has no value cell"))),
        None => Ok(pairs),
    }
}

/// Reads the transaction out of a label/value table
///
/// No cells, or no `Amount` value, is not a table alert: empty result.
/// Cells that cannot be paired are an error.
pub(super) fn table_fields(html: &str) -> Result<FoundFields, ExtractError> {
    let cells = table_cells(html);
    if cells.is_empty() {
        return Ok(FoundFields::default());
    }

    let pairs = pair_cells(&cells)?;
    let value = |label: &str| {
        pairs
            .iter()
            .find(|(key, v)| key == label && !v.is_empty())
            .map(|(_, v)| v.to_string())
    };

    let Some(amount) = value("amount") else {
        return Ok(FoundFields::default());
    };

    let vendor = value("merchant")
        .or_else(|| value("recipient"))
        .unwrap_or_else(|| DEFAULT_VENDOR.to_string());
    let account = value("account ending in")
        .or_else(|| value("account"))
        .and_then(|v| account_suffix(&v));

    Ok(FoundFields {
        amount: Some(amount),
        account,
        vendor: Some(vendor),
        date: value("posted").or_else(|| value("date")),
        from_table: true,
    })
}

fn label_key(label: &str) -> String {
    label.trim().trim_end_matches(':').trim().to_lowercase()
}
