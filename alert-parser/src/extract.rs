mod table;

use lazy_regex::regex;
use regex::Regex;
use serde::Serialize;

use crate::error::ExtractError;
use crate::template::{Template, VendorRule};
use crate::utils::first_non_empty_group;

/// Raw field text found by one template in one body
///
/// Nothing is parsed yet: the amount keeps its `$` and separators, the date is the scraped substring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FoundFields {
    pub amount: Option<String>,
    pub account: Option<String>,
    pub vendor: Option<String>,
    pub date: Option<String>,
    /// read from paired table cells
    pub from_table: bool,
}

impl FoundFields {
    /// Names of the fields a strict match would still need
    pub fn missing(&self, date_required: bool) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.account.is_none() {
            missing.push("account");
        }
        if self.vendor.is_none() {
            missing.push("vendor");
        }
        if date_required && self.date.is_none() {
            missing.push("date");
        }
        missing
    }
}

/// Runs every field rule of `template` against one body
///
/// Pattern fields are probed independently of each other.
/// Table templates fail only when the table cannot be paired.
pub fn extract_fields(template: &Template, body: &str) -> Result<FoundFields, ExtractError> {
    if template.iterate_results() {
        let mut fields = table::table_fields(body)?;
        if fields.from_table && template.date().is_some() {
            fields.date = capture(template.date(), body);
        }
        return Ok(fields);
    }

    Ok(FoundFields {
        amount: capture(template.amount(), body),
        account: capture(template.account(), body),
        vendor: template.vendor().and_then(|rule| vendor_value(rule, body)),
        date: capture(template.date(), body),
        from_table: false,
    })
}

/// Vendor text according to the rule kind
pub fn vendor_value(rule: &VendorRule, body: &str) -> Option<String> {
    match rule {
        VendorRule::Pattern(re) => capture(Some(re), body),
        VendorRule::Fixed(vendor) => Some(vendor.clone()),
        VendorRule::MerchantLabel(re) => capture(Some(re), body)
            .map(|v| cut_at_next_label(&v))
            .filter(|v| !v.is_empty()),
    }
}

/// Date text found by the template's date pattern alone
pub fn date_value(template: &Template, body: &str) -> Option<String> {
    capture(template.date(), body)
}

/// Vendor from the subject line, for templates that declare one
pub fn subject_vendor(template: &Template, subject: &str) -> Option<String> {
    capture(template.subject_vendor(), subject)
}

fn capture(re: Option<&Regex>, text: &str) -> Option<String> {
    let caps = re?.captures(text)?;
    first_non_empty_group(&caps).map(str::to_string)
}

/// `STARBUCKS #123 Amount: $5.00` -> `STARBUCKS #123`
fn cut_at_next_label(value: &str) -> String {
    let end = regex!(r"\s+[A-Z][A-Za-z ]{0,30}:|[<\r\n]")
        .find(value)
        .map_or(value.len(), |m| m.start());
    value[..end].trim().to_string()
}
