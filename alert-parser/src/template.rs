mod catalog;

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::error::ExtractError;

pub use catalog::BUILTIN_TEMPLATES;

/// How a template finds the vendor
#[derive(Debug, Clone)]
pub enum VendorRule {
    /// first non-empty capture group
    Pattern(Regex),
    /// constant vendor, always present
    Fixed(String),
    /// captured text cut at the next `Label:` or markup
    MerchantLabel(Regex),
}

/// Uncompiled vendor rule, as written in a catalog row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorDef {
    Pattern(&'static str),
    Fixed(&'static str),
    MerchantLabel(&'static str),
}

/// One catalog row
///
/// Built with the `const` setters so the whole catalog stays a static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateDef {
    pub name: &'static str,
    pub account: Option<&'static str>,
    pub amount: Option<&'static str>,
    pub vendor: Option<VendorDef>,
    /// `None`: the date comes from the envelope
    pub date: Option<&'static str>,
    /// fields come from paired `<td>` cells instead of patterns
    pub iterate_results: bool,
    pub subject_pattern: Option<&'static str>,
    /// sender, either the full `From` value or just its address
    pub email_from: Option<&'static str>,
    /// vendor read from the subject when the body yields none
    pub subject_vendor: Option<&'static str>,
}

impl TemplateDef {
    pub const fn new(name: &'static str) -> Self {
        TemplateDef {
            name,
            account: None,
            amount: None,
            vendor: None,
            date: None,
            iterate_results: false,
            subject_pattern: None,
            email_from: None,
            subject_vendor: None,
        }
    }

    pub const fn account(self, pattern: &'static str) -> Self {
        TemplateDef { account: Some(pattern), ..self }
    }

    pub const fn amount(self, pattern: &'static str) -> Self {
        TemplateDef { amount: Some(pattern), ..self }
    }

    pub const fn vendor(self, pattern: &'static str) -> Self {
        TemplateDef { vendor: Some(VendorDef::Pattern(pattern)), ..self }
    }

    pub const fn fixed_vendor(self, vendor: &'static str) -> Self {
        TemplateDef { vendor: Some(VendorDef::Fixed(vendor)), ..self }
    }

    pub const fn merchant_label(self, pattern: &'static str) -> Self {
        TemplateDef { vendor: Some(VendorDef::MerchantLabel(pattern)), ..self }
    }

    pub const fn date(self, pattern: &'static str) -> Self {
        TemplateDef { date: Some(pattern), ..self }
    }

    pub const fn iterate(self) -> Self {
        TemplateDef { iterate_results: true, ..self }
    }

    pub const fn subject(self, pattern: &'static str) -> Self {
        TemplateDef { subject_pattern: Some(pattern), ..self }
    }

    pub const fn email_from(self, address: &'static str) -> Self {
        TemplateDef { email_from: Some(address), ..self }
    }

    pub const fn subject_vendor(self, pattern: &'static str) -> Self {
        TemplateDef { subject_vendor: Some(pattern), ..self }
    }
}

/// A compiled template
///
/// Body patterns are case-insensitive with `.` spanning newlines;
/// the subject patterns are additionally multi-line.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    account: Option<Regex>,
    amount: Option<Regex>,
    vendor: Option<VendorRule>,
    date: Option<Regex>,
    iterate_results: bool,
    subject_pattern: Option<Regex>,
    email_from: Option<String>,
    subject_vendor: Option<Regex>,
}

impl Template {
    pub fn compile(def: &TemplateDef) -> Result<Self, ExtractError> {
        let vendor = match def.vendor {
            None => None,
            Some(VendorDef::Pattern(p)) => Some(VendorRule::Pattern(body_regex(p)?)),
            Some(VendorDef::Fixed(v)) => Some(VendorRule::Fixed(v.to_string())),
            Some(VendorDef::MerchantLabel(p)) => Some(VendorRule::MerchantLabel(body_regex(p)?)),
        };

        Ok(Template {
            name: def.name.to_string(),
            account: def.account.map(body_regex).transpose()?,
            amount: def.amount.map(body_regex).transpose()?,
            vendor,
            date: def.date.map(body_regex).transpose()?,
            iterate_results: def.iterate_results,
            subject_pattern: def.subject_pattern.map(subject_regex).transpose()?,
            email_from: def.email_from.map(|s| s.trim().to_string()),
            subject_vendor: def.subject_vendor.map(subject_regex).transpose()?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account(&self) -> Option<&Regex> {
        self.account.as_ref()
    }

    pub fn amount(&self) -> Option<&Regex> {
        self.amount.as_ref()
    }

    pub fn vendor(&self) -> Option<&VendorRule> {
        self.vendor.as_ref()
    }

    pub fn date(&self) -> Option<&Regex> {
        self.date.as_ref()
    }

    pub fn iterate_results(&self) -> bool {
        self.iterate_results
    }

    pub fn subject_pattern(&self) -> Option<&Regex> {
        self.subject_pattern.as_ref()
    }

    pub fn email_from(&self) -> Option<&str> {
        self.email_from.as_deref()
    }

    pub fn subject_vendor(&self) -> Option<&Regex> {
        self.subject_vendor.as_ref()
    }

    /// A template with its own date pattern must find a date in the body
    pub fn date_required(&self) -> bool {
        self.date.is_some()
    }

    /// Sender filter; a template without one accepts any sender
    ///
    /// The `From` value must equal the configured one, or carry the same address.
    pub fn accepts_sender(&self, from: Option<&str>) -> bool {
        match &self.email_from {
            Some(expected) => from.map(str::trim).is_some_and(|f| {
                f == expected || sender_address(f).eq_ignore_ascii_case(sender_address(expected))
            }),
            None => true,
        }
    }

    /// Subject filter; a missing subject fails a declared pattern
    pub fn accepts_subject(&self, subject: Option<&str>) -> bool {
        match &self.subject_pattern {
            Some(re) => subject.is_some_and(|s| re.is_match(s)),
            None => true,
        }
    }
}

/// `Chase <no-reply@alertsp.chase.com>` -> `no-reply@alertsp.chase.com`
fn sender_address(from: &str) -> &str {
    let from = from.trim();
    match (from.rfind('<'), from.rfind('>')) {
        (Some(start), Some(end)) if start < end => from[start + 1..end].trim(),
        _ => from,
    }
}

fn body_regex(pattern: &str) -> Result<Regex, ExtractError> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()?)
}

fn subject_regex(pattern: &str) -> Result<Regex, ExtractError> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .multi_line(true)
        .build()?)
}

static BUILTIN: Lazy<Arc<TemplateCatalog>> = Lazy::new(|| {
    let catalog = match TemplateCatalog::from_defs(BUILTIN_TEMPLATES) {
        Ok(catalog) => catalog,
        Err(e) => panic!("built-in template catalog is invalid: {e}"),
    };
    Arc::new(catalog)
});

/// Ordered, immutable template list
///
/// Declaration order is the match order: the first template that accepts a body wins.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// The catalog shipped with the crate, compiled once
    pub fn builtin() -> Arc<TemplateCatalog> {
        Arc::clone(&BUILTIN)
    }

    /// Compiles `defs` in order; names must be unique
    pub fn from_defs(defs: &[TemplateDef]) -> Result<Self, ExtractError> {
        let mut seen = HashSet::new();
        let mut templates = Vec::with_capacity(defs.len());

        for def in defs {
            if !seen.insert(def.name) {
                return Err(ExtractError::DuplicateTemplate(def.name.to_string()));
            }
            let template = Template::compile(def).map_err(|e| match e {
                ExtractError::Pattern(re) => ExtractError::TemplatePattern {
                    template: def.name.to_string(),
                    source: re,
                },
                other => other,
            })?;
            templates.push(template);
        }

        Ok(TemplateCatalog { templates })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
