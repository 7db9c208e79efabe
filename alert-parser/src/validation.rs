use chrono::DateTime;
use serde::Serialize;
use thiserror::Error;

use crate::model::ParsedTransaction;

/// One rule a transaction breaks before it may be stored
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ValidationIssue {
    #[error("amount is not a finite number")]
    NonFiniteAmount,
    #[error("amount cannot be zero")]
    ZeroAmount,
    #[error("invalid date format, expected ISO-8601 with offset: {0}")]
    InvalidDate(String),
    #[error("date is not UTC: {0}")]
    NotUtc(String),
    #[error("vendor is present but empty")]
    EmptyVendor,
    #[error("account is present but empty")]
    EmptyAccount,
    #[error("neither account nor vendor is present")]
    NoIdentifier,
    #[error("mail-API id cannot be empty")]
    EmptyApiId,
    #[error("template name cannot be empty")]
    EmptyTemplate,
}

/// Checks `tx` against the storage rules and reports every violation
pub fn validate(tx: &ParsedTransaction) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if !tx.amount.is_finite() {
        issues.push(ValidationIssue::NonFiniteAmount);
    } else if tx.amount == 0.0 {
        issues.push(ValidationIssue::ZeroAmount);
    }

    match DateTime::parse_from_rfc3339(&tx.date) {
        Ok(dt) if dt.offset().local_minus_utc() != 0 => issues.push(ValidationIssue::NotUtc(tx.date.clone())),
        Ok(_) => {}
        Err(_) => issues.push(ValidationIssue::InvalidDate(tx.date.clone())),
    }

    if tx.vendor.as_deref().is_some_and(|v| v.trim().is_empty()) {
        issues.push(ValidationIssue::EmptyVendor);
    }
    if tx.account.as_deref().is_some_and(|a| a.trim().is_empty()) {
        issues.push(ValidationIssue::EmptyAccount);
    }
    if tx.account.is_none() && tx.vendor.is_none() {
        issues.push(ValidationIssue::NoIdentifier);
    }
    if tx.id_api.trim().is_empty() {
        issues.push(ValidationIssue::EmptyApiId);
    }
    if tx.template_used.trim().is_empty() {
        issues.push(ValidationIssue::EmptyTemplate);
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
}
