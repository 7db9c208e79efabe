//! Extraction of normalized transactions from bank and card alert emails.
//!
//! A mail-API message goes through body extraction and sanitizing, is matched
//! against an ordered template catalog, and the winning template's fields are
//! turned into a [`ParsedTransaction`] with a UTC timestamp.

pub mod body;
pub mod datetime;
pub mod engine;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod model;
pub mod sanitize;
pub mod serialization;
pub mod template;
pub mod validation;

mod utils;

pub use crate::body::Bodies;
pub use crate::datetime::{DateTimeResolver, FixedTimezone, LocalTimezoneProvider, SystemTimezone, Zone};
pub use crate::engine::{Analysis, DiagnosticsSink, Engine, EngineConfig, TracingDiagnostics};
pub use crate::error::ExtractError;
pub use crate::extract::FoundFields;
pub use crate::matcher::{AcceptancePolicy, BodyVariant, MatchState, MatchTrace};
pub use crate::model::{Header, MessageIds, MessagePart, ParsedTransaction, RawMessage};
pub use crate::serialization::{write_csv, write_json_lines};
pub use crate::template::{Template, TemplateCatalog, TemplateDef, VendorDef, VendorRule};
pub use crate::validation::{ValidationIssue, validate};
