//! Template selection.
//!
//! Every template is tried in catalog order. A template whose sender or subject
//! filter rejects the envelope is skipped; otherwise its field rules are probed
//! against each configured body variant, and the first accepted probe wins.

use serde::Serialize;
use tracing::debug;

use crate::body::Bodies;
use crate::engine::{DiagnosticsSink, EngineConfig};
use crate::error::ExtractError;
use crate::extract::{FoundFields, date_value, extract_fields};
use crate::model::{Header, RawMessage};
use crate::template::{Template, TemplateCatalog};

/// Which rendition of the body a probe ran against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BodyVariant {
    Sanitized,
    Raw,
}

/// Which found fields make a probe acceptable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AcceptancePolicy {
    /// amount plus account or vendor; the date never gates
    #[default]
    AnyIdentifier,
    /// amount, account and vendor, plus the date when the template declares a date pattern
    AllFields,
}

impl AcceptancePolicy {
    /// A paired table needs only its amount
    pub fn accepts(self, fields: &FoundFields, date_required: bool) -> bool {
        if fields.from_table {
            return fields.amount.is_some();
        }

        match self {
            AcceptancePolicy::AnyIdentifier => {
                fields.amount.is_some() && (fields.account.is_some() || fields.vendor.is_some())
            }
            AcceptancePolicy::AllFields => fields.missing(date_required).is_empty(),
        }
    }
}

/// Where the matcher stands for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MatchState {
    #[default]
    NoMatch,
    FilteredOut,
    FieldProbe,
    Matched,
    Exhausted,
}

/// Everything the matcher reads from one message
///
/// Built per call and dropped afterwards.
#[derive(Debug, Clone)]
pub struct ExtractionContext<'m> {
    pub subject: Option<&'m str>,
    pub from: Option<&'m str>,
    pub date_header: Option<&'m str>,
    pub headers: &'m [Header],
    pub bodies: Bodies,
}

impl<'m> ExtractionContext<'m> {
    pub fn from_message(message: &'m RawMessage) -> Self {
        ExtractionContext {
            subject: message.header("Subject"),
            from: message.header("From"),
            date_header: message.header("Date"),
            headers: message.headers(),
            bodies: Bodies::extract(&message.payload),
        }
    }

    pub fn body(&self, variant: BodyVariant) -> &str {
        match variant {
            BodyVariant::Sanitized => &self.bodies.sanitized,
            BodyVariant::Raw => &self.bodies.raw,
        }
    }
}

/// Accepted template together with what it found
#[derive(Debug, Clone)]
pub struct TemplateMatch<'c> {
    pub template: &'c Template,
    pub variant: BodyVariant,
    pub fields: FoundFields,
}

/// What happened to one template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// sender or subject filter rejected the envelope
    FilteredOut { filter: &'static str },
    /// fields were probed; `accepted` tells whether the probe satisfied the policy
    Probed {
        variant: BodyVariant,
        fields: FoundFields,
        accepted: bool,
    },
    /// vendor capture hit the blocklist
    BlockedVendor { variant: BodyVariant, vendor: String },
    /// the probe raised an error
    Failed { variant: BodyVariant, error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub template: String,
    pub outcome: AttemptOutcome,
}

/// Record of every attempt made for one message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchTrace {
    pub attempts: Vec<AttemptRecord>,
    pub winner: Option<String>,
    pub state: MatchState,
}

impl MatchTrace {
    fn push(&mut self, template: &Template, outcome: AttemptOutcome) {
        self.attempts.push(AttemptRecord {
            template: template.name().to_string(),
            outcome,
        });
    }
}

/// Walks the catalog for one message
pub struct TemplateMatcher<'a> {
    catalog: &'a TemplateCatalog,
    config: &'a EngineConfig,
    sink: &'a dyn DiagnosticsSink,
}

impl<'a> TemplateMatcher<'a> {
    pub fn new(catalog: &'a TemplateCatalog, config: &'a EngineConfig, sink: &'a dyn DiagnosticsSink) -> Self {
        TemplateMatcher { catalog, config, sink }
    }

    /// First template accepting the message, in catalog order
    pub fn find_match(&self, ctx: &ExtractionContext<'_>) -> Option<TemplateMatch<'a>> {
        self.run(ctx, None)
    }

    /// Same as [`find_match`](Self::find_match), recording every attempt
    pub fn find_match_traced(&self, ctx: &ExtractionContext<'_>) -> (Option<TemplateMatch<'a>>, MatchTrace) {
        let mut trace = MatchTrace::default();
        let found = self.run(ctx, Some(&mut trace));
        (found, trace)
    }

    fn run(&self, ctx: &ExtractionContext<'_>, mut trace: Option<&mut MatchTrace>) -> Option<TemplateMatch<'a>> {
        let mut state = MatchState::NoMatch;

        for template in self.catalog.iter() {
            if let Some(filter) = filter_reason(template, ctx) {
                state = MatchState::FilteredOut;
                debug!(template = template.name(), filter, "template filtered out");
                if let Some(t) = trace.as_deref_mut() {
                    t.push(template, AttemptOutcome::FilteredOut { filter });
                }
                continue;
            }

            state = MatchState::FieldProbe;
            for &variant in &self.config.body_variants {
                let body = ctx.body(variant);
                if body.is_empty() {
                    continue;
                }

                match self.probe(template, variant, body, trace.as_deref_mut()) {
                    Ok(Some(mut fields)) => {
                        debug!(template = template.name(), ?variant, "template matched");
                        if fields.date.is_none() {
                            fields.date = self.date_from_other_variants(template, variant, ctx);
                        }
                        if let Some(t) = trace.as_deref_mut() {
                            t.winner = Some(template.name().to_string());
                            t.state = MatchState::Matched;
                        }
                        return Some(TemplateMatch { template, variant, fields });
                    }
                    Ok(None) => {}
                    Err(e) => {
                        self.sink.attempt_failed(template.name(), variant, &e);
                        if let Some(t) = trace.as_deref_mut() {
                            t.push(
                                template,
                                AttemptOutcome::Failed {
                                    variant,
                                    error: e.to_string(),
                                },
                            );
                        }
                    }
                }
            }
        }

        debug!(last_state = ?state, "catalog exhausted");
        if let Some(t) = trace {
            t.state = MatchState::Exhausted;
        }
        None
    }

    /// One template against one body
    ///
    /// `Ok(None)` means the template does not apply to this body.
    fn probe(
        &self,
        template: &Template,
        variant: BodyVariant,
        body: &str,
        trace: Option<&mut MatchTrace>,
    ) -> Result<Option<FoundFields>, ExtractError> {
        let fields = extract_fields(template, body)?;

        if let Some(vendor) = fields.vendor.as_deref().filter(|v| self.is_blocked(v)) {
            debug!(template = template.name(), vendor, "vendor on blocklist");
            if let Some(t) = trace {
                t.push(
                    template,
                    AttemptOutcome::BlockedVendor {
                        variant,
                        vendor: vendor.to_string(),
                    },
                );
            }
            return Ok(None);
        }

        let accepted = self.config.acceptance.accepts(&fields, template.date_required());
        debug!(
            template = template.name(),
            ?variant,
            amount = fields.amount.is_some(),
            account = fields.account.is_some(),
            vendor = fields.vendor.is_some(),
            date = fields.date.is_some(),
            accepted,
            "probed fields"
        );
        if let Some(t) = trace {
            t.push(
                template,
                AttemptOutcome::Probed {
                    variant,
                    fields: fields.clone(),
                    accepted,
                },
            );
        }

        Ok(accepted.then_some(fields))
    }

    /// Date pattern of an accepted template, run on the variants the probe did not use
    ///
    /// Patterns anchored on markup only find the date in the raw body.
    fn date_from_other_variants(
        &self,
        template: &Template,
        accepted: BodyVariant,
        ctx: &ExtractionContext<'_>,
    ) -> Option<String> {
        template.date()?;

        let date = self
            .config
            .body_variants
            .iter()
            .filter(|&&v| v != accepted)
            .find_map(|&v| date_value(template, ctx.body(v)));
        if date.is_some() {
            debug!(template = template.name(), "date taken from another body variant");
        }
        date
    }

    fn is_blocked(&self, vendor: &str) -> bool {
        let vendor = vendor.to_lowercase();
        self.config
            .vendor_blocklist
            .iter()
            .any(|phrase| vendor.contains(&phrase.to_lowercase()))
    }
}

fn filter_reason(template: &Template, ctx: &ExtractionContext<'_>) -> Option<&'static str> {
    if !template.accepts_sender(ctx.from) {
        return Some("email_from");
    }
    if !template.accepts_subject(ctx.subject) {
        return Some("subject_pattern");
    }
    None
}
