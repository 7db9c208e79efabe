use std::sync::Arc;
use std::{panic, thread};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::body::Bodies;
use crate::datetime::{DateTimeResolver, to_iso_utc};
use crate::error::ExtractError;
use crate::extract::{FoundFields, subject_vendor};
use crate::matcher::{
    AcceptancePolicy, BodyVariant, ExtractionContext, MatchTrace, TemplateMatch, TemplateMatcher,
};
use crate::model::{MessageIds, ParsedTransaction, RawMessage};
use crate::template::TemplateCatalog;
use crate::utils::parse_amount;

/// Phrase from a bank security footer that some templates would otherwise read as a vendor
pub const DEFAULT_VENDOR_BLOCKLIST: &[&str] = &["huntington is legitimate"];

/// Engine settings; immutable once the engine is built
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub acceptance: AcceptancePolicy,
    /// body renditions tried for each template, in order
    pub body_variants: Vec<BodyVariant>,
    /// vendor captures containing one of these (case-insensitive) reject the template
    pub vendor_blocklist: Vec<String>,
    /// characters of the sanitized body logged per message
    pub body_preview_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            acceptance: AcceptancePolicy::default(),
            body_variants: vec![BodyVariant::Sanitized, BodyVariant::Raw],
            vendor_blocklist: DEFAULT_VENDOR_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
            body_preview_chars: 200,
        }
    }
}

impl EngineConfig {
    pub fn with_acceptance(mut self, acceptance: AcceptancePolicy) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_body_variants(mut self, variants: Vec<BodyVariant>) -> Self {
        self.body_variants = variants;
        self
    }

    pub fn with_vendor_blocklist(mut self, phrases: Vec<String>) -> Self {
        self.vendor_blocklist = phrases;
        self
    }

    pub fn with_body_preview_chars(mut self, chars: usize) -> Self {
        self.body_preview_chars = chars;
        self
    }
}

/// Receives errors raised inside single template attempts
///
/// Those errors never fail a message; they only mean the attempt did not match.
pub trait DiagnosticsSink: Send + Sync {
    fn attempt_failed(&self, template: &str, variant: BodyVariant, error: &ExtractError);
}

/// Logs attempt errors at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn attempt_failed(&self, template: &str, variant: BodyVariant, error: &ExtractError) {
        debug!(template, ?variant, error = %error, "template attempt failed");
    }
}

/// Everything known about one message after matching, for diagnosis
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub subject: Option<String>,
    pub from: Option<String>,
    pub date_header: Option<String>,
    pub bodies: Bodies,
    pub trace: MatchTrace,
    pub matched_variant: Option<BodyVariant>,
    pub matched_fields: Option<FoundFields>,
    pub transaction: Option<ParsedTransaction>,
}

/// Alert email -> transaction
///
/// Holds only immutable state, so one engine can serve many threads.
#[derive(Clone)]
pub struct Engine {
    catalog: Arc<TemplateCatalog>,
    resolver: DateTimeResolver,
    config: EngineConfig,
    sink: Arc<dyn DiagnosticsSink>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Built-in catalog, system timezone, default config
    pub fn new() -> Self {
        Engine {
            catalog: TemplateCatalog::builtin(),
            resolver: DateTimeResolver::system(),
            config: EngineConfig::default(),
            sink: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<TemplateCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_resolver(mut self, resolver: DateTimeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses one message, reading its identifiers from the message itself
    pub fn parse_message(&self, message: &RawMessage) -> Option<ParsedTransaction> {
        let ids = MessageIds::from_message(message);
        self.parse_with_ids(message, &ids)
    }

    /// Parses one message with caller-supplied identifiers
    ///
    /// `None` when no template accepts the message, or when the accepted one
    /// yields values that cannot form a transaction (logged as a warning).
    pub fn parse_with_ids(&self, message: &RawMessage, ids: &MessageIds) -> Option<ParsedTransaction> {
        let ctx = ExtractionContext::from_message(message);
        self.log_context(&ctx, ids);

        let matcher = TemplateMatcher::new(&self.catalog, &self.config, self.sink.as_ref());
        let Some(found) = matcher.find_match(&ctx) else {
            debug!(id_api = %ids.api_id, subject = ctx.subject.unwrap_or_default(), "no template matched");
            return None;
        };

        self.finish(&found, &ctx, message, ids)
    }

    /// Like [`parse_message`](Self::parse_message), keeping the bodies and the attempt trace
    pub fn analyze(&self, message: &RawMessage) -> Analysis {
        let ids = MessageIds::from_message(message);
        let ctx = ExtractionContext::from_message(message);
        self.log_context(&ctx, &ids);

        let matcher = TemplateMatcher::new(&self.catalog, &self.config, self.sink.as_ref());
        let (found, trace) = matcher.find_match_traced(&ctx);
        let transaction = found
            .as_ref()
            .and_then(|m| self.finish(m, &ctx, message, &ids));

        Analysis {
            subject: ctx.subject.map(str::to_string),
            from: ctx.from.map(str::to_string),
            date_header: ctx.date_header.map(str::to_string),
            matched_variant: found.as_ref().map(|m| m.variant),
            matched_fields: found.map(|m| m.fields),
            bodies: ctx.bodies,
            trace,
            transaction,
        }
    }

    /// Parses `messages` on up to `threads` scoped threads; results keep input order
    pub fn parse_batch(&self, messages: &[RawMessage], threads: usize) -> Vec<Option<ParsedTransaction>> {
        let threads = threads.max(1);
        if threads == 1 || messages.len() < 2 {
            return messages.iter().map(|m| self.parse_message(m)).collect();
        }

        let chunk_size = messages.len().div_ceil(threads);
        debug!(messages = messages.len(), threads, chunk_size, "parsing batch");

        thread::scope(|scope| {
            let handles: Vec<_> = messages
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || chunk.iter().map(|m| self.parse_message(m)).collect::<Vec<_>>())
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect()
        })
    }

    fn finish(
        &self,
        found: &TemplateMatch<'_>,
        ctx: &ExtractionContext<'_>,
        message: &RawMessage,
        ids: &MessageIds,
    ) -> Option<ParsedTransaction> {
        match self.build_transaction(found, ctx, message, ids) {
            Ok(tx) => {
                info!(
                    template = %tx.template_used,
                    amount = tx.amount,
                    vendor = tx.vendor.as_deref().unwrap_or_default(),
                    account = tx.account.as_deref().unwrap_or_default(),
                    date = %tx.date,
                    "parsed transaction"
                );
                Some(tx)
            }
            Err(e) => {
                warn!(
                    template = found.template.name(),
                    id_api = %ids.api_id,
                    error = %e,
                    "extraction failed for matched template"
                );
                None
            }
        }
    }

    fn build_transaction(
        &self,
        found: &TemplateMatch<'_>,
        ctx: &ExtractionContext<'_>,
        message: &RawMessage,
        ids: &MessageIds,
    ) -> Result<ParsedTransaction, ExtractError> {
        let fields = &found.fields;

        let raw_amount = fields.amount.as_deref().ok_or(ExtractError::MissingField("amount"))?;
        let amount = parse_amount(raw_amount)?;

        let vendor = fields
            .vendor
            .clone()
            .or_else(|| ctx.subject.and_then(|s| subject_vendor(found.template, s)));
        let account = fields.account.clone();
        if account.is_none() && vendor.is_none() {
            return Err(ExtractError::MissingField("account or vendor"));
        }

        Ok(ParsedTransaction {
            id: ids.message_id.clone(),
            id_api: ids.api_id.clone(),
            template_used: found.template.name().to_string(),
            account,
            vendor,
            amount,
            date: self.resolve_date(fields.date.as_deref(), ctx, message),
        })
    }

    /// Scraped date, then envelope `Date`, then `internalDate`, then now
    fn resolve_date(&self, scraped: Option<&str>, ctx: &ExtractionContext<'_>, message: &RawMessage) -> String {
        match self.resolver.try_resolve(scraped, ctx.date_header) {
            Ok(date) => return to_iso_utc(date),
            Err(e) if scraped.is_some() => debug!(error = %e, "scraped date unusable, falling back to envelope"),
            Err(e) => debug!(error = %e, "no envelope date"),
        }

        self.resolver
            .resolve(None, ctx.date_header)
            .or_else(|| internal_date(message))
            .unwrap_or_else(|| {
                warn!(id_api = message.id.as_deref().unwrap_or_default(), "no usable date, using current time");
                to_iso_utc(Utc::now())
            })
    }

    fn log_context(&self, ctx: &ExtractionContext<'_>, ids: &MessageIds) {
        let preview: String = ctx.bodies.sanitized.chars().take(self.config.body_preview_chars).collect();
        debug!(
            id_api = %ids.api_id,
            message_id = ids.message_id.as_deref().unwrap_or_default(),
            subject = ctx.subject.unwrap_or_default(),
            from = ctx.from.unwrap_or_default(),
            preview = %preview,
            "parsing message"
        );
    }
}

/// `internalDate` (epoch milliseconds as text) rendered as UTC
fn internal_date(message: &RawMessage) -> Option<String> {
    let millis: i64 = message.internal_date.as_deref()?.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis).map(to_iso_utc)
}
