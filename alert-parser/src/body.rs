mod utils;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::MessagePart;
use crate::sanitize::{decode_quoted_printable, sanitize_decoded};
use utils::*;

const HTML: &str = "text/html";
const PLAIN: &str = "text/plain";

/// Both renditions of a message body
///
/// Table templates need the markup, sentence templates match better on plain text,
/// so both are always computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bodies {
    /// tags, scripts and entities removed, whitespace collapsed
    pub sanitized: String,
    /// decoded (base64 + quoted-printable) but otherwise untouched
    pub raw: String,
}

impl Bodies {
    /// Recovers the body text of a mail-API payload
    ///
    /// Every `text/html` leaf is decoded and the fragments are joined with a blank line,
    /// since a field may live in one part and the amount in another.
    /// Without HTML the first `text/plain` leaf is used, then the top-level body.
    /// A part that fails to decode contributes an empty fragment.
    pub fn extract(payload: &MessagePart) -> Self {
        let joined = raw_text(payload);
        let raw = decode_quoted_printable(&joined);
        let sanitized = sanitize_decoded(&raw);

        Bodies { sanitized, raw }
    }
}

fn raw_text(payload: &MessagePart) -> String {
    let mut html_parts = Vec::new();
    collect_leaves(payload, HTML, &mut html_parts);

    if !html_parts.is_empty() {
        debug!(parts = html_parts.len(), "using html parts");
        return html_parts
            .iter()
            .map(|part| part_text(part))
            .collect::<Vec<_>>()
            .join("\n\n");
    }

    let mut plain_parts = Vec::new();
    collect_leaves(payload, PLAIN, &mut plain_parts);
    if let Some(part) = plain_parts.first() {
        debug!("no html part, using text/plain");
        return part_text(part);
    }

    if !payload.is_multipart() {
        return part_text(payload);
    }

    debug!(mime_type = %payload.mime_type, "no usable body part");
    String::new()
}

fn part_text(part: &MessagePart) -> String {
    let Some(data) = part.body.as_ref().and_then(|b| b.data.as_ref()) else {
        return String::new();
    };

    let encoded = join_data(data);
    match decode_body_data(&encoded) {
        Ok(text) => text,
        Err(e) => {
            warn!(mime_type = %part.mime_type, error = %e, "failed to decode body part");
            String::new()
        }
    }
}
