use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::ExtractError;
use crate::model::{BodyData, MessagePart};

/// base64url as the mail API writes it: padding optional
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Collects leaves (nodes without children) with the given MIME type, depth-first, in order
pub(super) fn collect_leaves<'a>(
    part: &'a MessagePart,
    mime_type: &str,
    out: &mut Vec<&'a MessagePart>,
) {
    if part.parts.is_empty() {
        if part.mime_type.eq_ignore_ascii_case(mime_type) {
            out.push(part);
        }
        return;
    }

    for child in &part.parts {
        collect_leaves(child, mime_type, out);
    }
}

/// Joins a chunked `data` field; empty and null chunks are skipped
pub(super) fn join_data(data: &BodyData) -> String {
    match data {
        BodyData::Text(s) => s.clone(),
        BodyData::Chunks(chunks) => chunks
            .iter()
            .flatten()
            .filter(|c| !c.trim().is_empty())
            .map(String::as_str)
            .collect(),
    }
}

/// Decodes base64url body data into text
///
/// Whitespace inside the data is ignored; standard-alphabet input is accepted too.
/// Invalid UTF-8 is replaced rather than rejected.
pub(super) fn decode_body_data(data: &str) -> Result<String, ExtractError> {
    let normalized: String = data
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    if normalized.is_empty() {
        return Ok(String::new());
    }

    let bytes = URL_SAFE_LENIENT.decode(normalized.as_bytes())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
