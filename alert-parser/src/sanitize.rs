//! HTML body → plain text.
//!
//! Step order matters: quoted-printable soft breaks are undone before any tag
//! is touched, and entities are decoded only after whitespace is collapsed.

use lazy_regex::regex;
use quoted_printable::ParseMode;
use tracing::warn;

use crate::utils::squash_whitespace;

/// Full pipeline: quoted-printable decode, then [`sanitize_decoded`]
pub fn sanitize(raw_body: &str) -> String {
    sanitize_decoded(&decode_quoted_printable(raw_body))
}

/// Undoes quoted-printable encoding when the text carries its markers
///
/// Bodies the mail API already decoded are returned unchanged, so `width=100`
/// in plain HTML is never mistaken for an escape.
pub fn decode_quoted_printable(input: &str) -> String {
    if !looks_quoted_printable(input) {
        return input.to_string();
    }

    match quoted_printable::decode(input.as_bytes(), ParseMode::Robust) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(error = %e, "quoted-printable decode failed, keeping body as is");
            input.to_string()
        }
    }
}

fn looks_quoted_printable(input: &str) -> bool {
    regex!(r"=\r?\n|=3D|=20|=[0-9A-F]{2}=[0-9A-F]{2}").is_match(input)
}

/// Sanitizes an already decoded body (steps 2..8)
pub fn sanitize_decoded(body: &str) -> String {
    let body = regex!(r"(?is)<script\b[^>]*>.*?</script\s*>").replace_all(body, "");
    let body = regex!(r"(?is)<style\b[^>]*>.*?</style\s*>").replace_all(&body, "");
    let body = regex!(r"(?s)<!--.*?-->").replace_all(&body, "");
    // a space, not nothing: "Amount</td><td>$5" must not glue the words
    let body = regex!(r"<[^>]+>").replace_all(&body, " ");
    let body = squash_whitespace(&body);
    let body = html_escape::decode_html_entities(&body);

    strip_residue(&body)
}

/// Drops undecodable entities and anything outside printable ASCII
///
/// Non-breaking spaces become plain spaces first so the words they separate stay apart.
fn strip_residue(text: &str) -> String {
    let text = regex!(r"&#?[A-Za-z0-9]{1,10};").replace_all(text, "");
    let printable: String = text
        .chars()
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .filter(|c| c.is_ascii_graphic() || *c == ' ' || *c == '\n')
        .collect();

    regex!(r" {2,}").replace_all(&printable, " ").trim().to_string()
}

/// Text of one table cell: inner tags removed, entities decoded, whitespace squashed
pub(crate) fn cell_text(inner_html: &str) -> String {
    let text = regex!(r"<[^>]+>").replace_all(inner_html, " ");
    let text = squash_whitespace(&text);
    strip_residue(&html_escape::decode_html_entities(&text))
}
