use serde::{Deserialize, Serialize};
use std::fmt;

/// Message as returned by the mail API (`format=full`)
///
/// Only read by the engine, never modified.
/// Identifiers attached by the fetching side (`message_id`, `gmail_id`) are accepted as well.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    /// mail-API message id
    #[serde(default, alias = "gmail_id")]
    pub id: Option<String>,
    /// original Message-ID, if the caller already looked it up
    #[serde(default, alias = "message_id")]
    pub message_id: Option<String>,
    /// receive time in epoch milliseconds, as a string
    #[serde(default)]
    pub internal_date: Option<String>,
    /// root MIME node, carries the envelope headers
    pub payload: MessagePart,
}

impl RawMessage {
    /// Envelope headers in their original order
    pub fn headers(&self) -> &[Header] {
        &self.payload.headers
    }

    /// First header with exactly this name (case-sensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }
}

/// One (name, value) envelope header
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// MIME node of the message tree
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    pub fn is_multipart(&self) -> bool {
        self.mime_type.starts_with("multipart/") || !self.parts.is_empty()
    }
}

/// Body of a MIME node, `data` is base64url
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PartBody {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub data: Option<BodyData>,
}

/// `data` field of a body
///
/// Normally a single string; some upstream responses deliver it chunked as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BodyData {
    Text(String),
    Chunks(Vec<Option<String>>),
}

/// Identifiers copied into the parsed transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageIds {
    /// Message-ID header without angle brackets
    pub message_id: Option<String>,
    /// mail-API id
    pub api_id: String,
}

impl MessageIds {
    pub fn new(message_id: Option<String>, api_id: impl Into<String>) -> Self {
        MessageIds {
            message_id: message_id.map(|id| strip_brackets(&id)),
            api_id: api_id.into(),
        }
    }

    /// Looks up the identifiers on the message itself
    ///
    /// `Message-ID` is matched exactly first, then case-insensitively
    /// (the API sometimes reports it as `Message-Id`).
    pub fn from_message(message: &RawMessage) -> Self {
        let header_id = message
            .header("Message-ID")
            .or_else(|| {
                message
                    .headers()
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case("message-id"))
                    .map(|h| h.value.as_str())
            })
            .map(str::to_string);

        let message_id = message.message_id.clone().or(header_id);
        let api_id = message.id.clone().unwrap_or_default();

        MessageIds::new(message_id, api_id)
    }
}

fn strip_brackets(id: &str) -> String {
    id.trim().trim_start_matches('<').trim_end_matches('>').trim().to_string()
}

/// Transaction extracted from one alert email
///
/// Created once per matched message; `date` is always UTC ISO-8601.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParsedTransaction {
    /// original Message-ID
    pub id: Option<String>,
    /// mail-API id
    pub id_api: String,
    /// name of the template that matched
    pub template_used: String,
    /// account suffix (usually last 4 digits)
    pub account: Option<String>,
    /// merchant, payee or payer
    pub vendor: Option<String>,
    /// signed amount, negative for refunds/credits written as `($x)`
    pub amount: f64,
    /// UTC timestamp, ISO-8601
    pub date: String,
}

impl ParsedTransaction {
    /// Key downstream storage deduplicates on
    pub fn document_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.id_api)
    }
}

impl fmt::Display for ParsedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<25} {:>12.2} {:<6} {} [{}]",
            self.date,
            self.amount,
            self.account.as_deref().unwrap_or(""),
            self.vendor.as_deref().unwrap_or(""),
            self.template_used,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_api_message() {
        let json = r#"{
            "id": "1942a6a83abbf97b",
            "threadId": "1942a6a83abbf97b",
            "internalDate": "1735799613000",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "From", "value": "Chase <no.reply.alerts@chase.com>"},
                    {"name": "Message-Id", "value": "<abc@mail.chase.com>"}
                ],
                "body": {"size": 0},
                "parts": [
                    {"mimeType": "text/plain", "body": {"size": 5, "data": "aGVsbG8"}},
                    {"mimeType": "text/html", "body": {"data": ["PGI-", null, ""]}}
                ]
            }
        }"#;

        let msg: RawMessage = serde_json::from_str(json).unwrap();

        assert_eq!(msg.id.as_deref(), Some("1942a6a83abbf97b"));
        assert_eq!(msg.internal_date.as_deref(), Some("1735799613000"));
        assert!(msg.payload.is_multipart());
        assert_eq!(msg.payload.parts.len(), 2);
        assert_eq!(
            msg.payload.parts[0].body.as_ref().unwrap().data,
            Some(BodyData::Text("aGVsbG8".into()))
        );
        assert!(matches!(
            msg.payload.parts[1].body.as_ref().unwrap().data,
            Some(BodyData::Chunks(_))
        ));
        assert_eq!(msg.header("From"), Some("Chase <no.reply.alerts@chase.com>"));
        assert_eq!(msg.header("from"), None);
    }

    #[test]
    fn message_ids_strip_brackets_and_fall_back_to_case_insensitive_header() {
        let msg = RawMessage {
            id: Some("api-1".into()),
            payload: MessagePart {
                headers: vec![Header::new("Message-Id", " <abc@mail.chase.com> ")],
                ..Default::default()
            },
            ..Default::default()
        };

        let ids = MessageIds::from_message(&msg);

        assert_eq!(ids.message_id.as_deref(), Some("abc@mail.chase.com"));
        assert_eq!(ids.api_id, "api-1");
    }

    #[test]
    fn document_key_prefers_message_id() {
        let mut tx = ParsedTransaction {
            id: Some("abc".into()),
            id_api: "api".into(),
            template_used: "t".into(),
            account: None,
            vendor: Some("v".into()),
            amount: 1.0,
            date: "2025-01-02T06:33:33+00:00".into(),
        };
        assert_eq!(tx.document_key(), "abc");

        tx.id = None;
        assert_eq!(tx.document_key(), "api");
    }
}
