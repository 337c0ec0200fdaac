use async_trait::async_trait;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Gmail's URL-safe base64, which may or may not carry padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The list endpoint caps a page at this many ids.
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Mail API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Failed to decode attachment data: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No Gmail access token configured")]
    MissingToken,
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageId>,
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct MessageId {
    id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub payload: MessagePart,
}

/// One MIME part; the message payload is the root part.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePart {
    pub mime_type: String,
    pub filename: String,
    pub headers: Vec<Header>,
    pub body: PartBody,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartBody {
    pub attachment_id: Option<String>,
    pub size: u64,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AttachmentBody {
    data: String,
}

/// A downloadable attachment found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    pub attachment_id: String,
    pub size: u64,
    pub mime_type: String,
}

impl MessagePart {
    /// First header named `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Every part, at any depth, that has both a filename and an attachment id.
    pub fn attachments(&self) -> Vec<AttachmentRef> {
        let mut found = Vec::new();
        self.collect_attachments(&mut found);
        found
    }

    fn collect_attachments(&self, found: &mut Vec<AttachmentRef>) {
        if let Some(attachment_id) = &self.body.attachment_id {
            if !self.filename.is_empty() {
                found.push(AttachmentRef {
                    filename: self.filename.clone(),
                    attachment_id: attachment_id.clone(),
                    size: self.body.size,
                    mime_type: self.mime_type.clone(),
                });
            }
        }
        for part in &self.parts {
            part.collect_attachments(found);
        }
    }
}

pub fn decode_attachment(data: &str) -> Result<Vec<u8>, MailError> {
    URL_SAFE_LENIENT
        .decode(data.trim())
        .map_err(|e| MailError::Decode(e.to_string()))
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Read-only access to a mailbox.
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Ids of messages matching `query`, at most `max_results`.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, MailError>;

    async fn fetch(&self, message_id: &str) -> Result<Message, MailError>;

    async fn fetch_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, MailError>;
}

/// Gmail REST API client authenticated with an OAuth bearer token.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    api_base: String,
    token: String,
}

impl GmailClient {
    pub fn new(api_base: &str, token: &str) -> Result<Self, MailError> {
        if token.is_empty() {
            return Err(MailError::MissingToken);
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, MailError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api { status: status.as_u16(), message });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MailClient for GmailClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, MailError> {
        let url = format!("{}/messages", self.api_base);
        let mut ids: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;

        while ids.len() < max_results {
            let page_size = (max_results - ids.len()).min(MAX_PAGE_SIZE);
            let mut params = vec![("q", query.to_string()), ("maxResults", page_size.to_string())];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: MessageList = self.get_json(&url, &params).await?;
            debug!(query, count = page.messages.len(), "listed messages");
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        ids.truncate(max_results);
        Ok(ids)
    }

    async fn fetch(&self, message_id: &str) -> Result<Message, MailError> {
        let url = format!("{}/messages/{message_id}", self.api_base);
        self.get_json(&url, &[("format", "full".to_string())]).await
    }

    async fn fetch_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, MailError> {
        let url = format!("{}/messages/{message_id}/attachments/{attachment_id}", self.api_base);
        let body: AttachmentBody = self.get_json(&url, &[]).await?;
        decode_attachment(&body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = r#"{
        "id": "18c2f",
        "payload": {
            "mimeType": "multipart/mixed",
            "headers": [
                {"name": "Subject", "value": "Your HDFC Bank Credit Card Statement"},
                {"name": "From", "value": "HDFC Bank <alerts@hdfcbank.net>"},
                {"name": "Date", "value": "Tue, 14 Oct 2025 10:15:00 +0530"}
            ],
            "body": {"size": 0},
            "parts": [
                {"mimeType": "text/plain", "filename": "", "body": {"size": 12, "data": "aGVsbG8gd29ybGQ"}},
                {
                    "mimeType": "multipart/related",
                    "parts": [
                        {"mimeType": "application/pdf", "filename": "Statement.PDF",
                         "body": {"attachmentId": "att-1", "size": 2048}},
                        {"mimeType": "image/png", "filename": "logo.png",
                         "body": {"attachmentId": "att-2", "size": 64}}
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn message_headers_ignore_case() {
        let msg: Message = serde_json::from_str(MESSAGE).unwrap();
        assert_eq!(msg.id, "18c2f");
        assert_eq!(msg.payload.header("subject"), Some("Your HDFC Bank Credit Card Statement"));
        assert_eq!(msg.payload.header("FROM"), Some("HDFC Bank <alerts@hdfcbank.net>"));
        assert_eq!(msg.payload.header("cc"), None);
    }

    #[test]
    fn attachments_are_collected_recursively() {
        let msg: Message = serde_json::from_str(MESSAGE).unwrap();
        let attachments = msg.payload.attachments();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].filename, "Statement.PDF");
        assert_eq!(attachments[0].attachment_id, "att-1");
        assert_eq!(attachments[0].size, 2048);
        assert_eq!(attachments[1].mime_type, "image/png");
    }

    #[test]
    fn decodes_padded_and_unpadded_url_safe_data() {
        assert_eq!(decode_attachment("aGVsbG8gd29ybGQ").unwrap(), b"hello world");
        assert_eq!(decode_attachment("aGVsbG8gd29ybGQ=").unwrap(), b"hello world");
        assert_eq!(decode_attachment("-_8").unwrap(), vec![0xfb, 0xff]);
        assert!(matches!(decode_attachment("***"), Err(MailError::Decode(_))));
    }

    #[test]
    fn client_requires_token() {
        assert!(matches!(
            GmailClient::new("https://example.invalid", ""),
            Err(MailError::MissingToken)
        ));
        let client = GmailClient::new("https://example.invalid/v1/", "tok").unwrap();
        assert_eq!(client.api_base, "https://example.invalid/v1");
    }
}
