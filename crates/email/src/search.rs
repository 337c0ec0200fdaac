use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::{info, warn};

use expensetrend_core::{Bank, BankProfile};

use crate::gmail::{AttachmentRef, MailClient, MailError};

/// A statement email with at least one PDF attachment.
#[derive(Debug, Clone)]
pub struct StatementEmail {
    pub message_id: String,
    pub bank: Bank,
    pub subject: String,
    pub sender: String,
    pub received: DateTime<FixedOffset>,
    /// PDF attachments only.
    pub attachments: Vec<AttachmentRef>,
}

/// The bank's search query narrowed to `[since, until)`.
pub fn statement_query(
    profile: &BankProfile,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
) -> String {
    let mut query = profile.search_query.to_string();
    if let Some(since) = since {
        query.push_str(&format!(" after:{}", since.format("%Y/%m/%d")));
    }
    if let Some(until) = until {
        query.push_str(&format!(" before:{}", until.format("%Y/%m/%d")));
    }
    query
}

/// RFC 2822 `Date` header, tolerating a trailing `(TZ)` comment.
pub fn parse_message_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    let without_comment = match raw.rfind(" (") {
        Some(idx) if raw.ends_with(')') => &raw[..idx],
        _ => raw,
    };
    DateTime::parse_from_rfc2822(without_comment.trim()).ok()
}

pub struct StatementSearcher<C: MailClient> {
    client: C,
}

impl<C: MailClient> StatementSearcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Statement emails for `bank`, or for every supported bank when `None`.
    /// Banks without a mail profile are skipped, as is any message that
    /// fails to load.
    pub async fn search(
        &self,
        bank: Option<&Bank>,
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
        max_results: usize,
    ) -> Result<Vec<StatementEmail>, MailError> {
        let banks: Vec<Bank> = match bank {
            Some(bank) => vec![bank.clone()],
            None => Bank::SUPPORTED.to_vec(),
        };

        let mut results = Vec::new();
        for bank in banks {
            let Some(profile) = bank.profile() else {
                warn!(bank = bank.key(), "no mail search profile for bank");
                continue;
            };

            let query = statement_query(profile, since, until);
            let ids = self.client.search(&query, max_results).await?;
            info!(bank = profile.name, count = ids.len(), "found statement emails");

            for id in ids {
                match self.load(&id, &bank).await {
                    Ok(Some(email)) => results.push(email),
                    Ok(None) => {}
                    Err(e) => warn!(message_id = %id, error = %e, "failed to read message"),
                }
            }
        }
        Ok(results)
    }

    async fn load(&self, message_id: &str, bank: &Bank) -> Result<Option<StatementEmail>, MailError> {
        let message = self.client.fetch(message_id).await?;
        let payload = &message.payload;

        let attachments: Vec<AttachmentRef> = payload
            .attachments()
            .into_iter()
            .filter(|a| a.filename.to_lowercase().ends_with(".pdf"))
            .collect();
        if attachments.is_empty() {
            return Ok(None);
        }

        let received = payload
            .header("date")
            .and_then(parse_message_date)
            .unwrap_or_else(|| Utc::now().fixed_offset());

        Ok(Some(StatementEmail {
            message_id: message_id.to_string(),
            bank: bank.clone(),
            subject: payload.header("subject").unwrap_or_default().to_string(),
            sender: payload.header("from").unwrap_or_default().to_string(),
            received,
            attachments,
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gmail::Message;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory mailbox keyed by search query.
    #[derive(Default)]
    pub(crate) struct FakeMail {
        pub results: HashMap<String, Vec<String>>,
        pub messages: HashMap<String, String>,
        pub attachments: HashMap<(String, String), Vec<u8>>,
        pub queries: Mutex<Vec<String>>,
        pub attachment_calls: Mutex<usize>,
    }

    #[async_trait]
    impl MailClient for FakeMail {
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, MailError> {
            self.queries.lock().unwrap().push(query.to_string());
            let mut ids = self.results.get(query).cloned().unwrap_or_default();
            ids.truncate(max_results);
            Ok(ids)
        }

        async fn fetch(&self, message_id: &str) -> Result<Message, MailError> {
            let json = self.messages.get(message_id).ok_or_else(|| MailError::Api {
                status: 404,
                message: "Requested entity was not found.".to_string(),
            })?;
            Ok(serde_json::from_str(json).unwrap())
        }

        async fn fetch_attachment(
            &self,
            message_id: &str,
            attachment_id: &str,
        ) -> Result<Vec<u8>, MailError> {
            *self.attachment_calls.lock().unwrap() += 1;
            self.attachments
                .get(&(message_id.to_string(), attachment_id.to_string()))
                .cloned()
                .ok_or_else(|| MailError::Api { status: 404, message: "missing".to_string() })
        }
    }

    pub(crate) fn message_json(id: &str, date: &str, filenames: &[&str]) -> String {
        let parts: Vec<String> = filenames
            .iter()
            .enumerate()
            .map(|(i, name)| {
                format!(
                    r#"{{"mimeType": "application/octet-stream", "filename": "{name}", "body": {{"attachmentId": "a{i}", "size": 10}}}}"#
                )
            })
            .collect();
        format!(
            r#"{{"id": "{id}", "payload": {{"headers": [
                {{"name": "Subject", "value": "Statement {id}"}},
                {{"name": "From", "value": "statements@sbicard.com"}},
                {{"name": "Date", "value": "{date}"}}
            ], "parts": [{}]}}}}"#,
            parts.join(",")
        )
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn query_appends_date_bounds() {
        let profile = Bank::Hdfc.profile().unwrap();
        assert_eq!(statement_query(profile, None, None), profile.search_query);
        assert_eq!(
            statement_query(profile, Some(d(2025, 1, 5)), Some(d(2025, 12, 31))),
            format!("{} after:2025/01/05 before:2025/12/31", profile.search_query)
        );
    }

    #[test]
    fn message_dates() {
        let dt = parse_message_date("Tue, 14 Oct 2025 10:15:00 +0530").unwrap();
        assert_eq!(dt.format("%Y%m%d").to_string(), "20251014");
        let dt = parse_message_date("Wed, 1 Jan 2025 09:00:00 +0000 (UTC)").unwrap();
        assert_eq!(dt.format("%Y%m%d").to_string(), "20250101");
        assert!(parse_message_date("yesterday").is_none());
    }

    #[tokio::test]
    async fn keeps_only_messages_with_pdfs() {
        let sbi = Bank::Sbi.profile().unwrap();
        let mut mail = FakeMail::default();
        mail.results.insert(
            sbi.search_query.to_string(),
            vec!["m1".into(), "m2".into(), "missing".into()],
        );
        mail.messages.insert(
            "m1".into(),
            message_json("m1", "Tue, 14 Oct 2025 10:15:00 +0530", &["Statement.PDF", "terms.html"]),
        );
        mail.messages.insert(
            "m2".into(),
            message_json("m2", "Tue, 14 Oct 2025 10:15:00 +0530", &["offer.jpg"]),
        );

        let searcher = StatementSearcher::new(mail);
        let found = searcher.search(Some(&Bank::Sbi), None, None, 100).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message_id, "m1");
        assert_eq!(found[0].bank, Bank::Sbi);
        assert_eq!(found[0].subject, "Statement m1");
        assert_eq!(found[0].sender, "statements@sbicard.com");
        assert_eq!(found[0].attachments.len(), 1);
        assert_eq!(found[0].attachments[0].filename, "Statement.PDF");
    }

    #[tokio::test]
    async fn all_supported_banks_searched_when_unspecified() {
        let searcher = StatementSearcher::new(FakeMail::default());
        let found = searcher
            .search(None, Some(d(2025, 6, 1)), None, 10)
            .await
            .unwrap();
        assert!(found.is_empty());
        let queries = searcher.client.queries.lock().unwrap().clone();
        assert_eq!(queries.len(), 3);
        assert!(queries.iter().all(|q| q.ends_with(" after:2025/06/01")));
        assert!(queries[0].contains("hdfcbank.net"));
    }

    #[tokio::test]
    async fn unknown_bank_is_skipped() {
        let searcher = StatementSearcher::new(FakeMail::default());
        let found = searcher
            .search(Some(&Bank::from_key("icici")), None, None, 10)
            .await
            .unwrap();
        assert!(found.is_empty());
        assert!(searcher.client.queries.lock().unwrap().is_empty());
    }
}
