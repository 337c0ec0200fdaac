use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::gmail::{AttachmentRef, MailClient, MailError};
use crate::search::StatementEmail;

/// `<BANK>_<YYYYMMDD>_<filename>` with every character outside
/// `[A-Za-z0-9_.-]` in the attachment filename replaced by `_`.
pub fn statement_filename(email: &StatementEmail, attachment: &AttachmentRef) -> String {
    let safe: String = attachment
        .filename
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') { c } else { '_' })
        .collect();
    format!(
        "{}_{}_{}",
        email.bank.key().to_uppercase(),
        email.received.format("%Y%m%d"),
        safe
    )
}

/// Saves statement attachments under one directory.
pub struct AttachmentDownloader<C: MailClient> {
    client: C,
    dir: PathBuf,
}

impl<C: MailClient> AttachmentDownloader<C> {
    pub fn new(client: C, dir: impl Into<PathBuf>) -> Self {
        Self { client, dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of the email's statements on disk. Existing files are reused.
    /// A dry run writes nothing and returns only files already present.
    pub async fn download(
        &self,
        email: &StatementEmail,
        dry_run: bool,
    ) -> Result<Vec<PathBuf>, MailError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut saved = Vec::new();
        for attachment in &email.attachments {
            let filename = statement_filename(email, attachment);
            let path = self.dir.join(&filename);

            if tokio::fs::try_exists(&path).await? {
                info!(file = %filename, "already downloaded");
                saved.push(path);
                continue;
            }
            if dry_run {
                info!(file = %filename, "would download");
                continue;
            }

            match self.fetch_to(&email.message_id, attachment, &path).await {
                Ok(()) => {
                    info!(file = %filename, "downloaded");
                    saved.push(path);
                }
                Err(e) => warn!(file = %filename, error = %e, "failed to download attachment"),
            }
        }
        Ok(saved)
    }

    async fn fetch_to(
        &self,
        message_id: &str,
        attachment: &AttachmentRef,
        path: &Path,
    ) -> Result<(), MailError> {
        let bytes = self
            .client
            .fetch_attachment(message_id, &attachment.attachment_id)
            .await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tests::FakeMail;
    use chrono::DateTime;
    use expensetrend_core::Bank;

    fn attachment(filename: &str, id: &str) -> AttachmentRef {
        AttachmentRef {
            filename: filename.to_string(),
            attachment_id: id.to_string(),
            size: 10,
            mime_type: "application/pdf".to_string(),
        }
    }

    fn email(attachments: Vec<AttachmentRef>) -> StatementEmail {
        StatementEmail {
            message_id: "m1".to_string(),
            bank: Bank::Hdfc,
            subject: "Statement".to_string(),
            sender: "alerts@hdfcbank.net".to_string(),
            received: DateTime::parse_from_rfc2822("Tue, 14 Oct 2025 10:15:00 +0530").unwrap(),
            attachments,
        }
    }

    #[test]
    fn filename_is_prefixed_and_sanitized() {
        let e = email(vec![]);
        assert_eq!(
            statement_filename(&e, &attachment("Card Statement (Oct).pdf", "a")),
            "HDFC_20251014_Card_Statement__Oct_.pdf"
        );
        assert_eq!(
            statement_filename(&e, &attachment("estmt_4111-xx.PDF", "a")),
            "HDFC_20251014_estmt_4111-xx.PDF"
        );
    }

    #[tokio::test]
    async fn downloads_and_reuses_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut mail = FakeMail::default();
        mail.attachments.insert(("m1".into(), "a1".into()), b"%PDF-1.4 one".to_vec());
        let downloader = AttachmentDownloader::new(mail, dir.path().join("statements"));
        let e = email(vec![attachment("one.pdf", "a1")]);

        let first = downloader.download(&e, false).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(std::fs::read(&first[0]).unwrap(), b"%PDF-1.4 one");

        let second = downloader.download(&e, false).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(*downloader.client.attachment_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = AttachmentDownloader::new(FakeMail::default(), dir.path());
        let saved = downloader
            .download(&email(vec![attachment("one.pdf", "a1")]), true)
            .await
            .unwrap();
        assert!(saved.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(*downloader.client.attachment_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_attachment_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let mut mail = FakeMail::default();
        mail.attachments.insert(("m1".into(), "a2".into()), b"%PDF two".to_vec());
        let downloader = AttachmentDownloader::new(mail, dir.path());
        let saved = downloader
            .download(&email(vec![attachment("one.pdf", "a1"), attachment("two.pdf", "a2")]), false)
            .await
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].ends_with("HDFC_20251014_two.pdf"));
    }
}
