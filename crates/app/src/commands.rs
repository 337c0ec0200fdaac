use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use expensetrend_core::{AppConfig, Bank, BankCredentials, BANK_PROFILES};
use expensetrend_email::{AttachmentDownloader, GmailClient, MailError, StatementSearcher};
use expensetrend_import::StatementPipeline;
use expensetrend_pdf::{LopdfBackend, PdfBackend};
use expensetrend_storage::{ExpenseStore, SqliteStore};

pub fn list_banks() -> Result<()> {
    println!("Supported banks:");
    for profile in BANK_PROFILES {
        println!("  {}: {}", profile.key, profile.name);
    }
    Ok(())
}

async fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    if let Some(parent) = config.database.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    SqliteStore::open(&config.database)
        .await
        .with_context(|| format!("opening database {}", config.database.display()))
}

async fn flush(store: &dyn ExpenseStore) -> Result<()> {
    let deleted = store.delete_all().await.context("flushing stored transactions")?;
    info!(deleted, "flushed existing records");
    Ok(())
}

fn requested_banks(bank: Option<&str>) -> Vec<Bank> {
    match bank {
        Some(key) => vec![Bank::from_key(key)],
        None => Bank::SUPPORTED.to_vec(),
    }
}

/// Bank named in the filename, else `fallback`, else HDFC.
pub fn bank_for_pdf(path: &Path, fallback: Option<&str>) -> Bank {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(Bank::detect_from_filename)
        .or_else(|| fallback.map(Bank::from_key))
        .unwrap_or(Bank::Hdfc)
}

/// Downloaded statements for `bank` in `dir` (`<BANK>_*.pdf`), sorted by name.
pub fn statement_files(dir: &Path, bank: &Bank) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let prefix = format!("{}_", bank.key().to_uppercase());
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".pdf"));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse each file and store what it yields. Statements that produce nothing
/// are reported by the pipeline and skipped.
pub async fn save_statements<P: PdfBackend>(
    pipeline: &StatementPipeline<P>,
    store: &dyn ExpenseStore,
    bank: &Bank,
    files: &[PathBuf],
    credentials: &BankCredentials,
) -> Result<u64> {
    let mut total = 0;
    for file in files {
        let parsed = pipeline.parse_file(bank, file, credentials);
        if parsed.items.is_empty() {
            continue;
        }
        let saved = store
            .insert_many(&parsed.items)
            .await
            .with_context(|| format!("saving transactions from {}", file.display()))?;
        info!(file = %file.display(), saved, "saved transactions");
        total += saved;
    }
    Ok(total)
}

#[derive(Debug)]
pub struct DownloadOptions {
    pub bank: Option<String>,
    pub since: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub max_results: usize,
    pub dry_run: bool,
    pub parse: bool,
    pub flush: bool,
}

pub async fn download(config: &AppConfig, opts: DownloadOptions) -> Result<()> {
    let token = config
        .gmail_token()
        .ok_or(MailError::MissingToken)
        .context("set [gmail] access_token or EXPENSETREND_GMAIL_TOKEN")?;
    let client = GmailClient::new(&config.gmail.api_base, &token)?;
    let searcher = StatementSearcher::new(client.clone());
    let downloader = AttachmentDownloader::new(client, &config.statements_dir);

    let store = if opts.parse { Some(open_store(config).await?) } else { None };
    if let (Some(store), true) = (&store, opts.flush) {
        flush(store).await?;
    }

    let bank = opts.bank.as_deref().map(Bank::from_key);
    let emails = searcher
        .search(bank.as_ref(), opts.since, opts.to, opts.max_results)
        .await
        .context("searching for statement emails")?;
    info!(count = emails.len(), "found emails with PDF attachments");

    let credentials = config.credentials();
    let pipeline = StatementPipeline::new(LopdfBackend::new());
    let mut total = 0;

    for email in &emails {
        info!(
            subject = %email.subject,
            bank = email.bank.key(),
            date = %email.received.format("%Y-%m-%d"),
            "processing statement email"
        );
        let files = downloader.download(email, opts.dry_run).await?;

        if let (Some(store), false) = (&store, opts.dry_run) {
            total += save_statements(&pipeline, store, &email.bank, &files, &credentials).await?;
        }
    }

    if store.is_some() {
        info!(total, "transactions saved");
    }
    Ok(())
}

pub async fn parse(
    config: &AppConfig,
    bank: Option<String>,
    pdf: Option<PathBuf>,
    flush_first: bool,
) -> Result<()> {
    let store = open_store(config).await?;
    if flush_first {
        flush(&store).await?;
    }

    let credentials = config.credentials();
    let pipeline = StatementPipeline::new(LopdfBackend::new());
    let mut total = 0;

    match pdf {
        Some(path) => {
            if !path.is_file() {
                warn!(path = %path.display(), "file not found");
                return Ok(());
            }
            let bank = bank_for_pdf(&path, bank.as_deref());
            info!(file = %path.display(), bank = bank.key(), "parsing statement");
            total += save_statements(&pipeline, &store, &bank, &[path], &credentials).await?;
        }
        None => {
            for bank in requested_banks(bank.as_deref()) {
                let files = statement_files(&config.statements_dir, &bank)?;
                if files.is_empty() {
                    warn!(bank = bank.key(), dir = %config.statements_dir.display(), "no PDFs found");
                    continue;
                }
                total += save_statements(&pipeline, &store, &bank, &files, &credentials).await?;
            }
        }
    }

    info!(total, "transactions saved");
    Ok(())
}

pub async fn normalize_dates(config: &AppConfig) -> Result<()> {
    let store = open_store(config).await?;
    let updated = expensetrend_storage::normalize_dates(&store).await?;
    println!("Normalized {updated} date(s) to DD/MM/YYYY format.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use expensetrend_pdf::MockPdf;
    use expensetrend_storage::StoreFilter;

    #[test]
    fn bank_from_filename_then_fallback() {
        assert_eq!(bank_for_pdf(Path::new("/x/SBI_20260124_stmt.pdf"), None), Bank::Sbi);
        assert_eq!(bank_for_pdf(Path::new("/x/idfc-oct.pdf"), Some("hdfc")), Bank::Idfc);
        assert_eq!(bank_for_pdf(Path::new("/x/statement.pdf"), Some("axis")).key(), "axis");
        assert_eq!(bank_for_pdf(Path::new("/x/statement.pdf"), None), Bank::Hdfc);
    }

    #[test]
    fn statement_files_match_bank_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["HDFC_20251014_b.pdf", "HDFC_20250914_a.pdf", "SBI_20251014_a.pdf", "HDFC_notes.txt"] {
            std::fs::write(dir.path().join(name), b"%PDF").unwrap();
        }
        let files = statement_files(dir.path(), &Bank::Hdfc).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["HDFC_20250914_a.pdf", "HDFC_20251014_b.pdf"]);

        assert!(statement_files(&dir.path().join("absent"), &Bank::Sbi).unwrap().is_empty());
    }

    #[test]
    fn every_supported_bank_when_none_requested() {
        assert_eq!(requested_banks(None), Bank::SUPPORTED.to_vec());
        assert_eq!(requested_banks(Some("SBI")), vec![Bank::Sbi]);
    }

    #[tokio::test]
    async fn save_statements_skips_locked_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("SBI_20260124_stmt.pdf");
        std::fs::write(&file, b"%PDF").unwrap();
        let store = SqliteStore::in_memory().await.unwrap();
        let pipeline = StatementPipeline::new(
            MockPdf::new(["24 Jan 26 SWIGGY BANGALORE 450.00 D\n25 Jan 26 REFUND 100.00 C"]).encrypted("pw"),
        );

        let none = BankCredentials::new();
        let saved = save_statements(&pipeline, &store, &Bank::Sbi, &[file.clone()], &none).await.unwrap();
        assert_eq!(saved, 0);

        let creds = BankCredentials::new().with(&Bank::Sbi, "pw");
        let saved = save_statements(&pipeline, &store, &Bank::Sbi, &[file], &creds).await.unwrap();
        assert_eq!(saved, 2);
        let stored = store.find_all(&StoreFilter::default()).await.unwrap();
        assert_eq!(stored[0].date, "24/01/2026");
        assert_eq!(stored[0].category.as_str(), "food");
    }
}
