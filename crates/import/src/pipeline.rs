use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use expensetrend_core::{categorize, date, Bank, BankCredentials, ExpenseItem, Money};
use expensetrend_pdf::PdfBackend;

use crate::layout::{Layout, RawMatch};

/// Why a statement produced no records. None of these abort a batch; the
/// caller logs them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementDiagnostic {
    #[error("statement is encrypted and no password is configured for {0}")]
    MissingPassword(String),
    #[error("could not decrypt statement: {0}")]
    DecryptFailed(String),
    #[error("could not read statement: {0}")]
    Unreadable(String),
}

/// Records extracted from one statement.
#[derive(Debug, Clone, Default)]
pub struct ParsedStatement {
    pub items: Vec<ExpenseItem>,
    /// Matches dropped because the amount token did not parse.
    pub skipped: usize,
    pub diagnostic: Option<StatementDiagnostic>,
}

impl ParsedStatement {
    fn failed(diagnostic: StatementDiagnostic) -> Self {
        ParsedStatement { diagnostic: Some(diagnostic), ..Default::default() }
    }
}

/// Orchestrates: open → unlock → collect page text → layout extract → normalize.
pub struct StatementPipeline<P: PdfBackend> {
    backend: P,
}

impl<P: PdfBackend> StatementPipeline<P> {
    pub fn new(backend: P) -> Self {
        Self { backend }
    }

    /// Parse a statement file on disk, looking up its password in `credentials`.
    pub fn parse_file(
        &self,
        bank: &Bank,
        path: &Path,
        credentials: &BankCredentials,
    ) -> ParsedStatement {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let diagnostic =
                    StatementDiagnostic::Unreadable(format!("{}: {e}", path.display()));
                warn!(path = %path.display(), "{diagnostic}");
                return ParsedStatement::failed(diagnostic);
            }
        };
        let parsed = self.parse_bytes(bank, &bytes, credentials.password_for(bank));
        info!(
            path = %path.display(),
            bank = bank.key(),
            records = parsed.items.len(),
            skipped = parsed.skipped,
            "parsed statement"
        );
        parsed
    }

    /// Parse an in-memory PDF. An unreadable, locked or undecryptable
    /// document yields no items and a diagnostic.
    pub fn parse_bytes(&self, bank: &Bank, pdf: &[u8], password: Option<&str>) -> ParsedStatement {
        match self.read_text(bank, pdf, password) {
            Ok(text) => parse_text(bank, &text),
            Err(diagnostic) => {
                warn!(bank = bank.key(), "{diagnostic}");
                ParsedStatement::failed(diagnostic)
            }
        }
    }

    /// Full document text, pages joined with newlines in page order.
    pub fn read_text(
        &self,
        bank: &Bank,
        pdf: &[u8],
        password: Option<&str>,
    ) -> Result<String, StatementDiagnostic> {
        let mut doc = self
            .backend
            .open(pdf)
            .map_err(|e| StatementDiagnostic::Unreadable(e.to_string()))?;

        if self.backend.is_encrypted(&doc) {
            let password = password
                .filter(|p| !p.is_empty())
                .ok_or_else(|| StatementDiagnostic::MissingPassword(bank.key().to_string()))?;
            self.backend
                .decrypt(&mut doc, password)
                .map_err(|e| StatementDiagnostic::DecryptFailed(e.to_string()))?;
        }

        let pages = self.backend.page_count(&doc);
        debug!(bank = bank.key(), pages, "reading statement text");
        let mut texts = Vec::with_capacity(pages);
        for index in 0..pages {
            let text = self
                .backend
                .page_text(&doc, index)
                .map_err(|e| StatementDiagnostic::Unreadable(e.to_string()))?;
            texts.push(text);
        }
        Ok(texts.join("\n"))
    }
}

/// Extract canonical records from already-extracted statement text.
pub fn parse_text(bank: &Bank, text: &str) -> ParsedStatement {
    let mut parsed = ParsedStatement::default();
    for raw in Layout::for_bank(bank).extract(text) {
        match to_expense(bank, raw) {
            Some(item) => parsed.items.push(item),
            None => parsed.skipped += 1,
        }
    }
    if parsed.skipped > 0 {
        debug!(bank = bank.key(), skipped = parsed.skipped, "dropped rows with unparseable amounts");
    }
    parsed
}

fn to_expense(bank: &Bank, raw: RawMatch) -> Option<ExpenseItem> {
    let amount = Money::parse_statement_amount(&raw.amount)?;
    Some(ExpenseItem {
        date: date::normalize(&raw.date),
        category: categorize(&raw.description),
        description: raw.description,
        amount,
        direction: raw.direction,
        bank: bank.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use expensetrend_core::{Category, Direction};
    use expensetrend_pdf::MockPdf;

    #[test]
    fn hdfc_statement_end_to_end() {
        let pipeline = StatementPipeline::new(MockPdf::new([
            "HDFC Bank Credit Card Statement",
            "19/10/2025| 15:28 ANAND SWEETS AND SAVOURBANGALORE C 2,250.00",
        ]));
        let parsed = pipeline.parse_bytes(&Bank::Hdfc, b"%PDF", None);
        assert!(parsed.diagnostic.is_none());
        assert_eq!(parsed.items.len(), 1);
        let item = &parsed.items[0];
        assert_eq!(item.date, "19/10/2025");
        assert_eq!(item.description, "ANAND SWEETS AND SAVOURBANGALORE");
        assert_eq!(item.amount, Money::from_cents(225_000));
        assert_eq!(item.direction, Direction::Debit);
        assert_eq!(item.bank, Bank::Hdfc);
        assert_eq!(item.category, Category::Food);
    }

    #[test]
    fn sbi_dates_are_normalized() {
        let parsed = parse_text(
            &Bank::Sbi,
            "24 Jan 26 NEFTO00000000000000000HDFCH00757618150 13,142.00 C",
        );
        assert_eq!(parsed.items.len(), 1);
        let item = &parsed.items[0];
        assert_eq!(item.date, "24/01/2026");
        assert_eq!(item.amount, Money::from_cents(1_314_200));
        assert_eq!(item.direction, Direction::Credit);
        assert_eq!(item.category, Category::Other);
    }

    #[test]
    fn generic_layout_tags_bank_key() {
        let bank = Bank::from_key("axis");
        let parsed = parse_text(&bank, "02/03/2026 UBER TRIP 312.40");
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].bank.key(), "axis");
        assert_eq!(parsed.items[0].direction, Direction::Debit);
        assert_eq!(parsed.items[0].category, Category::Travel);
    }

    #[test]
    fn unparseable_amount_drops_only_that_row() {
        let text = "\
02/03/2026 UBER TRIP 312.40
03/03/2026 BROKEN ROW 123456789012345678901234567890.00
04/03/2026 SWIGGY ORDER 210.00
";
        let parsed = parse_text(&Bank::from_key("axis"), text);
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.items[1].description, "SWIGGY ORDER");
    }

    #[test]
    fn encrypted_without_password_reports_missing_password() {
        let pipeline = StatementPipeline::new(
            MockPdf::new(["24 Jan 26 SHOP 10.00 D"]).encrypted("secret"),
        );
        let parsed = pipeline.parse_bytes(&Bank::Sbi, b"%PDF", None);
        assert!(parsed.items.is_empty());
        assert_eq!(parsed.diagnostic, Some(StatementDiagnostic::MissingPassword("sbi".into())));

        let parsed = pipeline.parse_bytes(&Bank::Sbi, b"%PDF", Some(""));
        assert!(matches!(parsed.diagnostic, Some(StatementDiagnostic::MissingPassword(_))));
    }

    #[test]
    fn encrypted_with_password_is_read() {
        let pipeline = StatementPipeline::new(
            MockPdf::new(["24 Jan 26 SHOP 10.00 D"]).encrypted("secret"),
        );
        let parsed = pipeline.parse_bytes(&Bank::Sbi, b"%PDF", Some("secret"));
        assert!(parsed.diagnostic.is_none());
        assert_eq!(parsed.items.len(), 1);
    }

    #[test]
    fn wrong_password_reports_decrypt_failure() {
        let pipeline = StatementPipeline::new(
            MockPdf::new(["24 Jan 26 SHOP 10.00 D"]).encrypted("secret"),
        );
        let parsed = pipeline.parse_bytes(&Bank::Sbi, b"%PDF", Some("guess"));
        assert!(parsed.items.is_empty());
        assert!(matches!(parsed.diagnostic, Some(StatementDiagnostic::DecryptFailed(_))));
    }

    #[test]
    fn corrupt_pdf_is_unreadable() {
        let pipeline = StatementPipeline::new(MockPdf::corrupt());
        let parsed = pipeline.parse_bytes(&Bank::Hdfc, b"garbage", None);
        assert!(parsed.items.is_empty());
        assert!(matches!(parsed.diagnostic, Some(StatementDiagnostic::Unreadable(_))));
    }

    #[test]
    fn pages_are_joined_before_matching() {
        let pipeline = StatementPipeline::new(MockPdf::new(["first page", "second page"]));
        let text = pipeline.read_text(&Bank::Hdfc, b"%PDF", None).unwrap();
        assert_eq!(text, "first page\nsecond page");
    }

    #[test]
    fn parse_file_uses_credentials_and_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IDFC_20260101_statement.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let pipeline = StatementPipeline::new(
            MockPdf::new(["12 Jan 26 PAYMENT RECEIVED 5,000.00 CR"]).encrypted("idfc-pw"),
        );
        let creds = BankCredentials::new().with(&Bank::Idfc, "idfc-pw");
        let parsed = pipeline.parse_file(&Bank::Idfc, &path, &creds);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].direction, Direction::Credit);

        let missing = pipeline.parse_file(&Bank::Idfc, &dir.path().join("nope.pdf"), &creds);
        assert!(matches!(missing.diagnostic, Some(StatementDiagnostic::Unreadable(_))));
    }

    #[test]
    fn no_matches_is_an_empty_success() {
        let parsed = parse_text(&Bank::Idfc, "nothing to see here");
        assert!(parsed.items.is_empty());
        assert!(parsed.diagnostic.is_none());
        assert_eq!(parsed.skipped, 0);
    }
}
