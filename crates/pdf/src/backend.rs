use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to read PDF: {0}")]
    Open(String),
    #[error("Failed to decrypt PDF: {0}")]
    Decrypt(String),
    #[error("Failed to extract text from page {page}: {message}")]
    Text { page: usize, message: String },
}

/// Abstraction over a PDF library: open, unlock and read page text.
pub trait PdfBackend: Send + Sync {
    type Document;

    fn open(&self, bytes: &[u8]) -> Result<Self::Document, PdfError>;

    fn is_encrypted(&self, doc: &Self::Document) -> bool;

    fn decrypt(&self, doc: &mut Self::Document, password: &str) -> Result<(), PdfError>;

    fn page_count(&self, doc: &Self::Document) -> usize;

    /// Text of the page at zero-based `index`.
    fn page_text(&self, doc: &Self::Document, index: usize) -> Result<String, PdfError>;
}

// ── lopdf backend ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        LopdfBackend
    }
}

impl PdfBackend for LopdfBackend {
    type Document = lopdf::Document;

    fn open(&self, bytes: &[u8]) -> Result<lopdf::Document, PdfError> {
        lopdf::Document::load_mem(bytes).map_err(|e| PdfError::Open(e.to_string()))
    }

    fn is_encrypted(&self, doc: &lopdf::Document) -> bool {
        doc.is_encrypted()
    }

    fn decrypt(&self, doc: &mut lopdf::Document, password: &str) -> Result<(), PdfError> {
        doc.decrypt(password)
            .map_err(|e| PdfError::Decrypt(e.to_string()))
    }

    fn page_count(&self, doc: &lopdf::Document) -> usize {
        doc.get_pages().len()
    }

    fn page_text(&self, doc: &lopdf::Document, index: usize) -> Result<String, PdfError> {
        let page_number = doc
            .get_pages()
            .keys()
            .nth(index)
            .copied()
            .ok_or_else(|| PdfError::Text { page: index, message: "no such page".to_string() })?;
        doc.extract_text(&[page_number])
            .map_err(|e| PdfError::Text { page: index, message: e.to_string() })
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Serves pre-set page texts, optionally behind a password.
#[derive(Clone, Default)]
pub struct MockPdf {
    pages: Vec<String>,
    password: Option<String>,
    corrupt: bool,
}

impl fmt::Debug for MockPdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPdf")
            .field("pages", &self.pages.len())
            .field("encrypted", &self.password.is_some())
            .field("corrupt", &self.corrupt)
            .finish()
    }
}

impl MockPdf {
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { pages: pages.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    pub fn encrypted(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Every `open` fails, as for a truncated or non-PDF file.
    pub fn corrupt() -> Self {
        Self { corrupt: true, ..Default::default() }
    }
}

#[derive(Debug, Clone)]
pub struct MockDocument {
    pages: Vec<String>,
    locked_with: Option<String>,
}

impl PdfBackend for MockPdf {
    type Document = MockDocument;

    fn open(&self, _bytes: &[u8]) -> Result<MockDocument, PdfError> {
        if self.corrupt {
            return Err(PdfError::Open("invalid file header".to_string()));
        }
        Ok(MockDocument { pages: self.pages.clone(), locked_with: self.password.clone() })
    }

    fn is_encrypted(&self, doc: &MockDocument) -> bool {
        doc.locked_with.is_some()
    }

    fn decrypt(&self, doc: &mut MockDocument, password: &str) -> Result<(), PdfError> {
        match &doc.locked_with {
            Some(expected) if expected != password => {
                Err(PdfError::Decrypt("incorrect password".to_string()))
            }
            _ => {
                doc.locked_with = None;
                Ok(())
            }
        }
    }

    fn page_count(&self, doc: &MockDocument) -> usize {
        doc.pages.len()
    }

    fn page_text(&self, doc: &MockDocument, index: usize) -> Result<String, PdfError> {
        if doc.locked_with.is_some() {
            return Err(PdfError::Text { page: index, message: "document is encrypted".to_string() });
        }
        doc.pages
            .get(index)
            .cloned()
            .ok_or_else(|| PdfError::Text { page: index, message: "no such page".to_string() })
    }
}
