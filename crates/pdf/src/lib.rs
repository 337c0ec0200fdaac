pub mod backend;

pub use backend::{LopdfBackend, MockDocument, MockPdf, PdfBackend, PdfError};
