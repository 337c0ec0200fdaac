pub mod download;
pub mod gmail;
pub mod search;

pub use download::{statement_filename, AttachmentDownloader};
pub use gmail::{AttachmentRef, GmailClient, MailClient, MailError, Message, MessagePart};
pub use search::{parse_message_date, statement_query, StatementEmail, StatementSearcher};
