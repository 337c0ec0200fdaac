macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod generic;
pub mod hdfc;
pub mod idfc;
pub mod layout;
pub mod pipeline;
pub mod sbi;

pub use layout::{Layout, RawMatch};
pub use pipeline::{parse_text, ParsedStatement, StatementDiagnostic, StatementPipeline};
