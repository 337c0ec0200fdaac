use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Issuing bank of a statement.
///
/// The three supported banks each have a dedicated statement layout; any
/// other key is kept verbatim and parsed with the generic layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bank {
    Hdfc,
    Sbi,
    Idfc,
    Other(String),
}

/// Static metadata for a supported bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankProfile {
    pub key: &'static str,
    pub name: &'static str,
    /// Mail search query locating this bank's statement emails.
    pub search_query: &'static str,
    pub sender_patterns: &'static [&'static str],
}

pub const BANK_PROFILES: &[BankProfile] = &[
    BankProfile {
        key: "hdfc",
        name: "HDFC Bank",
        search_query: r#"from:hdfcbank.net subject:"credit card statement" has:attachment"#,
        sender_patterns: &["alerts@hdfcbank.net", "hdfcbank.net"],
    },
    BankProfile {
        key: "sbi",
        name: "SBI Card",
        search_query: r#"from:sbicard.com subject:"statement" has:attachment"#,
        sender_patterns: &["sbicard.com"],
    },
    BankProfile {
        key: "idfc",
        name: "IDFC First Bank",
        search_query: r#"from:idfcfirstbank.com subject:"credit card statement" has:attachment"#,
        sender_patterns: &["idfcfirstbank.com", "idfcfirst.bank.in"],
    },
];

impl Bank {
    /// The banks with a dedicated layout, in listing order.
    pub const SUPPORTED: [Bank; 3] = [Bank::Hdfc, Bank::Sbi, Bank::Idfc];

    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "hdfc" => Bank::Hdfc,
            "sbi" => Bank::Sbi,
            "idfc" => Bank::Idfc,
            _ => Bank::Other(key.trim().to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Bank::Hdfc => "hdfc",
            Bank::Sbi => "sbi",
            Bank::Idfc => "idfc",
            Bank::Other(key) => key,
        }
    }

    pub fn profile(&self) -> Option<&'static BankProfile> {
        BANK_PROFILES.iter().find(|p| p.key == self.key())
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Bank::Other(_))
    }

    /// Detect the bank from a downloaded statement's filename, which carries
    /// the upper-case bank key (`HDFC_20250101_statement.pdf`).
    pub fn detect_from_filename(filename: &str) -> Option<Bank> {
        let upper = filename.to_uppercase();
        Bank::SUPPORTED
            .into_iter()
            .find(|bank| upper.contains(&bank.key().to_uppercase()))
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Bank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Bank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Bank::from_key(&key))
    }
}

/// Statement passwords keyed by bank key, supplied per parse call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankCredentials {
    passwords: HashMap<String, String>,
}

impl BankCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty passwords are ignored so a blank config entry means "no password".
    pub fn insert(&mut self, bank: &Bank, password: impl Into<String>) {
        let password = password.into();
        if password.is_empty() {
            return;
        }
        self.passwords.insert(bank.key().to_lowercase(), password);
    }

    pub fn with(mut self, bank: &Bank, password: impl Into<String>) -> Self {
        self.insert(bank, password);
        self
    }

    pub fn password_for(&self, bank: &Bank) -> Option<&str> {
        self.passwords
            .get(&bank.key().to_lowercase())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty()
    }
}
