//! Document Number Records

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Numbered document kinds. Each has its own sequence per tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Order,
    Invoice,

    /// Universal transfer document.
    Upd,
}

impl DocumentType {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Invoice => "INVOICE",
            Self::Upd => "UPD",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown document type `{0}`")]
pub struct UnknownDocumentType(pub String);

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ORDER" => Ok(Self::Order),
            "INVOICE" => Ok(Self::Invoice),
            "UPD" => Ok(Self::Upd),
            other => Err(UnknownDocumentType(other.to_string())),
        }
    }
}
