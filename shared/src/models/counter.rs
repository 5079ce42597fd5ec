//! Document Counter Model
//!
//! One counter row per `(document_type, year)`. The row is created lazily on
//! the first allocation for its key and never deleted, so a new year starts a
//! fresh series at 1 without any reset job.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Well-known document types
pub mod document_types {
    /// Purchase/service order memo
    pub const MEMO: &str = "MEMO";
    /// Account point ("punto de cuenta")
    pub const ACCOUNT_POINT: &str = "PC";
}

/// Minimum rendered width of the sequence part of a document number
pub const SEQUENCE_WIDTH: usize = 5;

/// Counter identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterKey {
    pub document_type: String,
    pub year: i32,
}

impl CounterKey {
    pub fn new(document_type: impl Into<String>, year: i32) -> Self {
        Self {
            document_type: document_type.into(),
            year,
        }
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.document_type, self.year)
    }
}

/// Counter row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Counter {
    pub id: i64,
    pub document_type: String,
    pub year: i32,
    /// Last issued sequence (0 = row created, nothing issued yet)
    pub last_sequence: i64,
    pub updated_at: i64,
}

impl Counter {
    pub fn key(&self) -> CounterKey {
        CounterKey::new(self.document_type.clone(), self.year)
    }
}

/// Human-readable document identifier, e.g. `MEMO-2024-00001`
///
/// The sequence is zero-padded to [`SEQUENCE_WIDTH`] digits and simply grows
/// wider past 99999.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentNumber {
    pub document_type: String,
    pub year: i32,
    pub sequence: u64,
}

impl DocumentNumber {
    pub fn new(document_type: impl Into<String>, year: i32, sequence: u64) -> Self {
        Self {
            document_type: document_type.into(),
            year,
            sequence,
        }
    }

    pub fn key(&self) -> CounterKey {
        CounterKey::new(self.document_type.clone(), self.year)
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:0width$}",
            self.document_type,
            self.year,
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

/// Error returned when a string is not a `TYPE-YEAR-SEQUENCE` document number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDocumentNumberError {
    #[error("document number must look like TYPE-YEAR-SEQUENCE, got {0:?}")]
    Shape(String),
    #[error("invalid year in document number {0:?}")]
    Year(String),
    #[error("invalid sequence in document number {0:?}")]
    Sequence(String),
}

impl FromStr for DocumentNumber {
    type Err = ParseDocumentNumberError;

    /// Parses from the right so document types may themselves contain `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, '-');
        let (Some(seq), Some(year), Some(doc_type)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseDocumentNumberError::Shape(s.to_string()));
        };
        if doc_type.is_empty() {
            return Err(ParseDocumentNumberError::Shape(s.to_string()));
        }
        if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseDocumentNumberError::Sequence(s.to_string()));
        }
        if year.is_empty() || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseDocumentNumberError::Year(s.to_string()));
        }
        let sequence = seq
            .parse::<u64>()
            .map_err(|_| ParseDocumentNumberError::Sequence(s.to_string()))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| ParseDocumentNumberError::Year(s.to_string()))?;
        Ok(Self::new(doc_type, year, sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_five_digits() {
        let n = DocumentNumber::new(document_types::MEMO, 2024, 7);
        assert_eq!(n.to_string(), "MEMO-2024-00007");
    }

    #[test]
    fn test_format_grows_past_five_digits() {
        let n = DocumentNumber::new("PC", 2025, 123_456);
        assert_eq!(n.to_string(), "PC-2025-123456");
        let n = DocumentNumber::new("PC", 2025, 99_999);
        assert_eq!(n.to_string(), "PC-2025-99999");
    }

    #[test]
    fn test_parse_round_trip_with_dashed_type() {
        let n: DocumentNumber = "ORD-SRV-2024-00012".parse().unwrap();
        assert_eq!(n.document_type, "ORD-SRV");
        assert_eq!(n.year, 2024);
        assert_eq!(n.sequence, 12);
        assert_eq!(n.to_string(), "ORD-SRV-2024-00012");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "MEMO2024".parse::<DocumentNumber>(),
            Err(ParseDocumentNumberError::Shape(_))
        ));
        assert!(matches!(
            "MEMO-20x4-00001".parse::<DocumentNumber>(),
            Err(ParseDocumentNumberError::Year(_))
        ));
        assert!(matches!(
            "MEMO-2024-".parse::<DocumentNumber>(),
            Err(ParseDocumentNumberError::Sequence(_))
        ));
        assert!(matches!(
            "-2024-00001".parse::<DocumentNumber>(),
            Err(ParseDocumentNumberError::Shape(_))
        ));
    }

    #[test]
    fn test_counter_key_display() {
        assert_eq!(CounterKey::new("MEMO", 2025).to_string(), "MEMO/2025");
    }
}
