//! Account Point Model
//!
//! An account point ("punto de cuenta") authorizes spending; orders may
//! reference one. Its number comes from the `PC` document counter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account point status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountPointStatus {
    #[default]
    Available,
    Used,
}

impl AccountPointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Used => "USED",
        }
    }
}

impl fmt::Display for AccountPointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountPointStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(Self::Available),
            "USED" => Ok(Self::Used),
            other => Err(format!("unknown account point status: {other}")),
        }
    }
}

/// Account point entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountPoint {
    pub id: i64,
    /// Formatted `PC-{year}-{seq}` number
    pub account_number: String,
    pub date: NaiveDate,
    pub subject: String,
    pub synthesis: String,
    pub programmatic_category: String,
    /// Executing administrative unit
    pub uel: String,
    pub status: AccountPointStatus,
    pub created_at: i64,
}

/// Create account point payload (the number is assigned on insert)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccountPointDraft {
    /// Defaults to today when absent
    pub date: Option<NaiveDate>,
    pub subject: String,
    pub synthesis: String,
    pub programmatic_category: String,
    pub uel: String,
}
