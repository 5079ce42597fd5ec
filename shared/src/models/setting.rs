//! Setting Model

use serde::{Deserialize, Serialize};

/// Setting key holding the current tax (IVA) percentage
pub const IVA_PERCENTAGE_KEY: &str = "iva_percentage";

/// Global key/value setting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: i64,
}
