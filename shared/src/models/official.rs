//! Official Model

use serde::{Deserialize, Serialize};

/// Responsible official who signs orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Official {
    pub id: i64,
    pub full_name: String,
    /// Position held (e.g. "Director de Administración")
    pub position: Option<String>,
    /// Organizational unit name
    pub unit: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
}
