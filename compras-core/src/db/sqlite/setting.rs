//! Settings repository (SQLite)

use crate::db::RepoResult;
use shared::models::Setting;
use shared::util::now_millis;
use sqlx::SqliteConnection;

pub async fn find(conn: &mut SqliteConnection, key: &str) -> RepoResult<Option<Setting>> {
    let row =
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row)
}

pub async fn upsert(conn: &mut SqliteConnection, key: &str, value: &str) -> RepoResult<Setting> {
    let row = sqlx::query_as::<_, Setting>(
        "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3) ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at RETURNING key, value, updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(now_millis())
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}
