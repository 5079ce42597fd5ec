//! Document counter repository (SQLite)

use crate::db::{RepoError, RepoResult};
use shared::models::{Counter, CounterKey};
use shared::util::now_millis;
use sqlx::SqliteConnection;

/// Create-if-absent, read, increment. See [`crate::db::StoreTx::next_sequence`].
///
/// The insert runs first so the transaction takes the writer lock before it
/// reads anything. A deferred transaction that reads first and then writes
/// fails with `SQLITE_BUSY_SNAPSHOT` when another writer committed in between,
/// without waiting on the busy timeout.
pub async fn next_sequence(conn: &mut SqliteConnection, key: &CounterKey) -> RepoResult<i64> {
    let now = now_millis();

    sqlx::query(
        "INSERT INTO document_counters (document_type, year, last_sequence, updated_at) VALUES (?1, ?2, 0, ?3) ON CONFLICT (document_type, year) DO NOTHING",
    )
    .bind(&key.document_type)
    .bind(key.year)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let (id, last) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT id, last_sequence FROM document_counters WHERE document_type = ?1 AND year = ?2",
    )
    .bind(&key.document_type)
    .bind(key.year)
    .fetch_one(&mut *conn)
    .await?;

    let next = last
        .checked_add(1)
        .ok_or_else(|| RepoError::CounterOverflow(key.clone()))?;

    sqlx::query("UPDATE document_counters SET last_sequence = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(next)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(next)
}

pub async fn find(conn: &mut SqliteConnection, key: &CounterKey) -> RepoResult<Option<Counter>> {
    let row = sqlx::query_as::<_, Counter>(
        "SELECT id, document_type, year, last_sequence, updated_at FROM document_counters WHERE document_type = ?1 AND year = ?2",
    )
    .bind(&key.document_type)
    .bind(key.year)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn list(conn: &mut SqliteConnection, year: Option<i32>) -> RepoResult<Vec<Counter>> {
    let rows = sqlx::query_as::<_, Counter>(
        "SELECT id, document_type, year, last_sequence, updated_at FROM document_counters WHERE (?1 IS NULL OR year = ?1) ORDER BY document_type, year",
    )
    .bind(year)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}
