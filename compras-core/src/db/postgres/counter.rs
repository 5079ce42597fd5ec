//! Document counter repository (PostgreSQL)

use crate::db::{RepoError, RepoResult};
use shared::models::{Counter, CounterKey};
use shared::util::now_millis;
use sqlx::PgConnection;

/// Lock, create-if-absent, increment. See [`crate::db::StoreTx::next_sequence`].
pub async fn next_sequence(conn: &mut PgConnection, key: &CounterKey) -> RepoResult<i64> {
    let now = now_millis();

    let (id, last) = match lock(&mut *conn, key).await? {
        Some(row) => row,
        None => {
            // Concurrent first creators race here; the unique key lets exactly
            // one insert land and the rest fall through to the locking read.
            sqlx::query(
                "INSERT INTO document_counters (document_type, year, last_sequence, updated_at) VALUES ($1, $2, 0, $3) ON CONFLICT (document_type, year) DO NOTHING",
            )
            .bind(&key.document_type)
            .bind(key.year)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            lock(&mut *conn, key)
                .await?
                .ok_or_else(|| RepoError::Database(format!("Counter {key} missing after insert")))?
        }
    };

    let next = last
        .checked_add(1)
        .ok_or_else(|| RepoError::CounterOverflow(key.clone()))?;

    sqlx::query("UPDATE document_counters SET last_sequence = $1, updated_at = $2 WHERE id = $3")
        .bind(next)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(next)
}

/// Row lock held until the transaction ends
async fn lock(conn: &mut PgConnection, key: &CounterKey) -> RepoResult<Option<(i64, i64)>> {
    let row = sqlx::query_as::<_, (i64, i64)>(
        "SELECT id, last_sequence FROM document_counters WHERE document_type = $1 AND year = $2 FOR UPDATE",
    )
    .bind(&key.document_type)
    .bind(key.year)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn find(conn: &mut PgConnection, key: &CounterKey) -> RepoResult<Option<Counter>> {
    let row = sqlx::query_as::<_, Counter>(
        "SELECT id, document_type, year, last_sequence, updated_at FROM document_counters WHERE document_type = $1 AND year = $2",
    )
    .bind(&key.document_type)
    .bind(key.year)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn list(conn: &mut PgConnection, year: Option<i32>) -> RepoResult<Vec<Counter>> {
    let rows = sqlx::query_as::<_, Counter>(
        "SELECT id, document_type, year, last_sequence, updated_at FROM document_counters WHERE ($1::INTEGER IS NULL OR year = $1) ORDER BY document_type, year",
    )
    .bind(year)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}
