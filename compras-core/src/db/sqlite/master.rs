//! Officials and account points (SQLite)

use crate::db::RepoResult;
use crate::db::rows::{ACCOUNT_POINT_COLUMNS, AccountPointRow, OFFICIAL_COLUMNS};
use chrono::NaiveDate;
use shared::models::{AccountPoint, AccountPointDraft, AccountPointStatus, Official};
use shared::util::now_millis;
use sqlx::SqliteConnection;

pub async fn find_official(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Official>> {
    let sql = format!("SELECT {OFFICIAL_COLUMNS} FROM officials WHERE id = ?");
    let row = sqlx::query_as::<_, Official>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_account_point(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<AccountPoint>> {
    let sql = format!("SELECT {ACCOUNT_POINT_COLUMNS} FROM account_points WHERE id = ?");
    let row = sqlx::query_as::<_, AccountPointRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(AccountPoint::try_from).transpose()
}

pub async fn insert_account_point(
    conn: &mut SqliteConnection,
    account_number: &str,
    date: NaiveDate,
    draft: &AccountPointDraft,
) -> RepoResult<AccountPoint> {
    let sql = format!(
        "INSERT INTO account_points (account_number, date, subject, synthesis, programmatic_category, uel, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING {ACCOUNT_POINT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, AccountPointRow>(&sql)
        .bind(account_number)
        .bind(date)
        .bind(&draft.subject)
        .bind(&draft.synthesis)
        .bind(&draft.programmatic_category)
        .bind(&draft.uel)
        .bind(AccountPointStatus::Available.as_str())
        .bind(now_millis())
        .fetch_one(&mut *conn)
        .await?;
    AccountPoint::try_from(row)
}
