//! Order repository (PostgreSQL)

use super::master;
use crate::db::rows::{
    ORDER_COLUMNS, ORDER_ITEM_COLUMNS, ORDER_SUMMARY_COLUMNS, OrderRecord, OrderSummaryRecord,
};
use crate::db::{NewOrder, NewOrderItem, RepoResult};
use shared::models::{Order, OrderItem, OrderPage, OrderQuery, OrderSummary};
use sqlx::PgConnection;

const SEARCH_FILTER: &str = "($1::TEXT IS NULL OR memo_number ILIKE $1 OR concept ILIKE $1 OR requesting_unit ILIKE $1 OR provider ILIKE $1) \
     AND ($2::TEXT IS NULL OR provider ILIKE $2) \
     AND ($3::DATE IS NULL OR memo_date >= $3) \
     AND ($4::DATE IS NULL OR memo_date <= $4)";

pub async fn insert(conn: &mut PgConnection, order: &NewOrder<'_>) -> RepoResult<i64> {
    let d = order.draft;
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO orders (
            memo_number, memo_date, requesting_unit, responsible_official, concept,
            provider, quote_document_type, budget_number, budget_date, delivery_time,
            offer_quality, price_inquiry_type, observations,
            has_iva_retention, has_islr, has_itf, signed_by_id, account_point_id,
            base_amount, tax_percentage_snapshot, tax_amount, total_amount,
            status, created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
            $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $24
        )
        RETURNING id
        "#,
    )
    .bind(order.memo_number)
    .bind(d.memo_date)
    .bind(&d.requesting_unit)
    .bind(&d.responsible_official)
    .bind(&d.concept)
    .bind(&d.provider)
    .bind(&d.quote_document_type)
    .bind(&d.budget_number)
    .bind(d.budget_date)
    .bind(&d.delivery_time)
    .bind(&d.offer_quality)
    .bind(&d.price_inquiry_type)
    .bind(&d.observations)
    .bind(d.has_iva_retention)
    .bind(d.has_islr)
    .bind(d.has_itf)
    .bind(d.signed_by_id)
    .bind(d.account_point_id)
    .bind(order.base_amount)
    .bind(order.iva_percentage)
    .bind(order.tax_amount)
    .bind(order.total_amount)
    .bind(order.status.as_str())
    .bind(order.now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: i64,
    item: &NewOrderItem<'_>,
) -> RepoResult<i64> {
    let d = item.draft;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_items (order_id, position, description, unit, quantity, unit_price, line_total, applies_tax) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(order_id)
    .bind(item.position)
    .bind(&d.description)
    .bind(&d.unit)
    .bind(d.quantity)
    .bind(d.unit_price)
    .bind(item.line_total)
    .bind(d.applies_tax)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn find(conn: &mut PgConnection, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let record = sqlx::query_as::<_, OrderRecord>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    match record {
        Some(record) => Ok(Some(hydrate(conn, record).await?)),
        None => Ok(None),
    }
}

pub async fn by_account_point(
    conn: &mut PgConnection,
    account_point_id: i64,
) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE account_point_id = $1 ORDER BY created_at DESC, id DESC"
    );
    let records = sqlx::query_as::<_, OrderRecord>(&sql)
        .bind(account_point_id)
        .fetch_all(&mut *conn)
        .await?;

    let mut orders = Vec::with_capacity(records.len());
    for record in records {
        orders.push(hydrate(&mut *conn, record).await?);
    }
    Ok(orders)
}

pub async fn search(conn: &mut PgConnection, query: &OrderQuery) -> RepoResult<OrderPage> {
    let keyword = query.keyword().map(|k| format!("%{k}%"));
    let provider = query.provider().map(|p| format!("%{p}%"));

    let count_sql = format!("SELECT COUNT(*) FROM orders WHERE {SEARCH_FILTER}");
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(keyword.as_deref())
        .bind(provider.as_deref())
        .bind(query.date_from)
        .bind(query.date_to)
        .fetch_one(&mut *conn)
        .await?;

    let list_sql = format!(
        "SELECT {ORDER_SUMMARY_COLUMNS} FROM orders WHERE {SEARCH_FILTER} ORDER BY created_at DESC, id DESC LIMIT $5 OFFSET $6"
    );
    let rows = sqlx::query_as::<_, OrderSummaryRecord>(&list_sql)
        .bind(keyword.as_deref())
        .bind(provider.as_deref())
        .bind(query.date_from)
        .bind(query.date_to)
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(&mut *conn)
        .await?;

    let orders = rows
        .into_iter()
        .map(OrderSummary::try_from)
        .collect::<RepoResult<Vec<_>>>()?;
    Ok(OrderPage { orders, total })
}

async fn hydrate(conn: &mut PgConnection, record: OrderRecord) -> RepoResult<Order> {
    let sql =
        format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY position");
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(record.id)
        .fetch_all(&mut *conn)
        .await?;

    let signed_by = match record.signed_by_id {
        Some(id) => master::find_official(&mut *conn, id).await?,
        None => None,
    };
    let account_point = match record.account_point_id {
        Some(id) => master::find_account_point(&mut *conn, id).await?,
        None => None,
    };

    record.into_order(items, signed_by, account_point)
}
