//! Order repository (SQLite)

use super::{master, parse_decimal};
use crate::db::rows::{
    ORDER_COLUMNS, ORDER_ITEM_COLUMNS, ORDER_SUMMARY_COLUMNS, OrderRecord, OrderSummaryRecord,
};
use crate::db::{NewOrder, NewOrderItem, RepoError, RepoResult};
use chrono::NaiveDate;
use shared::models::{Order, OrderItem, OrderPage, OrderQuery, OrderSummary};
use sqlx::SqliteConnection;

const SEARCH_FILTER: &str = "(?1 IS NULL OR memo_number LIKE ?1 OR concept LIKE ?1 OR requesting_unit LIKE ?1 OR provider LIKE ?1) \
     AND (?2 IS NULL OR provider LIKE ?2) \
     AND (?3 IS NULL OR memo_date >= ?3) \
     AND (?4 IS NULL OR memo_date <= ?4)";

/// Order header as stored (amounts as text)
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    memo_number: String,
    memo_date: Option<NaiveDate>,
    requesting_unit: String,
    responsible_official: String,
    concept: String,
    provider: String,
    quote_document_type: String,
    budget_number: String,
    budget_date: Option<NaiveDate>,
    delivery_time: String,
    offer_quality: String,
    price_inquiry_type: String,
    observations: String,
    has_iva_retention: bool,
    has_islr: bool,
    has_itf: bool,
    signed_by_id: Option<i64>,
    account_point_id: Option<i64>,
    base_amount: String,
    tax_percentage_snapshot: String,
    tax_amount: String,
    total_amount: String,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = RepoError;

    fn try_from(row: OrderRow) -> RepoResult<Self> {
        Ok(OrderRecord {
            base_amount: parse_decimal("orders.base_amount", &row.base_amount)?,
            tax_percentage_snapshot: parse_decimal(
                "orders.tax_percentage_snapshot",
                &row.tax_percentage_snapshot,
            )?,
            tax_amount: parse_decimal("orders.tax_amount", &row.tax_amount)?,
            total_amount: parse_decimal("orders.total_amount", &row.total_amount)?,
            id: row.id,
            memo_number: row.memo_number,
            memo_date: row.memo_date,
            requesting_unit: row.requesting_unit,
            responsible_official: row.responsible_official,
            concept: row.concept,
            provider: row.provider,
            quote_document_type: row.quote_document_type,
            budget_number: row.budget_number,
            budget_date: row.budget_date,
            delivery_time: row.delivery_time,
            offer_quality: row.offer_quality,
            price_inquiry_type: row.price_inquiry_type,
            observations: row.observations,
            has_iva_retention: row.has_iva_retention,
            has_islr: row.has_islr,
            has_itf: row.has_itf,
            signed_by_id: row.signed_by_id,
            account_point_id: row.account_point_id,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    position: i32,
    description: String,
    unit: String,
    quantity: String,
    unit_price: String,
    line_total: String,
    applies_tax: bool,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepoError;

    fn try_from(row: OrderItemRow) -> RepoResult<Self> {
        Ok(OrderItem {
            quantity: parse_decimal("order_items.quantity", &row.quantity)?,
            unit_price: parse_decimal("order_items.unit_price", &row.unit_price)?,
            line_total: parse_decimal("order_items.line_total", &row.line_total)?,
            id: row.id,
            order_id: row.order_id,
            position: row.position,
            description: row.description,
            unit: row.unit,
            applies_tax: row.applies_tax,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: i64,
    memo_number: String,
    memo_date: Option<NaiveDate>,
    requesting_unit: String,
    provider: String,
    concept: String,
    total_amount: String,
    status: String,
    created_at: i64,
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = RepoError;

    fn try_from(row: OrderSummaryRow) -> RepoResult<Self> {
        OrderSummary::try_from(OrderSummaryRecord {
            total_amount: parse_decimal("orders.total_amount", &row.total_amount)?,
            id: row.id,
            memo_number: row.memo_number,
            memo_date: row.memo_date,
            requesting_unit: row.requesting_unit,
            provider: row.provider,
            concept: row.concept,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

pub async fn insert(conn: &mut SqliteConnection, order: &NewOrder<'_>) -> RepoResult<i64> {
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
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?24
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
    .bind(order.base_amount.to_string())
    .bind(order.iva_percentage.to_string())
    .bind(order.tax_amount.to_string())
    .bind(order.total_amount.to_string())
    .bind(order.status.as_str())
    .bind(order.now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    item: &NewOrderItem<'_>,
) -> RepoResult<i64> {
    let d = item.draft;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_items (order_id, position, description, unit, quantity, unit_price, line_total, applies_tax) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING id",
    )
    .bind(order_id)
    .bind(item.position)
    .bind(&d.description)
    .bind(&d.unit)
    .bind(d.quantity.to_string())
    .bind(d.unit_price.to_string())
    .bind(item.line_total.to_string())
    .bind(d.applies_tax)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => Ok(Some(hydrate(conn, OrderRecord::try_from(row)?).await?)),
        None => Ok(None),
    }
}

pub async fn by_account_point(
    conn: &mut SqliteConnection,
    account_point_id: i64,
) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE account_point_id = ? ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(account_point_id)
        .fetch_all(&mut *conn)
        .await?;

    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        orders.push(hydrate(&mut *conn, OrderRecord::try_from(row)?).await?);
    }
    Ok(orders)
}

pub async fn search(conn: &mut SqliteConnection, query: &OrderQuery) -> RepoResult<OrderPage> {
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
        "SELECT {ORDER_SUMMARY_COLUMNS} FROM orders WHERE {SEARCH_FILTER} ORDER BY created_at DESC, id DESC LIMIT ?5 OFFSET ?6"
    );
    let rows = sqlx::query_as::<_, OrderSummaryRow>(&list_sql)
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

async fn hydrate(conn: &mut SqliteConnection, record: OrderRecord) -> RepoResult<Order> {
    let sql =
        format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY position");
    let items = sqlx::query_as::<_, OrderItemRow>(&sql)
        .bind(record.id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<RepoResult<Vec<_>>>()?;

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
