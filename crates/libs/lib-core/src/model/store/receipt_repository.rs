//! # Receipt Repository
//!
//! Receipts, their merchants and purchased items.
//!
//! Every read and delete is scoped by `user_id`; callers never see another
//! user's rows even when they guess an id.

use super::models::{PurchasedItem, ReceiptForCreate, ReceiptRow, ReceiptWithItems};
use super::DbPool;
use sqlx::{query_as, QueryBuilder, Sqlite};
use std::collections::HashMap;

const RECEIPT_COLUMNS: &str = "SELECT r.id, r.user_id, m.name AS merchant, r.total, r.currency_type, \
     r.date, r.notes, r.created_at, r.updated_at \
     FROM receipts r JOIN merchants m ON m.id = r.merchant_id";

pub struct ReceiptRepository;

impl ReceiptRepository {
    /// Store a receipt and its items, creating the merchant when new.
    ///
    /// Merchant upsert, receipt insert and item inserts share one transaction.
    /// Returns the new receipt id.
    pub async fn save(pool: &DbPool, data: &ReceiptForCreate) -> Result<i64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (merchant_id,): (i64,) = query_as(
            "INSERT INTO merchants (name) VALUES (?)
             ON CONFLICT(name) DO UPDATE SET updated_at = CURRENT_TIMESTAMP
             RETURNING id",
        )
        .bind(&data.merchant)
        .fetch_one(&mut *tx)
        .await?;

        let (receipt_id,): (i64,) = query_as(
            "INSERT INTO receipts (user_id, merchant_id, total, date, notes)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&data.user_id)
        .bind(merchant_id)
        .bind(data.total)
        .bind(&data.date)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        for item in &data.items {
            sqlx::query(
                "INSERT INTO purchased_items (user_id, merchant_id, receipt_id, name, price)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&data.user_id)
            .bind(merchant_id)
            .bind(receipt_id)
            .bind(&item.name)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(receipt_id)
    }

    pub async fn find_by_id(
        pool: &DbPool,
        user_id: &str,
        receipt_id: i64,
    ) -> Result<Option<ReceiptWithItems>, sqlx::Error> {
        let receipt = query_as::<_, ReceiptRow>(&format!(
            "{RECEIPT_COLUMNS} WHERE r.id = ? AND r.user_id = ?"
        ))
        .bind(receipt_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };

        let items = query_as::<_, PurchasedItem>(
            "SELECT id, receipt_id, name, price, currency_type
             FROM purchased_items WHERE receipt_id = ? ORDER BY id",
        )
        .bind(receipt.id)
        .fetch_all(pool)
        .await?;

        Ok(Some(ReceiptWithItems { receipt, items }))
    }

    /// One page of a user's receipts, newest first, plus the user's total count.
    ///
    /// `page` starts at 1.
    pub async fn list(
        pool: &DbPool,
        user_id: &str,
        page: u32,
        records: u32,
    ) -> Result<(Vec<ReceiptWithItems>, i64), sqlx::Error> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(records);

        let rows = query_as::<_, ReceiptRow>(&format!(
            "{RECEIPT_COLUMNS} WHERE r.user_id = ?
             ORDER BY r.created_at DESC, r.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(i64::from(records))
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let (total,): (i64,) = query_as("SELECT COUNT(*) FROM receipts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        let mut items_by_receipt = Self::items_for(pool, &rows).await?;
        let receipts = rows
            .into_iter()
            .map(|receipt| {
                let items = items_by_receipt.remove(&receipt.id).unwrap_or_default();
                ReceiptWithItems { receipt, items }
            })
            .collect();

        Ok((receipts, total))
    }

    async fn items_for(
        pool: &DbPool,
        rows: &[ReceiptRow],
    ) -> Result<HashMap<i64, Vec<PurchasedItem>>, sqlx::Error> {
        let mut grouped: HashMap<i64, Vec<PurchasedItem>> = HashMap::new();
        if rows.is_empty() {
            return Ok(grouped);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, receipt_id, name, price, currency_type FROM purchased_items WHERE receipt_id IN (",
        );
        let mut separated = qb.separated(", ");
        for row in rows {
            separated.push_bind(row.id);
        }
        qb.push(") ORDER BY id");

        for item in qb.build_query_as::<PurchasedItem>().fetch_all(pool).await? {
            grouped.entry(item.receipt_id).or_default().push(item);
        }
        Ok(grouped)
    }

    /// The subset of `ids` that belong to `user_id`.
    pub async fn owned_ids(pool: &DbPool, user_id: &str, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM receipts WHERE user_id = ");
        qb.push_bind(user_id);
        push_id_list(&mut qb, ids);
        qb.push(" ORDER BY id");

        let rows: Vec<(i64,)> = qb.build_query_as().fetch_all(pool).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Delete the user's receipts among `ids`. Items go with them via cascade.
    pub async fn delete_many(pool: &DbPool, user_id: &str, ids: &[i64]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM receipts WHERE user_id = ");
        qb.push_bind(user_id);
        push_id_list(&mut qb, ids);

        let result = qb.build().execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Rows for CSV export, newest first.
    pub async fn export_rows(
        pool: &DbPool,
        user_id: &str,
        ids: &[i64],
    ) -> Result<Vec<ReceiptRow>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(RECEIPT_COLUMNS);
        qb.push(" WHERE r.user_id = ");
        qb.push_bind(user_id);
        qb.push(" AND r.id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        qb.push(") ORDER BY r.created_at DESC, r.id DESC");

        qb.build_query_as::<ReceiptRow>().fetch_all(pool).await
    }
}

fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    qb.push(" AND id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    qb.push(")");
}
