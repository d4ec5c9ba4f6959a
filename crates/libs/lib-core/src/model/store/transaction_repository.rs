//! Bank statement transactions.

use super::models::{Transaction, TransactionForCreate};
use super::DbPool;
use uuid::Uuid;

pub struct TransactionRepository;

impl TransactionRepository {
    /// Insert all rows in one transaction. Any failure leaves nothing behind.
    pub async fn save_all(
        pool: &DbPool,
        user_id: &str,
        rows: &[TransactionForCreate],
    ) -> Result<usize, sqlx::Error> {
        let mut tx = pool.begin().await?;

        for row in rows {
            sqlx::query(
                "INSERT INTO transactions (id, user_id, date, description, amount, type)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(row.date)
            .bind(&row.description)
            .bind(row.amount)
            .bind(row.kind)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(rows.len())
    }

    pub async fn list_for_user(pool: &DbPool, user_id: &str) -> Result<Vec<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE user_id = ? ORDER BY date DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::models::{TransactionType, UserForCreate};
    use crate::model::store::{create_test_pool, UserRepository};
    use chrono::NaiveDate;

    fn row(day: u32, amount: i64, kind: TransactionType) -> TransactionForCreate {
        TransactionForCreate {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            description: format!("Line {day}"),
            amount,
            kind,
        }
    }

    #[tokio::test]
    async fn test_save_all_and_list() {
        let pool = create_test_pool().await.unwrap();
        let user = UserRepository::create(
            &pool,
            UserForCreate::new("dan".into(), "dan@example.com".into(), "hash".into()),
        )
        .await
        .unwrap();

        let saved = TransactionRepository::save_all(
            &pool,
            &user.id,
            &[row(1, 1050, TransactionType::Debit), row(15, 250000, TransactionType::Credit)],
        )
        .await
        .unwrap();
        assert_eq!(saved, 2);

        let listed = TransactionRepository::list_for_user(&pool, &user.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(listed[0].kind, TransactionType::Credit);
        assert_eq!(listed[1].amount, 1050);
        assert_ne!(listed[0].id, listed[1].id);
    }

    #[tokio::test]
    async fn test_save_all_is_atomic() {
        let pool = create_test_pool().await.unwrap();

        let result = TransactionRepository::save_all(
            &pool,
            "ghost",
            &[row(1, 100, TransactionType::Debit)],
        )
        .await;
        assert!(result.is_err());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
