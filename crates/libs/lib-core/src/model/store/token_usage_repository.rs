//! Per-user accounting of completion tokens spent on extraction.

use super::models::TokenCounts;
use super::DbPool;

pub struct TokenUsageRepository;

impl TokenUsageRepository {
    pub async fn record(
        pool: &DbPool,
        user_id: &str,
        model: &str,
        counts: TokenCounts,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO token_usage (user_id, model, prompt_tokens, completion_tokens, total_tokens)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(model)
        .bind(counts.prompt_tokens)
        .bind(counts.completion_tokens)
        .bind(counts.total_tokens)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Sum of `total_tokens` across all calls by the user.
    pub async fn total_for_user(pool: &DbPool, user_id: &str) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_tokens), 0) FROM token_usage WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::models::UserForCreate;
    use crate::model::store::{create_test_pool, UserRepository};

    #[tokio::test]
    async fn test_record_and_total() {
        let pool = create_test_pool().await.unwrap();
        let user = UserRepository::create(
            &pool,
            UserForCreate::new("erin".into(), "erin@example.com".into(), "hash".into()),
        )
        .await
        .unwrap();

        assert_eq!(TokenUsageRepository::total_for_user(&pool, &user.id).await.unwrap(), 0);

        let counts = TokenCounts { prompt_tokens: 120, completion_tokens: 30, total_tokens: 150 };
        TokenUsageRepository::record(&pool, &user.id, "gpt-4o-mini", counts).await.unwrap();
        TokenUsageRepository::record(&pool, &user.id, "gpt-4o", counts).await.unwrap();

        assert_eq!(TokenUsageRepository::total_for_user(&pool, &user.id).await.unwrap(), 300);
    }
}
