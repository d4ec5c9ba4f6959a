//! Security question storage. One row per user, answers stored as hashes.

use super::models::SecurityQuestionsForCreate;
use super::{DbPool, UserRepository};
use uuid::Uuid;

pub struct SecurityQuestionRepository;

impl SecurityQuestionRepository {
    /// Insert the questions and flip `users.security_questions_answered`.
    ///
    /// A second call for the same user fails on the `user_id` UNIQUE constraint
    /// and leaves the flag untouched.
    pub async fn create(pool: &DbPool, data: SecurityQuestionsForCreate) -> Result<(), sqlx::Error> {
        let [(q1, a1), (q2, a2), (q3, a3)] = data.entries;
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO security_questions
                (id, user_id, question_1, answer_1, question_2, answer_2, question_3, answer_3)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&data.user_id)
        .bind(q1)
        .bind(a1)
        .bind(q2)
        .bind(a2)
        .bind(q3)
        .bind(a3)
        .execute(&mut *tx)
        .await?;

        UserRepository::mark_security_questions_answered(&mut *tx, &data.user_id).await?;

        tx.commit().await
    }

    pub async fn exists_for_user(pool: &DbPool, user_id: &str) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM security_questions WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }
}
