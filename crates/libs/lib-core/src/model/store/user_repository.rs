//! # User Repository
//!
//! Provides database access layer for user-related operations.
//!
//! Password changes and account creation also write `password_history`, so
//! those calls run inside a single sqlx transaction.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::model::store::{create_pool, models::UserForCreate, UserRepository};
//! # async fn example() -> anyhow::Result<()> {
//! let pool = create_pool("sqlite:data/dev.db").await?;
//!
//! let user = UserRepository::create(
//!     &pool,
//!     UserForCreate::new("alice".into(), "alice@example.com".into(), "$argon2id$...".into()),
//! ).await?;
//!
//! let found = UserRepository::find_by_email(&pool, "alice@example.com").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

use super::models::{User, UserForCreate};
use super::DbPool;
use sqlx::{query_as, SqliteConnection};
use uuid::Uuid;

/// User repository for database operations.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by id, including deleted accounts.
    pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by id among accounts that were not deleted.
    pub async fn find_active_by_id(pool: &DbPool, id: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM active_users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by their email address.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - User found with matching email
    /// * `Ok(None)` - No user found with that email
    /// * `Err(sqlx::Error)` - Database error occurred
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by their username.
    pub async fn find_by_username(pool: &DbPool, username: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Whether `username` or `email` already belongs to some account.
    pub async fn username_or_email_taken(
        pool: &DbPool,
        username: &str,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) =
            query_as("SELECT COUNT(*) FROM users WHERE username = ? OR email = ?")
                .bind(username)
                .bind(email)
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }

    /// Whether `email` belongs to an account other than `user_id`.
    pub async fn email_taken_by_other(
        pool: &DbPool,
        email: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
            .bind(email)
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    /// Create a new user together with its first `password_history` row.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if:
    /// - Username already exists (UNIQUE constraint violation)
    /// - Email already exists (UNIQUE constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &DbPool, user_data: UserForCreate) -> Result<User, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let mut tx = pool.begin().await?;

        let user = query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash)
             VALUES (?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(&user_data.username)
        .bind(&user_data.email)
        .bind(&user_data.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO password_history (user_id, password_hash) VALUES (?, ?)")
            .bind(&id)
            .bind(&user_data.password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    pub async fn update_email(pool: &DbPool, user_id: &str, email: &str) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET email = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(email)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        tx.commit().await
    }

    /// Replace the password hash and append it to the history.
    pub async fn update_password(
        pool: &DbPool,
        user_id: &str,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        sqlx::query("INSERT INTO password_history (user_id, password_hash) VALUES (?, ?)")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await
    }

    /// Number of hashes recorded for a user, current one included.
    pub async fn password_history_len(pool: &DbPool, user_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM password_history WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Set the security-questions flag. Takes a connection so it can join the
    /// transaction that stores the questions.
    pub async fn mark_security_questions_answered(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET security_questions_answered = 1, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Mark the account deleted. Data stays until the purge utility runs.
    pub async fn soft_delete(pool: &DbPool, user_id: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET inactive_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
             WHERE id = ? AND inactive_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    pub async fn count_inactive(pool: &DbPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM users WHERE inactive_at IS NOT NULL")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Hard-delete every soft-deleted account. Owned rows go with it via cascade.
    pub async fn delete_inactive(pool: &DbPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE inactive_at IS NOT NULL")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::create_test_pool;

    async fn alice(pool: &DbPool) -> User {
        UserRepository::create(
            pool,
            UserForCreate::new("alice".into(), "alice@example.com".into(), "hash-1".into()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = create_test_pool().await.unwrap();
        let user = alice(&pool).await;

        assert_eq!(user.username, "alice");
        assert!(!user.security_questions_answered);
        assert_eq!(user.application_environment_role, "user");
        assert!(user.is_active());
        assert_eq!(Uuid::parse_str(&user.id).unwrap().get_version_num(), 4);

        let by_name = UserRepository::find_by_username(&pool, "alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        let by_email = UserRepository::find_by_email(&pool, "alice@example.com").await.unwrap();
        assert!(by_email.is_some());
        assert!(UserRepository::find_by_id(&pool, "missing").await.unwrap().is_none());

        assert_eq!(UserRepository::password_history_len(&pool, &user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let pool = create_test_pool().await.unwrap();
        alice(&pool).await;

        let dup = UserRepository::create(
            &pool,
            UserForCreate::new("alice".into(), "other@example.com".into(), "hash".into()),
        )
        .await;
        assert!(dup.is_err());

        assert!(UserRepository::username_or_email_taken(&pool, "bob", "alice@example.com")
            .await
            .unwrap());
        assert!(!UserRepository::username_or_email_taken(&pool, "bob", "bob@example.com")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_email_taken_by_other() {
        let pool = create_test_pool().await.unwrap();
        let user = alice(&pool).await;
        let bob = UserRepository::create(
            &pool,
            UserForCreate::new("bob".into(), "bob@example.com".into(), "hash".into()),
        )
        .await
        .unwrap();

        assert!(!UserRepository::email_taken_by_other(&pool, "alice@example.com", &user.id)
            .await
            .unwrap());
        assert!(UserRepository::email_taken_by_other(&pool, "bob@example.com", &user.id)
            .await
            .unwrap());

        UserRepository::update_email(&pool, &bob.id, "robert@example.com").await.unwrap();
        let bob = UserRepository::find_by_id(&pool, &bob.id).await.unwrap().unwrap();
        assert_eq!(bob.email, "robert@example.com");
    }

    #[tokio::test]
    async fn test_update_password_appends_history() {
        let pool = create_test_pool().await.unwrap();
        let user = alice(&pool).await;

        UserRepository::update_password(&pool, &user.id, "hash-2").await.unwrap();

        let user = UserRepository::find_by_id(&pool, &user.id).await.unwrap().unwrap();
        assert_eq!(user.password_hash, "hash-2");
        assert_eq!(UserRepository::password_history_len(&pool, &user.id).await.unwrap(), 2);

        let missing = UserRepository::update_password(&pool, "nobody", "hash-3").await;
        assert!(matches!(missing, Err(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn test_soft_delete_and_purge() {
        let pool = create_test_pool().await.unwrap();
        let user = alice(&pool).await;

        UserRepository::soft_delete(&pool, &user.id).await.unwrap();

        assert!(UserRepository::find_active_by_id(&pool, &user.id).await.unwrap().is_none());
        let deleted = UserRepository::find_by_id(&pool, &user.id).await.unwrap().unwrap();
        assert!(!deleted.is_active());

        // Second delete is a no-op error, the account is already gone
        assert!(UserRepository::soft_delete(&pool, &user.id).await.is_err());

        assert_eq!(UserRepository::count_inactive(&pool).await.unwrap(), 1);
        assert_eq!(UserRepository::delete_inactive(&pool).await.unwrap(), 1);
        assert!(UserRepository::find_by_id(&pool, &user.id).await.unwrap().is_none());
        assert_eq!(UserRepository::password_history_len(&pool, &user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_security_questions_answered() {
        let pool = create_test_pool().await.unwrap();
        let user = alice(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        UserRepository::mark_security_questions_answered(&mut *conn, &user.id).await.unwrap();
        drop(conn);
        let user = UserRepository::find_by_id(&pool, &user.id).await.unwrap().unwrap();
        assert!(user.security_questions_answered);
    }
}
