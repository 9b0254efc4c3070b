use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::error::{UserError, UserResult};
use crate::users::repo_types::User;

/// Persistence Gateway for users.
///
/// Implementations own identity assignment and must reject a write that
/// would leave two rows with the same email with [`UserError::DuplicateEmail`].
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_all(&self) -> UserResult<Vec<User>>;

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Writes a new row; the gateway assigns the id and ignores `user.id`.
    async fn insert(&self, user: User) -> UserResult<User>;

    /// Rewrites the row with `user.id`. `None` when no such row exists;
    /// never creates one.
    async fn update(&self, user: User) -> UserResult<Option<User>>;

    /// Returns `false` when no row had that id.
    async fn delete_by_id(&self, id: i64) -> UserResult<bool>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_err(e: sqlx::Error, email: &str) -> UserError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            UserError::DuplicateEmail(email.to_string())
        }
        _ => UserError::Other(anyhow::Error::new(e).context("write user")),
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_all(&self) -> UserResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn insert(&self, user: User) -> UserResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_err(e, &user.email))
    }

    async fn update(&self, user: User) -> UserResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET username = $2, email = $3, password = $4
             WHERE id = $1
            RETURNING id, username, email, password
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_write_err(e, &user.email))
    }

    async fn delete_by_id(&self, id: i64) -> UserResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_constraint_write_errors_stay_internal() {
        let err = map_write_err(sqlx::Error::RowNotFound, "a@x.com");
        assert!(matches!(err, UserError::Other(_)));
        assert!(!err.is_client_error());
    }
}
