use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;

pub async fn email_taken(pool: &SqlitePool, email: &str) -> Result<bool, AppError> {
    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER(?))")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(taken)
}

pub async fn username_taken(pool: &SqlitePool, username: &str) -> Result<bool, AppError> {
    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
            .bind(username)
            .fetch_one(pool)
            .await?;
    Ok(taken)
}

pub async fn insert(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, AppError> {
    let now = Utc::now();
    let user = User {
        user_id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        password: password_hash.to_string(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO users (user_id, username, email, password, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.user_id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER(?)")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn insert_and_lookup_by_email() {
        let pool = db::test_pool().await;

        let created = insert(&pool, "alice", "a@x.com", "hash").await.unwrap();
        let found = find_by_email(&pool, "A@X.COM").await.unwrap().unwrap();

        assert_eq!(found.user_id, created.user_id);
        assert_eq!(found.username, "alice");
        assert_eq!(found.password, "hash");

        assert!(find_by_email(&pool, "b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn uniqueness_probes() {
        let pool = db::test_pool().await;
        insert(&pool, "alice", "a@x.com", "hash").await.unwrap();

        assert!(email_taken(&pool, "a@x.com").await.unwrap());
        assert!(email_taken(&pool, "A@x.com").await.unwrap());
        assert!(!email_taken(&pool, "b@x.com").await.unwrap());

        assert!(username_taken(&pool, "alice").await.unwrap());
        assert!(!username_taken(&pool, "bob").await.unwrap());
    }
}
