use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use wally_common::NAIRA_CURRENCY_CODE;

use crate::{
    db_types::{NewUser, User, Wallet},
    traits::LedgerError,
};

pub async fn insert_user(user: NewUser, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<User, LedgerError> {
    let chat_id = user.chat_id.clone();
    let user = sqlx::query_as(
        r#"
            INSERT INTO users (chat_id, full_name, email, created_at, updated_at) VALUES ($1, $2, $3, $4, $4)
            RETURNING *;
        "#,
    )
    .bind(user.chat_id)
    .bind(user.full_name)
    .bind(user.email)
    .bind(now)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => LedgerError::UserAlreadyExists(chat_id),
        _ => LedgerError::from(e),
    })?;
    Ok(user)
}

pub async fn insert_wallet(user_id: i64, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Wallet, LedgerError> {
    let wallet = sqlx::query_as(
        "INSERT INTO wallets (user_id, balance, currency, updated_at) VALUES ($1, 0, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(NAIRA_CURRENCY_CODE)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(wallet)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, LedgerError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_chat_id(chat_id: &str, conn: &mut SqliteConnection) -> Result<Option<User>, LedgerError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE chat_id = $1").bind(chat_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_wallet(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Wallet>, LedgerError> {
    let wallet =
        sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(wallet)
}
