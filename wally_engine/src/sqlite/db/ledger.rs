use chrono::{DateTime, Utc};
use log::*;
use sqlx::{types::Json, SqliteConnection};
use wally_common::Kobo;

use crate::{
    db_types::{DebitActivity, Direction, LedgerEntry, NewLedgerEntry},
    helpers::{new_reference, CREDIT_REFERENCE_PREFIX, DEBIT_REFERENCE_PREFIX},
    traits::LedgerError,
};

/// Adds `amount` to the wallet balance. Returns the wallet id and the new balance, or `None` if the user has no
/// wallet.
///
/// This is a write, so it takes the SQLite write lock. Call it first in a transaction.
pub async fn increase_balance(
    user_id: i64,
    amount: Kobo,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<(i64, Kobo)>, LedgerError> {
    let result = sqlx::query_as(
        "UPDATE wallets SET balance = balance + $1, updated_at = $2 WHERE user_id = $3 RETURNING id, balance",
    )
    .bind(amount)
    .bind(now)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Removes `amount` from the wallet balance, but only if the balance covers it. Returns the wallet id and the new
/// balance, or `None` if the wallet does not exist or holds less than `amount`.
pub async fn decrease_balance(
    user_id: i64,
    amount: Kobo,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<(i64, Kobo)>, LedgerError> {
    let result = sqlx::query_as(
        r#"
            UPDATE wallets SET balance = balance - $1, updated_at = $2
            WHERE user_id = $3 AND balance >= $1
            RETURNING id, balance
        "#,
    )
    .bind(amount)
    .bind(now)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Appends a row to the transaction log. The reference is generated if the entry does not carry one.
pub async fn insert_entry(
    wallet_id: i64,
    direction: Direction,
    entry: NewLedgerEntry,
    balance_after: Kobo,
    conn: &mut SqliteConnection,
) -> Result<LedgerEntry, LedgerError> {
    let balance_before = match direction {
        Direction::Credit => balance_after - entry.amount,
        Direction::Debit => balance_after + entry.amount,
    };
    let reference = entry.reference.unwrap_or_else(|| match direction {
        Direction::Credit => new_reference(CREDIT_REFERENCE_PREFIX, 12),
        Direction::Debit => new_reference(DEBIT_REFERENCE_PREFIX, 12),
    });
    let result = sqlx::query_as(
        r#"
            INSERT INTO ledger_entries (
                wallet_id, user_id, direction, category, amount, balance_before, balance_after,
                description, reference, status, metadata, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'success', $10, $11)
            RETURNING *;
        "#,
    )
    .bind(wallet_id)
    .bind(entry.user_id)
    .bind(direction)
    .bind(entry.category)
    .bind(entry.amount)
    .bind(balance_before)
    .bind(balance_after)
    .bind(entry.description)
    .bind(reference.clone())
    .bind(Json(entry.metadata))
    .bind(entry.created_at)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => LedgerError::DuplicateReference(reference),
        _ => LedgerError::from(e),
    })?;
    Ok(result)
}

/// Applies a credit: balance update followed by the log row. Must be called inside a transaction.
pub async fn credit(entry: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<LedgerEntry, LedgerError> {
    if !entry.amount.is_positive() {
        return Err(LedgerError::InvalidAmount(entry.amount));
    }
    let user_id = entry.user_id;
    let (wallet_id, balance) = increase_balance(user_id, entry.amount, Utc::now(), conn)
        .await?
        .ok_or(LedgerError::WalletNotFound(user_id))?;
    let entry = insert_entry(wallet_id, Direction::Credit, entry, balance, conn).await?;
    trace!("🗃️ Wallet #{wallet_id} credited with {}. New balance: {balance}", entry.amount);
    Ok(entry)
}

/// Applies a debit: conditional balance update followed by the log row. Must be called inside a transaction.
pub async fn debit(entry: NewLedgerEntry, conn: &mut SqliteConnection) -> Result<LedgerEntry, LedgerError> {
    if !entry.amount.is_positive() {
        return Err(LedgerError::InvalidAmount(entry.amount));
    }
    let user_id = entry.user_id;
    let requested = entry.amount;
    let (wallet_id, balance) = match decrease_balance(user_id, requested, Utc::now(), conn).await? {
        Some(v) => v,
        None => {
            let balance: Option<Kobo> = sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;
            return match balance {
                Some(balance) => Err(LedgerError::InsufficientFunds { balance, requested }),
                None => Err(LedgerError::WalletNotFound(user_id)),
            };
        },
    };
    let entry = insert_entry(wallet_id, Direction::Debit, entry, balance, conn).await?;
    trace!("🗃️ Wallet #{wallet_id} debited with {requested}. New balance: {balance}");
    Ok(entry)
}

pub async fn fetch_history(
    user_id: i64,
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, LedgerError> {
    let entries = sqlx::query_as("SELECT * FROM ledger_entries WHERE user_id = $1 ORDER BY id DESC LIMIT $2")
        .bind(user_id)
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}

pub async fn fetch_entry_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerEntry>, LedgerError> {
    let entry = sqlx::query_as("SELECT * FROM ledger_entries WHERE reference = $1")
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}

pub async fn fetch_debits_since(
    user_id: i64,
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, LedgerError> {
    let entries = sqlx::query_as(
        r#"
            SELECT * FROM ledger_entries
            WHERE user_id = $1 AND direction = 'debit' AND status = 'success' AND created_at >= $2
            ORDER BY id ASC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(conn)
    .await?;
    Ok(entries)
}

pub async fn debit_activity_since(
    user_id: i64,
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<DebitActivity, LedgerError> {
    let activity = sqlx::query_as(
        r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total FROM ledger_entries
            WHERE user_id = $1 AND direction = 'debit' AND status = 'success' AND created_at >= $2
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(conn)
    .await?;
    Ok(activity)
}
