use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{IntentStatus, NewPaymentIntent, PaymentIntent},
    traits::LedgerError,
};

pub async fn insert_intent(
    intent: NewPaymentIntent,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<PaymentIntent, LedgerError> {
    let reference = intent.reference.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO payment_intents (reference, user_id, amount, authorization_url, status, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(intent.reference)
    .bind(intent.user_id)
    .bind(intent.amount)
    .bind(intent.authorization_url)
    .bind(intent.expires_at)
    .bind(now)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => LedgerError::DuplicateReference(reference),
        _ => LedgerError::from(e),
    })?;
    Ok(result)
}

pub async fn fetch_intent(reference: &str, conn: &mut SqliteConnection) -> Result<Option<PaymentIntent>, LedgerError> {
    let intent = sqlx::query_as("SELECT * FROM payment_intents WHERE reference = $1")
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(intent)
}

/// Compare-and-swap on the intent status. Only a `pending` intent can move, and only one caller can move it.
/// Returns the updated intent, or `None` if the intent does not exist or is no longer `pending`.
pub async fn transition_from_pending(
    reference: &str,
    new_status: IntentStatus,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentIntent>, LedgerError> {
    let intent = sqlx::query_as(
        r#"
            UPDATE payment_intents SET status = $1, updated_at = $2
            WHERE reference = $3 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(now)
    .bind(reference)
    .fetch_optional(conn)
    .await?;
    Ok(intent)
}
