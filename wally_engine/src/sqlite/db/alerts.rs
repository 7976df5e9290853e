use chrono::{DateTime, Utc};
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewReconciliationAlert, ReconciliationAlert},
    traits::LedgerError,
};

pub async fn insert_alert(
    alert: NewReconciliationAlert,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<ReconciliationAlert, LedgerError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO reconciliation_alerts (user_id, amount, category, provider_transaction_id, reason, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(alert.user_id)
    .bind(alert.amount)
    .bind(alert.category)
    .bind(alert.provider_transaction_id)
    .bind(alert.reason)
    .bind(Json(alert.details))
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(result)
}

pub async fn fetch_open_alerts(conn: &mut SqliteConnection) -> Result<Vec<ReconciliationAlert>, LedgerError> {
    let alerts =
        sqlx::query_as("SELECT * FROM reconciliation_alerts WHERE resolved = FALSE ORDER BY id ASC").fetch_all(conn).await?;
    Ok(alerts)
}

pub async fn resolve_alert(
    id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<ReconciliationAlert, LedgerError> {
    let _ = sqlx::query("UPDATE reconciliation_alerts SET resolved = TRUE, resolved_at = $1 WHERE id = $2 AND resolved = FALSE")
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    let alert: Option<ReconciliationAlert> = sqlx::query_as("SELECT * FROM reconciliation_alerts WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    alert.ok_or(LedgerError::AlertNotFound(id))
}
