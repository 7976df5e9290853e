use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Beneficiary, BeneficiaryUpdate, NewBeneficiary},
    traits::BeneficiaryError,
};

pub async fn insert_beneficiary(
    beneficiary: NewBeneficiary,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Beneficiary, BeneficiaryError> {
    let phone = beneficiary.phone_number.clone();
    let beneficiary = sqlx::query_as(
        r#"
            INSERT INTO beneficiaries (user_id, name, phone_number, network, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *;
        "#,
    )
    .bind(beneficiary.user_id)
    .bind(beneficiary.name)
    .bind(beneficiary.phone_number)
    .bind(beneficiary.network)
    .bind(now)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => BeneficiaryError::AlreadyExists(phone),
        _ => BeneficiaryError::from(e),
    })?;
    Ok(beneficiary)
}

pub async fn fetch_beneficiaries(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Beneficiary>, BeneficiaryError> {
    let beneficiaries =
        sqlx::query_as("SELECT * FROM beneficiaries WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(beneficiaries)
}

pub async fn fetch_beneficiary_by_phone(
    user_id: i64,
    phone_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Beneficiary>, BeneficiaryError> {
    let beneficiary = sqlx::query_as("SELECT * FROM beneficiaries WHERE user_id = $1 AND phone_number = $2")
        .bind(user_id)
        .bind(phone_number)
        .fetch_optional(conn)
        .await?;
    Ok(beneficiary)
}

pub async fn update_beneficiary(
    user_id: i64,
    id: i64,
    update: BeneficiaryUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Beneficiary>, BeneficiaryError> {
    let phone = update.phone_number.clone().unwrap_or_default();
    let beneficiary = sqlx::query_as(
        r#"
            UPDATE beneficiaries SET
                name = COALESCE($1, name),
                phone_number = COALESCE($2, phone_number),
                network = COALESCE($3, network),
                updated_at = $4
            WHERE id = $5 AND user_id = $6
            RETURNING *;
        "#,
    )
    .bind(update.name)
    .bind(update.phone_number)
    .bind(update.network)
    .bind(now)
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => BeneficiaryError::AlreadyExists(phone),
        _ => BeneficiaryError::from(e),
    })?;
    Ok(beneficiary)
}

pub async fn delete_beneficiary(user_id: i64, id: i64, conn: &mut SqliteConnection) -> Result<bool, BeneficiaryError> {
    let result = sqlx::query("DELETE FROM beneficiaries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}
