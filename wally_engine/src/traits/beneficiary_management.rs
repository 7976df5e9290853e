use thiserror::Error;

use crate::{
    db_types::{Beneficiary, BeneficiaryUpdate, NewBeneficiary},
    traits::{LedgerError, LedgerManagement},
};

/// Storage for a user's saved contacts. Every lookup and change is scoped to the owning user, so one user can never
/// read or modify another user's beneficiaries by guessing an id.
#[allow(async_fn_in_trait)]
pub trait BeneficiaryManagement: LedgerManagement {
    /// Saves a new beneficiary. A user can save a phone number only once; a second save of the same number fails with
    /// [`BeneficiaryError::AlreadyExists`].
    async fn insert_beneficiary(&self, beneficiary: NewBeneficiary) -> Result<Beneficiary, BeneficiaryError>;

    /// The user's beneficiaries, most recently saved first.
    async fn fetch_beneficiaries(&self, user_id: i64) -> Result<Vec<Beneficiary>, BeneficiaryError>;

    async fn fetch_beneficiary_by_phone(
        &self,
        user_id: i64,
        phone_number: &str,
    ) -> Result<Option<Beneficiary>, BeneficiaryError>;

    /// Applies the non-empty fields of `update`. Returns `None` if the user has no beneficiary with this id.
    async fn update_beneficiary(
        &self,
        user_id: i64,
        id: i64,
        update: BeneficiaryUpdate,
    ) -> Result<Option<Beneficiary>, BeneficiaryError>;

    /// Returns `false` if the user has no beneficiary with this id.
    async fn delete_beneficiary(&self, user_id: i64, id: i64) -> Result<bool, BeneficiaryError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BeneficiaryError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("{0} is already saved as a beneficiary")]
    AlreadyExists(String),
    #[error("User {user_id} has no beneficiary #{id}")]
    NotFound { user_id: i64, id: i64 },
    #[error("Invalid beneficiary: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    LedgerError(#[from] LedgerError),
}

impl From<sqlx::Error> for BeneficiaryError {
    fn from(e: sqlx::Error) -> Self {
        BeneficiaryError::DatabaseError(e.to_string())
    }
}
