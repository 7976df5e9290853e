use std::fmt::Debug;

use log::*;

use crate::{
    conversation::{normalize_phone, MIN_NAME_LENGTH},
    db_types::{Beneficiary, BeneficiaryUpdate, NewBeneficiary},
    traits::{BeneficiaryError, BeneficiaryManagement, LedgerError},
};

/// Contacts a user has saved so that airtime can be shared without typing the number every time.
///
/// Names are trimmed and phone numbers are stored in the 11-digit local form, so `803 123 4567` and `08031234567`
/// are the same beneficiary.
pub struct BeneficiaryApi<B> {
    db: B,
}

impl<B: Debug> Debug for BeneficiaryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BeneficiaryApi ({:?})", self.db)
    }
}

impl<B> BeneficiaryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> BeneficiaryApi<B>
where B: BeneficiaryManagement
{
    pub async fn add_beneficiary(&self, beneficiary: NewBeneficiary) -> Result<Beneficiary, BeneficiaryError> {
        let user_id = beneficiary.user_id;
        if self.db.fetch_user(user_id).await?.is_none() {
            return Err(LedgerError::UserNotFound(user_id).into());
        }
        let beneficiary = NewBeneficiary {
            name: clean_name(&beneficiary.name)?,
            phone_number: clean_phone(&beneficiary.phone_number)?,
            ..beneficiary
        };
        let beneficiary = self.db.insert_beneficiary(beneficiary).await?;
        info!("📇️ {} ({}) saved as a beneficiary of user #{user_id}", beneficiary.name, beneficiary.phone_number);
        Ok(beneficiary)
    }

    /// Most recently saved first.
    pub async fn beneficiaries(&self, user_id: i64) -> Result<Vec<Beneficiary>, BeneficiaryError> {
        self.db.fetch_beneficiaries(user_id).await
    }

    pub async fn beneficiary_by_phone(
        &self,
        user_id: i64,
        phone_number: &str,
    ) -> Result<Option<Beneficiary>, BeneficiaryError> {
        let phone = clean_phone(phone_number)?;
        self.db.fetch_beneficiary_by_phone(user_id, &phone).await
    }

    pub async fn update_beneficiary(
        &self,
        user_id: i64,
        id: i64,
        update: BeneficiaryUpdate,
    ) -> Result<Beneficiary, BeneficiaryError> {
        if update.is_empty() {
            return Err(BeneficiaryError::InvalidInput("Nothing to update".into()));
        }
        let update = BeneficiaryUpdate {
            name: update.name.as_deref().map(clean_name).transpose()?,
            phone_number: update.phone_number.as_deref().map(clean_phone).transpose()?,
            network: update.network,
        };
        let beneficiary =
            self.db.update_beneficiary(user_id, id, update).await?.ok_or(BeneficiaryError::NotFound { user_id, id })?;
        debug!("📇️ Beneficiary #{id} of user #{user_id} updated");
        Ok(beneficiary)
    }

    pub async fn delete_beneficiary(&self, user_id: i64, id: i64) -> Result<(), BeneficiaryError> {
        if self.db.delete_beneficiary(user_id, id).await? {
            info!("📇️ Beneficiary #{id} of user #{user_id} deleted");
            Ok(())
        } else {
            Err(BeneficiaryError::NotFound { user_id, id })
        }
    }
}

fn clean_name(name: &str) -> Result<String, BeneficiaryError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(BeneficiaryError::InvalidInput(format!(
            "The name must be at least {MIN_NAME_LENGTH} characters long"
        )));
    }
    Ok(name.to_string())
}

fn clean_phone(phone: &str) -> Result<String, BeneficiaryError> {
    normalize_phone(phone).ok_or_else(|| BeneficiaryError::InvalidInput(format!("{phone} is not a valid phone number")))
}
