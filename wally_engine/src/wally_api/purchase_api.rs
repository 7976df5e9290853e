use std::fmt::Debug;

use log::*;
use serde_json::json;
use wally_common::Kobo;

use crate::{
    db_types::{Category, NewLedgerEntry, NewReconciliationAlert, ReconciliationAlert},
    events::{EventProducers, ReconciliationAlertEvent},
    traits::{Fulfillment, FulfillmentKind, FulfillmentOp, LedgerError, LedgerManagement},
    wally_api::{errors::PurchaseError, purchase_objects::Receipt},
};

/// `PurchaseApi` spends wallet money on third-party goods: airtime, data, bills and transfers.
///
/// The order of operations is fixed: check the balance, ask the provider to deliver, and only then debit the wallet.
/// No funds are held while the provider works, so the debit re-checks the balance when it commits. If the provider
/// delivered but the debit is refused, the goods cannot be taken back; a reconciliation alert is raised for an
/// operator instead.
pub struct PurchaseApi<B, F> {
    db: B,
    fulfillment: F,
    producers: EventProducers,
}

impl<B, F> Debug for PurchaseApi<B, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PurchaseApi")
    }
}

impl<B, F> PurchaseApi<B, F> {
    pub fn new(db: B, fulfillment: F, producers: EventProducers) -> Self {
        Self { db, fulfillment, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, F> PurchaseApi<B, F>
where
    B: LedgerManagement,
    F: Fulfillment,
{
    /// Buys `op` for `amount` on behalf of `user_id`. The amount sent to the provider is always `amount`.
    pub async fn purchase(
        &self,
        user_id: i64,
        amount: Kobo,
        category: Category,
        mut op: FulfillmentOp,
    ) -> Result<Receipt, PurchaseError> {
        if !amount.is_positive() {
            return Err(PurchaseError::InvalidAmount(amount));
        }
        op.amount = amount;
        let wallet = self.db.fetch_wallet(user_id).await?.ok_or(LedgerError::WalletNotFound(user_id))?;
        if wallet.balance < amount {
            info!("🛒️ User #{user_id} cannot afford {amount} of {category}. Balance: {}", wallet.balance);
            return Err(PurchaseError::InsufficientFunds { balance: wallet.balance, requested: amount });
        }
        let receipt = self.fulfillment.execute(&op).await.map_err(|e| {
            info!("🛒️ {category} purchase of {amount} for user #{user_id} failed at the provider. No debit. {e}");
            PurchaseError::FulfillmentFailed(e)
        })?;
        let provider_transaction_id = receipt.transaction_id;
        debug!("🛒️ Provider delivered {category} for user #{user_id} as [{provider_transaction_id}]");
        let entry = NewLedgerEntry::new(user_id, amount, category, describe(&op)).with_metadata(json!({
            "provider_transaction_id": provider_transaction_id,
            "network": op.network,
            "phone": op.phone,
            "plan": op.plan,
            "recipient_name": op.recipient_name,
        }));
        match self.db.debit(entry).await {
            Ok(entry) => {
                info!("🛒️ User #{user_id} charged {amount} for {category} [{}]", entry.reference);
                let new_balance = entry.balance_after;
                Ok(Receipt { entry, provider_transaction_id, new_balance })
            },
            Err(e) => {
                let err = self.raise_reconciliation_alert(user_id, amount, category, &op, provider_transaction_id, e).await;
                Err(err)
            },
        }
    }

    pub async fn open_reconciliation_alerts(&self) -> Result<Vec<ReconciliationAlert>, PurchaseError> {
        Ok(self.db.fetch_open_reconciliation_alerts().await?)
    }

    pub async fn resolve_reconciliation_alert(&self, id: i64) -> Result<ReconciliationAlert, PurchaseError> {
        let alert = self.db.resolve_reconciliation_alert(id).await?;
        info!("🛒️ Reconciliation alert #{id} marked as resolved");
        Ok(alert)
    }

    /// The goods are out of the door but the money did not move. This must reach a human, so the alert is stored,
    /// published and logged. Any one of those failing does not stop the others.
    async fn raise_reconciliation_alert(
        &self,
        user_id: i64,
        amount: Kobo,
        category: Category,
        op: &FulfillmentOp,
        provider_transaction_id: String,
        cause: LedgerError,
    ) -> PurchaseError {
        let reason = cause.to_string();
        error!(
            "🛒️ RECONCILIATION: {category} [{provider_transaction_id}] worth {amount} was delivered to user #{user_id} \
             but the debit failed: {reason}"
        );
        let alert = NewReconciliationAlert {
            user_id,
            amount,
            category,
            provider_transaction_id: provider_transaction_id.clone(),
            reason: reason.clone(),
            details: json!(op),
        };
        let alert_id = match self.db.insert_reconciliation_alert(alert.clone()).await {
            Ok(stored) => Some(stored.id),
            Err(e) => {
                error!("🛒️ RECONCILIATION: could not store the alert ({e}). Full alert: {alert:?}");
                None
            },
        };
        for emitter in &self.producers.reconciliation_alert_producer {
            emitter.publish_event(ReconciliationAlertEvent::new(alert_id, alert.clone())).await;
        }
        PurchaseError::ReconciliationAlert { alert_id, provider_transaction_id, reason }
    }
}

fn describe(op: &FulfillmentOp) -> String {
    let network = op.network.to_uppercase();
    match op.kind {
        FulfillmentKind::Airtime => format!("{network} airtime for {}", op.phone),
        FulfillmentKind::Data => {
            format!("{network} data ({}) for {}", op.plan.as_deref().unwrap_or("custom plan"), op.phone)
        },
        FulfillmentKind::AirtimeSharing => match &op.recipient_name {
            Some(name) => format!("{network} airtime shared with {name} ({})", op.phone),
            None => format!("{network} airtime shared with {}", op.phone),
        },
        FulfillmentKind::Bill => format!("{network} bill payment for {}", op.phone),
        FulfillmentKind::Transfer => match &op.recipient_name {
            Some(name) => format!("Transfer to {name} ({})", op.phone),
            None => format!("Transfer to {}", op.phone),
        },
    }
}
