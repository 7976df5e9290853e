use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use serde_json::json;
use wally_common::Kobo;

use crate::{
    db_types::{Category, IntentStatus, LedgerEntry, NewLedgerEntry, NewPaymentIntent, PaymentIntent},
    events::{EventProducers, WalletCreditedEvent},
    helpers::new_payment_reference,
    traits::{CheckoutProvider, LedgerError, PaymentVerifier, SettlementDatabase, VerifiedPayment},
    wally_api::{
        errors::SettlementError,
        settlement_objects::{SettleOutcome, WebhookEvent},
    },
};

/// Smallest amount a user can fund their wallet with.
pub const MIN_FUNDING_AMOUNT: Kobo = Kobo::from_naira(100);
/// How long a hosted checkout link stays valid.
pub const INTENT_LIFETIME_MINUTES: i64 = 60;

/// `SettlementApi` turns payments confirmed by the payment processor into wallet credits.
///
/// Two independent triggers reach [`SettlementApi::settle`] for the same reference: the processor's webhook and the
/// user pressing "verify payment". Either may arrive first, both may arrive together, and the webhook may be
/// retried. Settlement guarantees that no matter how the calls interleave, a reference is credited at most once.
///
/// The slow part (asking the processor) happens outside any database transaction. Only the final
/// `pending -> completed` compare-and-swap and the credit run together, atomically.
pub struct SettlementApi<B, V, C> {
    db: B,
    verifier: V,
    checkout: C,
    producers: EventProducers,
}

impl<B, V, C> Debug for SettlementApi<B, V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B, V, C> SettlementApi<B, V, C> {
    pub fn new(db: B, verifier: V, checkout: C, producers: EventProducers) -> Self {
        Self { db, verifier, checkout, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, V, C> SettlementApi<B, V, C>
where
    B: SettlementDatabase,
    V: PaymentVerifier,
    C: CheckoutProvider,
{
    /// Opens a funding request. A `pending` payment intent is stored along with the checkout URL the user must visit.
    pub async fn create_intent(
        &self,
        user_id: i64,
        email: &str,
        amount: Kobo,
    ) -> Result<PaymentIntent, SettlementError> {
        if amount < MIN_FUNDING_AMOUNT {
            return Err(SettlementError::AmountTooSmall { minimum: MIN_FUNDING_AMOUNT, requested: amount });
        }
        if self.db.fetch_user(user_id).await?.is_none() {
            return Err(SettlementError::UserNotFound(user_id));
        }
        let reference = new_payment_reference();
        let authorization_url =
            self.checkout.initialize(&reference, email, amount).await.map_err(SettlementError::Checkout)?;
        let intent = NewPaymentIntent {
            reference,
            user_id,
            amount,
            authorization_url,
            expires_at: Utc::now() + Duration::minutes(INTENT_LIFETIME_MINUTES),
        };
        let intent = self.db.insert_payment_intent(intent).await?;
        info!("🔄️ Funding request [{}] for {} opened by user #{user_id}", intent.reference, intent.amount);
        Ok(intent)
    }

    pub async fn fetch_intent(&self, reference: &str) -> Result<Option<PaymentIntent>, SettlementError> {
        Ok(self.db.fetch_payment_intent(reference).await?)
    }

    /// Settles the payment intent identified by `reference`.
    ///
    /// * Unknown references fail with [`SettlementError::UnknownReference`].
    /// * A `completed` intent is a no-op that reports `already_settled`.
    /// * A `failed` intent is terminal and is reported as such without asking the processor again.
    /// * Otherwise the processor is asked. A successful charge for at least the intent amount moves the intent to
    ///   `completed` and credits the wallet in one transaction. Anything else moves the intent to `failed`.
    ///
    /// If the processor cannot give a final answer (it is unreachable, or the charge is still in progress) the error
    /// is returned and the intent stays `pending`.
    pub async fn settle(&self, reference: &str) -> Result<SettleOutcome, SettlementError> {
        let intent = match self.db.fetch_payment_intent(reference).await? {
            Some(intent) => intent,
            None => {
                warn!("🔄️ Settlement was requested for unknown reference [{reference}]");
                return Err(SettlementError::UnknownReference(reference.to_string()));
            },
        };
        match intent.status {
            IntentStatus::Completed => {
                debug!("🔄️ [{reference}] is already settled. Nothing to do.");
                return Ok(SettleOutcome::already_settled(reference, intent.amount));
            },
            IntentStatus::Failed => {
                debug!("🔄️ [{reference}] has already failed. A new funding request is needed.");
                return Ok(SettleOutcome::failed(reference, intent.amount));
            },
            IntentStatus::Pending => {},
        }
        let verified = self.verifier.verify(reference).await.map_err(|e| {
            info!("🔄️ Could not verify [{reference}]: {e}");
            SettlementError::Verification(e)
        })?;
        if self.is_acceptable(&intent, &verified) {
            self.complete(intent, verified).await
        } else {
            self.fail(intent, verified).await
        }
    }

    /// Entry point for the processor webhook. The signature is checked before anything else is looked at.
    ///
    /// Returns `None` for events that do not trigger settlement.
    pub async fn process_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<Option<SettleOutcome>, SettlementError> {
        if !self.verifier.check_signature(payload, signature) {
            warn!("🔄️ Rejecting webhook with an invalid signature");
            return Err(SettlementError::SignatureInvalid);
        }
        let event: WebhookEvent =
            serde_json::from_slice(payload).map_err(|e| SettlementError::MalformedWebhook(e.to_string()))?;
        if !event.is_charge_success() {
            debug!("🔄️ Ignoring '{}' webhook for [{}]", event.event, event.data.reference);
            return Ok(None);
        }
        trace!("🔄️ charge.success webhook received for [{}]", event.data.reference);
        self.settle(&event.data.reference).await.map(Some)
    }

    fn is_acceptable(&self, intent: &PaymentIntent, verified: &VerifiedPayment) -> bool {
        if !verified.success {
            return false;
        }
        if verified.amount < intent.amount {
            error!(
                "🔄️ ANOMALY: [{}] was verified as paid, but for {} instead of {}. The payment will not be credited.",
                intent.reference, verified.amount, intent.amount
            );
            return false;
        }
        if verified.amount > intent.amount {
            warn!(
                "🔄️ [{}] was paid with {}, more than the {} requested. Only the requested amount is credited.",
                intent.reference, verified.amount, intent.amount
            );
        }
        true
    }

    async fn complete(
        &self,
        intent: PaymentIntent,
        verified: VerifiedPayment,
    ) -> Result<SettleOutcome, SettlementError> {
        let reference = intent.reference.as_str();
        let credit = NewLedgerEntry::new(intent.user_id, intent.amount, Category::Funding, "Wallet funding")
            .with_reference(reference)
            .with_metadata(json!({
                "provider_transaction_id": verified.provider_transaction_id,
                "verified_amount": verified.amount,
            }));
        match self.db.complete_intent_with_credit(reference, credit).await {
            Ok(Some((intent, entry))) => {
                info!("🔄️ [{reference}] settled. User #{} credited with {}", entry.user_id, entry.amount);
                self.call_wallet_credited_hook(&intent, &entry).await;
                Ok(SettleOutcome::credited(reference, entry))
            },
            Ok(None) => self.lost_race(reference).await,
            // Only possible if someone wrote a ledger entry with this reference outside of settlement
            Err(LedgerError::DuplicateReference(r)) => {
                error!("🔄️ A ledger entry with reference [{r}] exists, but the intent was still pending");
                Err(SettlementError::Ledger(LedgerError::DuplicateReference(r)))
            },
            Err(e) => {
                error!("🔄️ Could not credit [{reference}]. The intent remains pending. {e}");
                Err(e.into())
            },
        }
    }

    async fn fail(&self, intent: PaymentIntent, verified: VerifiedPayment) -> Result<SettleOutcome, SettlementError> {
        let reference = intent.reference.as_str();
        let reason = verified.message.unwrap_or_else(|| "no reason given".to_string());
        match self.db.fail_intent(reference).await? {
            Some(_) => {
                info!("🔄️ [{reference}] failed verification ({reason}). The wallet was not credited.");
                Ok(SettleOutcome::failed(reference, intent.amount))
            },
            None => self.lost_race(reference).await,
        }
    }

    /// Another caller moved the intent out of `pending` while we were talking to the processor. Report what they did.
    async fn lost_race(&self, reference: &str) -> Result<SettleOutcome, SettlementError> {
        let intent = self
            .db
            .fetch_payment_intent(reference)
            .await?
            .ok_or_else(|| SettlementError::UnknownReference(reference.to_string()))?;
        debug!("🔄️ [{reference}] was settled concurrently. Final status is {}", intent.status);
        match intent.status {
            IntentStatus::Completed => Ok(SettleOutcome::already_settled(reference, intent.amount)),
            _ => Ok(SettleOutcome::failed(reference, intent.amount)),
        }
    }

    async fn call_wallet_credited_hook(&self, intent: &PaymentIntent, entry: &LedgerEntry) {
        for emitter in &self.producers.wallet_credited_producer {
            debug!("🔄️ Notifying wallet credited hook subscribers");
            let event = WalletCreditedEvent::new(intent.clone(), entry.clone());
            emitter.publish_event(event).await;
        }
    }
}
