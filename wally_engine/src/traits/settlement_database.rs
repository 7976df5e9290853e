use crate::{
    db_types::{LedgerEntry, NewLedgerEntry, NewPaymentIntent, PaymentIntent},
    traits::{LedgerError, LedgerManagement},
};

/// Storage behaviour needed by the settlement state machine.
///
/// The backend is the sole writer of a payment intent's `status`. The two transition methods are compare-and-swap
/// operations on `status = 'pending'`: exactly one caller can win each transition, and the loser gets `None` back.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: LedgerManagement {
    /// Stores a new `pending` payment intent. Fails with [`LedgerError::DuplicateReference`] if the reference exists.
    async fn insert_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, LedgerError>;

    async fn fetch_payment_intent(&self, reference: &str) -> Result<Option<PaymentIntent>, LedgerError>;

    /// In a single atomic transaction,
    /// * moves the intent from `pending` to `completed`,
    /// * credits the wallet with `credit` (whose reference must equal the intent reference).
    ///
    /// Returns `None` if the intent was not `pending` (someone else settled or failed it first). If the credit fails,
    /// the status change is rolled back and the error is returned, so the intent stays `pending` and can be retried.
    async fn complete_intent_with_credit(
        &self,
        reference: &str,
        credit: NewLedgerEntry,
    ) -> Result<Option<(PaymentIntent, LedgerEntry)>, LedgerError>;

    /// Moves the intent from `pending` to `failed`. Returns `None` if the intent was not `pending`.
    async fn fail_intent(&self, reference: &str) -> Result<Option<PaymentIntent>, LedgerError>;
}
