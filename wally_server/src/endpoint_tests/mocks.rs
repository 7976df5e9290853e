use chrono::{DateTime, Utc};
use mockall::mock;
use wally_common::Kobo;
use wally_engine::{
    db_types::{
        Beneficiary,
        BeneficiaryUpdate,
        DebitActivity,
        LedgerEntry,
        LowBalanceCandidate,
        MilestoneCandidate,
        MilestoneCursors,
        NewBeneficiary,
        NewLedgerEntry,
        NewPaymentIntent,
        NewReconciliationAlert,
        NewUser,
        PaymentIntent,
        ReconciliationAlert,
        Reminder,
        ReminderType,
        User,
        Wallet,
    },
    traits::{
        BeneficiaryError,
        BeneficiaryManagement,
        CheckoutProvider,
        Fulfillment,
        FulfillmentOp,
        FulfillmentReceipt,
        LedgerError,
        LedgerManagement,
        NotificationAction,
        Notifier,
        PaymentVerifier,
        ProviderError,
        ReminderError,
        ReminderManagement,
        SettlementDatabase,
        VerifiedPayment,
    },
};

mock! {
    pub WalletDb {}
    impl Clone for WalletDb {
        fn clone(&self) -> Self;
    }
    impl LedgerManagement for WalletDb {
        fn url(&self) -> &str;
        async fn create_user(&self, user: NewUser) -> Result<User, LedgerError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LedgerError>;
        async fn fetch_user_by_chat_id(&self, chat_id: &str) -> Result<Option<User>, LedgerError>;
        async fn fetch_wallet(&self, user_id: i64) -> Result<Option<Wallet>, LedgerError>;
        async fn credit(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError>;
        async fn debit(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError>;
        async fn fetch_history(&self, user_id: i64, limit: u32) -> Result<Vec<LedgerEntry>, LedgerError>;
        async fn fetch_entry_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>, LedgerError>;
        async fn fetch_debits_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<Vec<LedgerEntry>, LedgerError>;
        async fn debit_activity_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<DebitActivity, LedgerError>;
        async fn insert_reconciliation_alert(&self, alert: NewReconciliationAlert) -> Result<ReconciliationAlert, LedgerError>;
        async fn fetch_open_reconciliation_alerts(&self) -> Result<Vec<ReconciliationAlert>, LedgerError>;
        async fn resolve_reconciliation_alert(&self, id: i64) -> Result<ReconciliationAlert, LedgerError>;
    }
    impl SettlementDatabase for WalletDb {
        async fn insert_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, LedgerError>;
        async fn fetch_payment_intent(&self, reference: &str) -> Result<Option<PaymentIntent>, LedgerError>;
        async fn complete_intent_with_credit(&self, reference: &str, credit: NewLedgerEntry) -> Result<Option<(PaymentIntent, LedgerEntry)>, LedgerError>;
        async fn fail_intent(&self, reference: &str) -> Result<Option<PaymentIntent>, LedgerError>;
    }
    impl ReminderManagement for WalletDb {
        async fn fetch_reminder(&self, user_id: i64, reminder_type: ReminderType) -> Result<Option<Reminder>, ReminderError>;
        async fn update_reminder_settings(&self, user_id: i64, reminder_type: ReminderType, threshold: Option<Kobo>, is_active: Option<bool>) -> Result<Reminder, ReminderError>;
        async fn fetch_low_balance_candidates(&self) -> Result<Vec<LowBalanceCandidate>, ReminderError>;
        async fn claim_reminder(&self, reminder_id: i64, now: DateTime<Utc>, cutoff: DateTime<Utc>) -> Result<bool, ReminderError>;
        async fn fetch_milestone_candidates(&self) -> Result<Vec<MilestoneCandidate>, ReminderError>;
        async fn update_milestone_cursors(&self, reminder_id: i64, current: MilestoneCursors, next: MilestoneCursors, sent_at: Option<DateTime<Utc>>) -> Result<bool, ReminderError>;
    }
    impl BeneficiaryManagement for WalletDb {
        async fn insert_beneficiary(&self, beneficiary: NewBeneficiary) -> Result<Beneficiary, BeneficiaryError>;
        async fn fetch_beneficiaries(&self, user_id: i64) -> Result<Vec<Beneficiary>, BeneficiaryError>;
        async fn fetch_beneficiary_by_phone(&self, user_id: i64, phone_number: &str) -> Result<Option<Beneficiary>, BeneficiaryError>;
        async fn update_beneficiary(&self, user_id: i64, id: i64, update: BeneficiaryUpdate) -> Result<Option<Beneficiary>, BeneficiaryError>;
        async fn delete_beneficiary(&self, user_id: i64, id: i64) -> Result<bool, BeneficiaryError>;
    }
}

mock! {
    pub Verifier {}
    impl PaymentVerifier for Verifier {
        async fn verify(&self, reference: &str) -> Result<VerifiedPayment, ProviderError>;
        fn check_signature(&self, payload: &[u8], signature: &str) -> bool;
    }
}

mock! {
    pub Checkout {}
    impl CheckoutProvider for Checkout {
        async fn initialize(&self, reference: &str, email: &str, amount: Kobo) -> Result<String, ProviderError>;
    }
}

mock! {
    pub Vtu {}
    impl Fulfillment for Vtu {
        async fn execute(&self, op: &FulfillmentOp) -> Result<FulfillmentReceipt, ProviderError>;
    }
}

mock! {
    pub ChatNotifier {}
    impl Notifier for ChatNotifier {
        async fn send(&self, chat_id: &str, text: &str, actions: &[NotificationAction]) -> Result<(), ProviderError>;
    }
}
