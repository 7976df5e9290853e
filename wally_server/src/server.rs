use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use wally_engine::{
    conversation::ConversationGuard,
    events::EventProducers,
    BeneficiaryApi,
    LedgerApi,
    PurchaseApi,
    ReminderApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::{create_wallet_event_handlers, PaystackApi, TelegramNotifier, VtuApi},
    middleware::ApiTokenMiddlewareFactory,
    reminder_worker::{start_guard_sweeper, start_reminder_worker},
    routes::{
        enter_dialog,
        health,
        leave_dialog,
        submit_dialog_input,
        AddBeneficiaryRoute,
        BalanceRoute,
        BeneficiariesRoute,
        BeneficiaryByPhoneRoute,
        CreateUserRoute,
        DeleteBeneficiaryRoute,
        HistoryRoute,
        InitializePaymentRoute,
        LowBalanceScanRoute,
        MilestoneScanRoute,
        PaystackWebhookRoute,
        PurchaseRoute,
        ReconciliationAlertsRoute,
        ReminderSettingsRoute,
        ResolveAlertRoute,
        SpendingSummaryRoute,
        UpdateBeneficiaryRoute,
        UpdateReminderSettingsRoute,
        UserByChatIdRoute,
        VerifyPaymentRoute,
    },
};

/// The third-party clients the server hands to the engine.
#[derive(Clone)]
pub struct Providers {
    pub paystack: PaystackApi,
    pub vtu: VtuApi,
    pub notifier: TelegramNotifier,
}

impl Providers {
    /// Payments and purchases cannot work without their keys, so those are required. Chat notifications are
    /// optional: without a bot token, messages are logged and dropped.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let paystack =
            PaystackApi::new(config.paystack.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        let vtu = VtuApi::new(config.vtu.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        let notifier =
            TelegramNotifier::new(config.telegram.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        if config.telegram.bot_token.reveal().is_empty() {
            warn!("🪛️ WALLY_TELEGRAM_BOT_TOKEN is not set. Users will not receive chat notifications.");
        }
        Ok(Self { paystack, vtu, notifier })
    }
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let providers = Providers::from_config(&config)?;
    let handlers = create_wallet_event_handlers(db.clone(), providers.notifier.clone());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let guard = Arc::new(ConversationGuard::new(config.step_timeout));
    let _sweeper = start_guard_sweeper(Arc::clone(&guard));
    if config.reminders.enabled {
        let _workers = start_reminder_worker(db.clone(), providers.notifier.clone(), config.reminders);
    } else {
        info!("🕰️ The reminder worker is disabled. Scans will only run when /api/scheduler is called.");
    }
    let srv = create_server_instance(config, db, providers, producers, guard)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    providers: Providers,
    producers: EventProducers,
    guard: Arc<ConversationGuard>,
) -> Result<Server, ServerError> {
    let guard = web::Data::from(guard);
    let options = ServerOptions::from_config(&config);
    let api_token = config.api_token.clone();
    let srv = HttpServer::new(move || {
        let ledger_api = LedgerApi::new(db.clone());
        let settlement_api = SettlementApi::new(
            db.clone(),
            providers.paystack.clone(),
            providers.paystack.clone(),
            producers.clone(),
        );
        let purchase_api = PurchaseApi::new(db.clone(), providers.vtu.clone(), producers.clone());
        let reminder_api = ReminderApi::new(db.clone(), providers.notifier.clone());
        let beneficiary_api = BeneficiaryApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("wally::access_log"))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(purchase_api))
            .app_data(web::Data::new(reminder_api))
            .app_data(web::Data::new(beneficiary_api))
            .app_data(web::Data::new(options))
            .app_data(guard.clone());
        // Routes that require the API token
        let api_scope = web::scope("/api")
            .wrap(ApiTokenMiddlewareFactory::new(api_token.clone()))
            .service(VerifyPaymentRoute::<SqliteDatabase, PaystackApi, PaystackApi>::new())
            .service(InitializePaymentRoute::<SqliteDatabase, PaystackApi, PaystackApi>::new())
            .service(CreateUserRoute::<SqliteDatabase>::new())
            .service(UserByChatIdRoute::<SqliteDatabase>::new())
            .service(BalanceRoute::<SqliteDatabase>::new())
            .service(HistoryRoute::<SqliteDatabase>::new())
            .service(SpendingSummaryRoute::<SqliteDatabase>::new())
            .service(PurchaseRoute::<SqliteDatabase, VtuApi>::new())
            .service(ReconciliationAlertsRoute::<SqliteDatabase, VtuApi>::new())
            .service(ResolveAlertRoute::<SqliteDatabase, VtuApi>::new())
            .service(ReminderSettingsRoute::<SqliteDatabase, TelegramNotifier>::new())
            .service(UpdateReminderSettingsRoute::<SqliteDatabase, TelegramNotifier>::new())
            .service(LowBalanceScanRoute::<SqliteDatabase, TelegramNotifier>::new())
            .service(MilestoneScanRoute::<SqliteDatabase, TelegramNotifier>::new())
            .service(BeneficiariesRoute::<SqliteDatabase>::new())
            .service(AddBeneficiaryRoute::<SqliteDatabase>::new())
            .service(BeneficiaryByPhoneRoute::<SqliteDatabase>::new())
            .service(UpdateBeneficiaryRoute::<SqliteDatabase>::new())
            .service(DeleteBeneficiaryRoute::<SqliteDatabase>::new())
            .service(enter_dialog)
            .service(submit_dialog_input)
            .service(leave_dialog);
        // Paystack authenticates itself with the webhook signature
        let paystack_scope =
            web::scope("/paystack").service(PaystackWebhookRoute::<SqliteDatabase, PaystackApi, PaystackApi>::new());
        app.service(health).service(api_scope).service(paystack_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("💻️ Wally server listening on {}:{}", config.host, config.port);
    Ok(srv)
}
