//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Provider calls and database access are always awaited, never
//! blocked on. The conversation guard is the one synchronous dependency, and it only ever holds its lock for a map
//! lookup.
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use bytes::Bytes;
use chrono::Utc;
use log::*;
use wally_engine::{
    conversation::{ConversationGuard, Topic},
    db_types::{BeneficiaryUpdate, NewBeneficiary, Network, NewUser, ReminderType},
    traits::{
        BeneficiaryManagement,
        CheckoutProvider,
        Fulfillment,
        LedgerManagement,
        Notifier,
        PaymentVerifier,
        ReminderManagement,
        SettlementDatabase,
    },
    BeneficiaryApi,
    LedgerApi,
    PurchaseApi,
    ReminderApi,
    SettlementApi,
    SettlementError,
};

use crate::{
    config::ServerOptions,
    data_objects::{
        BalanceResponse,
        BeneficiaryRequest,
        BeneficiaryUpdateRequest,
        DialogInput,
        DialogResponse,
        HistoryParams,
        InitializePaymentRequest,
        InitializePaymentResponse,
        JsonResponse,
        PurchaseRequest,
        ReminderSettingsRequest,
        SummaryParams,
        VerifyParams,
    },
    errors::ServerError,
    helpers::get_remote_ip,
    integrations::PAYSTACK_SIGNATURE_HEADER,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// The handler's type parameters must be declared in the same order as the bounds listed in the macro call.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Paystack  ----------------------------------------------------
route!(paystack_webhook => Post "/webhook" impl SettlementDatabase, PaymentVerifier, CheckoutProvider);
/// Receives charge notifications from Paystack.
///
/// The body is read raw, since the signature covers the exact bytes that were sent. A missing or invalid signature
/// is refused with a 401. Everything else gets a 200, even when processing fails, otherwise Paystack keeps
/// re-sending the event. Users can always fall back to the manual verify route.
pub async fn paystack_webhook<B, V, C>(
    req: HttpRequest,
    body: Bytes,
    api: web::Data<SettlementApi<B, V, C>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    V: PaymentVerifier,
    C: CheckoutProvider,
{
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    let peer = peer.map(|ip| ip.to_string()).unwrap_or_else(|| "an unknown address".to_string());
    trace!("💻️ Received Paystack webhook from {peer}");
    let signature = match req.headers().get(PAYSTACK_SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => {
            warn!("💻️ Paystack webhook from {peer} has no signature. Rejecting it.");
            return Err(ServerError::InvalidSignature);
        },
    };
    let result = match api.process_webhook(&body, signature).await {
        Ok(Some(outcome)) if outcome.credited => {
            info!("💻️ Webhook settled [{}] for {}", outcome.reference, outcome.amount);
            JsonResponse::success("Payment credited.")
        },
        Ok(Some(outcome)) if outcome.already_settled => JsonResponse::success("Payment already credited."),
        Ok(Some(outcome)) => {
            info!("💻️ Webhook for [{}] did not result in a credit. Status: {}", outcome.reference, outcome.status);
            JsonResponse::failure("Payment was not credited.")
        },
        Ok(None) => JsonResponse::success("Event ignored."),
        Err(SettlementError::SignatureInvalid) => {
            warn!("💻️ Paystack webhook from {peer} has an invalid signature. Rejecting it.");
            return Err(ServerError::InvalidSignature);
        },
        Err(e) => {
            warn!("💻️ Could not process Paystack webhook. {e}");
            JsonResponse::failure("Event could not be processed.")
        },
    };
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(verify_payment => Get "/payment/verify" impl SettlementDatabase, PaymentVerifier, CheckoutProvider);
/// Lets the user ask for their payment to be checked, for when the webhook is late or never arrives.
pub async fn verify_payment<B, V, C>(
    query: web::Query<VerifyParams>,
    api: web::Data<SettlementApi<B, V, C>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    V: PaymentVerifier,
    C: CheckoutProvider,
{
    let reference = query.into_inner().reference;
    debug!("💻️ GET verify_payment({reference})");
    let outcome = api.settle(&reference).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(initialize_payment => Post "/payment/initialize" impl SettlementDatabase, PaymentVerifier, CheckoutProvider);
pub async fn initialize_payment<B, V, C>(
    body: web::Json<InitializePaymentRequest>,
    api: web::Data<SettlementApi<B, V, C>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    V: PaymentVerifier,
    C: CheckoutProvider,
{
    let req = body.into_inner();
    debug!("💻️ POST initialize_payment for user #{} ({})", req.user_id, req.amount);
    let intent = api.create_intent(req.user_id, &req.email, req.amount).await?;
    Ok(HttpResponse::Ok().json(InitializePaymentResponse::from(intent)))
}

//----------------------------------------------   Users & wallets  ----------------------------------------------
route!(create_user => Post "/users" impl LedgerManagement);
pub async fn create_user<B: LedgerManagement>(
    body: web::Json<NewUser>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user = api.create_user(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

route!(user_by_chat_id => Get "/users/{chat_id}" impl LedgerManagement);
pub async fn user_by_chat_id<B: LedgerManagement>(
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let chat_id = path.into_inner();
    debug!("💻️ GET user_by_chat_id({chat_id})");
    let user = api
        .user_by_chat_id(&chat_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No user is registered for chat {chat_id}")))?;
    Ok(HttpResponse::Ok().json(user))
}

route!(balance => Get "/wallet/{user_id}" impl LedgerManagement);
pub async fn balance<B: LedgerManagement>(
    path: web::Path<i64>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💻️ GET balance({user_id})");
    let wallet = api.get_wallet(user_id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(wallet)))
}

route!(history => Get "/wallet/{user_id}/history" impl LedgerManagement);
/// The most recent ledger entries first.
pub async fn history<B: LedgerManagement>(
    path: web::Path<i64>,
    query: web::Query<HistoryParams>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let limit = query.limit();
    debug!("💻️ GET history({user_id}, limit={limit})");
    let entries = api.get_history(user_id, limit).await?;
    Ok(HttpResponse::Ok().json(entries))
}

route!(spending_summary => Get "/wallet/{user_id}/summary" impl LedgerManagement);
pub async fn spending_summary<B: LedgerManagement>(
    path: web::Path<i64>,
    query: web::Query<SummaryParams>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let period = query.into_inner().period;
    debug!("💻️ GET spending_summary({user_id}, {period:?})");
    let summary = api.spending_summary(user_id, period, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

//----------------------------------------------   Purchases  ----------------------------------------------------
route!(purchase => Post "/purchase" impl LedgerManagement, Fulfillment);
pub async fn purchase<B, F>(
    body: web::Json<PurchaseRequest>,
    api: web::Data<PurchaseApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerManagement,
    F: Fulfillment,
{
    let req = body.into_inner();
    debug!("💻️ POST purchase: {:?} of {} for user #{}", req.kind, req.amount, req.user_id);
    let receipt = api.purchase(req.user_id, req.amount, req.category(), req.operation()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

route!(reconciliation_alerts => Get "/reconciliation/alerts" impl LedgerManagement, Fulfillment);
pub async fn reconciliation_alerts<B, F>(api: web::Data<PurchaseApi<B, F>>) -> Result<HttpResponse, ServerError>
where
    B: LedgerManagement,
    F: Fulfillment,
{
    let alerts = api.open_reconciliation_alerts().await?;
    Ok(HttpResponse::Ok().json(alerts))
}

route!(resolve_alert => Post "/reconciliation/alerts/{id}/resolve" impl LedgerManagement, Fulfillment);
pub async fn resolve_alert<B, F>(
    path: web::Path<i64>,
    api: web::Data<PurchaseApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerManagement,
    F: Fulfillment,
{
    let id = path.into_inner();
    debug!("💻️ POST resolve_alert({id})");
    let alert = api.resolve_reconciliation_alert(id).await?;
    Ok(HttpResponse::Ok().json(alert))
}

//----------------------------------------------   Reminders  ----------------------------------------------------
route!(reminder_settings => Get "/reminders/{user_id}/{reminder_type}" impl ReminderManagement, Notifier);
pub async fn reminder_settings<B, N>(
    path: web::Path<(i64, ReminderType)>,
    api: web::Data<ReminderApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: ReminderManagement,
    N: Notifier,
{
    let (user_id, reminder_type) = path.into_inner();
    let reminder = api.reminder(user_id, reminder_type).await?;
    Ok(HttpResponse::Ok().json(reminder))
}

route!(update_reminder_settings => Put "/reminders/{user_id}/{reminder_type}" impl ReminderManagement, Notifier);
pub async fn update_reminder_settings<B, N>(
    path: web::Path<(i64, ReminderType)>,
    body: web::Json<ReminderSettingsRequest>,
    api: web::Data<ReminderApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: ReminderManagement,
    N: Notifier,
{
    let (user_id, reminder_type) = path.into_inner();
    let settings = body.into_inner();
    if settings.threshold.is_some_and(|t| t.value() < 0) {
        return Err(ServerError::InvalidRequestBody("The threshold cannot be negative".into()));
    }
    debug!("💻️ PUT update_reminder_settings({user_id}, {reminder_type})");
    let reminder = api.update_reminder_settings(user_id, reminder_type, settings.threshold, settings.is_active).await?;
    Ok(HttpResponse::Ok().json(reminder))
}

route!(low_balance_scan => Post "/scheduler/low_balance" impl ReminderManagement, Notifier);
/// Lets an external cron job trigger the scan. It is safe to run alongside the in-process worker.
pub async fn low_balance_scan<B, N>(api: web::Data<ReminderApi<B, N>>) -> Result<HttpResponse, ServerError>
where
    B: ReminderManagement,
    N: Notifier,
{
    let report = api.run_low_balance_scan(Utc::now()).await?;
    info!("💻️ Low-balance scan triggered over HTTP: {report:?}");
    Ok(HttpResponse::Ok().json(report))
}

route!(milestone_scan => Post "/scheduler/milestones" impl ReminderManagement, Notifier);
pub async fn milestone_scan<B, N>(api: web::Data<ReminderApi<B, N>>) -> Result<HttpResponse, ServerError>
where
    B: ReminderManagement,
    N: Notifier,
{
    let report = api.run_milestone_scan(Utc::now()).await?;
    info!("💻️ Milestone scan triggered over HTTP: {report:?}");
    Ok(HttpResponse::Ok().json(report))
}

//----------------------------------------------   Beneficiaries  ------------------------------------------------
route!(beneficiaries => Get "/beneficiaries/{user_id}" impl BeneficiaryManagement);
pub async fn beneficiaries<B>(
    path: web::Path<i64>,
    api: web::Data<BeneficiaryApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
{
    let user_id = path.into_inner();
    let beneficiaries = api.beneficiaries(user_id).await?;
    Ok(HttpResponse::Ok().json(beneficiaries))
}

route!(add_beneficiary => Post "/beneficiaries/{user_id}" impl BeneficiaryManagement);
pub async fn add_beneficiary<B>(
    path: web::Path<i64>,
    body: web::Json<BeneficiaryRequest>,
    api: web::Data<BeneficiaryApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
{
    let user_id = path.into_inner();
    let BeneficiaryRequest { name, phone_number, network } = body.into_inner();
    debug!("💻️ POST add_beneficiary({user_id})");
    let network = parse_network(&network)?;
    let beneficiary = api.add_beneficiary(NewBeneficiary { user_id, name, phone_number, network }).await?;
    Ok(HttpResponse::Created().json(beneficiary))
}

route!(beneficiary_by_phone => Get "/beneficiaries/{user_id}/by_phone/{phone}" impl BeneficiaryManagement);
pub async fn beneficiary_by_phone<B>(
    path: web::Path<(i64, String)>,
    api: web::Data<BeneficiaryApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
{
    let (user_id, phone) = path.into_inner();
    let beneficiary = api
        .beneficiary_by_phone(user_id, &phone)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No beneficiary with phone number {phone}")))?;
    Ok(HttpResponse::Ok().json(beneficiary))
}

route!(update_beneficiary => Put "/beneficiaries/{user_id}/{id}" impl BeneficiaryManagement);
pub async fn update_beneficiary<B>(
    path: web::Path<(i64, i64)>,
    body: web::Json<BeneficiaryUpdateRequest>,
    api: web::Data<BeneficiaryApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
{
    let (user_id, id) = path.into_inner();
    let BeneficiaryUpdateRequest { name, phone_number, network } = body.into_inner();
    debug!("💻️ PUT update_beneficiary({user_id}, {id})");
    let network = network.as_deref().map(parse_network).transpose()?;
    let beneficiary = api.update_beneficiary(user_id, id, BeneficiaryUpdate { name, phone_number, network }).await?;
    Ok(HttpResponse::Ok().json(beneficiary))
}

route!(delete_beneficiary => Delete "/beneficiaries/{user_id}/{id}" impl BeneficiaryManagement);
pub async fn delete_beneficiary<B>(
    path: web::Path<(i64, i64)>,
    api: web::Data<BeneficiaryApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: BeneficiaryManagement,
{
    let (user_id, id) = path.into_inner();
    debug!("💻️ DELETE delete_beneficiary({user_id}, {id})");
    api.delete_beneficiary(user_id, id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Beneficiary deleted.")))
}

fn parse_network(network: &str) -> Result<Network, ServerError> {
    network.parse::<Network>().map_err(|e| ServerError::InvalidRequestBody(e.to_string()))
}

//----------------------------------------------   Conversations  ------------------------------------------------
#[post("/conversation/{chat_id}/{topic}")]
pub async fn enter_dialog(
    path: web::Path<(String, Topic)>,
    guard: web::Data<ConversationGuard>,
) -> Result<HttpResponse, ServerError> {
    let (chat_id, topic) = path.into_inner();
    let step = guard.enter(&chat_id, topic)?;
    Ok(HttpResponse::Ok().json(DialogResponse::from(step)))
}

#[post("/conversation/{chat_id}/{topic}/input")]
pub async fn submit_dialog_input(
    path: web::Path<(String, Topic)>,
    body: web::Json<DialogInput>,
    guard: web::Data<ConversationGuard>,
) -> Result<HttpResponse, ServerError> {
    let (chat_id, topic) = path.into_inner();
    let progress = guard.submit(&chat_id, topic, &body.input)?;
    Ok(HttpResponse::Ok().json(DialogResponse::from(progress)))
}

#[delete("/conversation/{chat_id}/{topic}")]
pub async fn leave_dialog(
    path: web::Path<(String, Topic)>,
    guard: web::Data<ConversationGuard>,
) -> Result<HttpResponse, ServerError> {
    let (chat_id, topic) = path.into_inner();
    let result = if guard.leave(&chat_id, topic) {
        JsonResponse::success(format!("The {topic} request was cancelled."))
    } else {
        JsonResponse::failure(format!("There is no {topic} request in progress."))
    };
    Ok(HttpResponse::Ok().json(result))
}
