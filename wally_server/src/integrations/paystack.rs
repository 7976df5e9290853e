//! Paystack client.
//!
//! Implements [`PaymentVerifier`] and [`CheckoutProvider`] against the Paystack transaction API:
//! * `POST /transaction/initialize` opens a hosted checkout and returns its authorization URL.
//! * `GET /transaction/verify/{reference}` reports the state of a charge.
//!
//! Webhook bodies are signed with HMAC-SHA512 using the account secret key. The hex digest arrives in the
//! `x-paystack-signature` header.
use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use wally_common::Kobo;
use wally_engine::traits::{CheckoutProvider, PaymentVerifier, ProviderError, VerifiedPayment};

use crate::{config::PaystackConfig, helpers::verify_hmac};

pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

/// Every Paystack response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    /// Always in kobo
    amount: i64,
    id: Option<i64>,
    gateway_response: Option<String>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, ProviderError> {
        if config.secret_key.reveal().is_empty() {
            return Err(ProviderError::NotConfigured("the Paystack secret key is empty".into()));
        }
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| ProviderError::NotConfigured(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, ProviderError> {
        let url = self.url(path);
        trace!("🔄️ Paystack request: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| ProviderError::Unreachable(e.to_string()))?;
        let status = response.status();
        let envelope = response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("HTTP {status}. {e}")))?;
        match (status.is_success() && envelope.status, envelope.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ProviderError::InvalidResponse(format!("no data in response. {}", envelope.message))),
            (false, _) if status.is_server_error() => Err(ProviderError::Unreachable(envelope.message)),
            (false, _) => Err(ProviderError::Rejected(envelope.message)),
        }
    }
}

impl PaymentVerifier for PaystackApi {
    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, ProviderError> {
        let path = format!("/transaction/verify/{reference}");
        let data = self.rest_query::<VerifyData, ()>(Method::GET, &path, None).await?;
        debug!("🔄️ Paystack reports [{reference}] as '{}'", data.status);
        verified_payment(data)
    }

    fn check_signature(&self, payload: &[u8], signature: &str) -> bool {
        verify_hmac(self.config.secret_key.reveal(), payload, signature)
    }
}

impl CheckoutProvider for PaystackApi {
    async fn initialize(&self, reference: &str, email: &str, amount: Kobo) -> Result<String, ProviderError> {
        let mut body = json!({
            "email": email,
            "amount": amount.value(),
            "reference": reference,
        });
        if let Some(callback_url) = &self.config.callback_url {
            body["callback_url"] = json!(callback_url);
        }
        let data = self.rest_query::<InitializeData, _>(Method::POST, "/transaction/initialize", Some(body)).await?;
        debug!("🔄️ Paystack checkout opened for [{reference}]");
        Ok(data.authorization_url)
    }
}

/// Charges in a non-final state are reported as [`ProviderError::Incomplete`] so that the intent stays pending.
fn verified_payment(data: VerifyData) -> Result<VerifiedPayment, ProviderError> {
    let success = match data.status.as_str() {
        "success" => true,
        "failed" | "reversed" | "abandoned" => false,
        other => return Err(ProviderError::Incomplete(other.to_string())),
    };
    Ok(VerifiedPayment {
        success,
        amount: Kobo::from(data.amount),
        provider_transaction_id: data.id.map(|id| id.to_string()),
        message: data.gateway_response,
    })
}
