//! VTU (virtual top-up) provider client.
//!
//! All purchases are a `POST` to the provider's base URL with an `Action` field naming the product. Network and biller
//! names are translated to the provider's numeric service codes here.
use std::sync::Arc;

use chrono::Utc;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use wally_engine::traits::{Fulfillment, FulfillmentKind, FulfillmentOp, FulfillmentReceipt, ProviderError};

use crate::{config::VtuConfig, helpers::naira_string};

#[derive(Clone)]
pub struct VtuApi {
    config: VtuConfig,
    client: Arc<Client>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct VtuRequest {
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<String>,
    number: String,
    #[serde(rename = "Ref")]
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VtuResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
}

impl VtuApi {
    pub fn new(config: VtuConfig) -> Result<Self, ProviderError> {
        if config.api_key.reveal().is_empty() {
            return Err(ProviderError::NotConfigured("the VTU API key is empty".into()));
        }
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| ProviderError::NotConfigured(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }
}

impl Fulfillment for VtuApi {
    async fn execute(&self, op: &FulfillmentOp) -> Result<FulfillmentReceipt, ProviderError> {
        let request = build_request(op)?;
        let reference = request.reference.clone();
        trace!("🛒️ Sending {} request [{reference}] to the VTU provider", request.action);
        let response = self
            .client
            .post(&self.config.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;
        let status = response.status();
        if status.is_server_error() {
            return Err(ProviderError::Unreachable(format!("HTTP {status}")));
        }
        let body = response.json::<VtuResponse>().await.map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        if !status.is_success() || is_failure(&body) {
            let reason = body.response.unwrap_or_else(|| format!("HTTP {status}"));
            return Err(ProviderError::Rejected(reason));
        }
        let transaction_id = body.transaction_id.unwrap_or(reference);
        info!("🛒️ VTU provider accepted {:?} for {} as [{transaction_id}]", op.kind, op.phone);
        Ok(FulfillmentReceipt { transaction_id })
    }
}

fn is_failure(body: &VtuResponse) -> bool {
    matches!(body.status.as_deref().map(str::to_ascii_lowercase).as_deref(), Some("failed" | "error" | "fail"))
}

fn build_request(op: &FulfillmentOp) -> Result<VtuRequest, ProviderError> {
    let amount = Some(naira_string(op.amount));
    let number = op.phone.clone();
    let request = match op.kind {
        FulfillmentKind::Airtime | FulfillmentKind::AirtimeSharing => VtuRequest {
            action: "AIRTIME",
            service: Some(network_code(&op.network).to_string()),
            plan: None,
            amount,
            number,
            reference: new_vtu_reference("AIRTIME"),
        },
        FulfillmentKind::Data => {
            let plan = op.plan.clone().ok_or_else(|| ProviderError::Rejected("a data plan is required".into()))?;
            VtuRequest {
                action: "DATA",
                service: None,
                plan: Some(plan),
                amount: None,
                number,
                reference: new_vtu_reference("DATA"),
            }
        },
        FulfillmentKind::Bill => VtuRequest {
            action: "ELE",
            service: Some(meter_type_code(op.plan.as_deref()).to_string()),
            plan: Some(disco_code(&op.network).to_string()),
            amount,
            number,
            reference: new_vtu_reference("ELE"),
        },
        FulfillmentKind::Transfer => {
            return Err(ProviderError::Rejected("the VTU provider does not handle bank transfers".into()));
        },
    };
    Ok(request)
}

fn network_code(network: &str) -> &'static str {
    match network.to_ascii_uppercase().as_str() {
        "GLO" => "2",
        "AIRTEL" => "3",
        "9MOBILE" | "ETISALAT" => "4",
        _ => "1",
    }
}

fn meter_type_code(meter_type: Option<&str>) -> &'static str {
    match meter_type.map(str::to_ascii_uppercase).as_deref() {
        Some("POSTPAID") => "2",
        _ => "1",
    }
}

fn disco_code(disco: &str) -> &'static str {
    match disco.to_ascii_uppercase().as_str() {
        "BEDC" => "801",
        "EKEDC" => "802",
        "EEDC" => "803",
        "IKEDC" => "804",
        "IBDC" => "805",
        "PHED" => "806",
        "JED" => "807",
        "KEDCO" => "808",
        "KADCO" => "809",
        "ABA" => "810",
        _ => "800",
    }
}

/// At most 30 characters: prefix, unix millis, then random upper-case alphanumerics.
fn new_vtu_reference(prefix: &str) -> String {
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(16).map(|c| char::from(c).to_ascii_uppercase()).collect();
    let mut reference = format!("{prefix}{}{suffix}", Utc::now().timestamp_millis());
    reference.truncate(30);
    reference
}
