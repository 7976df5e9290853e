use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use thiserror::Error;
use wally_engine::{
    conversation::GuardError,
    BeneficiaryError,
    LedgerError,
    PurchaseError,
    ReminderError,
    SettlementError,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(String),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    DialogTimeout(String),
    #[error("The provider could not complete the request. {0}")]
    ProviderError(String),
    /// Goods were delivered without the wallet being charged. The details are in the reconciliation queue.
    #[error("The purchase was delivered and is awaiting reconciliation. {0}")]
    DeliveredUnpaid(String),
}

impl ServerError {
    /// The message returned to the caller. Server-side failures are reported without their internals.
    pub fn public_message(&self) -> String {
        match self {
            Self::InitializeError(_) |
            Self::BackendError(_) |
            Self::IOError(_) |
            Self::ConfigurationError(_) |
            Self::Unspecified(_) => "An internal error occurred. Please try again later.".to_string(),
            Self::DeliveredUnpaid(_) => {
                "Your purchase was delivered, but the payment needs a manual review. Support has been notified."
                    .to_string()
            },
            Self::ProviderError(_) => "The service provider is unavailable right now. No money was taken.".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::DialogTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::ProviderError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DeliveredUnpaid(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
            error!("💻️ {status}: {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.public_message() }).to_string())
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(_) => Self::BackendError(e.to_string()),
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds(e.to_string()),
            LedgerError::InvalidAmount(_) => Self::InvalidRequestBody(e.to_string()),
            LedgerError::UserNotFound(_) | LedgerError::WalletNotFound(_) | LedgerError::AlertNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            LedgerError::UserAlreadyExists(_) | LedgerError::DuplicateReference(_) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::UnknownReference(_) | SettlementError::UserNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            SettlementError::SignatureInvalid => Self::InvalidSignature,
            SettlementError::MalformedWebhook(_) | SettlementError::AmountTooSmall { .. } => {
                Self::InvalidRequestBody(e.to_string())
            },
            SettlementError::Verification(_) | SettlementError::Checkout(_) => Self::ProviderError(e.to_string()),
            SettlementError::Ledger(e) => e.into(),
        }
    }
}

impl From<PurchaseError> for ServerError {
    fn from(e: PurchaseError) -> Self {
        match e {
            PurchaseError::InsufficientFunds { .. } => Self::InsufficientFunds(e.to_string()),
            PurchaseError::InvalidAmount(_) => Self::InvalidRequestBody(e.to_string()),
            PurchaseError::FulfillmentFailed(_) => Self::ProviderError(e.to_string()),
            PurchaseError::ReconciliationAlert { .. } => Self::DeliveredUnpaid(e.to_string()),
            PurchaseError::Ledger(e) => e.into(),
        }
    }
}

impl From<ReminderError> for ServerError {
    fn from(e: ReminderError) -> Self {
        match e {
            ReminderError::DatabaseError(_) => Self::BackendError(e.to_string()),
            ReminderError::ReminderNotFound(..) => Self::NoRecordFound(e.to_string()),
            ReminderError::LedgerError(e) => e.into(),
        }
    }
}

impl From<BeneficiaryError> for ServerError {
    fn from(e: BeneficiaryError) -> Self {
        match e {
            BeneficiaryError::DatabaseError(_) => Self::BackendError(e.to_string()),
            BeneficiaryError::AlreadyExists(_) => Self::Conflict(e.to_string()),
            BeneficiaryError::NotFound { .. } => Self::NoRecordFound(e.to_string()),
            BeneficiaryError::InvalidInput(_) => Self::InvalidRequestBody(e.to_string()),
            BeneficiaryError::LedgerError(e) => e.into(),
        }
    }
}

impl From<GuardError> for ServerError {
    fn from(e: GuardError) -> Self {
        match e {
            GuardError::StillProcessing(_) => Self::Conflict(e.to_string()),
            GuardError::NoActiveDialog(_) => Self::NoRecordFound(e.to_string()),
            GuardError::Timeout(_) => Self::DialogTimeout(e.to_string()),
            GuardError::InvalidInput(_) => Self::InvalidRequestBody(e.to_string()),
        }
    }
}
