use std::{fmt::Display, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use wally_common::Kobo;

use crate::{db_types::Network, wally_api::settlement_api::MIN_FUNDING_AMOUNT};

/// Nigerian mobile numbers, with or without the leading zero.
pub const PHONE_PATTERN: &str = r"^0?[789]\d{9}$";
pub const MIN_AIRTIME_AMOUNT: Kobo = Kobo::from_naira(50);
pub const MIN_NAME_LENGTH: usize = 2;

/// A multi-step chat dialog. At most one dialog per topic can be open in a chat at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    FundWallet,
    BuyAirtime,
    BuyData,
    ShareAirtime,
    SaveBeneficiary,
}

impl Topic {
    /// The inputs the dialog collects, in order.
    pub fn steps(&self) -> &'static [Step] {
        match self {
            Topic::FundWallet => &[Step::Amount { minimum: MIN_FUNDING_AMOUNT }],
            Topic::BuyAirtime => &[Step::Phone, Step::Amount { minimum: MIN_AIRTIME_AMOUNT }],
            Topic::BuyData => &[Step::Phone],
            Topic::ShareAirtime => &[Step::Phone, Step::Amount { minimum: MIN_AIRTIME_AMOUNT }],
            Topic::SaveBeneficiary => &[Step::Name, Step::Phone, Step::Network],
        }
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Topic::FundWallet => "fund wallet",
            Topic::BuyAirtime => "buy airtime",
            Topic::BuyData => "buy data",
            Topic::ShareAirtime => "share airtime",
            Topic::SaveBeneficiary => "save beneficiary",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Phone,
    Amount { minimum: Kobo },
    Name,
    Network,
}

/// A validated answer to a [`Step`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Phone(String),
    Amount(Kobo),
    Name(String),
    Network(Network),
}

impl Step {
    /// What to ask the user for at this step.
    pub fn prompt(&self) -> String {
        match self {
            Step::Phone => "Please enter the phone number (e.g. 08012345678).".to_string(),
            Step::Amount { minimum } => format!("Please enter the amount (minimum {minimum})."),
            Step::Name => "Please enter a name for this beneficiary.".to_string(),
            Step::Network => {
                let names = Network::ALL.iter().map(Network::to_string).collect::<Vec<_>>().join(", ");
                format!("Which network is this number on? ({names})")
            },
        }
    }

    /// Checks raw user input for this step. The error is a short message that can be shown to the user as is.
    pub fn validate(&self, input: &str) -> Result<FieldValue, String> {
        let input = input.trim();
        match self {
            Step::Phone => {
                let phone: String = input.chars().filter(|c| !c.is_whitespace()).collect();
                if phone_pattern().is_match(&phone) {
                    Ok(FieldValue::Phone(phone))
                } else {
                    Err(INVALID_PHONE.to_string())
                }
            },
            Step::Amount { minimum } => match input.parse::<Kobo>() {
                Ok(amount) if amount >= *minimum => Ok(FieldValue::Amount(amount)),
                Ok(_) => Err(format!("Invalid amount. The minimum is {minimum}.")),
                Err(_) => Err("Invalid amount. Please enter a number, e.g. 500.".to_string()),
            },
            Step::Name => {
                if input.chars().count() >= MIN_NAME_LENGTH {
                    Ok(FieldValue::Name(input.to_string()))
                } else {
                    Err(format!("The name must be at least {MIN_NAME_LENGTH} characters long."))
                }
            },
            Step::Network => input.parse::<Network>().map(FieldValue::Network).map_err(|_| {
                let names = Network::ALL.iter().map(Network::to_string).collect::<Vec<_>>().join(", ");
                format!("Unknown network. Please choose one of {names}.")
            }),
        }
    }
}

const INVALID_PHONE: &str = "Invalid phone number. Please enter a valid Nigerian phone number.";

/// Strips whitespace and restores the leading zero, so `803 123 4567` becomes `08031234567`. Returns `None` for
/// anything that is not a Nigerian mobile number.
pub fn normalize_phone(input: &str) -> Option<String> {
    let phone: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if !phone_pattern().is_match(&phone) {
        return None;
    }
    if phone.starts_with('0') {
        Some(phone)
    } else {
        Some(format!("0{phone}"))
    }
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PHONE_PATTERN).expect("PHONE_PATTERN is a valid regex"))
}
