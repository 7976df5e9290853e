use rand::{distributions::Alphanumeric, Rng};

pub const CREDIT_REFERENCE_PREFIX: &str = "CR";
pub const DEBIT_REFERENCE_PREFIX: &str = "DB";
pub const PAYMENT_REFERENCE_PREFIX: &str = "PAY";

/// Generates a reference of the form `PREFIX-XXXXXXXXXXXX` with `len` random upper-case alphanumerics.
pub fn new_reference(prefix: &str, len: usize) -> String {
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(|c| char::from(c).to_ascii_uppercase()).collect();
    format!("{prefix}-{suffix}")
}

pub fn new_payment_reference() -> String {
    new_reference(PAYMENT_REFERENCE_PREFIX, 16)
}
