//! Multi-step chat dialogs and the guard that keeps them from interleaving.
//!
//! The guard holds no database state. Slots live in memory for the lifetime of the process and are lost on restart,
//! which simply sends the user back to the start of the dialog.
mod guard;
mod steps;

pub use guard::{ConversationGuard, GuardError, Progress, DEFAULT_STEP_TIMEOUT, MAX_STEP_TIMEOUT};
pub use steps::{normalize_phone, FieldValue, Step, Topic, MIN_AIRTIME_AMOUNT, MIN_NAME_LENGTH, PHONE_PATTERN};
