use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};

use log::*;
use thiserror::Error;

use crate::conversation::steps::{FieldValue, Step, Topic};

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(120);
/// Longer timeouts are cut down to this, which keeps every deadline representable as an `Instant`.
pub const MAX_STEP_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("A {0} request is still being processed. Please wait for it to finish.")]
    StillProcessing(Topic),
    #[error("There is no {0} request in progress.")]
    NoActiveDialog(Topic),
    #[error("The {0} request timed out. Please start again.")]
    Timeout(Topic),
    #[error("{0} Please start again.")]
    InvalidInput(String),
}

/// What happens after a step's input was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The dialog continues. Ask the user for `step` next.
    NextStep(Step),
    /// All steps are done. The slot has been released and the collected values are returned in step order.
    Complete(Vec<FieldValue>),
}

#[derive(Debug, Clone)]
struct Slot {
    step: usize,
    deadline: Instant,
    values: Vec<FieldValue>,
}

/// Keeps multi-step chat dialogs from interleaving.
///
/// Each `(chat, topic)` pair is either idle or holds a single slot. Entering a busy pair is refused with
/// [`GuardError::StillProcessing`], which is how repeated button presses and duplicate messages are deduplicated.
/// Every step has a deadline. A slot is released when its deadline passes, when an input fails validation, when the
/// last step completes, or when the caller leaves the dialog. There is no retry of a failed step.
///
/// Every method has an `_at` twin that takes the current instant explicitly.
#[derive(Debug)]
pub struct ConversationGuard {
    slots: Mutex<HashMap<(String, Topic), Slot>>,
    step_timeout: Duration,
}

impl Default for ConversationGuard {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_TIMEOUT)
    }
}

impl ConversationGuard {
    pub fn new(step_timeout: Duration) -> Self {
        if step_timeout > MAX_STEP_TIMEOUT {
            warn!("💬️ A step timeout of {}s is too long. Using {}s.", step_timeout.as_secs(), MAX_STEP_TIMEOUT.as_secs());
        }
        Self { slots: Mutex::new(HashMap::new()), step_timeout: step_timeout.min(MAX_STEP_TIMEOUT) }
    }

    pub fn step_timeout(&self) -> Duration {
        self.step_timeout
    }

    /// Opens a dialog and returns its first step.
    pub fn enter(&self, chat_id: &str, topic: Topic) -> Result<Step, GuardError> {
        self.enter_at(chat_id, topic, Instant::now())
    }

    pub fn enter_at(&self, chat_id: &str, topic: Topic, now: Instant) -> Result<Step, GuardError> {
        let mut slots = self.slots();
        let key = (chat_id.to_string(), topic);
        if let Some(slot) = slots.get(&key) {
            if slot.deadline > now {
                debug!("💬️ Chat {chat_id} is already busy with {topic}");
                return Err(GuardError::StillProcessing(topic));
            }
            trace!("💬️ Stale {topic} slot for chat {chat_id} replaced");
        }
        let first = topic.steps()[0];
        slots.insert(key, Slot { step: 0, deadline: now + self.step_timeout, values: Vec::new() });
        trace!("💬️ Chat {chat_id} entered {topic}");
        Ok(first)
    }

    /// Feeds the user's answer to the current step of an open dialog.
    pub fn submit(&self, chat_id: &str, topic: Topic, input: &str) -> Result<Progress, GuardError> {
        self.submit_at(chat_id, topic, input, Instant::now())
    }

    pub fn submit_at(&self, chat_id: &str, topic: Topic, input: &str, now: Instant) -> Result<Progress, GuardError> {
        let mut slots = self.slots();
        let key = (chat_id.to_string(), topic);
        let Some(slot) = slots.get_mut(&key) else {
            return Err(GuardError::NoActiveDialog(topic));
        };
        if slot.deadline <= now {
            slots.remove(&key);
            debug!("💬️ {topic} for chat {chat_id} timed out");
            return Err(GuardError::Timeout(topic));
        }
        let steps = topic.steps();
        let value = match steps[slot.step].validate(input) {
            Ok(v) => v,
            Err(msg) => {
                slots.remove(&key);
                debug!("💬️ Invalid input for {topic} in chat {chat_id}. Slot released.");
                return Err(GuardError::InvalidInput(msg));
            },
        };
        slot.values.push(value);
        slot.step += 1;
        if slot.step < steps.len() {
            slot.deadline = now + self.step_timeout;
            return Ok(Progress::NextStep(steps[slot.step]));
        }
        let values = slots.remove(&key).map(|s| s.values).unwrap_or_default();
        trace!("💬️ Chat {chat_id} completed {topic}");
        Ok(Progress::Complete(values))
    }

    /// Releases the slot. Returns whether a dialog was open.
    pub fn leave(&self, chat_id: &str, topic: Topic) -> bool {
        self.slots().remove(&(chat_id.to_string(), topic)).is_some()
    }

    pub fn is_active(&self, chat_id: &str, topic: Topic) -> bool {
        self.is_active_at(chat_id, topic, Instant::now())
    }

    pub fn is_active_at(&self, chat_id: &str, topic: Topic, now: Instant) -> bool {
        self.slots().get(&(chat_id.to_string(), topic)).map(|s| s.deadline > now).unwrap_or(false)
    }

    /// Drops every slot whose deadline has passed and returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|_, slot| slot.deadline > now);
        let removed = before - slots.len();
        if removed > 0 {
            debug!("💬️ Swept {removed} expired conversation slots");
        }
        removed
    }

    /// The number of slots held, including expired ones that have not been swept yet.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave a slot half-written, so a poisoned map is still usable.
    fn slots(&self) -> MutexGuard<'_, HashMap<(String, Topic), Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}
