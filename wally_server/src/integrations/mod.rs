//! HTTP clients for the third parties the wallet depends on. Each implements one or more of the engine's collaborator
//! traits. The event subscribers that talk to users live here too.
mod notifications;
mod paystack;
mod telegram;
mod vtu;

pub use notifications::{create_wallet_event_handlers, WALLET_EVENT_BUFFER_SIZE};
pub use paystack::{PaystackApi, PAYSTACK_SIGNATURE_HEADER};
pub use telegram::TelegramNotifier;
pub use vtu::VtuApi;
