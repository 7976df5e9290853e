//! # Wally server
//! This crate puts the Wally wallet engine on the network. It is responsible for:
//! * Receiving Paystack webhooks and settling the payments they announce.
//! * Exposing the wallet, purchase, reminder and dialog operations to the chat front-end over an authenticated API.
//! * Talking to Paystack, the VTU provider and Telegram on the engine's behalf.
//! * Running the reminder scans on a timer.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/paystack/webhook`: Paystack charge notifications. Authenticated by the HMAC signature of the body.
//! * `/api/...`: Everything else. Authenticated with a shared bearer token. See [routes](routes/index.html).
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod reminder_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
