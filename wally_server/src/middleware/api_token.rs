//! Shared-secret authentication for the internal API.
//!
//! Every request under `/api` must carry `Authorization: Bearer <WALLY_API_TOKEN>`. The chat front-end, the
//! operator tooling and the cron scheduler all use the same token. An empty configured token refuses everything.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use wally_common::Secret;

use crate::errors::ServerError;

pub struct ApiTokenMiddlewareFactory {
    token: Secret<String>,
}

impl ApiTokenMiddlewareFactory {
    pub fn new(token: Secret<String>) -> Self {
        ApiTokenMiddlewareFactory { token }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiTokenMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = ApiTokenMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiTokenMiddlewareService { token: self.token.clone(), service: Rc::new(service) }))
    }
}

pub struct ApiTokenMiddlewareService<S> {
    token: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiTokenMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let expected = self.token.reveal().clone();
        Box::pin(async move {
            trace!("🔐️ Checking API token for {}", req.path());
            let presented = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim);
            match presented {
                Some(token) if !expected.is_empty() && tokens_match(token, &expected) => service.call(req).await,
                Some(_) => {
                    warn!("🔐️ Invalid API token presented for {}. Denying access.", req.path());
                    Err(ServerError::AuthenticationError("Invalid API token.".into()).into())
                },
                None => {
                    warn!("🔐️ No API token presented for {}. Denying access.", req.path());
                    Err(ServerError::AuthenticationError("An API token is required.".into()).into())
                },
            }
        })
    }
}

/// Compares without returning early on the first differing byte.
fn tokens_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
