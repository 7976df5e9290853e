mod api_token;

pub use api_token::{ApiTokenMiddlewareFactory, ApiTokenMiddlewareService};
