use std::{env, time::Duration};

use log::*;
use wally_common::{parse_boolean_flag, Secret};
use wally_engine::conversation::DEFAULT_STEP_TIMEOUT;

const DEFAULT_WALLY_HOST: &str = "127.0.0.1";
const DEFAULT_WALLY_PORT: u16 = 8480;
const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_VTU_BASE_URL: &str = "https://api.tranzit.com.ng";
const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_LOW_BALANCE_INTERVAL: Duration = Duration::from_secs(60 * 60);
const DEFAULT_MILESTONE_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
/// Upper bound for any interval or timeout read from the environment.
const MAX_CONFIGURED_DURATION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Bearer token required on every `/api` route.
    pub api_token: Secret<String>,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    pub paystack: PaystackConfig,
    pub vtu: VtuConfig,
    pub telegram: TelegramConfig,
    pub reminders: ReminderWorkerConfig,
    /// How long a chat dialog may wait for the user's next answer.
    pub step_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_WALLY_HOST.to_string(),
            port: DEFAULT_WALLY_PORT,
            database_url: String::default(),
            api_token: Secret::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            paystack: PaystackConfig::default(),
            vtu: VtuConfig::default(),
            telegram: TelegramConfig::default(),
            reminders: ReminderWorkerConfig::default(),
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("WALLY_HOST").ok().unwrap_or_else(|| DEFAULT_WALLY_HOST.into());
        let port = env::var("WALLY_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for WALLY_PORT. {e} Using the default, {DEFAULT_WALLY_PORT}, \
                         instead."
                    );
                    DEFAULT_WALLY_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_WALLY_PORT);
        let database_url = env::var("WALLY_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ WALLY_DATABASE_URL is not set. Please set it to the URL for the wallet database.");
            String::default()
        });
        let api_token = env::var("WALLY_API_TOKEN").ok().unwrap_or_else(|| {
            warn!("🚨️ WALLY_API_TOKEN is not set. Every request to /api will be refused until it is.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("WALLY_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("WALLY_USE_FORWARDED").ok(), false);
        let step_timeout = duration_from_env("WALLY_STEP_TIMEOUT", DEFAULT_STEP_TIMEOUT);
        Self {
            host,
            port,
            database_url,
            api_token: Secret::new(api_token),
            use_x_forwarded_for,
            use_forwarded,
            paystack: PaystackConfig::from_env_or_defaults(),
            vtu: VtuConfig::from_env_or_defaults(),
            telegram: TelegramConfig::from_env_or_defaults(),
            reminders: ReminderWorkerConfig::from_env_or_defaults(),
            step_timeout,
        }
    }
}

//-------------------------------------------------  Paystack  ---------------------------------------------------------
#[derive(Clone, Debug)]
pub struct PaystackConfig {
    /// The secret key authenticates API calls and signs webhook bodies.
    pub secret_key: Secret<String>,
    pub base_url: String,
    /// Where the hosted checkout sends the user after paying.
    pub callback_url: Option<String>,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self { secret_key: Secret::default(), base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(), callback_url: None }
    }
}

impl PaystackConfig {
    pub fn from_env_or_defaults() -> Self {
        let secret_key = env::var("WALLY_PAYSTACK_SECRET_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ WALLY_PAYSTACK_SECRET_KEY is not set. Payments cannot be initialized or verified.");
            String::default()
        });
        let base_url = env::var("WALLY_PAYSTACK_BASE_URL").ok().unwrap_or_else(|| DEFAULT_PAYSTACK_BASE_URL.into());
        let callback_url = env::var("WALLY_CALLBACK_URL").ok().filter(|s| !s.is_empty());
        if callback_url.is_none() {
            info!("🪛️ WALLY_CALLBACK_URL is not set. Paystack will use the callback URL from the dashboard.");
        }
        Self { secret_key: Secret::new(secret_key), base_url, callback_url }
    }
}

//-------------------------------------------------     VTU     --------------------------------------------------------
#[derive(Clone, Debug)]
pub struct VtuConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
}

impl Default for VtuConfig {
    fn default() -> Self {
        Self { api_key: Secret::default(), base_url: DEFAULT_VTU_BASE_URL.to_string() }
    }
}

impl VtuConfig {
    pub fn from_env_or_defaults() -> Self {
        let api_key = env::var("WALLY_VTU_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ WALLY_VTU_API_KEY is not set. Airtime and data purchases will fail.");
            String::default()
        });
        let base_url = env::var("WALLY_VTU_BASE_URL").ok().unwrap_or_else(|| DEFAULT_VTU_BASE_URL.into());
        Self { api_key: Secret::new(api_key), base_url }
    }
}

//-------------------------------------------------  Telegram  ---------------------------------------------------------
#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: Secret<String>,
    pub base_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self { bot_token: Secret::default(), base_url: DEFAULT_TELEGRAM_BASE_URL.to_string() }
    }
}

impl TelegramConfig {
    pub fn from_env_or_defaults() -> Self {
        let bot_token = env::var("WALLY_TELEGRAM_BOT_TOKEN").ok().unwrap_or_else(|| {
            warn!("🪛️ WALLY_TELEGRAM_BOT_TOKEN is not set. Reminders will be logged but not delivered.");
            String::default()
        });
        Self { bot_token: Secret::new(bot_token), ..Default::default() }
    }
}

//-------------------------------------------------  Reminders  --------------------------------------------------------
#[derive(Clone, Copy, Debug)]
pub struct ReminderWorkerConfig {
    /// When false, scans only run when an external scheduler calls the `/api/scheduler` routes.
    pub enabled: bool,
    pub low_balance_interval: Duration,
    pub milestone_interval: Duration,
}

impl Default for ReminderWorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            low_balance_interval: DEFAULT_LOW_BALANCE_INTERVAL,
            milestone_interval: DEFAULT_MILESTONE_INTERVAL,
        }
    }
}

impl ReminderWorkerConfig {
    pub fn from_env_or_defaults() -> Self {
        let enabled = parse_boolean_flag(env::var("WALLY_RUN_REMINDER_WORKER").ok(), true);
        let low_balance_interval = duration_from_env("WALLY_LOW_BALANCE_INTERVAL", DEFAULT_LOW_BALANCE_INTERVAL);
        let milestone_interval = duration_from_env("WALLY_MILESTONE_INTERVAL", DEFAULT_MILESTONE_INTERVAL);
        Self { enabled, low_balance_interval, milestone_interval }
    }
}

/// Reads a duration in whole seconds from `var`.
fn duration_from_env(var: &str, default: Duration) -> Duration {
    env::var(var)
        .map_err(|_| info!("🪛️ {var} is not set. Using the default value of {}s.", default.as_secs()))
        .and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for {var}. {e}"))
                .and_then(|secs| match secs {
                    0 => Err(warn!("🪛️ {var} must be greater than zero.")),
                    n if n > MAX_CONFIGURED_DURATION.as_secs() => {
                        warn!("🪛️ {var} is capped at {}s.", MAX_CONFIGURED_DURATION.as_secs());
                        Ok(MAX_CONFIGURED_DURATION)
                    },
                    n => Ok(Duration::from_secs(n)),
                })
        })
        .ok()
        .unwrap_or(default)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that handlers need. It carries no secrets.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
