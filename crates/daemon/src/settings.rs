//! Daemon settings, collected from LINEUP_* environment variables with
//! hard defaults. Channel providers are optional: a missing credential set
//! simply leaves that channel unconfigured and the dispatcher skips it.

use lineup_core::application::DEFAULT_SERVICE_ESTIMATE_MINUTES;
use lineup_infra_channels::{EmailProviderConfig, SmsProviderConfig};

const DEFAULT_DB_PATH: &str = "~/.lineup/queues.db";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9628;

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: String,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub service_estimate_minutes: i64,
    pub log_format: String,
    pub email: Option<EmailProviderConfig>,
    pub sms: Option<SmsProviderConfig>,
}

impl Settings {
    pub fn from_env() -> Self {
        let db_path = std::env::var("LINEUP_DB_PATH")
            .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());

        let rpc_host =
            std::env::var("LINEUP_RPC_HOST").unwrap_or_else(|_| DEFAULT_RPC_HOST.to_string());
        let rpc_port: u16 = std::env::var("LINEUP_RPC_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RPC_PORT);

        let service_estimate_minutes: i64 = std::env::var("LINEUP_SERVICE_ESTIMATE_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SERVICE_ESTIMATE_MINUTES);

        let log_format =
            std::env::var("LINEUP_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

        let email = match (
            std::env::var("LINEUP_EMAIL_API_URL"),
            std::env::var("LINEUP_EMAIL_API_KEY"),
        ) {
            (Ok(api_url), Ok(api_key)) => Some(EmailProviderConfig {
                api_url,
                api_key,
                from: std::env::var("LINEUP_EMAIL_FROM")
                    .unwrap_or_else(|_| "Lineup <noreply@lineup.dev>".to_string()),
            }),
            _ => None,
        };

        let sms = match (
            std::env::var("LINEUP_SMS_API_URL"),
            std::env::var("LINEUP_SMS_ACCOUNT_SID"),
            std::env::var("LINEUP_SMS_AUTH_TOKEN"),
            std::env::var("LINEUP_SMS_FROM"),
        ) {
            (Ok(api_url), Ok(account_sid), Ok(auth_token), Ok(from)) => Some(SmsProviderConfig {
                api_url,
                account_sid,
                auth_token,
                from,
            }),
            _ => None,
        };

        Self {
            db_path,
            rpc_host,
            rpc_port,
            service_estimate_minutes,
            log_format,
            email,
            sms,
        }
    }
}
