//! Configuration management for the Brevo lead server.
//!
//! This module handles loading and validating configuration from environment
//! variables, with an optional `.env` file.

use crate::error::{ConfigError, ConfigResult};
use crate::models::{PayloadOptions, PhoneStrategy, DEFAULT_LIST_ID};
use std::env;

/// Default Brevo API base URL.
pub const DEFAULT_BREVO_API_URL: &str = "https://api.brevo.com/v3";

/// Configuration for the Brevo lead server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Brevo API key. Absent keys are reported per request, not at startup.
    pub brevo_api_key: Option<String>,

    /// Brevo API base URL (default: https://api.brevo.com/v3)
    pub brevo_api_url: String,

    /// List new contacts are added to (default: 2)
    pub list_id: i64,

    /// Country code assumed for numbers typed without one (default: "34")
    pub default_country_code: String,

    /// Phone normalization strategy (default: e164)
    pub phone_strategy: PhoneStrategy,

    /// Whether the message field is mandatory (default: false)
    pub require_message: bool,

    /// HTTP request timeout in seconds for each CRM call (default: 10)
    pub request_timeout: u64,

    /// Operator address for new-lead notifications; disabled when unset
    pub notify_email: Option<String>,

    /// Sender of notification emails
    pub sender_email: String,
    pub sender_name: String,

    /// Listen address (default: 0.0.0.0:3000)
    pub host: String,
    pub port: u16,

    /// Submissions allowed per client address per window (default: 30)
    pub rate_limit_max_requests: u32,

    /// Rate limit window in seconds (default: 900)
    pub rate_limit_window_secs: u64,

    /// Key rate limits on `X-Forwarded-For` instead of the peer address
    /// (default: false). Only safe behind a proxy that sets the header.
    pub trust_forwarded_for: bool,

    /// Directory served as static files when it exists (default: "public")
    pub static_dir: String,

    /// Log level (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nothing is strictly required at startup. `BREVO_API_KEY` is checked on
    /// every submission so a misconfigured deployment answers 500 instead of
    /// refusing to boot.
    ///
    /// Optional environment variables:
    /// - `BREVO_API_KEY`, `BREVO_API_BASE_URL`, `BREVO_LIST_ID`
    /// - `DEFAULT_COUNTRY_CODE`, `PHONE_STRATEGY`, `REQUIRE_MESSAGE`
    /// - `REQUEST_TIMEOUT`, `NOTIFY_EMAIL`, `SENDER_EMAIL`, `SENDER_NAME`
    /// - `HOST`, `PORT`, `RATE_LIMIT_MAX_REQUESTS`, `RATE_LIMIT_WINDOW_SECS`
    /// - `TRUST_FORWARDED_FOR`, `STATIC_DIR`, `LOG_LEVEL`
    pub fn from_env() -> ConfigResult<Self> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();

        let defaults = Config::default();

        let brevo_api_key = Self::optional_env("BREVO_API_KEY");

        let brevo_api_url =
            env::var("BREVO_API_BASE_URL").unwrap_or_else(|_| defaults.brevo_api_url.clone());
        if !brevo_api_url.starts_with("http://") && !brevo_api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: "BREVO_API_BASE_URL".to_string(),
                reason: "Must start with http:// or https://".to_string(),
            });
        }

        let list_id = Self::parse_list_id(env::var("BREVO_LIST_ID").ok().as_deref());

        let default_country_code = env::var("DEFAULT_COUNTRY_CODE")
            .map(|v| v.trim().trim_start_matches('+').to_string())
            .unwrap_or_else(|_| defaults.default_country_code.clone());
        if default_country_code.is_empty()
            || default_country_code.len() > 3
            || !default_country_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ConfigError::InvalidValue {
                var: "DEFAULT_COUNTRY_CODE".to_string(),
                reason: "Must be 1 to 3 digits".to_string(),
            });
        }

        let phone_strategy = match env::var("PHONE_STRATEGY") {
            Ok(val) => val
                .parse::<PhoneStrategy>()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: "PHONE_STRATEGY".to_string(),
                    reason,
                })?,
            Err(_) => defaults.phone_strategy,
        };

        let require_message = Self::parse_env_bool("REQUIRE_MESSAGE", false)?;
        let request_timeout = Self::parse_env_u64("REQUEST_TIMEOUT", 10)?;
        if request_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                var: "REQUEST_TIMEOUT".to_string(),
                reason: "Must be greater than zero".to_string(),
            });
        }

        let notify_email = Self::optional_env("NOTIFY_EMAIL");
        let sender_email =
            Self::optional_env("SENDER_EMAIL").unwrap_or(defaults.sender_email.clone());
        let sender_name =
            Self::optional_env("SENDER_NAME").unwrap_or(defaults.sender_name.clone());

        let host = env::var("HOST").unwrap_or_else(|_| defaults.host.clone());
        let port = Self::parse_env_u16("PORT", defaults.port)?;

        let rate_limit_max_requests =
            Self::parse_env_u32("RATE_LIMIT_MAX_REQUESTS", defaults.rate_limit_max_requests)?;
        let rate_limit_window_secs =
            Self::parse_env_u64("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit_window_secs)?;
        let trust_forwarded_for =
            Self::parse_env_bool("TRUST_FORWARDED_FOR", defaults.trust_forwarded_for)?;

        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| defaults.static_dir.clone());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| defaults.log_level.clone());

        Ok(Config {
            brevo_api_key,
            brevo_api_url,
            list_id,
            default_country_code,
            phone_strategy,
            require_message,
            request_timeout,
            notify_email,
            sender_email,
            sender_name,
            host,
            port,
            rate_limit_max_requests,
            rate_limit_window_secs,
            trust_forwarded_for,
            static_dir,
            log_level,
        })
    }

    /// The API key, or the error every submission fails with when it is unset.
    pub fn api_key(&self) -> ConfigResult<&str> {
        self.brevo_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("BREVO_API_KEY".to_string()))
    }

    /// Options the payload builder needs.
    pub fn payload_options(&self) -> PayloadOptions {
        PayloadOptions {
            list_id: self.list_id,
            phone_strategy: self.phone_strategy,
            default_country_code: self.default_country_code.clone(),
        }
    }

    /// A non-blank environment variable.
    fn optional_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse the list id, falling back to the default when unset or not a
    /// positive number.
    fn parse_list_id(raw: Option<&str>) -> i64 {
        match raw.map(str::trim) {
            None | Some("") => DEFAULT_LIST_ID,
            Some(val) => match val.parse::<i64>() {
                Ok(id) if id > 0 => id,
                _ => {
                    tracing::warn!(
                        "BREVO_LIST_ID {:?} is not a positive number, using {}",
                        val,
                        DEFAULT_LIST_ID
                    );
                    DEFAULT_LIST_ID
                }
            },
        }
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as u32 with a default value.
    fn parse_env_u32(var_name: &str, default: u32) -> ConfigResult<u32> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as u16 with a default value.
    fn parse_env_u16(var_name: &str, default: u16) -> ConfigResult<u16> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a number between 0-65535, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as bool with a default value.
    fn parse_env_bool(var_name: &str, default: bool) -> ConfigResult<bool> {
        match env::var(var_name) {
            Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" | "" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    var: var_name.to_string(),
                    reason: format!("Must be true or false, got: {}", val),
                }),
            },
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            brevo_api_key: None,
            brevo_api_url: DEFAULT_BREVO_API_URL.to_string(),
            list_id: DEFAULT_LIST_ID,
            default_country_code: "34".to_string(),
            phone_strategy: PhoneStrategy::E164,
            require_message: false,
            request_timeout: 10,
            notify_email: None,
            sender_email: "no-reply@localhost".to_string(),
            sender_name: "Contact Form".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            rate_limit_max_requests: 30,
            rate_limit_window_secs: 900,
            trust_forwarded_for: false,
            static_dir: "public".to_string(),
            log_level: "info".to_string(),
        }
    }
}
