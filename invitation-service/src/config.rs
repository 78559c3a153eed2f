use std::env;
use std::str::FromStr;

use eventhub_shared::error::{Result, ServiceError};
use eventhub_shared::mail::smtp::SmtpSettings;

const DEFAULT_SMTP_HOST: &str = "localhost";
const DEFAULT_SMTP_PORT: u16 = 25;
const DEFAULT_MAIL_FROM: &str = "no-reply@localhost";
const DEFAULT_DISPATCH_CONCURRENCY: usize = 8;
const DEFAULT_PORT: u16 = 3001;
// API Gateway stage prefix, dropped when REMOVE_BASE_PATH=true
const DEFAULT_ROUTE_PREFIX: &str = "/Prod";

/// Runtime settings of the invitation service, read once from the environment
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub smtp: SmtpSettings,
    pub dispatch_concurrency: usize,
    pub report_topic_arn: Option<String>,
    pub route_prefix: String,
    pub port: u16,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let smtp = SmtpSettings {
            host: env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string()),
            port: parse_var("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            username: non_empty_var("SMTP_USERNAME"),
            password: non_empty_var("SMTP_PASSWORD"),
            use_tls: flag_var("SMTP_TLS"),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string()),
        };

        let dispatch_concurrency = parse_var("DISPATCH_CONCURRENCY", DEFAULT_DISPATCH_CONCURRENCY)?;
        if dispatch_concurrency == 0 {
            return Err(ServiceError::ConfigError(
                "DISPATCH_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let route_prefix = if flag_var("REMOVE_BASE_PATH") {
            String::new()
        } else {
            DEFAULT_ROUTE_PREFIX.to_string()
        };

        Ok(Self {
            smtp,
            dispatch_concurrency,
            report_topic_arn: non_empty_var("REPORT_TOPIC_ARN"),
            route_prefix,
            port: parse_var("PORT", DEFAULT_PORT)?,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn flag_var(name: &str) -> bool {
    env::var(name)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match non_empty_var(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            ServiceError::ConfigError(format!("{} has an invalid value: {}", name, raw))
        }),
        None => Ok(default),
    }
}
