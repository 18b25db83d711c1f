//! Client configuration structs
//!
//! Loads configuration from environment variables.

use concord_core::Capabilities;
use serde::Deserialize;
use std::env;

/// Main client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub gateway: GatewayEndpoint,
    pub auth: AuthConfig,
    pub identity: IdentityConfig,
    pub reconnect: ReconnectConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Gateway endpoint configuration
#[derive(Debug, Clone)]
pub struct GatewayEndpoint {
    /// Base WebSocket URL, without query parameters
    pub url: String,
    /// Gateway protocol version
    pub protocol_version: u8,
    /// Request the continuous zlib-stream transport
    pub compress: bool,
    /// Use the legacy op 8 member-range request instead of op 14
    pub legacy_member_requests: bool,
}

impl GatewayEndpoint {
    /// Full connection URL with version/encoding/compression query parameters
    #[must_use]
    pub fn connect_url(&self) -> String {
        self.connect_url_from(&self.url)
    }

    /// Connection URL against a different base (the server-supplied resume URL)
    #[must_use]
    pub fn connect_url_from(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        if self.compress {
            format!(
                "{base}/?v={}&encoding=json&compress=zlib-stream",
                self.protocol_version
            )
        } else {
            format!("{base}/?v={}&encoding=json", self.protocol_version)
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Account token presented in IDENTIFY and RESUME
    pub token: String,
    /// Declared client capability bitmask
    pub capabilities: Capabilities,
}

/// Client identity block sent verbatim inside IDENTIFY
///
/// These values are policy, not protocol; the gateway core serializes them
/// without interpreting them.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub os: String,
    pub browser: String,
    pub client_version: String,
    pub client_build_number: u32,
    pub release_channel: String,
    pub locale: String,
}

/// Reconnect backoff configuration
#[derive(Debug, Clone, Copy)]
pub struct ReconnectConfig {
    /// First retry delay in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on the exponential backoff
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "concord".to_string()
}

fn default_gateway_url() -> String {
    "wss://gateway.concord.gg".to_string()
}

fn default_protocol_version() -> u8 {
    9
}

fn default_os() -> String {
    std::env::consts::OS.to_string()
}

fn default_browser() -> String {
    "Concord Client".to_string()
}

fn default_client_version() -> String {
    "0.1.0".to_string()
}

fn default_client_build() -> u32 {
    221_132
}

fn default_release_channel() -> String {
    "stable".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            gateway: GatewayEndpoint {
                url: env::var("GATEWAY_URL").unwrap_or_else(|_| default_gateway_url()),
                protocol_version: env::var("GATEWAY_VERSION")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_protocol_version),
                compress: env::var("GATEWAY_COMPRESS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
                legacy_member_requests: env::var("GATEWAY_LEGACY_MEMBER_REQUESTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
            },
            auth: AuthConfig {
                token: env::var("CONCORD_TOKEN")
                    .map_err(|_| ConfigError::MissingVar("CONCORD_TOKEN"))?,
                capabilities: env::var("CONCORD_CAPABILITIES")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .map_or_else(Capabilities::default, Capabilities::from_bits_truncate),
            },
            identity: IdentityConfig {
                os: env::var("CLIENT_OS").unwrap_or_else(|_| default_os()),
                browser: env::var("CLIENT_BROWSER").unwrap_or_else(|_| default_browser()),
                client_version: env::var("CLIENT_VERSION")
                    .unwrap_or_else(|_| default_client_version()),
                client_build_number: env::var("CLIENT_BUILD_NUMBER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_client_build),
                release_channel: env::var("CLIENT_RELEASE_CHANNEL")
                    .unwrap_or_else(|_| default_release_channel()),
                locale: env::var("CLIENT_LOCALE").unwrap_or_else(|_| default_locale()),
            },
            reconnect: ReconnectConfig {
                base_delay_ms: env::var("RECONNECT_BASE_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_base_delay_ms),
                max_delay_ms: env::var("RECONNECT_MAX_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_delay_ms),
            },
        })
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
