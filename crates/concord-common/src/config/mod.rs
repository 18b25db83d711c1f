//! Client configuration

mod client_config;

pub use client_config::{
    AppSettings, AuthConfig, ClientConfig, ConfigError, Environment, GatewayEndpoint,
    IdentityConfig, ReconnectConfig,
};
