use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Settings shared by every service: where the HTTP listener binds.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5001
}

impl Config {
    /// `APP__PORT` wins over the `configuration` file, which wins over a
    /// plain `PORT`.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut builder = Cfg::builder();
        if let Some(port) = fallback_port(std::env::var("PORT").ok())? {
            builder = builder.set_default("port", i64::from(port))?;
        }

        let config = builder
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn fallback_port(raw: Option<String>) -> Result<Option<u16>, AppError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid PORT '{}': {}", value, e))
        }),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
