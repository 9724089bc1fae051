use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use tracing::Level;

use crate::packer::PackingConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub packing: PackingSettings,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            packing: PackingSettings::from_env(),
            catalog: CatalogConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("BOX_FIT_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    "Could not parse BOX_FIT_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("BOX_FIT_API_PORT") {
            Some(raw) => parse_port(&raw).unwrap_or(Self::DEFAULT_PORT),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Log verbosity. Read before the subscriber exists, so a rejected value is
/// kept and reported once logging is up.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    level: Level,
    rejected: Option<String>,
}

impl LoggingConfig {
    const LEVEL_VAR: &'static str = "BOX_FIT_LOG_LEVEL";
    const DEFAULT_LEVEL: Level = Level::INFO;

    pub fn from_env() -> Self {
        match env_string(Self::LEVEL_VAR) {
            Some(raw) => match parse_level(&raw) {
                Some(level) => Self {
                    level,
                    rejected: None,
                },
                None => Self {
                    level: Self::DEFAULT_LEVEL,
                    rejected: Some(raw),
                },
            },
            None => Self {
                level: Self::DEFAULT_LEVEL,
                rejected: None,
            },
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Emits a warning if the configured level could not be used.
    pub fn report_rejected(&self) {
        if let Some(raw) = &self.rejected {
            tracing::warn!(
                "Could not interpret {} ('{}') as log level. Using {}.",
                Self::LEVEL_VAR,
                raw,
                self.level
            );
        }
    }
}

/// Defaults for packing requests.
#[derive(Clone, Debug)]
pub struct PackingSettings {
    packing: PackingConfig,
}

impl PackingSettings {
    const PADDING_VAR: &'static str = "BOX_FIT_DEFAULT_PADDING";
    const EPSILON_VAR: &'static str = "BOX_FIT_FIT_EPSILON";
    const PARALLEL_VAR: &'static str = "BOX_FIT_PARALLEL";

    fn from_env() -> Self {
        let padding = load_f64_with_warning(
            Self::PADDING_VAR,
            PackingConfig::DEFAULT_PADDING,
            |value| value >= 0.0,
            "must not be negative",
            "Adjusted default padding changes which boxes are recommended",
        );

        let epsilon = load_f64_with_warning(
            Self::EPSILON_VAR,
            PackingConfig::DEFAULT_EPSILON,
            |value| value > 0.0 && value < 1.0,
            "must be between 0 and 1 (exclusive)",
            "Adjusted fit tolerance may accept items that are slightly too large",
        );

        let parallel = env_string(Self::PARALLEL_VAR)
            .and_then(|raw| parse_bool(&raw, Self::PARALLEL_VAR))
            .unwrap_or(PackingConfig::DEFAULT_PARALLEL);

        let packing = PackingConfig::builder()
            .padding(padding)
            .epsilon(epsilon)
            .parallel(parallel)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

impl Default for PackingSettings {
    fn default() -> Self {
        Self {
            packing: PackingConfig::default(),
        }
    }
}

/// Where the box catalog comes from.
#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    path: Option<PathBuf>,
}

impl CatalogConfig {
    const PATH_VAR: &'static str = "BOX_FIT_CATALOG_PATH";

    fn from_env() -> Self {
        Self {
            path: env_string(Self::PATH_VAR).map(PathBuf::from),
        }
    }

    /// Catalog file, or `None` for the reference catalog.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            tracing::warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => {
            tracing::warn!("BOX_FIT_API_PORT must not be 0. Using default port.");
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                "Could not parse BOX_FIT_API_PORT ('{}'): {}. Using default port.",
                raw,
                err
            );
            None
        }
    }
}

fn parse_level(raw: &str) -> Option<Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            tracing::warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name,
                other
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_setting(var_name, &raw, default, validator, invalid_hint, warning),
        None => default,
    }
}

fn parse_f64_setting(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = (default.abs().max(1.0)) * 1e-9;
            if (value - default).abs() > tolerance {
                tracing::warn!("{} ({} = {}).", warning, var_name, value);
            }
            value
        }
        Ok(_) => {
            tracing::warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name,
                raw,
                invalid_hint,
                default
            );
            default
        }
        Err(err) => {
            tracing::warn!(
                "Could not parse {} ('{}') as number: {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}
