use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use log::{info, warn};

use crate::packer::{PackingConfig, RotationStrategy};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
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
    const HOST_VAR: &'static str = "BIN_PACKER_API_HOST";
    const PORT_VAR: &'static str = "BIN_PACKER_API_PORT";

    fn from_env() -> Self {
        let host_value =
            env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
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

        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => parse_port(&raw).unwrap_or(Self::DEFAULT_PORT),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
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

/// Configuration for the packing engine.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const FEWEST_BOXES_VAR: &'static str = "BIN_PACKER_FEWEST_BOXES";
    const OVERLAP_TOLERANCE_VAR: &'static str = "BIN_PACKER_OVERLAP_TOLERANCE";
    const ENFORCE_WEIGHT_VAR: &'static str = "BIN_PACKER_ENFORCE_WEIGHT";
    const ROTATION_STRATEGY_VAR: &'static str = "BIN_PACKER_ROTATION_STRATEGY";

    fn from_env() -> Self {
        let fewest_boxes = env_string(Self::FEWEST_BOXES_VAR)
            .and_then(|raw| parse_bool(&raw, Self::FEWEST_BOXES_VAR))
            .unwrap_or(PackingConfig::DEFAULT_FEWEST_BOXES);

        let overlap_tolerance = load_f64_with_warning(
            Self::OVERLAP_TOLERANCE_VAR,
            PackingConfig::DEFAULT_OVERLAP_TOLERANCE,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted overlap tolerance changes which placements count as touching",
        );

        let enforce_weight = env_string(Self::ENFORCE_WEIGHT_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ENFORCE_WEIGHT_VAR))
            .unwrap_or(PackingConfig::DEFAULT_ENFORCE_WEIGHT);

        let rotation_strategy = env_string(Self::ROTATION_STRATEGY_VAR)
            .and_then(|raw| {
                let parsed = RotationStrategy::parse(&raw);
                if parsed.is_none() {
                    warn!(
                        "Unknown {} ('{}'). Using the default strategy.",
                        Self::ROTATION_STRATEGY_VAR,
                        raw
                    );
                }
                parsed
            })
            .unwrap_or_default();

        let packing = PackingConfig::builder()
            .fewest_boxes(fewest_boxes)
            .overlap_tolerance(overlap_tolerance)
            .enforce_weight(enforce_weight)
            .rotation_strategy(rotation_strategy)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

impl From<PackingConfig> for OptimizerConfig {
    fn from(packing: PackingConfig) -> Self {
        Self { packing }
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
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => {
            warn!("{} must not be 0.", ApiConfig::PORT_VAR);
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Could not parse {} ('{}'): {}.", ApiConfig::PORT_VAR, raw, err);
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
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
    notice: &str,
) -> f64 {
    let Some(raw) = env_string(var_name) else {
        return default;
    };

    match raw.parse::<f64>() {
        Ok(value) if validator(value) => {
            let tolerance = default.abs().max(1.0) * 1e-9;
            if (value - default).abs() > tolerance {
                info!("{} ({} = {}).", notice, var_name, value);
            }
            value
        }
        Ok(_) => {
            warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            warn!(
                "Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}
