//! Configuration loading.
//!
//! Defaults first, then `AEROFLY_BRIDGE_*` environment overrides. The host
//! gives the bridge no command line and no config file, so the environment
//! is the whole configuration surface; it is read exactly once at init.

pub mod types;

pub use types::BridgeConfig;

use anyhow::{Context, Result};
use config::{Config as ConfigLoader, Environment};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AEROFLY_BRIDGE";

impl BridgeConfig {
    /// Load from the environment on top of defaults, then normalize.
    pub fn from_env() -> Result<Self> {
        let loader = ConfigLoader::builder()
            .set_default("ws_enable", 1)?
            .set_default("ws_port", i64::from(crate::net::DEFAULT_WS_PORT))?
            .set_default("broadcast_ms", 20)?
            .set_default("tcp_port", i64::from(crate::net::DEFAULT_TELEMETRY_PORT))?
            .set_default("command_port", i64::from(crate::net::DEFAULT_COMMAND_PORT))?
            .set_default("log_level", "info")?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("failed to build bridge configuration")?;

        let mut cfg: BridgeConfig = loader
            .try_deserialize()
            .context("failed to deserialize bridge configuration")?;
        cfg.normalize()?;
        Ok(cfg)
    }

    /// Clamp and validate; called by every loading path.
    pub fn normalize(&mut self) -> Result<()> {
        if self.broadcast_ms < crate::utils::BroadcastThrottle::MIN_INTERVAL_MS {
            tracing::warn!(
                requested = self.broadcast_ms,
                clamped = crate::utils::BroadcastThrottle::MIN_INTERVAL_MS,
                "broadcast interval below minimum"
            );
            self.broadcast_ms = crate::utils::BroadcastThrottle::MIN_INTERVAL_MS;
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            anyhow::bail!(
                "invalid log level '{}', must be one of: {:?}",
                self.log_level,
                valid_log_levels
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = BridgeConfig::default();
        assert!(cfg.ws_enabled());
        assert_eq!(cfg.ws_port, 8765);
        assert_eq!(cfg.broadcast_ms, 20);
        assert_eq!(cfg.tcp_port, 12345);
        assert_eq!(cfg.command_port, 12346);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_normalize_clamps_broadcast_interval() {
        let mut cfg = BridgeConfig {
            broadcast_ms: 1,
            ..BridgeConfig::default()
        };
        cfg.normalize().unwrap();
        assert_eq!(cfg.broadcast_ms, 5);
    }

    #[test]
    fn test_normalize_rejects_bad_log_level() {
        let mut cfg = BridgeConfig {
            log_level: "loud".to_string(),
            ..BridgeConfig::default()
        };
        assert!(cfg.normalize().is_err());
    }

    #[test]
    fn test_ws_enable_zero_disables() {
        let cfg = BridgeConfig {
            ws_enable: 0,
            ..BridgeConfig::default()
        };
        assert!(!cfg.ws_enabled());
    }
}
