//! Configuration for a render attempt with validation.

use std::env;

use crate::error::ConfigError;

/// Configuration shared by every render attempt of a route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Development mode. Outside of it, disallowed dynamic usage is logged
    /// together with guidance on getting better stack traces.
    pub dev_mode: bool,
    /// Capture a stack for every dynamic access (expensive).
    pub debug_dynamic_accesses: bool,
    /// Runtime prefetching is enabled, which makes synchronous IO during the
    /// runtime stage fatal to that stage.
    pub runtime_prefetch: bool,
    /// The host renderer provides a postpone primitive.
    pub supports_postpone: bool,
    /// Scheduler ticks to wait before declaring cache inputs hung.
    pub hanging_input_ticks: u32,
}

impl RenderConfig {
    /// Create and validate a render config.
    pub fn new(
        dev_mode: bool,
        debug_dynamic_accesses: bool,
        runtime_prefetch: bool,
        supports_postpone: bool,
        hanging_input_ticks: u32,
    ) -> Result<Self, ConfigError> {
        if hanging_input_ticks == 0 {
            return Err(ConfigError::InvalidHangingInputTicks);
        }

        Ok(Self {
            dev_mode,
            debug_dynamic_accesses,
            runtime_prefetch,
            supports_postpone,
            hanging_input_ticks,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RENDERGATE_DEV` - development mode (default: false)
    /// - `RENDERGATE_DEBUG_PRERENDER` - capture stacks per access (default: false)
    /// - `RENDERGATE_RUNTIME_PREFETCH` - runtime prefetching (default: false)
    /// - `RENDERGATE_HANGING_INPUT_TICKS` - ticks before inputs hang (default: 1)
    pub fn from_env() -> Result<Self, ConfigError> {
        let hanging_input_ticks = match env::var("RENDERGATE_HANGING_INPUT_TICKS") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "RENDERGATE_HANGING_INPUT_TICKS".to_string(),
                value,
            })?,
            Err(_) => 1,
        };

        Self::new(
            env_flag("RENDERGATE_DEV")?,
            env_flag("RENDERGATE_DEBUG_PRERENDER")?,
            env_flag("RENDERGATE_RUNTIME_PREFETCH")?,
            true,
            hanging_input_ticks,
        )
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            debug_dynamic_accesses: false,
            runtime_prefetch: false,
            supports_postpone: true,
            hanging_input_ticks: 1,
        }
    }
}

fn env_flag(var: &str) -> Result<bool, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(false),
        Ok(value) => parse_flag(&value).ok_or_else(|| ConfigError::InvalidValue {
            var: var.to_string(),
            value,
        }),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_config_valid() {
        let config = RenderConfig::new(true, false, true, true, 3).unwrap();
        assert!(config.dev_mode);
        assert!(config.runtime_prefetch);
        assert_eq!(config.hanging_input_ticks, 3);
    }

    #[test]
    fn test_render_config_zero_ticks() {
        let result = RenderConfig::new(false, false, false, true, 0);
        assert!(matches!(result, Err(ConfigError::InvalidHangingInputTicks)));
    }

    #[test]
    fn test_default_values() {
        let config = RenderConfig::default();
        assert!(!config.dev_mode);
        assert!(!config.debug_dynamic_accesses);
        assert!(!config.runtime_prefetch);
        assert!(config.supports_postpone);
        assert_eq!(config.hanging_input_ticks, 1);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 1 "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
