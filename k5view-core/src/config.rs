//! Mirror configuration
//!
//! Plain data with defaults matching the K5 link. The firmware build embeds
//! a TOML file, validated and converted to postcard binary at compile time.

use k5view_hal::UartConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Consecutive idle polls before the link is reported down
pub const DEFAULT_NO_SIGNAL_POLLS: u8 = 5;

/// FPS measurement window
pub const DEFAULT_FPS_WINDOW_MS: u32 = 1000;

/// SH1106 power-on contrast
pub const DEFAULT_CONTRAST: u8 = 0xCF;

/// Top-level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MirrorConfig {
    /// Serial link to the radio
    pub uart: UartConfig,
    /// Link health reporting
    pub link: LinkConfig,
    /// Local display
    pub display: DisplayConfig,
}

/// Link health thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Idle polls in a row that mean "no signal"
    pub no_signal_polls: u8,
    /// Minimum span of one FPS measurement
    pub fps_window_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            no_signal_polls: DEFAULT_NO_SIGNAL_POLLS,
            fps_window_ms: DEFAULT_FPS_WINDOW_MS,
        }
    }
}

/// Display options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisplayConfig {
    /// Draw lit pixels dark
    pub invert: bool,
    /// Panel contrast
    pub contrast: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            invert: false,
            contrast: DEFAULT_CONTRAST,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// UART baud rate is zero
    ZeroBaudrate,
    /// UART read timeout is zero
    ZeroReadTimeout,
    /// No-signal threshold is zero
    ZeroNoSignalPolls,
    /// FPS window is zero
    ZeroFpsWindow,
}

impl MirrorConfig {
    /// Check values that would stall or divide by zero at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uart.baudrate == 0 {
            return Err(ConfigError::ZeroBaudrate);
        }
        if self.uart.read_timeout_ms == 0 {
            return Err(ConfigError::ZeroReadTimeout);
        }
        if self.link.no_signal_polls == 0 {
            return Err(ConfigError::ZeroNoSignalPolls);
        }
        if self.link.fps_window_ms == 0 {
            return Err(ConfigError::ZeroFpsWindow);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MirrorConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.uart.baudrate, 38_400);
        assert_eq!(config.link.no_signal_polls, 5);
        assert_eq!(config.display.contrast, 0xCF);
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let mut config = MirrorConfig::default();
        config.uart.baudrate = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroBaudrate));

        let mut config = MirrorConfig::default();
        config.uart.read_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroReadTimeout));

        let mut config = MirrorConfig::default();
        config.link.no_signal_polls = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroNoSignalPolls));

        let mut config = MirrorConfig::default();
        config.link.fps_window_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroFpsWindow));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: MirrorConfig = toml::from_str(
            r#"
            [uart]
            baudrate = 115200

            [display]
            invert = true
            "#,
        )
        .unwrap();

        assert_eq!(config.uart.baudrate, 115_200);
        assert_eq!(config.uart.read_timeout_ms, 500);
        assert!(config.display.invert);
        assert_eq!(config.link, LinkConfig::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_blob_round_trip() {
        let mut config = MirrorConfig::default();
        config.link.fps_window_ms = 2000;

        let blob = postcard::to_allocvec(&config).unwrap();
        let decoded: MirrorConfig = postcard::from_bytes(&blob).unwrap();
        assert_eq!(decoded, config);
    }
}
