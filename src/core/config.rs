//! Detector configuration.
//!
//! Build a [`DetectorConfig`] from the defaults and override individual fields
//! with a partial [`DetectorOptions`], typically deserialized from a JSON or
//! JavaScript object. Overrides are validated when applied; the configuration
//! is immutable once the detector starts.

use serde::{Deserialize, Serialize};

use super::cooldown::{BlockPattern, cooldown_ms};
use super::error::{ExitIntentError, Result};
use super::gesture::GestureChannels;

/// Active time before gesture listeners attach
pub const DEFAULT_BIND_DELAY_MS: f64 = 3000.0;

/// Cooldown written after a successful action
pub const DEFAULT_COOLDOWN_MINUTES: f64 = 10.0;

/// Scale factor of the fast-upward mouse heuristic
pub const DEFAULT_EDGE_TOLERANCE: f64 = 1.0;

/// Partial configuration. Absent fields keep their current value.
///
/// Field names follow the JavaScript convention (`bindDelayMs`,
/// `cooldownPattern`, ...). The names used by earlier releases (`bindDelay`,
/// `storageBlockingRegex`, `storageBlockingMinutes`) are still accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorOptions {
    #[serde(alias = "bindDelay")]
    pub bind_delay_ms: Option<f64>,
    pub bind_event_blur: Option<bool>,
    pub bind_event_mouse_leave: Option<bool>,
    pub bind_event_mouse_move: Option<bool>,
    #[serde(alias = "storageBlockingRegex")]
    pub cooldown_pattern: Option<String>,
    #[serde(alias = "storageBlockingMinutes")]
    pub cooldown_minutes: Option<f64>,
    pub ignore_storage_blocking: Option<bool>,
    pub ignore_flag_blocking: Option<bool>,
    pub edge_tolerance: Option<f64>,
}

/// Complete detector configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Active milliseconds before listeners attach
    pub bind_delay_ms: f64,
    /// Enabled gesture channels
    pub channels: GestureChannels,
    /// Pattern written with each new cooldown
    pub cooldown_pattern: BlockPattern,
    /// Length of each new cooldown
    pub cooldown_minutes: f64,
    /// Skip the persisted cooldown check
    pub ignore_storage_blocking: bool,
    /// Skip the "already acted on this page" check
    pub ignore_flag_blocking: bool,
    pub edge_tolerance: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            bind_delay_ms: DEFAULT_BIND_DELAY_MS,
            channels: GestureChannels::all(),
            cooldown_pattern: BlockPattern::Wildcard,
            cooldown_minutes: DEFAULT_COOLDOWN_MINUTES,
            ignore_storage_blocking: false,
            ignore_flag_blocking: false,
            edge_tolerance: DEFAULT_EDGE_TOLERANCE,
        }
    }
}

impl DetectorConfig {
    /// Apply the fields present in `options`
    pub fn with_options(mut self, options: &DetectorOptions) -> Result<Self> {
        if let Some(delay) = options.bind_delay_ms {
            if !delay.is_finite() {
                return Err(ExitIntentError::InvalidDuration {
                    field: "bindDelayMs",
                    value: delay,
                });
            }
            self.bind_delay_ms = delay;
        }
        if let Some(blur) = options.bind_event_blur {
            self.channels.blur = blur;
        }
        if let Some(mouse_leave) = options.bind_event_mouse_leave {
            self.channels.mouse_leave = mouse_leave;
        }
        if let Some(mouse_move) = options.bind_event_mouse_move {
            self.channels.mouse_move = mouse_move;
        }
        if let Some(pattern) = options.cooldown_pattern.as_deref() {
            self.cooldown_pattern = BlockPattern::parse(pattern)?;
        }
        if let Some(minutes) = options.cooldown_minutes {
            cooldown_ms(minutes)?;
            self.cooldown_minutes = minutes;
        }
        if let Some(ignore) = options.ignore_storage_blocking {
            self.ignore_storage_blocking = ignore;
        }
        if let Some(ignore) = options.ignore_flag_blocking {
            self.ignore_flag_blocking = ignore;
        }
        if let Some(tolerance) = options.edge_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(ExitIntentError::InvalidEdgeTolerance(tolerance));
            }
            self.edge_tolerance = tolerance;
        }
        Ok(self)
    }

    /// Every field as an explicit override, for handing back to JavaScript
    pub fn to_options(&self) -> DetectorOptions {
        DetectorOptions {
            bind_delay_ms: Some(self.bind_delay_ms),
            bind_event_blur: Some(self.channels.blur),
            bind_event_mouse_leave: Some(self.channels.mouse_leave),
            bind_event_mouse_move: Some(self.channels.mouse_move),
            cooldown_pattern: Some(self.cooldown_pattern.as_str().to_string()),
            cooldown_minutes: Some(self.cooldown_minutes),
            ignore_storage_blocking: Some(self.ignore_storage_blocking),
            ignore_flag_blocking: Some(self.ignore_flag_blocking),
            edge_tolerance: Some(self.edge_tolerance),
        }
    }

    pub fn from_options(options: &DetectorOptions) -> Result<Self> {
        Self::default().with_options(options)
    }

    /// Parse a JSON options object on top of the defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let options: DetectorOptions = serde_json::from_str(json)?;
        Self::from_options(&options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Defaults
    // ========================================================================

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.bind_delay_ms, 3000.0);
        assert_eq!(config.channels, GestureChannels::all());
        assert_eq!(config.cooldown_pattern, BlockPattern::Wildcard);
        assert_eq!(config.cooldown_minutes, 10.0);
        assert!(!config.ignore_storage_blocking);
        assert!(!config.ignore_flag_blocking);
        assert_eq!(config.edge_tolerance, 1.0);
    }

    #[test]
    fn test_empty_options_keep_defaults() {
        let config = DetectorConfig::from_options(&DetectorOptions::default()).unwrap();
        assert_eq!(config, DetectorConfig::default());
    }

    // ========================================================================
    // Overrides
    // ========================================================================

    #[test]
    fn test_partial_override() {
        let options = DetectorOptions {
            bind_delay_ms: Some(2000.0),
            bind_event_mouse_move: Some(false),
            ignore_flag_blocking: Some(true),
            ..Default::default()
        };
        let config = DetectorConfig::from_options(&options).unwrap();

        assert_eq!(config.bind_delay_ms, 2000.0);
        assert!(config.channels.blur);
        assert!(config.channels.mouse_leave);
        assert!(!config.channels.mouse_move);
        assert!(config.ignore_flag_blocking);
        assert_eq!(config.cooldown_minutes, 10.0);
    }

    #[test]
    fn test_from_json_camel_case() {
        let config = DetectorConfig::from_json(
            r#"{"bindDelayMs": 500, "cooldownPattern": "/checkout", "cooldownMinutes": 0.5,
                "bindEventBlur": false, "ignoreStorageBlocking": true, "edgeTolerance": 2}"#,
        )
        .unwrap();

        assert_eq!(config.bind_delay_ms, 500.0);
        assert_eq!(config.cooldown_pattern.as_str(), "/checkout");
        assert_eq!(config.cooldown_minutes, 0.5);
        assert!(!config.channels.blur);
        assert!(config.ignore_storage_blocking);
        assert_eq!(config.edge_tolerance, 2.0);
    }

    #[test]
    fn test_from_json_legacy_names() {
        let config = DetectorConfig::from_json(
            r#"{"bindDelay": 2000, "storageBlockingRegex": "^https://a", "storageBlockingMinutes": 1}"#,
        )
        .unwrap();

        assert_eq!(config.bind_delay_ms, 2000.0);
        assert_eq!(config.cooldown_pattern.as_str(), "^https://a");
        assert_eq!(config.cooldown_minutes, 1.0);
    }

    #[test]
    fn test_from_json_ignores_unknown_fields() {
        let config = DetectorConfig::from_json(r#"{"somethingElse": true}"#).unwrap();
        assert_eq!(config, DetectorConfig::default());
    }

    #[test]
    fn test_to_options_reproduces_config() {
        let config = DetectorConfig::from_json(
            r#"{"bindDelayMs": 750, "cooldownPattern": "/cart", "bindEventMouseMove": false}"#,
        )
        .unwrap();

        let options = config.to_options();
        assert_eq!(DetectorConfig::from_options(&options).unwrap(), config);

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["bindDelayMs"], 750.0);
        assert_eq!(json["cooldownPattern"], "/cart");
        assert_eq!(json["bindEventMouseMove"], false);
        assert_eq!(json["cooldownMinutes"], 10.0);
    }

    #[test]
    fn test_negative_bind_delay_allowed() {
        let options = DetectorOptions {
            bind_delay_ms: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(
            DetectorConfig::from_options(&options).unwrap().bind_delay_ms,
            -1.0
        );
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn test_invalid_pattern_fails_fast() {
        let options = DetectorOptions {
            cooldown_pattern: Some("[".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            DetectorConfig::from_options(&options),
            Err(ExitIntentError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_durations() {
        let bad_minutes = DetectorOptions {
            cooldown_minutes: Some(-5.0),
            ..Default::default()
        };
        let bad_delay = DetectorOptions {
            bind_delay_ms: Some(f64::NAN),
            ..Default::default()
        };
        assert!(DetectorConfig::from_options(&bad_minutes).is_err());
        assert!(DetectorConfig::from_options(&bad_delay).is_err());
    }

    #[test]
    fn test_cooldown_minutes_must_fit_in_milliseconds() {
        let huge = DetectorOptions {
            cooldown_minutes: Some(1e306),
            ..Default::default()
        };
        assert!(matches!(
            DetectorConfig::from_options(&huge),
            Err(ExitIntentError::InvalidDuration {
                field: "cooldownMinutes",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_edge_tolerance() {
        for tolerance in [-0.5, f64::NAN, f64::INFINITY] {
            let options = DetectorOptions {
                edge_tolerance: Some(tolerance),
                ..Default::default()
            };
            assert!(matches!(
                DetectorConfig::from_options(&options),
                Err(ExitIntentError::InvalidEdgeTolerance(_))
            ));
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            DetectorConfig::from_json("{"),
            Err(ExitIntentError::InvalidOptions(_))
        ));
        assert!(matches!(
            DetectorConfig::from_json(r#"{"bindDelayMs": "soon"}"#),
            Err(ExitIntentError::InvalidOptions(_))
        ));
    }
}
