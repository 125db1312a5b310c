use serde;
use std::fs;
use std::path::Path;

use crate::dispatch::error::DispatchError;
use crate::service::error::ServiceError;
use crate::util::constants as setting;

/// Settings for the serving layer. Every field has a default, so a config
/// file only needs the keys it wants to change.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub id: String,
    pub listen_addr: String,
    pub min_floor: i64,
    pub max_floor: i64,
    pub max_steps_per_call: i64,
    /// Period of the automatic `step(1)` ticker, off when `None`.
    pub auto_step_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            id: setting::ELEVATOR_ID.to_string(),
            listen_addr: setting::LISTEN_ADDR.to_string(),
            min_floor: setting::MIN_FLOOR,
            max_floor: setting::MAX_FLOOR,
            max_steps_per_call: setting::MAX_STEPS_PER_CALL,
            auto_step_ms: None,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, ServiceError> {
        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.min_floor > self.max_floor {
            return Err(ServiceError::Config(format!(
                "minFloor {} is above maxFloor {}",
                self.min_floor, self.max_floor
            )));
        }
        if self.max_steps_per_call < 1 {
            return Err(ServiceError::Config("maxStepsPerCall must be at least 1".to_string()));
        }
        if let Some(period) = self.auto_step_ms {
            if period == 0 || period > setting::MAX_AUTO_STEP_MS {
                return Err(ServiceError::Config(format!(
                    "autoStepMs must be between 1 and {}, got {}",
                    setting::MAX_AUTO_STEP_MS,
                    period
                )));
            }
        }
        Ok(())
    }

    /// Range policy the dispatch core leaves to its callers.
    pub fn check_floor(&self, floor: i64) -> Result<(), DispatchError> {
        if floor < self.min_floor {
            return Err(DispatchError::invalid(format!(
                "floor cannot be below {}, got {}",
                self.min_floor, floor
            )));
        }
        if floor > self.max_floor {
            return Err(DispatchError::invalid(format!(
                "floor cannot exceed max floor {}, got {}",
                self.max_floor, floor
            )));
        }
        Ok(())
    }

    pub fn check_steps(&self, steps: i64) -> Result<(), DispatchError> {
        if steps > self.max_steps_per_call {
            return Err(DispatchError::invalid(format!(
                "steps cannot exceed {}, got {}",
                self.max_steps_per_call, steps
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_fills_missing_keys_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"maxFloor": 20, "autoStepMs": 500}"#).unwrap();
        assert_eq!(config.max_floor, 20);
        assert_eq!(config.auto_step_ms, Some(500));
        assert_eq!(config.min_floor, setting::MIN_FLOOR);
        assert_eq!(config.listen_addr, setting::LISTEN_ADDR);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn it_rejects_inverted_floor_range() {
        let config = Config {
            min_floor: 5,
            max_floor: 2,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ServiceError::Config(_))));
    }

    #[test]
    fn it_rejects_zero_tick_period() {
        let config = Config {
            auto_step_ms: Some(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn it_enforces_floor_range() {
        let config = Config::default();
        assert!(config.check_floor(0).is_ok());
        assert!(config.check_floor(10).is_ok());
        assert!(config.check_floor(-1).is_err());
        assert!(config.check_floor(11).is_err());
    }

    #[test]
    fn it_caps_steps_per_call() {
        let config = Config::default();
        assert!(config.check_steps(setting::MAX_STEPS_PER_CALL).is_ok());
        assert!(config.check_steps(setting::MAX_STEPS_PER_CALL + 1).is_err());
    }
}
