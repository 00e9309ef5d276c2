use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::types::HandleKind;

/// Bridge configuration, provided by the host at session start.
/// Usually built with `Default`, or parsed from a JSON settings blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Namespace the function table is registered under (default: "physics").
    pub namespace: String,
    /// Space table capacity step (default: 8).
    pub space_capacity_step: usize,
    /// Body table capacity step (default: 128).
    pub body_capacity_step: usize,
    /// Shape table capacity step (default: 128).
    pub shape_capacity_step: usize,
    /// Constraint table capacity step (default: 128).
    pub constraint_capacity_step: usize,
    /// Step every space from the host's per-frame update (default: false).
    /// Scripts normally call `space_step` themselves.
    pub auto_step: bool,
    /// Fixed timestep used by `auto_step`, in seconds (default: 1/60).
    pub fixed_dt: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: "physics".to_string(),
            space_capacity_step: 8,
            body_capacity_step: 128,
            shape_capacity_step: 128,
            constraint_capacity_step: 128,
            auto_step: false,
            fixed_dt: 1.0 / 60.0,
        }
    }
}

impl BridgeConfig {
    /// Parse a config from a JSON string. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the step clock or the slot tables cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fixed_dt.is_finite() || self.fixed_dt <= 0.0 {
            return Err(ConfigError::FixedDt(self.fixed_dt));
        }
        let steps = [
            ("space_capacity_step", self.space_capacity_step),
            ("body_capacity_step", self.body_capacity_step),
            ("shape_capacity_step", self.shape_capacity_step),
            ("constraint_capacity_step", self.constraint_capacity_step),
        ];
        match steps.iter().find(|(_, step)| *step == 0) {
            Some((name, _)) => Err(ConfigError::CapacityStep(name)),
            None => Ok(()),
        }
    }

    pub fn capacity_step(&self, kind: HandleKind) -> usize {
        match kind {
            HandleKind::Space => self.space_capacity_step,
            HandleKind::Body => self.body_capacity_step,
            HandleKind::Shape => self.shape_capacity_step,
            HandleKind::Constraint => self.constraint_capacity_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_table_steps() {
        let config = BridgeConfig::default();
        assert_eq!(config.capacity_step(HandleKind::Space), 8);
        assert_eq!(config.capacity_step(HandleKind::Body), 128);
        assert_eq!(config.capacity_step(HandleKind::Shape), 128);
        assert_eq!(config.capacity_step(HandleKind::Constraint), 128);
        assert!(!config.auto_step);
        assert!((config.fixed_dt - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn parse_partial_config() {
        let json = r#"{ "namespace": "chipmunk", "space_capacity_step": 2, "auto_step": true }"#;
        let config = BridgeConfig::from_json(json).unwrap();
        assert_eq!(config.namespace, "chipmunk");
        assert_eq!(config.space_capacity_step, 2);
        assert!(config.auto_step);
        assert_eq!(config.body_capacity_step, 128);
    }

    #[test]
    fn parse_empty_object() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn reject_malformed_json() {
        let err = BridgeConfig::from_json("{ namespace: }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)), "{:?}", err);
    }

    #[test]
    fn reject_unusable_fixed_dt() {
        for json in [
            r#"{ "auto_step": true, "fixed_dt": -0.016 }"#,
            r#"{ "fixed_dt": 0.0 }"#,
        ] {
            let err = BridgeConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::FixedDt(_)), "{}: {:?}", json, err);
        }

        let config = BridgeConfig {
            fixed_dt: f32::NAN,
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::FixedDt(_))));
    }

    #[test]
    fn reject_zero_capacity_step() {
        let err = BridgeConfig::from_json(r#"{ "shape_capacity_step": 0 }"#).unwrap_err();
        assert_eq!(err.to_string(), "shape_capacity_step must be at least 1");
        assert!(BridgeConfig::default().validate().is_ok());
    }
}
