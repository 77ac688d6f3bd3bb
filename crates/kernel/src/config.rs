use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::d2q9::BounceBack;
use crate::error::ConfigError;

/// `tau` closer than this to 0.5 counts as being at the BGK stability limit.
pub const STABILITY_MARGIN: f32 = 0.05;

/// Parameters a lattice is built from.
///
/// Every field has a default, so a JSON config only needs the fields it
/// changes:
///
/// ```json
/// { "width": 64, "height": 32, "viscosity": 0.02 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Cells along x.
    pub width: usize,
    /// Cells along y.
    pub height: usize,
    /// Edge length of a cell in world units.
    pub cell_size: f32,
    /// Kinematic viscosity; sets the relaxation time.
    pub viscosity: f32,
    /// Signed acceleration along y, folded into the equilibrium velocity.
    pub gravity: f32,
    pub bounce_back: BounceBack,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            cell_size: 4.0,
            viscosity: 0.01,
            gravity: -0.001,
            bounce_back: BounceBack::default(),
        }
    }
}

impl SimConfig {
    pub fn new(width: usize, height: usize, cell_size: f32, viscosity: f32, gravity: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            viscosity,
            gravity,
            bounce_back: BounceBack::default(),
        }
    }

    pub fn with_bounce_back(mut self, bounce_back: BounceBack) -> Self {
        self.bounce_back = bounce_back;
        self
    }

    /// Parse a config from JSON text. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::CellSize(self.cell_size));
        }
        if !(self.viscosity.is_finite() && self.viscosity >= 0.0) {
            return Err(ConfigError::Viscosity(self.viscosity));
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::Gravity(self.gravity));
        }
        Ok(())
    }

    /// Number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Time step, fixed by the cell size: `dt = cell_size / sqrt(2)`.
    pub fn dt(&self) -> f32 {
        self.cell_size / std::f32::consts::SQRT_2
    }

    /// BGK relaxation time `0.5 + viscosity * dt / cell_size^2`.
    pub fn tau(&self) -> f32 {
        0.5 + self.viscosity * self.dt() / (self.cell_size * self.cell_size)
    }

    /// Relaxation factor `1 / tau`.
    pub fn omega(&self) -> f32 {
        1.0 / self.tau()
    }

    /// True when `tau - 0.5 < STABILITY_MARGIN`, i.e. `omega` is close to 2.
    ///
    /// The defaults are in this regime: viscosity 0.01 at cell size 4 gives
    /// `tau ~= 0.5018`. Such runs develop large velocities and lean on the
    /// lattice's speed limit and non-finite cell reset to stay bounded.
    pub fn near_stability_limit(&self) -> bool {
        self.tau() - 0.5 < STABILITY_MARGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_scene() {
        let c = SimConfig::default();
        assert_eq!((c.width, c.height), (128, 128));
        assert_eq!(c.cell_size, 4.0);
        assert_eq!(c.viscosity, 0.01);
        assert_eq!(c.gravity, -0.001);
        assert_eq!(c.bounce_back, BounceBack::Opposite);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn relaxation_parameters() {
        let c = SimConfig::new(4, 4, 1.0, 1.0, 0.0);
        assert!((c.dt() - 0.707_106_77).abs() < 1e-6);
        assert!((c.tau() - 1.207_106_8).abs() < 1e-6);
        assert!((c.omega() - 0.828_427_1).abs() < 1e-6);

        let inviscid = SimConfig::new(4, 4, 2.0, 0.0, 0.0);
        assert_eq!(inviscid.tau(), 0.5);
        assert_eq!(inviscid.omega(), 2.0);
    }

    #[test]
    fn stability_limit_detection() {
        assert!(SimConfig::default().near_stability_limit());
        assert!(SimConfig::new(4, 4, 2.0, 0.0, 0.0).near_stability_limit());
        assert!(!SimConfig::new(4, 4, 1.0, 1.0, 0.0).near_stability_limit());
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            SimConfig::new(0, 4, 1.0, 0.1, 0.0).validate(),
            Err(ConfigError::EmptyGrid { .. })
        ));
        assert!(matches!(
            SimConfig::new(4, 4, 0.0, 0.1, 0.0).validate(),
            Err(ConfigError::CellSize(_))
        ));
        assert!(matches!(
            SimConfig::new(4, 4, 1.0, -0.1, 0.0).validate(),
            Err(ConfigError::Viscosity(_))
        ));
        assert!(matches!(
            SimConfig::new(4, 4, 1.0, 0.1, f32::INFINITY).validate(),
            Err(ConfigError::Gravity(_))
        ));
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let c = SimConfig::from_json(r#"{ "width": 64, "bounce_back": "legacy" }"#).unwrap();
        assert_eq!(c.width, 64);
        assert_eq!(c.height, 128);
        assert_eq!(c.bounce_back, BounceBack::Legacy);
    }

    #[test]
    fn json_is_validated() {
        assert!(matches!(
            SimConfig::from_json(r#"{ "cell_size": -1.0 }"#),
            Err(ConfigError::CellSize(_))
        ));
        assert!(matches!(
            SimConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        let original = SimConfig::new(10, 6, 0.5, 0.2, 0.01);
        std::fs::write(&path, serde_json::to_string_pretty(&original).unwrap()).unwrap();
        assert_eq!(SimConfig::from_json_file(&path).unwrap(), original);
        assert!(matches!(
            SimConfig::from_json_file(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
