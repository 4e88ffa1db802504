/// Scene configuration, loadable from TOML. An empty document yields the stock scene.
use crate::animation::JumpParams;
use crate::error::{Result, SceneError};
use crate::geometry::{ground_vertex_count, sphere_vertex_count, torus_vertex_count};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Half the side length of the square ground
    pub extent: f32,
    pub step: f32,
    pub color: [f32; 3],
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            extent: 20.0,
            step: 1.0,
            color: [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    pub radius: f32,
    pub columns: u32,
    pub rows: u32,
    /// Number of spheres scattered over the ground
    pub count: usize,
    /// Spheres land in `[-scatter, scatter)` on x and z
    pub scatter: f32,
    pub color: [f32; 3],
    /// Fixed seed for the scatter; random when unset
    pub seed: Option<u64>,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            radius: 0.2,
            columns: 15,
            rows: 15,
            count: 50,
            scatter: 20.0,
            color: [1.0, 1.0, 1.0],
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TorusConfig {
    pub major_radius: f32,
    pub minor_radius: f32,
    pub num_major: u32,
    pub num_minor: u32,
    pub color: [f32; 3],
}

impl Default for TorusConfig {
    fn default() -> Self {
        Self {
            major_radius: 0.35,
            minor_radius: 0.15,
            num_major: 40,
            num_minor: 20,
            color: [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Degrees per second
    pub rotation_rate: f32,
    pub jump: JumpParams,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            rotation_rate: 60.0,
            jump: JumpParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub move_step: f32,
    /// Degrees per control
    pub turn_step: f32,
    /// Scale held-key movement by elapsed time (normalized to 60 fps)
    pub scale_by_elapsed: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            move_step: 0.1,
            turn_step: 1.0,
            scale_by_elapsed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Vertical field of view in degrees
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fovy: 35.0,
            near: 0.1,
            far: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub ground: GroundConfig,
    pub sphere: SphereConfig,
    pub torus: TorusConfig,
    pub animation: AnimationConfig,
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub light: LightConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Direction toward a distant light, in camera space
    pub direction: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [1.0, 1.0, 1.0],
        }
    }
}

fn require(ok: bool, message: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(SceneError::InvalidConfig(message.to_string()))
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

impl SceneConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| SceneError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| SceneError::ConfigParse(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Reject settings that would leave the scene degenerate
    pub fn validate(&self) -> Result<()> {
        require(positive(self.ground.extent), "ground.extent must be positive")?;
        require(positive(self.ground.step), "ground.step must be positive")?;
        require(positive(self.sphere.radius), "sphere.radius must be positive")?;
        require(
            self.sphere.columns > 0 && self.sphere.rows > 0,
            "sphere.columns and sphere.rows must be at least 1",
        )?;
        require(
            self.sphere.scatter.is_finite() && self.sphere.scatter >= 0.0,
            "sphere.scatter must not be negative",
        )?;
        require(positive(self.torus.major_radius), "torus.major_radius must be positive")?;
        require(
            self.torus.minor_radius.is_finite() && self.torus.minor_radius >= 0.0,
            "torus.minor_radius must not be negative",
        )?;
        require(
            self.torus.num_major > 0 && self.torus.num_minor > 0,
            "torus.num_major and torus.num_minor must be at least 1",
        )?;
        require(
            ground_vertex_count(self.ground.extent, self.ground.step).is_some(),
            "ground has too many cells (extent / step too large)",
        )?;
        require(
            sphere_vertex_count(self.sphere.columns, self.sphere.rows).is_some(),
            "sphere.columns * sphere.rows is too large",
        )?;
        require(
            torus_vertex_count(self.torus.num_major, self.torus.num_minor).is_some(),
            "torus.num_major * torus.num_minor is too large",
        )?;
        require(
            self.animation.rotation_rate.is_finite(),
            "animation.rotation_rate must be finite",
        )?;
        require(
            positive(self.animation.jump.gravity),
            "animation.jump.gravity must be positive",
        )?;
        require(
            self.animation.jump.initial_speed.is_finite()
                && self.animation.jump.initial_speed >= 0.0,
            "animation.jump.initial_speed must not be negative",
        )?;
        require(
            self.camera.move_step.is_finite() && self.camera.turn_step.is_finite(),
            "camera steps must be finite",
        )?;
        require(
            positive(self.projection.fovy) && self.projection.fovy < 180.0,
            "projection.fovy must be within (0, 180)",
        )?;
        require(
            positive(self.projection.near) && self.projection.far > self.projection.near,
            "projection needs 0 < near < far",
        )?;
        require(
            self.light.direction.iter().any(|c| *c != 0.0),
            "light.direction must not be zero",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sphere.count, 50);
        assert_eq!(config.projection.fovy, 35.0);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(SceneConfig::from_toml_str("").unwrap(), SceneConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = SceneConfig::from_toml_str(
            r#"
            [sphere]
            count = 5
            seed = 7

            [animation.jump]
            initial_speed = 5.0
            gravity = 10.0

            [camera]
            scale_by_elapsed = true
            "#,
        )
        .unwrap();
        assert_eq!(config.sphere.count, 5);
        assert_eq!(config.sphere.seed, Some(7));
        assert_eq!(config.sphere.radius, 0.2);
        assert_eq!(config.animation.jump.peak_height(), 1.25);
        assert!(config.camera.scale_by_elapsed);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SceneConfig::from_toml_str("[ground]\nstep = 0.0\n").unwrap_err();
        assert!(matches!(err, SceneError::InvalidConfig(_)));

        let err = SceneConfig::from_toml_str("[projection]\nnear = 5.0\nfar = 1.0\n").unwrap_err();
        assert!(matches!(err, SceneError::InvalidConfig(_)));
    }

    #[test]
    fn test_oversized_meshes_rejected() {
        let err = SceneConfig::from_toml_str("[ground]\nextent = 100000.0\nstep = 0.001\n")
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidConfig(_)));

        let err = SceneConfig::from_toml_str("[sphere]\ncolumns = 100000\nrows = 100000\n")
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidConfig(_)));

        let err = SceneConfig::from_toml_str("[torus]\nnum_major = 4294967295\nnum_minor = 2\n")
            .unwrap_err();
        assert!(matches!(err, SceneError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = SceneConfig::from_toml_str("[ground\nextent = 1").unwrap_err();
        assert!(matches!(err, SceneError::ConfigParse(_)));
    }
}
