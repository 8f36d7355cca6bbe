//! Configuration for the galaxy and the surrounding experience

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::Color;
use crate::error::{CoreError, Result};

/// Parameters read by the galaxy generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    /// Number of particles
    pub count: u32,
    /// Point size fed to the material
    pub size: f32,
    /// Radial extent of the disc
    pub radius: f32,
    /// Number of spiral arms
    pub branches: u32,
    /// Arm curl: angle added per unit of radius
    pub spin: f32,
    /// Exposed for tuning and triggers regeneration; the jitter itself is `±U^power`
    pub randomness: f32,
    /// Jitter falloff exponent; higher keeps particles closer to their arm
    pub randomness_power: f32,
    pub inside_color: Color,
    pub outside_color: Color,
    /// Angular speed used by the vertex stage; applied without regeneration
    pub spin_speed: f32,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            count: 90_000,
            size: 0.02,
            radius: 4.0,
            branches: 3,
            spin: 0.5,
            randomness: 0.2,
            randomness_power: 5.0,
            inside_color: Color::from_rgb8(0xff, 0x60, 0x30),
            outside_color: Color::from_rgb8(0x4a, 0x7a, 0xf2),
            spin_speed: 0.05,
        }
    }
}

impl GalaxyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(CoreError::invalid("galaxy.count", "must be at least 1"));
        }
        if self.branches == 0 {
            return Err(CoreError::invalid("galaxy.branches", "must be at least 1"));
        }
        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return Err(CoreError::invalid("galaxy.radius", "must be a positive number"));
        }
        if !self.randomness_power.is_finite() || self.randomness_power < 0.0 {
            return Err(CoreError::invalid(
                "galaxy.randomness_power",
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Initial camera placement and orbit limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
    pub damping: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 20.0,
            position: [3.0, 3.0, 3.0],
            min_distance: 2.0,
            max_distance: 14.0,
            damping: true,
        }
    }
}

/// Rigid bodies dropped onto the floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical acceleration, negative pulls down
    pub gravity: f32,
    /// Boxes stacked above the floor when the world is built
    pub initial_boxes: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.82,
            initial_boxes: 3,
        }
    }
}

/// Top-level configuration, usually loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub galaxy: GalaxyConfig,
    pub camera: CameraConfig,
    pub physics: PhysicsConfig,
    /// Show the debug panel
    pub debug: bool,
    /// Frame rate target for timer-driven front ends
    pub fps: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            galaxy: GalaxyConfig::default(),
            camera: CameraConfig::default(),
            physics: PhysicsConfig::default(),
            debug: false,
            fps: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        tracing::info!("Loading config from: {}", path.as_ref().display());
        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(s).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.galaxy.validate()?;
        let camera = &self.camera;
        if !(camera.near > 0.0) || camera.far <= camera.near {
            return Err(CoreError::invalid("camera.far", "must be greater than camera.near"));
        }
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(CoreError::invalid("camera.fov", "must be between 0 and 180 degrees"));
        }
        if camera.min_distance > camera.max_distance {
            return Err(CoreError::invalid(
                "camera.min_distance",
                "must not exceed camera.max_distance",
            ));
        }
        if !self.physics.gravity.is_finite() {
            return Err(CoreError::invalid("physics.gravity", "must be a finite number"));
        }
        if self.fps == 0 {
            return Err(CoreError::invalid("fps", "must be at least 1"));
        }
        Ok(())
    }
}
