//! Orbit controls: rotate and zoom the camera around a target with damping

use nalgebra::{Point3, Vector3};
use std::f32::consts::PI;

use crate::camera::Camera;
use crate::config::CameraConfig;

const POLAR_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    radius: f32,
    /// Azimuth around +Y, measured from +Z towards +X
    theta: f32,
    /// Polar angle from +Y
    phi: f32,
    theta_delta: f32,
    phi_delta: f32,
    zoom_scale: f32,
}

impl OrbitControls {
    /// Start orbiting from the camera's current position
    pub fn new(camera: &Camera, config: &CameraConfig) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.norm();
        let (theta, phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };
        Self {
            target: camera.target,
            enable_damping: config.damping,
            damping_factor: 0.05,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            radius: radius.clamp(config.min_distance, config.max_distance),
            theta,
            phi,
            theta_delta: 0.0,
            phi_delta: 0.0,
            zoom_scale: 1.0,
        }
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    /// Queue a rotation; positive `azimuth` turns left, positive `polar` tilts down
    pub fn rotate(&mut self, azimuth: f32, polar: f32) {
        self.theta_delta -= azimuth;
        self.phi_delta -= polar;
    }

    /// Multiply the orbit distance; values below 1 move closer
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 && factor.is_finite() {
            self.zoom_scale *= factor;
        }
    }

    /// Apply queued motion and write the camera position.
    ///
    /// With damping on, only a fraction of the queued rotation is applied per
    /// call and the rest decays, so the camera glides to a stop.
    pub fn update(&mut self, camera: &mut Camera) {
        if self.enable_damping {
            self.theta += self.theta_delta * self.damping_factor;
            self.phi += self.phi_delta * self.damping_factor;
            self.theta_delta *= 1.0 - self.damping_factor;
            self.phi_delta *= 1.0 - self.damping_factor;
        } else {
            self.theta += self.theta_delta;
            self.phi += self.phi_delta;
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
        }

        self.phi = self.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.radius = (self.radius * self.zoom_scale).clamp(self.min_distance, self.max_distance);
        self.zoom_scale = 1.0;

        let sin_phi = self.phi.sin();
        let offset = Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        );
        camera.position = self.target + offset;
        camera.target = self.target;
    }
}
