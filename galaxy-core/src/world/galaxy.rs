use rand::Rng;

use crate::config::GalaxyConfig;
use crate::error::Result;
use crate::galaxy;
use crate::scene::{Node, NodeId, NodeKind, Points, PointsMaterial, Scene};
use crate::time::FrameTime;

use super::Updatable;

/// Converts the configured size into device pixels at unit depth
const SIZE_TO_PIXELS: f32 = 500.0;

/// The galaxy point cloud as a scene object
#[derive(Debug, Default)]
pub struct Galaxy {
    node: Option<NodeId>,
    generation: u64,
}

impl Galaxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently attached points node
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Number of successful regenerations
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the attached point cloud with a fresh sample of `config`.
    ///
    /// The old node is removed (and queued for disposal) before the new one
    /// is added. On an invalid config the current node stays untouched.
    pub fn regenerate<R: Rng + ?Sized>(
        &mut self,
        scene: &mut Scene,
        config: &GalaxyConfig,
        pixel_ratio: f32,
        rng: &mut R,
    ) -> Result<NodeId> {
        let buffer = galaxy::generate(config, rng)?;

        // Keep the running time so the animation does not jump
        let time = self
            .points_material(scene)
            .map(|material| material.time)
            .unwrap_or(0.0);

        if let Some(old) = self.node.take() {
            scene.remove(old);
        }

        let material = PointsMaterial {
            size: config.size * SIZE_TO_PIXELS * pixel_ratio,
            time,
            spin_speed: config.spin_speed,
            ..PointsMaterial::default()
        };
        let id = scene.add(Node::new("galaxy", NodeKind::Points(Points { buffer, material })));
        self.node = Some(id);
        self.generation += 1;

        tracing::info!(
            count = config.count,
            branches = config.branches,
            generation = self.generation,
            "Generated galaxy"
        );
        Ok(id)
    }

    fn points_material(&self, scene: &Scene) -> Option<PointsMaterial> {
        let node = scene.get(self.node?)?;
        node.as_points().map(|points| points.material)
    }

    fn with_material<F: FnOnce(&mut PointsMaterial)>(&self, scene: &mut Scene, apply: F) {
        if let Some(points) = self
            .node
            .and_then(|id| scene.get_mut(id))
            .and_then(|node| node.as_points_mut())
        {
            apply(&mut points.material);
        }
    }

    pub fn set_spin_speed(&self, scene: &mut Scene, spin_speed: f32) {
        self.with_material(scene, |material| material.spin_speed = spin_speed);
    }

    pub fn set_point_size(&self, scene: &mut Scene, size: f32, pixel_ratio: f32) {
        self.with_material(scene, |material| {
            material.size = size * SIZE_TO_PIXELS * pixel_ratio
        });
    }
}

impl Updatable for Galaxy {
    fn update(&mut self, scene: &mut Scene, time: &FrameTime) {
        self.with_material(scene, |material| material.time = time.elapsed);
    }
}
