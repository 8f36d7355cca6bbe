//! Scene objects built once resources are available

pub mod environment;
pub mod floor;
pub mod galaxy;
pub mod model;
pub mod physics;

use rand::Rng;

use crate::config::{GalaxyConfig, PhysicsConfig};
use crate::error::Result;
use crate::resources::Resources;
use crate::scene::Scene;
use crate::time::FrameTime;

pub use environment::{Environment, EnvironmentSettings};
pub use floor::Floor;
pub use galaxy::Galaxy;
pub use model::Model;
pub use physics::{BodyShape, Physics};

/// Resource name of the optional centre-piece mesh
pub const MODEL_RESOURCE: &str = "model";

/// Floor height: under the unit-fitted model, and the ground rigid bodies land on
pub const FLOOR_HEIGHT: f32 = -0.5;

/// Per-frame hook for scene objects
pub trait Updatable {
    fn update(&mut self, scene: &mut Scene, time: &FrameTime);
}

/// Everything placed in the scene after loading
#[derive(Debug)]
pub struct World {
    pub galaxy: Galaxy,
    pub environment: Environment,
    pub model: Option<Model>,
    pub floor: Floor,
    pub physics: Physics,
}

impl World {
    pub fn new<R: Rng + ?Sized>(
        scene: &mut Scene,
        resources: &Resources,
        config: &GalaxyConfig,
        physics: &PhysicsConfig,
        settings: &EnvironmentSettings,
        pixel_ratio: f32,
        rng: &mut R,
    ) -> Result<Self> {
        let environment = Environment::new(scene, settings);
        let model = resources
            .model(MODEL_RESOURCE)
            .map(|mesh| Model::new(scene, mesh));
        let floor = Floor::new(scene, FLOOR_HEIGHT);
        let physics = Physics::new(scene, physics, FLOOR_HEIGHT);

        let mut galaxy = Galaxy::new();
        galaxy.regenerate(scene, config, pixel_ratio, rng)?;

        Ok(Self {
            galaxy,
            environment,
            model,
            floor,
            physics,
        })
    }

    /// Remove every node this world placed. The ids are queued for
    /// disposal and the scene keeps handing out fresh ones.
    pub fn dispose(mut self, scene: &mut Scene) {
        self.physics.reset(scene);
        let nodes = self
            .environment
            .nodes()
            .into_iter()
            .chain(self.galaxy.node())
            .chain(self.model.as_ref().map(Model::node))
            .chain(Some(self.floor.node()));
        for node in nodes {
            scene.remove(node);
        }
        tracing::debug!("World disposed");
    }

    pub fn update(&mut self, scene: &mut Scene, time: &FrameTime) {
        let mut objects: Vec<&mut dyn Updatable> = Vec::with_capacity(3);
        objects.push(&mut self.galaxy);
        objects.push(&mut self.physics);
        if let Some(model) = self.model.as_mut() {
            objects.push(model);
        }
        for object in objects {
            object.update(scene, time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;
    use crate::resources::Resource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(scene: &mut Scene, resources: &Resources) -> World {
        let config = GalaxyConfig {
            count: 50,
            ..GalaxyConfig::default()
        };
        World::new(
            scene,
            resources,
            &config,
            &PhysicsConfig::default(),
            &EnvironmentSettings::default(),
            1.0,
            &mut StdRng::seed_from_u64(2),
        )
        .unwrap()
    }

    #[test]
    fn test_world_places_model_from_resources() {
        let mut resources = Resources::default();
        resources.insert(MODEL_RESOURCE, Resource::Model(Mesh::cube(3.0)));

        let mut scene = Scene::new();
        let mut world = build(&mut scene, &resources);
        let model = world.model.as_ref().unwrap().node();
        // Two lights, the model, the floor, the galaxy and three stacked boxes
        assert_eq!(scene.len(), 8);
        let floor = world.floor.node();
        assert_eq!(scene.get(floor).unwrap().transform.position.y, FLOOR_HEIGHT);

        world.update(
            &mut scene,
            &FrameTime {
                elapsed: 1.0,
                delta: 0.02,
                frame: 1,
            },
        );
        assert!(scene.get(model).unwrap().transform.rotation.y > 0.0);
        let first_box = world.physics.nodes().next().unwrap();
        let start = FLOOR_HEIGHT + 3.0;
        assert!(scene.get(first_box).unwrap().transform.position.y < start);
    }

    #[test]
    fn test_dispose_removes_every_node() {
        let mut resources = Resources::default();
        resources.insert(MODEL_RESOURCE, Resource::Model(Mesh::cube(1.0)));
        let mut scene = Scene::new();
        let world = build(&mut scene, &resources);
        let count = scene.len();

        world.dispose(&mut scene);
        assert!(scene.is_empty());
        assert_eq!(scene.drain_disposed().len(), count);
    }
}
