//! Rigid bodies dropped onto the floor
//!
//! Every body owns one mesh node. The simulation advances in fixed steps;
//! each frame consumes its delta in whole steps, at most `MAX_SUBSTEPS` of
//! them, and drops whatever lag is left beyond one step.

use nalgebra::Vector3;
use rand::Rng;
use rapier3d::prelude::{
    vector, BroadPhase, CCDSolver, ColliderBuilder, ColliderSet, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Vector,
};
use std::fmt;

use crate::color::Color;
use crate::config::PhysicsConfig;
use crate::geometry::Mesh;
use crate::scene::{MeshNode, Node, NodeId, NodeKind, Scene, StandardMaterial};
use crate::time::FrameTime;
use crate::transform::{Rotation, Transform};

use super::Updatable;

/// Simulation step in seconds
pub const FIXED_STEP: f32 = 1.0 / 60.0;
pub const MAX_SUBSTEPS: u32 = 3;

/// Height spawned bodies are dropped from
const SPAWN_HEIGHT: f32 = 3.0;
/// Spawned bodies start within half this distance of the centre on x and z
const SPAWN_SPREAD: f32 = 3.0;
const MIN_EXTENT: f32 = 0.05;
const BODY_MASS: f32 = 1.0;

// Contact coefficients are averaged per pair: body on body bounces at 0.8,
// body on floor at 0.5
const BODY_FRICTION: f32 = 0.1;
const BODY_RESTITUTION: f32 = 0.8;
const FLOOR_FRICTION: f32 = 0.1;
const FLOOR_RESTITUTION: f32 = 0.2;

/// Side of the boxes stacked at start-up
const STACK_BOX: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Sphere { radius: f32 },
    Box { size: [f32; 3] },
}

impl BodyShape {
    /// Scale applied to the unit mesh of this shape
    fn scale(&self) -> Vector3<f32> {
        match *self {
            BodyShape::Sphere { radius } => Vector3::repeat(radius),
            BodyShape::Box { size: [x, y, z] } => Vector3::new(x, y, z),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    handle: RigidBodyHandle,
    node: NodeId,
    shape: BodyShape,
}

pub struct Physics {
    gravity: Vector<f32>,
    parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    objects: Vec<Body>,
    accumulator: f32,
    sphere_mesh: Mesh,
    box_mesh: Mesh,
}

impl fmt::Debug for Physics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Physics")
            .field("gravity", &self.gravity.y)
            .field("bodies", &self.objects.len())
            .field("accumulator", &self.accumulator)
            .finish()
    }
}

impl Physics {
    /// Create the simulation with a static floor at `floor_height` and the
    /// configured stack of boxes above it
    pub fn new(scene: &mut Scene, config: &PhysicsConfig, floor_height: f32) -> Self {
        let mut physics = Self {
            gravity: vector![0.0, config.gravity, 0.0],
            parameters: IntegrationParameters {
                dt: FIXED_STEP,
                ..IntegrationParameters::default()
            },
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            objects: Vec::new(),
            accumulator: 0.0,
            sphere_mesh: Mesh::sphere(1.0, 20, 20),
            box_mesh: Mesh::cube(1.0),
        };

        let floor = ColliderBuilder::halfspace(Vector::y_axis())
            .translation(vector![0.0, floor_height, 0.0])
            .friction(FLOOR_FRICTION)
            .restitution(FLOOR_RESTITUTION)
            .build();
        physics.colliders.insert(floor);

        for level in 0..config.initial_boxes {
            let height = floor_height + SPAWN_HEIGHT * (level + 1) as f32;
            physics.spawn(scene, BodyShape::Box { size: [STACK_BOX; 3] }, [1.0, height, 0.0]);
        }
        physics
    }

    /// Add a dynamic body and its mesh node at `position`
    pub fn spawn(&mut self, scene: &mut Scene, shape: BodyShape, position: [f32; 3]) -> NodeId {
        let [x, y, z] = position;
        let handle = self
            .bodies
            .insert(RigidBodyBuilder::dynamic().translation(vector![x, y, z]).build());

        let collider = match shape {
            BodyShape::Sphere { radius } => ColliderBuilder::ball(radius),
            BodyShape::Box { size: [sx, sy, sz] } => ColliderBuilder::cuboid(sx / 2.0, sy / 2.0, sz / 2.0),
        }
        .mass(BODY_MASS)
        .friction(BODY_FRICTION)
        .restitution(BODY_RESTITUTION)
        .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        let (name, mesh) = match shape {
            BodyShape::Sphere { .. } => ("sphere", self.sphere_mesh.clone()),
            BodyShape::Box { .. } => ("box", self.box_mesh.clone()),
        };
        let transform = Transform {
            scale: shape.scale(),
            ..Transform::from_position(x, y, z)
        };
        let node = scene.add(
            Node::new(
                name,
                NodeKind::Mesh(MeshNode {
                    mesh,
                    material: body_material(),
                }),
            )
            .with_transform(transform),
        );

        self.objects.push(Body { handle, node, shape });
        tracing::debug!(?shape, bodies = self.objects.len(), "Spawned rigid body");
        node
    }

    pub fn spawn_sphere<R: Rng + ?Sized>(&mut self, scene: &mut Scene, rng: &mut R) -> NodeId {
        let radius = (rng.gen::<f32>() * 0.5).max(MIN_EXTENT);
        let position = drop_point(rng);
        self.spawn(scene, BodyShape::Sphere { radius }, position)
    }

    pub fn spawn_box<R: Rng + ?Sized>(&mut self, scene: &mut Scene, rng: &mut R) -> NodeId {
        let size = [(); 3].map(|_| rng.gen::<f32>().max(MIN_EXTENT));
        let position = drop_point(rng);
        self.spawn(scene, BodyShape::Box { size }, position)
    }

    /// Remove every body and its node; the nodes are queued for disposal
    pub fn reset(&mut self, scene: &mut Scene) {
        for body in self.objects.drain(..) {
            self.bodies.remove(
                body.handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
            scene.remove(body.node);
        }
        self.accumulator = 0.0;
        tracing::debug!("Removed all rigid bodies");
    }

    pub fn body_count(&self) -> usize {
        self.objects.len()
    }

    /// Mesh nodes owned by the bodies, in spawn order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.objects.iter().map(|body| body.node)
    }

    pub fn shape(&self, node: NodeId) -> Option<BodyShape> {
        self.find(node).map(|body| body.shape)
    }

    /// Simulated position of the body behind `node`
    pub fn position(&self, node: NodeId) -> Option<[f32; 3]> {
        let body = self.bodies.get(self.find(node)?.handle)?;
        let t = body.translation();
        Some([t.x, t.y, t.z])
    }

    fn find(&self, node: NodeId) -> Option<&Body> {
        self.objects.iter().find(|body| body.node == node)
    }

    /// Advance by `delta` seconds. Returns the number of fixed steps taken.
    pub fn step(&mut self, delta: f32) -> u32 {
        self.accumulator += delta.max(0.0);
        let mut steps = 0;
        while self.accumulator >= FIXED_STEP && steps < MAX_SUBSTEPS {
            self.pipeline.step(
                &self.gravity,
                &self.parameters,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
            self.accumulator -= FIXED_STEP;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(FIXED_STEP);
        }
        steps
    }

    /// Copy body poses into their nodes
    pub fn sync(&self, scene: &mut Scene) {
        for object in &self.objects {
            let (Some(body), Some(node)) = (self.bodies.get(object.handle), scene.get_mut(object.node)) else {
                continue;
            };
            let t = body.translation();
            let (roll, pitch, yaw) = body.rotation().euler_angles();
            node.transform.position = Vector3::new(t.x, t.y, t.z);
            node.transform.rotation = Rotation::new(roll, pitch, yaw);
        }
    }
}

impl Updatable for Physics {
    fn update(&mut self, scene: &mut Scene, time: &FrameTime) {
        if self.step(time.delta) > 0 {
            self.sync(scene);
        }
    }
}

fn drop_point<R: Rng + ?Sized>(rng: &mut R) -> [f32; 3] {
    [
        (rng.gen::<f32>() - 0.5) * SPAWN_SPREAD,
        SPAWN_HEIGHT,
        (rng.gen::<f32>() - 0.5) * SPAWN_SPREAD,
    ]
}

fn body_material() -> StandardMaterial {
    StandardMaterial {
        color: Color::from_rgb8(0xd0, 0xd4, 0xdc),
        roughness: 0.04,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FLOOR: f32 = -0.5;

    fn empty(scene: &mut Scene) -> Physics {
        let config = PhysicsConfig {
            initial_boxes: 0,
            ..PhysicsConfig::default()
        };
        Physics::new(scene, &config, FLOOR)
    }

    fn frame(delta: f32) -> FrameTime {
        FrameTime {
            elapsed: 0.0,
            delta,
            frame: 0,
        }
    }

    #[test]
    fn test_spawn_adds_body_and_mesh_node() {
        let mut scene = Scene::new();
        let mut physics = empty(&mut scene);
        let node = physics.spawn(&mut scene, BodyShape::Sphere { radius: 0.25 }, [0.0, 3.0, 0.0]);

        assert_eq!(physics.body_count(), 1);
        assert_eq!(scene.len(), 1);
        let transform = scene.get(node).unwrap().transform;
        assert_eq!(transform.scale, Vector3::repeat(0.25));
        assert_eq!(transform.position.y, 3.0);
        assert_eq!(physics.position(node), Some([0.0, 3.0, 0.0]));
    }

    #[test]
    fn test_initial_stack() {
        let mut scene = Scene::new();
        let physics = Physics::new(&mut scene, &PhysicsConfig::default(), FLOOR);
        assert_eq!(physics.body_count(), 3);
        let heights: Vec<f32> = physics
            .nodes()
            .map(|node| physics.position(node).unwrap()[1])
            .collect();
        assert!(heights.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(heights[0] > FLOOR);
    }

    #[test]
    fn test_body_falls_and_rests_on_floor() {
        let mut scene = Scene::new();
        let mut physics = empty(&mut scene);
        let radius = 0.25;
        let node = physics.spawn(&mut scene, BodyShape::Sphere { radius }, [0.0, 3.0, 0.0]);

        physics.update(&mut scene, &frame(0.5));
        let falling = physics.position(node).unwrap()[1];
        assert!(falling < 3.0);
        assert_eq!(scene.get(node).unwrap().transform.position.y, falling);

        for _ in 0..600 {
            physics.update(&mut scene, &frame(FIXED_STEP));
        }
        let resting = physics.position(node).unwrap()[1];
        assert!((resting - (FLOOR + radius)).abs() < 0.05, "rests at {}", resting);
        assert_eq!(scene.get(node).unwrap().transform.position.y, resting);
    }

    #[test]
    fn test_substeps_are_capped() {
        let mut scene = Scene::new();
        let mut physics = empty(&mut scene);
        assert_eq!(physics.step(FIXED_STEP * 0.5), 0);
        assert_eq!(physics.step(1.0), MAX_SUBSTEPS);
        // Lag beyond one step is dropped
        assert_eq!(physics.step(0.0), 1);
        assert_eq!(physics.step(0.0), 0);
    }

    #[test]
    fn test_random_spawns_stay_in_bounds() {
        let mut scene = Scene::new();
        let mut physics = empty(&mut scene);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..20 {
            let sphere = physics.spawn_sphere(&mut scene, &mut rng);
            let Some(BodyShape::Sphere { radius }) = physics.shape(sphere) else {
                panic!("expected a sphere");
            };
            assert!((MIN_EXTENT..=0.5).contains(&radius));

            let cube = physics.spawn_box(&mut scene, &mut rng);
            let Some(BodyShape::Box { size }) = physics.shape(cube) else {
                panic!("expected a box");
            };
            assert!(size.iter().all(|s| (MIN_EXTENT..=1.0).contains(s)));
            let [x, y, z] = physics.position(cube).unwrap();
            assert!(x.abs() <= SPAWN_SPREAD / 2.0 && z.abs() <= SPAWN_SPREAD / 2.0);
            assert_eq!(y, SPAWN_HEIGHT);
        }
        assert_eq!(physics.body_count(), 40);
    }

    #[test]
    fn test_reset_removes_bodies_and_nodes() {
        let mut scene = Scene::new();
        let mut physics = Physics::new(&mut scene, &PhysicsConfig::default(), FLOOR);
        let mut rng = StdRng::seed_from_u64(1);
        physics.spawn_box(&mut scene, &mut rng);
        let nodes: Vec<NodeId> = physics.nodes().collect();
        assert_eq!(nodes.len(), 4);

        physics.reset(&mut scene);
        assert_eq!(physics.body_count(), 0);
        assert!(scene.is_empty());
        let mut disposed = scene.drain_disposed();
        disposed.sort();
        assert_eq!(disposed, nodes);

        // The simulation keeps working after a reset
        let node = physics.spawn_sphere(&mut scene, &mut rng);
        physics.update(&mut scene, &frame(FIXED_STEP));
        assert!(physics.position(node).unwrap()[1] < SPAWN_HEIGHT);
    }
}
