use crate::color::Color;
use crate::geometry::Mesh;
use crate::scene::{MeshNode, Node, NodeId, NodeKind, Scene, StandardMaterial};
use crate::time::FrameTime;
use crate::transform::Rotation;

use super::Updatable;

/// Radians per second around X and Y
const SPIN_RATE: f32 = 0.15;
/// Largest extent after fitting
const MODEL_SIZE: f32 = 1.0;

/// A loaded mesh slowly tumbling at the centre of the galaxy
#[derive(Debug)]
pub struct Model {
    node: NodeId,
}

impl Model {
    pub fn new(scene: &mut Scene, mesh: &Mesh) -> Self {
        let mut mesh = mesh.clone();
        mesh.center();
        mesh.fit_to(MODEL_SIZE);
        let node = scene.add(Node::new(
            "model",
            NodeKind::Mesh(MeshNode {
                mesh,
                material: StandardMaterial {
                    color: Color::from_rgb8(0xb0, 0xb8, 0xc8),
                    roughness: 0.5,
                },
            }),
        ));
        Self { node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Updatable for Model {
    fn update(&mut self, scene: &mut Scene, time: &FrameTime) {
        if let Some(node) = scene.get_mut(self.node) {
            let angle = SPIN_RATE * time.elapsed;
            node.transform.rotation = Rotation::new(angle, angle, 0.0);
        }
    }
}
