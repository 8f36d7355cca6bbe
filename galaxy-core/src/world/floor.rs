use crate::color::Color;
use crate::geometry::Mesh;
use crate::scene::{MeshNode, Node, NodeId, NodeKind, Scene, StandardMaterial};
use crate::transform::Transform;

/// Side length of the floor plane
const FLOOR_SIZE: f32 = 4.0;

/// Ground plane under the model and the rigid bodies
#[derive(Debug)]
pub struct Floor {
    node: NodeId,
}

impl Floor {
    /// Place the floor with its top surface at `height`
    pub fn new(scene: &mut Scene, height: f32) -> Self {
        let node = scene.add(
            Node::new(
                "floor",
                NodeKind::Mesh(MeshNode {
                    mesh: Mesh::plane(FLOOR_SIZE, FLOOR_SIZE),
                    material: StandardMaterial {
                        color: Color::from_rgb8(0x3a, 0x2c, 0x22),
                        roughness: 0.9,
                    },
                }),
            )
            .with_transform(Transform::from_position(0.0, height, 0.0)),
        );
        Self { node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}
