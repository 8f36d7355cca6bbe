//! Retained scene graph
//!
//! Nodes live in a map keyed by `NodeId` and may have a parent. Removing a
//! node detaches its whole subtree; the removed ids are queued so renderers
//! can release the GPU buffers they created for them.

use nalgebra::Matrix4;
use std::collections::BTreeMap;

use crate::color::Color;
use crate::galaxy::ParticleBuffer;
use crate::geometry::Mesh;
use crate::transform::Transform;

/// Stable handle to a node; never reused within a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

/// Uniforms and blend state of the galaxy point material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsMaterial {
    /// Base point size in device pixels at unit depth
    pub size: f32,
    /// Seconds since start, fed by the update loop
    pub time: f32,
    pub spin_speed: f32,
    pub additive: bool,
    pub depth_write: bool,
}

impl Default for PointsMaterial {
    fn default() -> Self {
        Self {
            size: 10.0,
            time: 0.0,
            spin_speed: 0.0,
            additive: true,
            depth_write: false,
        }
    }
}

/// A point cloud node: one buffer, one material
#[derive(Debug, Clone, PartialEq)]
pub struct Points {
    pub buffer: ParticleBuffer,
    pub material: PointsMaterial,
}

/// Lit surface parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMaterial {
    pub color: Color,
    pub roughness: f32,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            roughness: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub mesh: Mesh,
    pub material: StandardMaterial,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient { color: Color, intensity: f32 },
    /// Shines from the node position towards the origin
    Directional { color: Color, intensity: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Points(Points),
    Mesh(MeshNode),
    Light(Light),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            visible: true,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_points(&self) -> Option<&Points> {
        match &self.kind {
            NodeKind::Points(points) => Some(points),
            _ => None,
        }
    }

    pub fn as_points_mut(&mut self) -> Option<&mut Points> {
        match &mut self.kind {
            NodeKind::Points(points) => Some(points),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
    disposed: Vec<NodeId>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            background: Color::new(0.0, 0.0, 0.0),
            nodes: BTreeMap::new(),
            next_id: 0,
            disposed: Vec::new(),
        }
    }

    fn insert(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        node.parent = parent;
        node.children.clear();
        self.nodes.insert(id, node);
        id
    }

    /// Attach a node at the root
    pub fn add(&mut self, node: Node) -> NodeId {
        self.insert(node, None)
    }

    /// Attach a node under `parent`; `None` when the parent is not in the scene
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = self.insert(node, Some(parent));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Some(id)
    }

    /// Detach `id` and its descendants, returning them in depth-first order.
    /// The ids are queued for `drain_disposed`.
    pub fn remove(&mut self, id: NodeId) -> Vec<Node> {
        let Some(parent) = self.nodes.get(&id).map(|n| n.parent) else {
            return Vec::new();
        };
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children.iter().rev().copied());
                self.disposed.push(current);
                removed.push(node);
            }
        }
        removed
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of attached point-cloud nodes
    pub fn points_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Points(_)))
            .count()
    }

    /// Visit every node depth-first, roots in insertion order
    pub fn traverse<F: FnMut(NodeId, &Node)>(&self, mut visit: F) {
        let mut stack: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(id, _)| *id)
            .rev()
            .collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                visit(id, node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    /// Visible nodes whose whole ancestor chain is visible, with world matrices
    pub fn visible_nodes(&self) -> Vec<(NodeId, Matrix4<f32>)> {
        let mut out = Vec::new();
        self.traverse(|id, _| {
            if self.is_visible(id) {
                if let Some(matrix) = self.world_matrix(id) {
                    out.push((id, matrix));
                }
            }
        });
        out
    }

    fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.nodes.get(&c)) {
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Product of the local transforms from the root down to `id`
    pub fn world_matrix(&self, id: NodeId) -> Option<Matrix4<f32>> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(&p)) {
            matrix = parent.transform.matrix() * matrix;
            node = parent;
        }
        Some(matrix)
    }

    pub fn lights(&self) -> impl Iterator<Item = (NodeId, &Node, &Light)> {
        self.nodes.iter().filter_map(|(id, node)| match &node.kind {
            NodeKind::Light(light) if node.visible => Some((*id, node, light)),
            _ => None,
        })
    }

    /// Ids removed since the last call, for releasing GPU-side resources
    pub fn drain_disposed(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.disposed)
    }
}
