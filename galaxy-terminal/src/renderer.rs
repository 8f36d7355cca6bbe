/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use galaxy_core::scene::{Light, MeshNode, NodeKind, Points};
use galaxy_core::{Camera, Scene, ScreenPoint, Triangle};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light contributed by one particle to its cell
const POINT_WEIGHT: f32 = 0.35;

/// A terminal cell is roughly twice as tall as it is wide
pub const CELL_ASPECT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    color: [f32; 3],
    depth: f32,
}

impl Cell {
    const EMPTY: Cell = Cell {
        glyph: ' ',
        color: [0.0; 3],
        depth: f32::INFINITY,
    };
}

/// Light reaching a surface, gathered from the scene once per frame
#[derive(Debug, Clone, Default)]
struct Lighting {
    ambient: [f32; 3],
    directional: Vec<(Vector3<f32>, [f32; 3])>,
}

impl Lighting {
    fn from_scene(scene: &Scene) -> Self {
        let mut lighting = Lighting::default();
        for (id, _, light) in scene.lights() {
            match *light {
                Light::Ambient { color, intensity } => {
                    let c = color.scale(intensity).to_array();
                    for (a, c) in lighting.ambient.iter_mut().zip(c) {
                        *a += c;
                    }
                }
                Light::Directional { color, intensity } => {
                    // Directional lights shine from their position towards the origin
                    let Some(world) = scene.world_matrix(id) else {
                        continue;
                    };
                    let position = world.transform_point(&Point3::origin()).coords;
                    if let Some(direction) = position.try_normalize(1e-6) {
                        lighting
                            .directional
                            .push((direction, color.scale(intensity).to_array()));
                    }
                }
            }
        }
        lighting
    }

    fn shade(&self, normal: &Vector3<f32>) -> [f32; 3] {
        let mut total = self.ambient;
        for (direction, color) in &self.directional {
            let lambert = normal.dot(direction).max(0.0);
            for (t, c) in total.iter_mut().zip(color) {
                *t += c * lambert;
            }
        }
        total
    }
}

/// ASCII renderer that converts a scene to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::EMPTY; width * height];
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Draw every visible node: opaque meshes first, then additive points
    pub fn render_scene(&mut self, scene: &Scene, camera: &Camera) {
        let view_projection = camera.view_projection();
        let lighting = Lighting::from_scene(scene);
        let visible = scene.visible_nodes();

        for (id, world) in &visible {
            if let Some(NodeKind::Mesh(mesh)) = scene.get(*id).map(|n| &n.kind) {
                self.render_mesh(mesh, world, &view_projection, camera, &lighting);
            }
        }
        for (id, world) in &visible {
            if let Some(points) = scene.get(*id).and_then(|n| n.as_points()) {
                self.render_points(points, &(view_projection * world), camera);
            }
        }
    }

    fn project(&self, camera: &Camera, point: &Point3<f32>, mvp: &Matrix4<f32>) -> Option<ScreenPoint> {
        camera.project_to_screen(point, mvp, self.width as u32, self.height as u32)
    }

    fn render_points(&mut self, points: &Points, mvp: &Matrix4<f32>, camera: &Camera) {
        let material = points.material;
        for i in 0..points.buffer.len() {
            let [x, y, z] = points
                .buffer
                .animated_position(i, material.time, material.spin_speed);
            let Some(p) = self.project(camera, &Point3::new(x, y, z), mvp) else {
                continue;
            };
            let Some(idx) = self.index(p.x, p.y) else {
                continue;
            };
            let cell = &mut self.cells[idx];
            // Depth tested against meshes but never written
            if p.depth > cell.depth {
                continue;
            }
            for (c, p) in cell.color.iter_mut().zip(points.buffer.color(i)) {
                *c += p * POINT_WEIGHT;
            }
            let luminance = cell.color.iter().cloned().fold(0.0, f32::max);
            cell.glyph = ramp(luminance);
        }
    }

    fn render_mesh(
        &mut self,
        node: &MeshNode,
        world: &Matrix4<f32>,
        view_projection: &Matrix4<f32>,
        camera: &Camera,
        lighting: &Lighting,
    ) {
        let mvp = view_projection * world;
        let base = node.material.color.to_array();
        for triangle in &node.mesh.triangles {
            let normal = world
                .transform_vector(&triangle.face_normal())
                .try_normalize(1e-6)
                .unwrap_or_else(Vector3::zeros);
            let light = lighting.shade(&normal);
            let color = [base[0] * light[0], base[1] * light[1], base[2] * light[2]];
            self.render_triangle(triangle, &mvp, camera, color);
        }
    }

    fn render_triangle(&mut self, triangle: &Triangle, mvp: &Matrix4<f32>, camera: &Camera, color: [f32; 3]) {
        // Project vertices to screen space
        let mut screen = [ScreenPoint {
            x: 0.0,
            y: 0.0,
            depth: 0.0,
        }; 3];
        for (slot, vertex) in screen.iter_mut().zip(&triangle.vertices) {
            match self.project(camera, &vertex.position, mvp) {
                Some(p) => *slot = p,
                None => return, // Triangle is clipped
            }
        }

        let luminance = color.iter().cloned().fold(0.0, f32::max);
        let cell = Cell {
            glyph: ramp(luminance),
            color,
            depth: 0.0,
        };
        self.rasterize_triangle(&screen, cell);
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenPoint; 3], cell: Cell) {
        let [v0, v1, v2] = coords;

        // Bounding box, clipped to screen bounds
        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i32;
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i32).min(self.width as i32 - 1);
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i32;
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i32).min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates, either winding
                let Some((w0, w1, w2)) = barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py))
                else {
                    continue;
                };
                let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
                if !inside {
                    continue;
                }

                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let idx = y as usize * self.width + x as usize;
                if depth < self.cells[idx].depth {
                    self.cells[idx] = Cell { depth, ..cell };
                }
            }
        }
    }

    fn index(&self, x: f32, y: f32) -> Option<usize> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Glyph at a cell, for inspection
    pub fn glyph(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x].glyph)
    }

    /// Number of cells holding something other than blank space
    pub fn lit_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.glyph != ' ').count()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            writer.queue(MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let cell = &self.cells[y * self.width + x];
                let color = to_terminal_color(cell.color);
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(cell.glyph))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Map a luminance in `[0, 1]` onto the glyph ramp
fn ramp(luminance: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = (luminance.clamp(0.0, 1.0) * last as f32).ceil() as usize;
    LUMINOSITY_RAMP[index.min(last)]
}

fn to_terminal_color(color: [f32; 3]) -> Color {
    let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: q(color[0]),
        g: q(color[1]),
        b: q(color[2]),
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_core::galaxy::ParticleBuffer;
    use galaxy_core::scene::{Node, PointsMaterial, StandardMaterial};
    use galaxy_core::transform::Transform;
    use galaxy_core::{Color as Rgb, Mesh};

    fn camera(width: usize, height: usize) -> Camera {
        let mut camera = Camera::new(width as u32, height as u32 * CELL_ASPECT);
        camera.position = Point3::new(0.0, 0.0, 5.0);
        camera
    }

    fn single_point(color: [f32; 3]) -> Points {
        let mut buffer = ParticleBuffer::with_count(1);
        buffer.colors.copy_from_slice(&color);
        Points {
            buffer,
            material: PointsMaterial::default(),
        }
    }

    #[test]
    fn test_ramp_ends() {
        assert_eq!(ramp(0.0), ' ');
        assert_eq!(ramp(1.0), '@');
        assert_eq!(ramp(7.0), '@');
        assert_ne!(ramp(0.01), ' ');
    }

    #[test]
    fn test_points_accumulate_additively() {
        let mut scene = Scene::new();
        for _ in 0..3 {
            scene.add(Node::new("p", NodeKind::Points(single_point([1.0, 0.5, 0.0]))));
        }
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_scene(&scene, &camera(40, 20));

        assert_eq!(renderer.lit_cells(), 1);
        let cell = renderer.cells.iter().find(|c| c.glyph != ' ').unwrap();
        assert!((cell.color[0] - 3.0 * POINT_WEIGHT).abs() < 1e-5);
        assert!((cell.color[1] - 1.5 * POINT_WEIGHT).abs() < 1e-5);
        assert_eq!(cell.depth, f32::INFINITY);
    }

    #[test]
    fn test_mesh_hides_points_behind_it() {
        let mut scene = Scene::new();
        scene.add(
            Node::new("behind", NodeKind::Points(single_point([1.0, 1.0, 1.0])))
                .with_transform(Transform::from_position(0.0, 0.0, -2.0)),
        );
        scene.add(Node::new(
            "wall",
            NodeKind::Mesh(MeshNode {
                mesh: Mesh::cube(1.0),
                material: StandardMaterial::default(),
            }),
        ));
        scene.add(Node::new(
            "ambient",
            NodeKind::Light(Light::Ambient {
                color: Rgb::WHITE,
                intensity: 1.0,
            }),
        ));

        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render_scene(&scene, &camera(40, 20));
        let center = renderer.index(20.0, 10.0).unwrap();
        let cell = renderer.cells[center];
        assert!(cell.depth.is_finite());
        assert_eq!(cell.color, StandardMaterial::default().color.to_array());
    }

    #[test]
    fn test_resize_and_clear() {
        let mut renderer = AsciiRenderer::new(4, 2);
        renderer.cells[0].glyph = '@';
        renderer.clear();
        assert_eq!(renderer.lit_cells(), 0);
        renderer.resize(10, 5);
        assert_eq!((renderer.width(), renderer.height()), (10, 5));
        assert_eq!(renderer.glyph(9, 4), Some(' '));
        assert_eq!(renderer.glyph(10, 4), None);
    }

    #[test]
    fn test_draw_emits_rows() {
        let renderer = AsciiRenderer::new(3, 2);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert_eq!(text.matches(' ').count(), 6);
    }
}
