/// Triangle meshes for solid scene objects
use nalgebra::{Point3, Vector3};
use std::f32::consts::{PI, TAU};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding order; zero for degenerate faces
    pub fn face_normal(&self) -> Vector3<f32> {
        let [a, b, c] = &self.vertices;
        let n = (b.position - a.position).cross(&(c.position - a.position));
        n.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
    }
}

/// Axis-aligned bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// A triangle soup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Two triangles spanning the quad `a b c d` (counter-clockwise)
    fn add_quad(&mut self, corners: [Point3<f32>; 4], normal: Vector3<f32>) {
        let v = corners.map(|p| Vertex::new(p, normal));
        self.add_triangle(Triangle::new(v[0], v[1], v[2]));
        self.add_triangle(Triangle::new(v[0], v[2], v[3]));
    }

    /// Axis-aligned cube centred on the origin
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let mut mesh = Self::with_capacity(12);
        for axis in 0..3 {
            for sign in [1.0f32, -1.0] {
                let mut normal = Vector3::zeros();
                normal[axis] = sign;
                // Two in-plane directions whose cross product is the normal
                let u = Vector3::from_fn(|r, _| if r == (axis + 1) % 3 { 1.0 } else { 0.0 });
                let w = normal.cross(&u);
                let centre = Point3::from(normal * h);
                let corners = [
                    centre - u * h - w * h,
                    centre + u * h - w * h,
                    centre + u * h + w * h,
                    centre - u * h + w * h,
                ];
                mesh.add_quad(corners, normal);
            }
        }
        mesh
    }

    /// UV sphere centred on the origin; `rings` bands from pole to pole
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let vertex = |ring: u32, segment: u32| {
            let polar = PI * ring as f32 / rings as f32;
            let azimuth = TAU * segment as f32 / segments as f32;
            let normal = Vector3::new(
                polar.sin() * azimuth.cos(),
                polar.cos(),
                polar.sin() * azimuth.sin(),
            );
            Vertex::new(Point3::from(normal * radius), normal)
        };

        let mut mesh = Self::with_capacity((segments * rings * 2) as usize);
        for ring in 0..rings {
            for segment in 0..segments {
                let top = vertex(ring, segment);
                let bottom = vertex(ring + 1, segment);
                let bottom_next = vertex(ring + 1, segment + 1);
                let top_next = vertex(ring, segment + 1);
                // The pole rows collapse one triangle of each quad
                if ring + 1 < rings {
                    mesh.add_triangle(Triangle::new(top, bottom_next, bottom));
                }
                if ring > 0 {
                    mesh.add_triangle(Triangle::new(top, top_next, bottom_next));
                }
            }
        }
        mesh
    }

    /// Horizontal plane at y = 0 facing up
    pub fn plane(width: f32, depth: f32) -> Self {
        let (hw, hd) = (width / 2.0, depth / 2.0);
        let mut mesh = Self::with_capacity(2);
        mesh.add_quad(
            [
                Point3::new(-hw, 0.0, hd),
                Point3::new(hw, 0.0, hd),
                Point3::new(hw, 0.0, -hd),
                Point3::new(-hw, 0.0, -hd),
            ],
            Vector3::y(),
        );
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position));
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        });
        Some(Bounds { min, max })
    }

    /// Translate the mesh so its bounding box is centred on the origin
    pub fn center(&mut self) {
        if let Some(bounds) = self.bounds() {
            let shift = bounds.center().coords;
            for vertex in self.triangles.iter_mut().flat_map(|t| t.vertices.iter_mut()) {
                vertex.position -= shift;
            }
        }
    }

    /// Uniformly scale so the largest extent equals `size`
    pub fn fit_to(&mut self, size: f32) {
        let Some(bounds) = self.bounds() else { return };
        let extent = bounds.size().max();
        if extent <= f32::EPSILON {
            return;
        }
        let factor = size / extent;
        for vertex in self.triangles.iter_mut().flat_map(|t| t.vertices.iter_mut()) {
            vertex.position = Point3::from(vertex.position.coords * factor);
        }
    }

    /// Interleaved `[px, py, pz, nx, ny, nz]` per vertex for GPU upload
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertex_count() * 6);
        for vertex in self.triangles.iter().flat_map(|t| t.vertices.iter()) {
            out.extend_from_slice(vertex.position.coords.as_slice());
            out.extend_from_slice(vertex.normal.as_slice());
        }
        out
    }
}
