//! WebGL2 scene renderer

use std::collections::HashMap;

use galaxy_core::scene::{Light, MeshNode, NodeKind, Points};
use galaxy_core::{Camera, NodeId, Scene, Sizes};
use nalgebra::{Matrix4, Point3, Vector3};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::shaders;

const FLOAT_BYTES: i32 = 4;

struct GalaxyProgram {
    program: WebGlProgram,
    model_view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    size: Option<WebGlUniformLocation>,
    time: Option<WebGlUniformLocation>,
    spin_speed: Option<WebGlUniformLocation>,
}

struct MeshProgram {
    program: WebGlProgram,
    model: Option<WebGlUniformLocation>,
    view_projection: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
    sun_direction: Option<WebGlUniformLocation>,
    sun_color: Option<WebGlUniformLocation>,
}

/// GPU copy of one scene node
struct GpuNode {
    vao: WebGlVertexArrayObject,
    buffers: Vec<WebGlBuffer>,
    count: i32,
}

/// Scene lighting reduced to what the mesh program takes
struct Lighting {
    ambient: [f32; 3],
    sun_direction: [f32; 3],
    sun_color: [f32; 3],
}

pub struct GlRenderer {
    gl: GL,
    galaxy: GalaxyProgram,
    mesh: MeshProgram,
    nodes: HashMap<NodeId, GpuNode>,
}

impl GlRenderer {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let gl: GL = canvas
            .get_context("webgl2")?
            .ok_or("WebGL2 not supported")?
            .dyn_into()?;

        let program = link_program(&gl, shaders::GALAXY_VERTEX, shaders::GALAXY_FRAGMENT)?;
        let galaxy = GalaxyProgram {
            model_view: gl.get_uniform_location(&program, "uModelView"),
            projection: gl.get_uniform_location(&program, "uProjection"),
            size: gl.get_uniform_location(&program, "uSize"),
            time: gl.get_uniform_location(&program, "uTime"),
            spin_speed: gl.get_uniform_location(&program, "uSpinSpeed"),
            program,
        };

        let program = link_program(&gl, shaders::MESH_VERTEX, shaders::MESH_FRAGMENT)?;
        let mesh = MeshProgram {
            model: gl.get_uniform_location(&program, "uModel"),
            view_projection: gl.get_uniform_location(&program, "uViewProjection"),
            color: gl.get_uniform_location(&program, "uColor"),
            ambient: gl.get_uniform_location(&program, "uAmbient"),
            sun_direction: gl.get_uniform_location(&program, "uSunDirection"),
            sun_color: gl.get_uniform_location(&program, "uSunColor"),
            program,
        };

        Ok(Self {
            gl,
            galaxy,
            mesh,
            nodes: HashMap::new(),
        })
    }

    /// Number of nodes with live GPU buffers
    pub fn uploaded(&self) -> usize {
        self.nodes.len()
    }

    pub fn render(&mut self, scene: &mut Scene, camera: &Camera, sizes: &Sizes) -> Result<(), JsValue> {
        // Ids are never reused, so releasing what the scene disposed is enough
        for id in scene.drain_disposed() {
            self.release(id);
        }

        let gl = &self.gl;
        let (width, height) = sizes.drawing_buffer();
        gl.viewport(0, 0, width as i32, height as i32);
        let [r, g, b] = scene.background.to_array();
        gl.clear_color(r, g, b, 1.0);
        gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);

        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let view_projection = projection * view;
        let lighting = lighting(scene);
        let visible = scene.visible_nodes();

        // Opaque meshes first
        gl.enable(GL::DEPTH_TEST);
        gl.depth_mask(true);
        gl.disable(GL::BLEND);
        for (id, world) in &visible {
            if let Some(NodeKind::Mesh(mesh)) = scene.get(*id).map(|n| &n.kind) {
                self.draw_mesh(*id, mesh, world, &view_projection, &lighting)?;
            }
        }

        // Additive particles, depth tested but never written
        self.gl.enable(GL::BLEND);
        self.gl.blend_func(GL::ONE, GL::ONE);
        self.gl.depth_mask(false);
        for (id, world) in &visible {
            if let Some(points) = scene.get(*id).and_then(|n| n.as_points()) {
                self.draw_points(*id, points, &(view * world), &projection)?;
            }
        }
        self.gl.depth_mask(true);
        Ok(())
    }

    fn draw_points(
        &mut self,
        id: NodeId,
        points: &Points,
        model_view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Result<(), JsValue> {
        if !self.nodes.contains_key(&id) {
            let node = self.upload_points(points)?;
            self.nodes.insert(id, node);
        }
        let Some(node) = self.nodes.get(&id) else {
            return Ok(());
        };

        let gl = &self.gl;
        let program = &self.galaxy;
        let material = points.material;
        gl.use_program(Some(&program.program));
        gl.uniform_matrix4fv_with_f32_array(program.model_view.as_ref(), false, model_view.as_slice());
        gl.uniform_matrix4fv_with_f32_array(program.projection.as_ref(), false, projection.as_slice());
        gl.uniform1f(program.size.as_ref(), material.size);
        gl.uniform1f(program.time.as_ref(), material.time);
        gl.uniform1f(program.spin_speed.as_ref(), material.spin_speed);

        gl.bind_vertex_array(Some(&node.vao));
        gl.draw_arrays(GL::POINTS, 0, node.count);
        gl.bind_vertex_array(None);
        Ok(())
    }

    fn draw_mesh(
        &mut self,
        id: NodeId,
        mesh: &MeshNode,
        world: &Matrix4<f32>,
        view_projection: &Matrix4<f32>,
        lighting: &Lighting,
    ) -> Result<(), JsValue> {
        if !self.nodes.contains_key(&id) {
            let node = self.upload_mesh(mesh)?;
            self.nodes.insert(id, node);
        }
        let Some(node) = self.nodes.get(&id) else {
            return Ok(());
        };

        let gl = &self.gl;
        let program = &self.mesh;
        gl.use_program(Some(&program.program));
        gl.uniform_matrix4fv_with_f32_array(program.model.as_ref(), false, world.as_slice());
        gl.uniform_matrix4fv_with_f32_array(program.view_projection.as_ref(), false, view_projection.as_slice());
        gl.uniform3fv_with_f32_array(program.color.as_ref(), &mesh.material.color.to_array());
        gl.uniform3fv_with_f32_array(program.ambient.as_ref(), &lighting.ambient);
        gl.uniform3fv_with_f32_array(program.sun_direction.as_ref(), &lighting.sun_direction);
        gl.uniform3fv_with_f32_array(program.sun_color.as_ref(), &lighting.sun_color);

        gl.bind_vertex_array(Some(&node.vao));
        gl.draw_arrays(GL::TRIANGLES, 0, node.count);
        gl.bind_vertex_array(None);
        Ok(())
    }

    fn upload_points(&self, points: &Points) -> Result<GpuNode, JsValue> {
        let gl = &self.gl;
        let vao = gl.create_vertex_array().ok_or("failed to create vertex array")?;
        gl.bind_vertex_array(Some(&vao));

        let buffer = &points.buffer;
        let buffers = vec![
            self.attribute(shaders::POSITION_LOCATION, 3, &buffer.positions)?,
            self.attribute(shaders::COLOR_LOCATION, 3, &buffer.colors)?,
            self.attribute(shaders::SCALE_LOCATION, 1, &buffer.scales)?,
            self.attribute(shaders::RANDOMNESS_LOCATION, 3, &buffer.randomness)?,
        ];
        gl.bind_vertex_array(None);

        web_sys::console::log_1(&format!("Uploaded {} particles", buffer.len()).into());
        Ok(GpuNode {
            vao,
            buffers,
            count: buffer.len() as i32,
        })
    }

    fn upload_mesh(&self, mesh: &MeshNode) -> Result<GpuNode, JsValue> {
        let gl = &self.gl;
        let vao = gl.create_vertex_array().ok_or("failed to create vertex array")?;
        gl.bind_vertex_array(Some(&vao));

        let buffer = self.upload(&mesh.mesh.interleaved())?;
        let stride = 6 * FLOAT_BYTES;
        gl.enable_vertex_attrib_array(shaders::POSITION_LOCATION);
        gl.vertex_attrib_pointer_with_i32(shaders::POSITION_LOCATION, 3, GL::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(shaders::NORMAL_LOCATION);
        gl.vertex_attrib_pointer_with_i32(shaders::NORMAL_LOCATION, 3, GL::FLOAT, false, stride, 3 * FLOAT_BYTES);
        gl.bind_vertex_array(None);

        Ok(GpuNode {
            vao,
            buffers: vec![buffer],
            count: mesh.mesh.vertex_count() as i32,
        })
    }

    fn upload(&self, data: &[f32]) -> Result<WebGlBuffer, JsValue> {
        let gl = &self.gl;
        let buffer = gl.create_buffer().ok_or("failed to create buffer")?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        let array = js_sys::Float32Array::from(data);
        gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &array, GL::STATIC_DRAW);
        Ok(buffer)
    }

    /// Upload `data` and bind it to `location` in the current vertex array
    fn attribute(&self, location: u32, size: i32, data: &[f32]) -> Result<WebGlBuffer, JsValue> {
        let buffer = self.upload(data)?;
        self.gl.enable_vertex_attrib_array(location);
        self.gl
            .vertex_attrib_pointer_with_i32(location, size, GL::FLOAT, false, 0, 0);
        Ok(buffer)
    }

    fn release(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for buffer in &node.buffers {
                self.gl.delete_buffer(Some(buffer));
            }
            self.gl.delete_vertex_array(Some(&node.vao));
        }
    }
}

fn lighting(scene: &Scene) -> Lighting {
    let mut lighting = Lighting {
        ambient: [0.0; 3],
        sun_direction: [0.0, 1.0, 0.0],
        sun_color: [0.0; 3],
    };
    for (id, _, light) in scene.lights() {
        match *light {
            Light::Ambient { color, intensity } => {
                let c = color.scale(intensity).to_array();
                for (a, c) in lighting.ambient.iter_mut().zip(c) {
                    *a += c;
                }
            }
            Light::Directional { color, intensity } => {
                let position = scene
                    .world_matrix(id)
                    .map(|m| m.transform_point(&Point3::origin()).coords)
                    .unwrap_or_else(Vector3::y);
                if let Some(direction) = position.try_normalize(1e-6) {
                    lighting.sun_direction = [direction.x, direction.y, direction.z];
                    lighting.sun_color = color.scale(intensity).to_array();
                }
            }
        }
    }
    lighting
}

fn compile_shader(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl.create_shader(kind).ok_or("failed to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(JsValue::from_str(&format!("shader compile failed: {}", log)))
    }
}

fn link_program(gl: &GL, vertex: &str, fragment: &str) -> Result<WebGlProgram, JsValue> {
    let vertex = compile_shader(gl, GL::VERTEX_SHADER, vertex)?;
    let fragment = compile_shader(gl, GL::FRAGMENT_SHADER, fragment)?;
    let program = gl.create_program().ok_or("failed to create program")?;
    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    gl.link_program(&program);
    gl.delete_shader(Some(&vertex));
    gl.delete_shader(Some(&fragment));

    let linked = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if linked {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        Err(JsValue::from_str(&format!("program link failed: {}", log)))
    }
}
