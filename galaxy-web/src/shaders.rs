/// GLSL ES 3.0 programs for the WebGL2 renderer
///
/// Attribute locations are fixed in the source so buffers can be bound
/// without looking them up.

pub const POSITION_LOCATION: u32 = 0;
pub const COLOR_LOCATION: u32 = 1;
pub const SCALE_LOCATION: u32 = 2;
pub const RANDOMNESS_LOCATION: u32 = 3;
pub const NORMAL_LOCATION: u32 = 1;

/// Galaxy particles: spin around Y, faster near the centre, then jitter.
/// Point size shrinks with view depth.
pub const GALAXY_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec3 aPosition;
layout(location = 1) in vec3 aColor;
layout(location = 2) in float aScale;
layout(location = 3) in vec3 aRandomness;

uniform mat4 uModelView;
uniform mat4 uProjection;
uniform float uSize;
uniform float uTime;
uniform float uSpinSpeed;

out vec3 vColor;

void main() {
    vec3 position = aPosition;
    float distanceToCenter = length(position.xz);
    if (distanceToCenter > 1e-6) {
        float angle = atan(position.z, position.x) + uTime * uSpinSpeed / distanceToCenter;
        position.x = cos(angle) * distanceToCenter;
        position.z = sin(angle) * distanceToCenter;
    }
    position += aRandomness;

    vec4 viewPosition = uModelView * vec4(position, 1.0);
    gl_Position = uProjection * viewPosition;
    gl_PointSize = uSize * aScale * (1.0 / -viewPosition.z);

    vColor = aColor;
}
"#;

/// Soft disc with a steep falloff; black edges vanish under additive blending
pub const GALAXY_FRAGMENT: &str = r#"#version 300 es
precision highp float;

in vec3 vColor;
out vec4 fragColor;

void main() {
    float strength = distance(gl_PointCoord, vec2(0.5));
    strength = pow(1.0 - strength, 10.0);
    fragColor = vec4(mix(vec3(0.0), vColor, strength), 1.0);
}
"#;

pub const MESH_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec3 aPosition;
layout(location = 1) in vec3 aNormal;

uniform mat4 uModel;
uniform mat4 uViewProjection;

out vec3 vNormal;

void main() {
    vNormal = mat3(uModel) * aNormal;
    gl_Position = uViewProjection * uModel * vec4(aPosition, 1.0);
}
"#;

/// Lambert shading from one directional light plus ambient
pub const MESH_FRAGMENT: &str = r#"#version 300 es
precision highp float;

in vec3 vNormal;

uniform vec3 uColor;
uniform vec3 uAmbient;
uniform vec3 uSunDirection;
uniform vec3 uSunColor;

out vec4 fragColor;

void main() {
    float lambert = max(dot(normalize(vNormal), uSunDirection), 0.0);
    vec3 light = uAmbient + uSunColor * lambert;
    fragColor = vec4(uColor * light, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_galaxy_shader_declares_its_inputs() {
        for name in ["aScale", "aRandomness", "uSize", "uTime", "uSpinSpeed"] {
            assert!(GALAXY_VERTEX.contains(name), "missing {}", name);
        }
        assert!(GALAXY_VERTEX.contains(&format!("location = {}) in float aScale", SCALE_LOCATION)));
        assert!(GALAXY_VERTEX.contains(&format!(
            "location = {}) in vec3 aRandomness",
            RANDOMNESS_LOCATION
        )));
    }

    #[test]
    fn test_programs_start_with_version() {
        for source in [GALAXY_VERTEX, GALAXY_FRAGMENT, MESH_VERTEX, MESH_FRAGMENT] {
            assert!(source.starts_with("#version 300 es"));
        }
    }
}
