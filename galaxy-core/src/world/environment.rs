use crate::color::Color;
use crate::debug::{ControlValue, EnvironmentParam, ParamKey, Tunable};
use crate::scene::{Light, Node, NodeId, NodeKind, Scene};
use crate::transform::Transform;

/// Lighting parameters exposed in the debug panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSettings {
    pub sun_color: Color,
    pub sun_intensity: f32,
    pub sun_position: [f32; 3],
    pub ambient_intensity: f32,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            sun_color: Color::WHITE,
            sun_intensity: 4.0,
            sun_position: [5.0, 3.0, -1.25],
            ambient_intensity: 0.4,
        }
    }
}

impl Tunable for EnvironmentSettings {
    fn get(&self, key: ParamKey) -> Option<ControlValue> {
        let ParamKey::Environment(param) = key else {
            return None;
        };
        let value = match param {
            EnvironmentParam::SunIntensity => self.sun_intensity,
            EnvironmentParam::SunX => self.sun_position[0],
            EnvironmentParam::SunY => self.sun_position[1],
            EnvironmentParam::SunZ => self.sun_position[2],
            EnvironmentParam::AmbientIntensity => self.ambient_intensity,
        };
        Some(ControlValue::Number(value))
    }

    fn set(&mut self, key: ParamKey, value: ControlValue) -> bool {
        let (ParamKey::Environment(param), ControlValue::Number(n)) = (key, value) else {
            return false;
        };
        let slot = match param {
            EnvironmentParam::SunIntensity => &mut self.sun_intensity,
            EnvironmentParam::SunX => &mut self.sun_position[0],
            EnvironmentParam::SunY => &mut self.sun_position[1],
            EnvironmentParam::SunZ => &mut self.sun_position[2],
            EnvironmentParam::AmbientIntensity => &mut self.ambient_intensity,
        };
        *slot = n;
        true
    }
}

/// Sun and ambient light nodes
#[derive(Debug)]
pub struct Environment {
    sun: NodeId,
    ambient: NodeId,
}

impl Environment {
    pub fn new(scene: &mut Scene, settings: &EnvironmentSettings) -> Self {
        let sun = scene.add(Node::new(
            "sun",
            NodeKind::Light(Light::Directional {
                color: settings.sun_color,
                intensity: settings.sun_intensity,
            }),
        ));
        let ambient = scene.add(Node::new(
            "ambient",
            NodeKind::Light(Light::Ambient {
                color: Color::WHITE,
                intensity: settings.ambient_intensity,
            }),
        ));
        let environment = Self { sun, ambient };
        environment.apply(scene, settings);
        environment
    }

    /// Sun and ambient light nodes
    pub fn nodes(&self) -> [NodeId; 2] {
        [self.sun, self.ambient]
    }

    /// Write `settings` into the light nodes
    pub fn apply(&self, scene: &mut Scene, settings: &EnvironmentSettings) {
        if let Some(node) = scene.get_mut(self.sun) {
            let [x, y, z] = settings.sun_position;
            node.transform = Transform::from_position(x, y, z);
            node.kind = NodeKind::Light(Light::Directional {
                color: settings.sun_color,
                intensity: settings.sun_intensity,
            });
        }
        if let Some(node) = scene.get_mut(self.ambient) {
            node.kind = NodeKind::Light(Light::Ambient {
                color: Color::WHITE,
                intensity: settings.ambient_intensity,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip_through_scene() {
        let mut scene = Scene::new();
        let mut settings = EnvironmentSettings::default();
        let environment = Environment::new(&mut scene, &settings);
        assert_eq!(scene.lights().count(), 2);

        let sun_x = ParamKey::Environment(EnvironmentParam::SunX);
        assert!(settings.set(sun_x, ControlValue::Number(-2.0)));
        assert!(settings.set(
            ParamKey::Environment(EnvironmentParam::SunIntensity),
            ControlValue::Number(7.5)
        ));
        environment.apply(&mut scene, &settings);

        let (_, node, light) = scene
            .lights()
            .find(|(_, _, l)| matches!(l, Light::Directional { .. }))
            .unwrap();
        assert_eq!(node.transform.position.x, -2.0);
        assert!(matches!(light, Light::Directional { intensity, .. } if *intensity == 7.5));
        assert_eq!(settings.get(sun_x), Some(ControlValue::Number(-2.0)));
    }
}
