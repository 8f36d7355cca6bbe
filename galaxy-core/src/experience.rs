//! The Experience ties the scene, camera, debug panel and world together.
//!
//! Everything it needs is handed in at construction; front ends own the
//! platform pieces (time source, input, drawing surface) and call into it.

use rand::rngs::StdRng;

use crate::camera::Camera;
use crate::config::{AppConfig, GalaxyConfig, PhysicsConfig};
use crate::controls::OrbitControls;
use crate::debug::{Change, Command, ControlValue, DebugPanel, Effect, ParamKey, Phase, Tunable};
use crate::error::{CoreError, Result};
use crate::resources::Resources;
use crate::scene::{PointsMaterial, Scene};
use crate::time::{FrameTime, Sizes};
use crate::world::{EnvironmentSettings, World};

pub struct Experience {
    pub sizes: Sizes,
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub debug: DebugPanel,
    config: GalaxyConfig,
    physics: PhysicsConfig,
    environment: EnvironmentSettings,
    world: Option<World>,
    rng: StdRng,
}

impl Experience {
    pub fn new(config: &AppConfig, sizes: Sizes, rng: StdRng) -> Self {
        let camera = Camera::from_config(&config.camera, sizes.width, sizes.height);
        let controls = OrbitControls::new(&camera, &config.camera);
        Self {
            sizes,
            scene: Scene::new(),
            camera,
            controls,
            debug: DebugPanel::new(config.debug),
            config: config.galaxy.clone(),
            physics: config.physics.clone(),
            environment: EnvironmentSettings::default(),
            world: None,
            rng,
        }
    }

    /// Build the world from loaded resources. A previous world is disposed
    /// first, so renderers see its nodes in `drain_disposed`.
    pub fn attach_resources(&mut self, resources: &Resources) -> Result<()> {
        if let Some(previous) = self.world.take() {
            previous.dispose(&mut self.scene);
        }
        let world = World::new(
            &mut self.scene,
            resources,
            &self.config,
            &self.physics,
            &self.environment,
            self.sizes.pixel_ratio,
            &mut self.rng,
        )?;
        self.world = Some(world);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.world.is_some()
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn galaxy_config(&self) -> &GalaxyConfig {
        &self.config
    }

    pub fn environment(&self) -> &EnvironmentSettings {
        &self.environment
    }

    /// Uniforms of the attached galaxy, once the world exists
    pub fn uniforms(&self) -> Option<PointsMaterial> {
        let node = self.world.as_ref()?.galaxy.node()?;
        self.scene.get(node)?.as_points().map(|points| points.material)
    }

    /// Advance one frame
    pub fn tick(&mut self, time: FrameTime) {
        self.controls.update(&mut self.camera);
        if let Some(world) = self.world.as_mut() {
            world.update(&mut self.scene, &time);
        }
    }

    /// Viewport changed: only sizes, camera aspect and point scale follow
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) {
        self.sizes.resize(width, height, device_pixel_ratio);
        self.camera.set_aspect(width, height);
        if let Some(world) = self.world.as_ref() {
            world
                .galaxy
                .set_point_size(&mut self.scene, self.config.size, self.sizes.pixel_ratio);
        }
    }

    /// Current value behind a debug control
    pub fn value(&self, key: ParamKey) -> Option<ControlValue> {
        self.config.get(key).or_else(|| self.environment.get(key))
    }

    /// Route a debug control edit. Returns the effect that was applied, or
    /// `None` while a finish-change control is still being dragged.
    pub fn input(&mut self, key: ParamKey, value: ControlValue, phase: Phase) -> Result<Option<Effect>> {
        match self.debug.input(key, value, phase)? {
            Some(change) => self.apply(change).map(Some),
            None => Ok(None),
        }
    }

    /// Commit the value currently being dragged, if any
    pub fn finish_input(&mut self) -> Result<Option<Effect>> {
        match self.debug.finish() {
            Some(change) => self.apply(change).map(Some),
            None => Ok(None),
        }
    }

    fn apply(&mut self, change: Change) -> Result<Effect> {
        let written = self.config.set(change.key, change.value)
            || self.environment.set(change.key, change.value);
        if !written {
            return Err(CoreError::invalid("debug", format!("{:?} has no target", change.key)));
        }

        match (change.key, change.effect) {
            (_, Effect::Regenerate) => self.regenerate()?,
            (ParamKey::Galaxy(_), Effect::Apply) => {
                if let Some(world) = self.world.as_ref() {
                    world.galaxy.set_spin_speed(&mut self.scene, self.config.spin_speed);
                }
            }
            (ParamKey::Environment(_), Effect::Apply) => {
                if let Some(world) = self.world.as_ref() {
                    world.environment.apply(&mut self.scene, &self.environment);
                }
            }
        }
        Ok(change.effect)
    }

    /// Run a panel button. Does nothing before the world exists.
    pub fn press(&mut self, command: Command) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        match command {
            Command::SpawnSphere => {
                world.physics.spawn_sphere(&mut self.scene, &mut self.rng);
            }
            Command::SpawnBox => {
                world.physics.spawn_box(&mut self.scene, &mut self.rng);
            }
            Command::ResetBodies => world.physics.reset(&mut self.scene),
        }
        tracing::debug!(?command, bodies = world.physics.body_count(), "Panel command");
    }

    /// Rebuild the galaxy from the current configuration
    pub fn regenerate(&mut self) -> Result<()> {
        if let Some(world) = self.world.as_mut() {
            world.galaxy.regenerate(
                &mut self.scene,
                &self.config,
                self.sizes.pixel_ratio,
                &mut self.rng,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{EnvironmentParam, GalaxyParam};
    use crate::scene::Light;
    use rand::SeedableRng;

    fn experience() -> Experience {
        let config = AppConfig {
            galaxy: GalaxyConfig {
                count: 200,
                ..GalaxyConfig::default()
            },
            debug: true,
            ..AppConfig::default()
        };
        Experience::new(&config, Sizes::new(800, 600, 1.0), StdRng::seed_from_u64(8))
    }

    fn frame(elapsed: f32) -> FrameTime {
        FrameTime {
            elapsed,
            delta: 0.016,
            frame: 0,
        }
    }

    #[test]
    fn test_world_waits_for_resources() {
        let mut experience = experience();
        experience.tick(frame(0.0));
        assert!(!experience.is_ready());
        assert_eq!(experience.uniforms(), None);
        assert_eq!(experience.scene.points_count(), 0);

        experience.attach_resources(&Resources::default()).unwrap();
        assert!(experience.is_ready());
        assert_eq!(experience.scene.points_count(), 1);
        assert!(experience.world().unwrap().model.is_none());
    }

    #[test]
    fn test_reattach_disposes_previous_world() {
        let mut experience = experience();
        experience.attach_resources(&Resources::default()).unwrap();
        let first = experience.world().unwrap().galaxy.node().unwrap();
        let nodes = experience.scene.len();
        assert!(experience.scene.drain_disposed().is_empty());

        experience.attach_resources(&Resources::default()).unwrap();
        let second = experience.world().unwrap().galaxy.node().unwrap();
        assert_ne!(first, second);
        assert_eq!(experience.scene.len(), nodes);
        let disposed = experience.scene.drain_disposed();
        assert_eq!(disposed.len(), nodes);
        assert!(disposed.contains(&first));
        assert!(!experience.scene.contains(first));
    }

    #[test]
    fn test_panel_commands_drive_physics() {
        let mut experience = experience();
        experience.press(Command::SpawnSphere);
        assert!(!experience.is_ready());

        experience.attach_resources(&Resources::default()).unwrap();
        let stacked = experience.world().unwrap().physics.body_count();
        experience.press(Command::SpawnSphere);
        experience.press(Command::SpawnBox);
        assert_eq!(experience.world().unwrap().physics.body_count(), stacked + 2);

        let before = experience.scene.len();
        experience.press(Command::ResetBodies);
        assert_eq!(experience.world().unwrap().physics.body_count(), 0);
        assert_eq!(experience.scene.len(), before - stacked - 2);
        assert_eq!(experience.scene.drain_disposed().len(), stacked + 2);
        assert_eq!(experience.scene.points_count(), 1);
    }

    #[test]
    fn test_finish_change_regenerates_once() {
        let mut experience = experience();
        experience.attach_resources(&Resources::default()).unwrap();
        let first = experience.world().unwrap().galaxy.node().unwrap();

        let count = ParamKey::Galaxy(GalaxyParam::Count);
        let effect = experience
            .input(count, ControlValue::Number(400.0), Phase::Changing)
            .unwrap();
        assert_eq!(effect, None);
        assert_eq!(experience.galaxy_config().count, 200);
        assert_eq!(experience.world().unwrap().galaxy.node(), Some(first));

        assert_eq!(experience.finish_input().unwrap(), Some(Effect::Regenerate));
        assert_eq!(experience.galaxy_config().count, 400);
        let second = experience.world().unwrap().galaxy.node().unwrap();
        assert_ne!(first, second);
        assert_eq!(experience.scene.points_count(), 1);
        let points = experience.scene.get(second).unwrap().as_points().unwrap();
        assert_eq!(points.buffer.len(), 400);
    }

    #[test]
    fn test_spin_speed_applies_without_regeneration() {
        let mut experience = experience();
        experience.attach_resources(&Resources::default()).unwrap();
        let node = experience.world().unwrap().galaxy.node().unwrap();

        let effect = experience
            .input(
                ParamKey::Galaxy(GalaxyParam::SpinSpeed),
                ControlValue::Number(1.5),
                Phase::Changing,
            )
            .unwrap();
        assert_eq!(effect, Some(Effect::Apply));
        assert_eq!(experience.world().unwrap().galaxy.node(), Some(node));
        let material = experience.scene.get(node).unwrap().as_points().unwrap().material;
        assert_eq!(material.spin_speed, 1.5);
    }

    #[test]
    fn test_environment_control_updates_light() {
        let mut experience = experience();
        experience.attach_resources(&Resources::default()).unwrap();
        experience
            .input(
                ParamKey::Environment(EnvironmentParam::AmbientIntensity),
                ControlValue::Number(2.0),
                Phase::Changing,
            )
            .unwrap();
        let ambient = experience
            .scene
            .lights()
            .find_map(|(_, _, light)| match light {
                Light::Ambient { intensity, .. } => Some(*intensity),
                _ => None,
            })
            .unwrap();
        assert_eq!(ambient, 2.0);
    }

    #[test]
    fn test_resize_updates_camera_only() {
        let mut experience = experience();
        experience.attach_resources(&Resources::default()).unwrap();
        let node = experience.world().unwrap().galaxy.node();
        experience.resize(1000, 500, 2.0);
        assert!((experience.camera.aspect - 2.0).abs() < 1e-6);
        assert_eq!(experience.sizes.pixel_ratio, 2.0);
        assert_eq!(experience.world().unwrap().galaxy.node(), node);
    }

    #[test]
    fn test_tick_advances_time_uniform() {
        let mut experience = experience();
        experience.attach_resources(&Resources::default()).unwrap();
        assert_eq!(experience.uniforms().unwrap().time, 0.0);
        experience.tick(frame(1.25));
        let uniforms = experience.uniforms().unwrap();
        assert_eq!(uniforms.time, 1.25);
        assert!((uniforms.size - 10.0).abs() < 1e-4);
    }
}
