/// Galaxy Core Library - Platform independent scene and simulation logic
///
/// This library provides everything the terminal and browser front ends
/// share: the galaxy particle generator, scene graph, camera and orbit
/// controls, debug panel model, resource loading and the run loop.

pub mod camera;
pub mod color;
pub mod config;
pub mod controls;
pub mod debug;
pub mod error;
pub mod experience;
pub mod galaxy;
pub mod geometry;
pub mod resources;
pub mod run_loop;
pub mod scene;
pub mod stl;
pub mod time;
pub mod transform;
pub mod world;

// Re-export commonly used types
pub use camera::{Camera, ScreenPoint};
pub use color::Color;
pub use config::{AppConfig, CameraConfig, GalaxyConfig, PhysicsConfig};
pub use controls::OrbitControls;
pub use debug::{Command, ControlValue, DebugPanel, Effect, ParamKey, Phase};
pub use error::{CoreError, Result};
pub use experience::Experience;
pub use galaxy::ParticleBuffer;
pub use geometry::{Mesh, Triangle, Vertex};
pub use resources::{Fetch, LoadHandle, LoadTask, Resources, Source};
pub use run_loop::{RunLoop, Scheduler, StopHandle};
pub use scene::{NodeId, Scene};
pub use time::{Clock, FrameTime, Sizes};
pub use transform::{Rotation, Transform};
pub use world::World;
