/// Example: Render a single galaxy frame to stdout without taking over the terminal
///
/// Usage: cargo run --example snapshot -- [path/to/model.stl]

use anyhow::Context;
use crossterm::{execute, terminal};
use galaxy_core::resources::{Resource, Resources};
use galaxy_core::world::MODEL_RESOURCE;
use galaxy_core::{stl, AppConfig, Experience, FrameTime, GalaxyConfig, Sizes};
use galaxy_terminal::{logical_size, AsciiRenderer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::fs;
use std::io::{stdout, Write};

const COLUMNS: u16 = 100;
const ROWS: u16 = 40;

fn main() -> anyhow::Result<()> {
    let mut resources = Resources::default();
    if let Some(path) = env::args().nth(1) {
        let data = fs::read(&path).with_context(|| format!("reading {}", path))?;
        let mesh = stl::parse_stl(&data)?;
        println!("Loaded {} triangles from {}", mesh.triangles.len(), path);
        resources.insert(MODEL_RESOURCE, Resource::Model(mesh));
    }

    let config = AppConfig {
        galaxy: GalaxyConfig {
            count: 20_000,
            ..GalaxyConfig::default()
        },
        ..AppConfig::default()
    };
    let (width, height) = logical_size(COLUMNS, ROWS);
    let mut experience = Experience::new(&config, Sizes::new(width, height, 1.0), StdRng::seed_from_u64(7));
    experience.attach_resources(&resources)?;
    experience.tick(FrameTime::default());

    let mut renderer = AsciiRenderer::new(COLUMNS as usize, ROWS as usize);
    renderer.render_scene(&experience.scene, &experience.camera);

    let mut out = stdout();
    execute!(out, terminal::Clear(terminal::ClearType::All))?;
    renderer.draw(&mut out)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
