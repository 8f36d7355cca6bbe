/// Terminal front end: galaxy and model drawn as coloured ASCII
use crossterm::{
    cursor,
    event::{self, Event},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use futures::future::LocalBoxFuture;
use galaxy_core::{CoreError, Experience, Fetch, FrameTime, Phase, RunLoop, Scheduler, StopHandle};
use std::io::{self, stdout, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub mod panel;
pub mod renderer;

pub use panel::{Action, PanelCursor};
pub use renderer::{AsciiRenderer, CELL_ASPECT};

/// Reads resources from the local filesystem, relative to `root`
#[derive(Debug, Clone, Default)]
pub struct FsFetch {
    root: PathBuf,
}

impl FsFetch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetch for FsFetch {
    fn fetch<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, galaxy_core::Result<Vec<u8>>> {
        Box::pin(async move { std::fs::read(self.root.join(path)).map_err(CoreError::from) })
    }
}

/// First failure among steps that have all already run
fn first_error(steps: impl IntoIterator<Item = io::Result<()>>) -> io::Result<()> {
    steps.into_iter().fold(Ok(()), |first, step| first.and(step))
}

/// Sleeps between frames to hold a fixed frame rate
pub struct FixedRate {
    start: Instant,
    frame: Duration,
}

impl FixedRate {
    pub fn new(fps: u32) -> Self {
        Self {
            start: Instant::now(),
            frame: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
        }
    }
}

impl Scheduler for FixedRate {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    fn wait_for_next_frame(&mut self, frame_start_ms: f64) {
        let spent = Duration::from_secs_f64((self.now_ms() - frame_start_ms).max(0.0) / 1000.0);
        if spent < self.frame {
            std::thread::sleep(self.frame - spent);
        }
    }
}

/// Terminal viewport in logical pixels: cells are twice as tall as wide
pub fn logical_size(columns: u16, rows: u16) -> (u32, u32) {
    (columns.max(1) as u32, rows.max(1) as u32 * CELL_ASPECT)
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    experience: Experience,
    renderer: AsciiRenderer,
    cursor: PanelCursor,
    fps: u32,
    stop: Option<StopHandle>,
    status: Option<String>,
    last_report: Instant,
    frame_count: u32,
    measured_fps: f32,
}

impl TerminalApp {
    pub fn new(experience: Experience, fps: u32) -> std::io::Result<Self> {
        let (width, height) = terminal::size()?;
        let mut app = Self {
            experience,
            renderer: AsciiRenderer::new(width as usize, height as usize),
            cursor: PanelCursor::default(),
            fps,
            stop: None,
            status: None,
            last_report: Instant::now(),
            frame_count: 0,
            measured_fps: 0.0,
        };
        app.resize(width, height);
        Ok(app)
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Every restore step runs even if an earlier one fails
        let restored = first_error([
            terminal::disable_raw_mode(),
            execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show),
        ]);

        result?;
        restored?;
        Ok(())
    }

    fn main_loop(&mut self) -> anyhow::Result<()> {
        let mut run_loop = RunLoop::new();
        self.stop = Some(run_loop.stop_handle());
        let mut scheduler = FixedRate::new(self.fps);

        let frames = run_loop.run(&mut scheduler, |time| self.frame(time))?;
        tracing::info!(frames, "Terminal renderer stopped");
        Ok(())
    }

    fn frame(&mut self, time: FrameTime) -> anyhow::Result<()> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(action) = Action::from_key(key) {
                        self.handle(action);
                    }
                }
                Event::Resize(width, height) => self.resize(width, height),
                _ => {}
            }
        }

        self.experience.tick(time);
        self.render()?;
        self.count_frame();
        Ok(())
    }

    /// Apply one keyboard action
    pub fn handle(&mut self, action: Action) {
        let result = match action {
            Action::Quit => {
                if let Some(stop) = &self.stop {
                    stop.stop();
                }
                Ok(())
            }
            Action::Orbit { azimuth, polar } => {
                self.experience.controls.rotate(azimuth, polar);
                Ok(())
            }
            Action::Zoom(factor) => {
                self.experience.controls.zoom(factor);
                Ok(())
            }
            Action::TogglePanel => {
                self.experience.debug.active = !self.experience.debug.active;
                Ok(())
            }
            Action::Select(step) => {
                self.experience.debug.cancel();
                self.cursor.select(&self.experience, step);
                Ok(())
            }
            Action::Nudge(direction) => match self.cursor.nudged(&self.experience, direction) {
                Some((key, value)) => self.experience.input(key, value, Phase::Changing).map(|_| ()),
                None => Ok(()),
            },
            Action::Commit => match self.cursor.button(&self.experience) {
                Some(command) => {
                    self.experience.press(command);
                    Ok(())
                }
                None => self.experience.finish_input().map(|_| ()),
            },
            Action::Regenerate => self.experience.regenerate(),
        };

        self.status = match result {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Rejected {:?}: {}", action, e);
                Some(e.to_string())
            }
        };
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        let (width, height) = logical_size(columns, rows);
        self.experience.resize(width, height, 1.0);
        self.renderer.resize(columns as usize, rows as usize);
        tracing::debug!(columns, rows, "Terminal resized");
    }

    fn count_frame(&mut self) {
        self.frame_count += 1;
        let now = Instant::now();
        if (now - self.last_report).as_secs() >= 1 {
            self.measured_fps = self.frame_count as f32 / (now - self.last_report).as_secs_f32();
            self.frame_count = 0;
            self.last_report = now;
        }
    }

    fn render(&mut self) -> std::io::Result<()> {
        self.renderer.clear();
        if self.experience.is_ready() {
            self.renderer
                .render_scene(&self.experience.scene, &self.experience.camera);
        }

        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Galaxy | FPS: {:.1} | WASD=Orbit +/-=Zoom Tab=Select [/]=Adjust Enter=Apply/Press H=Panel R=Regenerate Q=Quit",
                self.measured_fps
            ))
        )?;

        let mut row = 1;
        if self.experience.debug.active {
            queue!(stdout, SetForegroundColor(Color::White))?;
            for line in self.cursor.lines(&self.experience) {
                queue!(stdout, cursor::MoveTo(0, row), Print(line))?;
                row += 1;
            }
        }
        if let Some(status) = &self.status {
            queue!(
                stdout,
                cursor::MoveTo(0, row),
                SetForegroundColor(Color::Red),
                Print(status),
                terminal::Clear(ClearType::UntilNewLine)
            )?;
        }
        queue!(stdout, ResetColor)?;

        stdout.flush()
    }
}
