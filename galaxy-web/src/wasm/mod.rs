//! Browser entry point, frame loop and event wiring

mod fetch;
mod gl;
mod panel;

use std::cell::RefCell;
use std::rc::Rc;

use galaxy_core::resources::{self, LoadHandle, LoadTask, Resources, Source};
use galaxy_core::world::MODEL_RESOURCE;
use galaxy_core::{AppConfig, Experience, RunLoop, Sizes, StopHandle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, MouseEvent, WheelEvent, Window};

pub use fetch::HttpFetch;
use gl::GlRenderer;

use crate::bindings::{debug_requested, drag_rotation, wheel_zoom};
use crate::MODEL_PATH;

thread_local! {
    static STOP: RefCell<Option<StopHandle>> = RefCell::new(None);
    static LOADING: RefCell<Option<LoadHandle>> = RefCell::new(None);
}

pub(crate) fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

pub(crate) fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

/// Everything the frame callback and event handlers share
pub struct App {
    pub experience: Experience,
    renderer: GlRenderer,
    canvas: HtmlCanvasElement,
    run_loop: RunLoop,
}

impl App {
    /// Run one frame. Returns `false` once the loop has been stopped.
    fn frame(&mut self, now_ms: f64) -> Result<bool, JsValue> {
        let Some(time) = self.run_loop.frame(now_ms) else {
            return Ok(false);
        };
        self.experience.tick(time);
        if self.experience.is_ready() {
            let experience = &mut self.experience;
            self.renderer
                .render(&mut experience.scene, &experience.camera, &experience.sizes)?;
        }
        Ok(true)
    }

    fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) {
        self.experience.resize(width, height, device_pixel_ratio);
        self.fit_canvas();
    }

    fn fit_canvas(&self) {
        let sizes = self.experience.sizes;
        let (width, height) = sizes.drawing_buffer();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let style = self.canvas.style();
        let css = [
            ("width", format!("{}px", sizes.width)),
            ("height", format!("{}px", sizes.height)),
        ];
        for (property, value) in css {
            if let Err(e) = style.set_property(property, &value) {
                warn(&format!("canvas style: {:?}", e));
            }
        }
    }
}

fn viewport(window: &Window) -> Result<(u32, u32, f32), JsValue> {
    let width = window.inner_width()?.as_f64().ok_or("inner width is not a number")?;
    let height = window.inner_height()?.as_f64().ok_or("inner height is not a number")?;
    Ok((width as u32, height as u32, window.device_pixel_ratio() as f32))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let Some(canvas) = document.query_selector("canvas.webgl")? else {
        warn("no canvas.webgl on this page, nothing to render");
        return Ok(());
    };
    let canvas = canvas.dyn_into::<HtmlCanvasElement>()?;

    let hash = window.location().hash().unwrap_or_default();
    let config = AppConfig {
        debug: debug_requested(&hash),
        ..AppConfig::default()
    };

    let (width, height, device_pixel_ratio) = viewport(&window)?;
    let experience = Experience::new(
        &config,
        Sizes::new(width, height, device_pixel_ratio),
        StdRng::from_entropy(),
    );
    let renderer = GlRenderer::new(&canvas)?;
    let run_loop = RunLoop::new();
    STOP.with(|stop| *stop.borrow_mut() = Some(run_loop.stop_handle()));

    let app = Rc::new(RefCell::new(App {
        experience,
        renderer,
        canvas: canvas.clone(),
        run_loop,
    }));
    app.borrow().fit_canvas();

    listen_resize(&window, &app)?;
    listen_pointer(&canvas, &app)?;
    if config.debug {
        panel::build(&document, &app)?;
    }
    load(app.clone());
    animate(app)?;

    log("Galaxy started");
    Ok(())
}

/// Stop the frame loop and abandon any load in progress
#[wasm_bindgen]
pub fn stop() {
    STOP.with(|stop| {
        if let Some(stop) = stop.borrow().as_ref() {
            stop.stop();
        }
    });
    LOADING.with(|loading| {
        if let Some(handle) = loading.borrow_mut().take() {
            handle.cancel();
        }
    });
}

fn load(app: Rc<RefCell<App>>) {
    wasm_bindgen_futures::spawn_local(async move {
        let fetch = HttpFetch::new("");
        let sources = [Source::model(MODEL_RESOURCE, MODEL_PATH)];
        let (task, handle) = LoadTask::new(resources::load(&sources, &fetch, |progress| {
            log(&format!("Loaded {}/{} resources", progress.loaded, progress.total));
        }));
        LOADING.with(|loading| *loading.borrow_mut() = Some(handle));

        // The galaxy does not need the model; show it either way
        let loaded = match task.await {
            Ok(loaded) => loaded,
            Err(galaxy_core::CoreError::Cancelled) => return,
            Err(e) => {
                warn(&format!("{}; continuing without model", e));
                Resources::default()
            }
        };
        LOADING.with(|loading| loading.borrow_mut().take());

        if let Err(e) = app.borrow_mut().experience.attach_resources(&loaded) {
            warn(&format!("failed to build world: {}", e));
        }
    });
}

fn request_frame(callback: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or("no window")?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or_default()
}

fn animate(app: Rc<RefCell<App>>) -> Result<(), JsValue> {
    // `f` holds the animation-frame closure so it can reschedule itself
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let result = app.borrow_mut().frame(now_ms());
        match result {
            Ok(true) => {
                if let Some(callback) = f.borrow().as_ref() {
                    if let Err(e) = request_frame(callback) {
                        warn(&format!("requestAnimationFrame failed: {:?}", e));
                    }
                }
            }
            Ok(false) => log("Galaxy stopped"),
            Err(e) => warn(&format!("render failed: {:?}", e)),
        }
    }) as Box<dyn FnMut()>));

    if let Some(callback) = g.borrow().as_ref() {
        request_frame(callback)?;
    }
    Ok(())
}

fn listen_resize(window: &Window, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let app = app.clone();
    let target = window.clone();
    let on_resize = Closure::wrap(Box::new(move || match viewport(&target) {
        Ok((width, height, device_pixel_ratio)) => app.borrow_mut().resize(width, height, device_pixel_ratio),
        Err(e) => warn(&format!("resize: {:?}", e)),
    }) as Box<dyn FnMut()>);
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();
    Ok(())
}

fn listen_pointer(canvas: &HtmlCanvasElement, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let drag_app = app.clone();
    let on_move = Closure::wrap(Box::new(move |event: MouseEvent| {
        // Primary button held
        if event.buttons() & 1 == 0 {
            return;
        }
        let mut app = drag_app.borrow_mut();
        let height = app.experience.sizes.height as f32;
        let (azimuth, polar) = drag_rotation(event.movement_x() as f32, event.movement_y() as f32, height);
        app.experience.controls.rotate(azimuth, polar);
    }) as Box<dyn FnMut(MouseEvent)>);
    canvas.add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())?;
    on_move.forget();

    let zoom_app = app.clone();
    let on_wheel = Closure::wrap(Box::new(move |event: WheelEvent| {
        event.prevent_default();
        zoom_app
            .borrow_mut()
            .experience
            .controls
            .zoom(wheel_zoom(event.delta_y()));
    }) as Box<dyn FnMut(WheelEvent)>);
    canvas.add_event_listener_with_callback("wheel", on_wheel.as_ref().unchecked_ref())?;
    on_wheel.forget();
    Ok(())
}
