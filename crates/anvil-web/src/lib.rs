//! Browser bridge for the anvil simulation.
//!
//! `anvil_mount` waits for the canvas, sizes it, creates the page overlay for
//! escaped sparks, wires pointer input and starts the frame loop. The returned
//! [`AnvilHandle`] is the only way to reset or tear the animation down.

pub mod canvas;
pub mod dom;
pub mod runner;

use anvil_sim::{RetryPolicy, SimConfig, Simulation, Viewport};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

use crate::canvas::CanvasSurface;

pub use runner::AnvilRunner;

const OVERLAY_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("top", "0"),
    ("left", "0"),
    ("pointer-events", "none"),
    ("z-index", "1000"),
];

/// A running animation.
#[wasm_bindgen]
pub struct AnvilHandle {
    runner: AnvilRunner,
}

#[wasm_bindgen]
impl AnvilHandle {
    /// Re-centre the hammer and clear in-canvas sparks.
    pub fn reset(&self) {
        self.runner.reset();
    }

    /// Stop the animation and remove everything it added to the page.
    pub fn destroy(self) {
        self.runner.stop();
        log::info!("anvil animation destroyed");
    }
}

/// Mount the animation on the canvas with id `canvas_id`.
///
/// `config_json` may override any [`SimConfig`] field. Rejects if the JSON is
/// invalid or the canvas never appears.
#[wasm_bindgen]
pub async fn anvil_mount(canvas_id: String, config_json: Option<String>) -> Result<AnvilHandle, JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let config = match config_json {
        Some(json) => SimConfig::from_json(&json).map_err(dom::to_js)?,
        None => SimConfig::default(),
    };

    let canvas_el = dom::wait_for_canvas(&canvas_id, RetryPolicy::default()).await?;
    let window = dom::window()?;
    let dpr = dom::device_pixel_ratio(&window);

    let rect = canvas_el.get_bounding_client_rect();
    let viewport = Viewport::measured(rect.width() as f32, rect.height() as f32);
    let mut canvas = CanvasSurface::new(canvas_el)?;
    canvas.fit(viewport.size(), dpr)?;

    let mut overlay = CanvasSurface::new(create_overlay()?)?;
    overlay.fit(dom::viewport_size(&window), dpr)?;

    let overlay_el = overlay.element().clone();
    let runner = Simulation::new(config, viewport, dom::now_ms())
        .map_err(dom::to_js)
        .and_then(|sim| AnvilRunner::start(sim, canvas, overlay))
        .map_err(|e| {
            overlay_el.remove();
            e
        })?;
    log::info!("anvil mounted on #{} ({}x{})", canvas_id, viewport.width, viewport.height);
    Ok(AnvilHandle { runner })
}

/// A fixed, click-through canvas covering the page, appended to `<body>`.
fn create_overlay() -> Result<HtmlCanvasElement, JsValue> {
    let document = dom::document()?;
    let overlay = document.create_element("canvas")?.dyn_into::<HtmlCanvasElement>()?;
    let style = overlay.style();
    for (name, value) in OVERLAY_STYLE {
        style.set_property(name, value)?;
    }
    let body = document.body().ok_or_else(|| JsValue::from_str("document has no body"))?;
    body.append_child(&overlay)?;
    Ok(overlay)
}
