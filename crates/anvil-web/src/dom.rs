//! Small helpers over `web-sys` for the page the simulation is mounted in.

use anvil_sim::{Readiness, Retry, RetryPolicy, SimError};
use glam::Vec2;
use js_sys::Promise;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlCanvasElement, Window};

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?.document().ok_or_else(|| JsValue::from_str("window has no document"))
}

/// Milliseconds on the same clock `requestAnimationFrame` reports.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Size of the browser viewport in CSS pixels.
pub fn viewport_size(window: &Window) -> Vec2 {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
    Vec2::new(dim(window.inner_width()), dim(window.inner_height()))
}

pub fn device_pixel_ratio(window: &Window) -> f64 {
    let dpr = window.device_pixel_ratio();
    if dpr.is_finite() && dpr > 0.0 {
        dpr
    } else {
        1.0
    }
}

/// Resolve after `ms` milliseconds.
pub async fn sleep_ms(ms: u32) -> Result<(), JsValue> {
    let window = window()?;
    let promise = Promise::new(&mut |resolve, _reject| {
        let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout) {
            log::error!("setTimeout failed: {:?}", e);
        }
    });
    JsFuture::from(promise).await.map(|_| ())
}

/// Poll for the canvas with `id` until it exists or the policy runs out.
pub async fn wait_for_canvas(id: &str, policy: RetryPolicy) -> Result<HtmlCanvasElement, JsValue> {
    let document = document()?;
    let mut retry = Retry::new(policy);
    loop {
        let found = document.get_element_by_id(id);
        match retry.check(found.is_some()).map_err(to_js)? {
            Readiness::Ready => {
                let element = found.ok_or_else(|| JsValue::from_str("canvas vanished"))?;
                return element
                    .dyn_into::<HtmlCanvasElement>()
                    .map_err(|_| JsValue::from_str(&format!("#{} is not a canvas", id)));
            }
            Readiness::RetryAfter(ms) => {
                log::debug!("canvas #{} not found yet (attempt {})", id, retry.attempts());
                sleep_ms(ms).await?;
            }
        }
    }
}

pub fn to_js(e: SimError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}
