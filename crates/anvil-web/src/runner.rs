use std::cell::RefCell;
use std::rc::Rc;

use anvil_sim::{InputEvent, PageFrame, Simulation, Surface, TickOutcome};
use glam::Vec2;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, PointerEvent, Window};

use crate::canvas::CanvasSurface;
use crate::dom;

/// Everything the frame callback and the pointer listeners share.
struct Shared {
    sim: Simulation,
    canvas: CanvasSurface,
    overlay: CanvasSurface,
    raf_id: Option<i32>,
}

impl Shared {
    fn frame(&mut self, window: &Window, now_ms: f64) {
        let dpr = dom::device_pixel_ratio(window);
        if let Err(e) = self.overlay.fit(dom::viewport_size(window), dpr) {
            log::warn!("overlay resize failed: {:?}", e);
        }
        let rect = self.canvas.element().get_bounding_client_rect();
        let origin = Vec2::new(rect.left() as f32, rect.top() as f32);
        self.sim.set_page_frame(PageFrame::new(origin, self.overlay.size()));

        if self.sim.tick(now_ms) != TickOutcome::Throttled {
            self.sim.draw(&mut self.canvas, &mut self.overlay, now_ms);
        }
    }

    /// Pointer position relative to the canvas.
    fn local(&self, event: &PointerEvent) -> Vec2 {
        let rect = self.canvas.element().get_bounding_client_rect();
        Vec2::new(
            (event.client_x() as f64 - rect.left()) as f32,
            (event.client_y() as f64 - rect.top()) as f32,
        )
    }
}

type FrameCallback = Closure<dyn FnMut(f64)>;
type PointerCallback = Closure<dyn FnMut(PointerEvent)>;

/// Drives a [`Simulation`] from `requestAnimationFrame` and feeds it pointer input.
pub struct AnvilRunner {
    shared: Rc<RefCell<Shared>>,
    frame: Rc<RefCell<Option<FrameCallback>>>,
    listeners: Vec<(&'static str, PointerCallback)>,
    canvas_el: HtmlCanvasElement,
    overlay_el: HtmlCanvasElement,
    window: Window,
}

impl AnvilRunner {
    pub fn start(sim: Simulation, canvas: CanvasSurface, overlay: CanvasSurface) -> Result<Self, JsValue> {
        let window = dom::window()?;
        let canvas_el = canvas.element().clone();
        let overlay_el = overlay.element().clone();
        let shared = Rc::new(RefCell::new(Shared { sim, canvas, overlay, raf_id: None }));

        let mut runner = Self {
            shared,
            frame: Rc::new(RefCell::new(None)),
            listeners: Vec::new(),
            canvas_el,
            overlay_el,
            window,
        };
        runner.listen("pointerdown", |p| InputEvent::PointerDown { x: p.x, y: p.y })?;
        runner.listen("pointermove", |p| InputEvent::PointerMove { x: p.x, y: p.y })?;
        runner.listen("pointerup", |p| InputEvent::PointerUp { x: p.x, y: p.y })?;
        runner.listen("pointerleave", |_| InputEvent::PointerLeave)?;
        runner.start_frames()?;
        Ok(runner)
    }

    fn listen(&mut self, kind: &'static str, to_event: fn(Vec2) -> InputEvent) -> Result<(), JsValue> {
        let shared = Rc::clone(&self.shared);
        let callback = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            match shared.try_borrow_mut() {
                Ok(mut s) => {
                    let pos = s.local(&event);
                    s.sim.push_input(to_event(pos));
                }
                Err(_) => log::warn!("{} dropped: simulation busy", kind),
            }
        });
        self.canvas_el
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        self.listeners.push((kind, callback));
        Ok(())
    }

    fn start_frames(&mut self) -> Result<(), JsValue> {
        let shared = Rc::clone(&self.shared);
        let slot = Rc::clone(&self.frame);
        let window = self.window.clone();

        let callback = Closure::<dyn FnMut(f64)>::new(move |now_ms: f64| {
            let Ok(mut s) = shared.try_borrow_mut() else {
                log::warn!("frame skipped: simulation busy");
                return;
            };
            s.frame(&window, now_ms);
            s.raf_id = match slot.borrow().as_ref() {
                Some(next) => match window.request_animation_frame(next.as_ref().unchecked_ref()) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        log::error!("requestAnimationFrame failed, animation stopped: {:?}", e);
                        None
                    }
                },
                None => None,
            };
        });

        let id = self.window.request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.shared.borrow_mut().raf_id = Some(id);
        *self.frame.borrow_mut() = Some(callback);
        Ok(())
    }

    /// Queue a hammer reset for the next frame.
    pub fn reset(&self) {
        match self.shared.try_borrow_mut() {
            Ok(mut s) => s.sim.push_input(InputEvent::Reset),
            Err(_) => log::warn!("reset dropped: simulation busy"),
        }
    }

    /// Cancel the frame loop, detach listeners and remove the overlay.
    pub fn stop(self) {
        if let Some(id) = self.shared.borrow_mut().raf_id.take() {
            if let Err(e) = self.window.cancel_animation_frame(id) {
                log::warn!("cancelAnimationFrame failed: {:?}", e);
            }
        }
        // Dropping the callback breaks the closure's reference back to its own slot.
        self.frame.borrow_mut().take();

        for (kind, callback) in &self.listeners {
            if let Err(e) = self
                .canvas_el
                .remove_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            {
                log::warn!("could not remove {} listener: {:?}", kind, e);
            }
        }
        drop(self.listeners);
        self.overlay_el.remove();

        match Rc::try_unwrap(self.shared) {
            Ok(cell) => cell.into_inner().sim.destroy(),
            Err(_) => log::warn!("simulation still shared at shutdown"),
        }
    }
}
