//! Ember backdrop: soft flame wisps drifting up behind the quest.
//!
//! Geometry comes from `wisps()`, a pure function of time and canvas size;
//! the animation-frame loop below only paints what it returns.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, window};

const CANVAS_ID: &str = "vq-backdrop";
const WISP_COUNT: usize = 14;

fn lattice(ix: i32, iy: i32) -> f64 {
    let mut h = (ix as u32).wrapping_mul(374_761_393) ^ (iy as u32).wrapping_mul(668_265_263);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h ^ (h >> 16)) as f64 / u32::MAX as f64
}

fn smooth(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Value noise in [0, 1], continuous in both axes.
pub fn noise2(x: f64, y: f64) -> f64 {
    let (fx, fy) = (x.floor(), y.floor());
    let (ix, iy) = (fx as i32, fy as i32);
    let (tx, ty) = (smooth(x - fx), smooth(y - fy));
    let top = lattice(ix, iy) + (lattice(ix + 1, iy) - lattice(ix, iy)) * tx;
    let bottom = lattice(ix, iy + 1) + (lattice(ix + 1, iy + 1) - lattice(ix, iy + 1)) * tx;
    top + (bottom - top) * ty
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wisp {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub alpha: f64,
}

/// Wisp layout at `t_ms` on a `width` x `height` canvas.
pub fn wisps(count: usize, t_ms: f64, width: f64, height: f64) -> Vec<Wisp> {
    let t = t_ms / 1000.0;
    let short = width.min(height);
    (0..count)
        .map(|i| {
            let s = i as f64 * 7.31;
            // 0 at the bottom edge, 1 at the top; each wisp loops at its own pace.
            let rise = (t * (0.04 + 0.04 * noise2(s, 0.5)) + noise2(s, 9.0)).fract();
            Wisp {
                x: width * noise2(s + 1.7, t * 0.15),
                y: height * (1.0 - rise),
                radius: short * (0.05 + 0.12 * noise2(s + 3.0, t * 0.3)),
                alpha: 0.35 * 4.0 * rise * (1.0 - rise),
            }
        })
        .collect()
}

struct Backdrop {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

thread_local! {
    static BACKDROP: RefCell<Option<Backdrop>> = const { RefCell::new(None) };
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

#[wasm_bindgen]
pub fn start_backdrop() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = match doc.get_element_by_id(CANVAS_ID) {
        Some(el) => el.dyn_into()?,
        None => {
            let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
            c.set_id(CANVAS_ID);
            c.set_attribute("style", "position:fixed; inset:0; width:100%; height:100%; z-index:0; pointer-events:none;")?;
            doc.body()
                .ok_or_else(|| JsValue::from_str("no body"))?
                .append_child(&c)?;
            c
        }
    };
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    let fresh = BACKDROP.with(|cell| {
        let mut slot = cell.borrow_mut();
        let fresh = slot.is_none();
        *slot = Some(Backdrop { canvas, ctx });
        fresh
    });
    // A second call only swaps the canvas; the running loop picks it up.
    if fresh {
        start_backdrop_loop();
    }
    Ok(())
}

fn start_backdrop_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        BACKDROP.with(|cell| {
            if let Some(b) = cell.borrow().as_ref() {
                if let Err(e) = paint(b, ts) {
                    log::warn!("backdrop paint failed: {:?}", e);
                }
            }
        });
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

fn paint(b: &Backdrop, ts: f64) -> Result<(), JsValue> {
    // Track the viewport so the wisps never stretch.
    let (w, h) = match window() {
        Some(win) => (
            win.inner_width()?.as_f64().unwrap_or(640.0),
            win.inner_height()?.as_f64().unwrap_or(480.0),
        ),
        None => (640.0, 480.0),
    };
    if b.canvas.width() != w as u32 || b.canvas.height() != h as u32 {
        b.canvas.set_width(w as u32);
        b.canvas.set_height(h as u32);
    }
    let ctx = &b.ctx;
    ctx.set_fill_style_str("#0d0806");
    ctx.fill_rect(0.0, 0.0, w, h);
    for wisp in wisps(WISP_COUNT, ts, w, h) {
        let grad = ctx.create_radial_gradient(wisp.x, wisp.y, 0.0, wisp.x, wisp.y, wisp.radius)?;
        grad.add_color_stop(0.0, &format!("rgba(255,170,70,{:.3})", wisp.alpha))?;
        grad.add_color_stop(0.5, &format!("rgba(200,70,20,{:.3})", wisp.alpha * 0.5))?;
        grad.add_color_stop(1.0, "rgba(60,10,0,0)")?;
        ctx.set_fill_style_canvas_gradient(&grad);
        ctx.begin_path();
        ctx.arc(wisp.x, wisp.y, wisp.radius, 0.0, std::f64::consts::TAU)?;
        ctx.fill();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_bounded_and_deterministic() {
        for i in 0..200 {
            let (x, y) = (i as f64 * 0.37, i as f64 * 0.11 - 5.0);
            let n = noise2(x, y);
            assert!((0.0..=1.0).contains(&n), "noise {} out of range", n);
            assert_eq!(n, noise2(x, y));
        }
    }

    #[test]
    fn wisps_stay_on_canvas() {
        for t in [0.0, 1234.5, 99_999.0] {
            let ws = wisps(WISP_COUNT, t, 800.0, 600.0);
            assert_eq!(ws.len(), WISP_COUNT);
            for w in ws {
                assert!((0.0..=800.0).contains(&w.x));
                assert!((0.0..=600.0).contains(&w.y));
                assert!(w.radius > 0.0);
                assert!((0.0..=0.35 + 1e-9).contains(&w.alpha));
            }
        }
    }
}
