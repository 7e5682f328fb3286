//! Browser glue: the 2d context as a [`Painter`], canvas sizing, pointer
//! coordinates and the `requestAnimationFrame` loop.

use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;

use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, TouchList};

use super::error::{GraphError, Result};
use super::render::Painter;
use super::types::{SurfaceSize, Vec2};

impl Painter for CanvasRenderingContext2d {
	fn reset_transform(&self, pixel_ratio: f64) {
		let _ = self.set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0);
	}

	fn clear(&self, width: f64, height: f64, background: &str) {
		self.set_fill_style_str(background);
		self.fill_rect(0.0, 0.0, width, height);
	}

	fn translate(&self, x: f64, y: f64) {
		let _ = CanvasRenderingContext2d::translate(self, x, y);
	}

	fn scale(&self, k: f64) {
		let _ = CanvasRenderingContext2d::scale(self, k, k);
	}

	fn set_alpha(&self, alpha: f64) {
		self.set_global_alpha(alpha);
	}

	fn line(&self, from: Vec2, to: Vec2, color: &str, width: f64) {
		self.set_stroke_style_str(color);
		self.set_line_width(width);
		self.begin_path();
		self.move_to(from.x, from.y);
		self.line_to(to.x, to.y);
		self.stroke();
	}

	fn fill_circle(&self, center: Vec2, radius: f64, color: &str) {
		self.set_fill_style_str(color);
		self.begin_path();
		let _ = self.arc(center.x, center.y, radius, 0.0, TAU);
		self.fill();
	}

	fn stroke_circle(&self, center: Vec2, radius: f64, color: &str, width: f64) {
		self.set_stroke_style_str(color);
		self.set_line_width(width);
		self.begin_path();
		let _ = self.arc(center.x, center.y, radius, 0.0, TAU);
		self.stroke();
	}

	fn text(&self, text: &str, at: Vec2, font_px: f64, color: &str) {
		self.set_font(&format!("{font_px}px sans-serif"));
		self.set_text_align("center");
		self.set_text_baseline("top");
		self.set_fill_style_str(color);
		let _ = self.fill_text(text, at.x, at.y);
	}
}

/// The canvas' 2d rendering context.
pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")?
		.ok_or(GraphError::ContextUnavailable)?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| GraphError::ContextUnavailable)
}

/// Container width (fallback 800) by `height`, at the window's pixel ratio.
pub fn measure_surface(canvas: &HtmlCanvasElement, height: f64) -> Result<SurfaceSize> {
	let window = web_sys::window().ok_or(GraphError::NoWindow)?;
	let width = canvas
		.parent_element()
		.map(|parent| parent.client_width() as f64)
		.unwrap_or(SurfaceSize::DEFAULT_WIDTH);
	Ok(SurfaceSize::new(width, height, window.device_pixel_ratio()))
}

/// Sizes the backing store in device pixels and the element in CSS pixels.
pub fn fit_canvas(canvas: &HtmlCanvasElement, surface: SurfaceSize) -> Result<()> {
	canvas.set_width((surface.width * surface.pixel_ratio).round() as u32);
	canvas.set_height((surface.height * surface.pixel_ratio).round() as u32);
	let style = canvas.style();
	style.set_property("width", &format!("{}px", surface.width))?;
	style.set_property("height", &format!("{}px", surface.height))?;
	Ok(())
}

/// Client coordinates relative to the canvas' top-left corner.
pub fn canvas_point(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> Vec2 {
	let rect = canvas.get_bounding_client_rect();
	Vec2::new(client_x - rect.left(), client_y - rect.top())
}

/// Canvas-relative positions of every touch in `touches`.
pub fn touch_points(canvas: &HtmlCanvasElement, touches: &TouchList) -> Vec<Vec2> {
	(0..touches.length())
		.filter_map(|i| touches.get(i))
		.map(|touch| canvas_point(canvas, touch.client_x() as f64, touch.client_y() as f64))
		.collect()
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// A single outstanding `requestAnimationFrame` at a time. The callback
/// returns whether it wants another frame.
pub struct FrameLoop {
	callback: FrameCallback,
	handle: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
	/// Wraps `on_frame`; nothing runs until [`FrameLoop::request`].
	pub fn new(mut on_frame: impl FnMut() -> bool + 'static) -> Self {
		let callback: FrameCallback = Rc::new(RefCell::new(None));
		let handle = Rc::new(Cell::new(None));
		let (callback_inner, handle_inner) = (callback.clone(), handle.clone());
		*callback.borrow_mut() = Some(Closure::new(move || {
			handle_inner.set(None);
			if on_frame() {
				if let Err(err) = schedule(&callback_inner, &handle_inner) {
					error!("failed to schedule animation frame: {err}");
				}
			}
		}));
		Self { callback, handle }
	}

	/// Schedules the callback unless a frame is already pending.
	pub fn request(&self) -> Result<()> {
		schedule(&self.callback, &self.handle)
	}

	/// Cancels the pending frame, if any.
	pub fn cancel(&self) {
		if let (Some(id), Some(window)) = (self.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
	}

	/// Cancels any pending frame and releases the callback.
	pub fn dispose(&self) {
		self.cancel();
		self.callback.borrow_mut().take();
	}
}

fn schedule(callback: &FrameCallback, handle: &Cell<Option<i32>>) -> Result<()> {
	if handle.get().is_some() {
		return Ok(());
	}
	let callback = callback.borrow();
	let Some(callback) = callback.as_ref() else {
		return Ok(());
	};
	let window = web_sys::window().ok_or(GraphError::NoWindow)?;
	let id = window.request_animation_frame(callback.as_ref().unchecked_ref())?;
	handle.set(Some(id));
	Ok(())
}
