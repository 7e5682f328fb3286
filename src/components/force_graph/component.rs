use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use log::{debug, error, info};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent};

use super::canvas::{self, FrameLoop};
use super::config::GraphConfig;
use super::error::{GraphError, Result};
use super::interaction::{GraphEvent, PointerInput, TouchInput, TouchPhase};
use super::types::{GraphPayload, Vec2};
use super::variant::{ColorMode, SelectAction};
use super::view::{GraphView, HoverDetail};

enum Notice {
	Selected(SelectAction),
	Cleared,
	Hover(Option<HoverDetail>),
}

struct Mounted {
	view: GraphView,
	ctx: CanvasRenderingContext2d,
	canvas: HtmlCanvasElement,
}

/// Owns the current view and the frame loop driving it.
struct Host {
	mounted: Rc<RefCell<Option<Mounted>>>,
	frames: FrameLoop,
}

impl Host {
	fn new() -> Self {
		let mounted: Rc<RefCell<Option<Mounted>>> = Rc::new(RefCell::new(None));
		let frame_target = mounted.clone();
		let frames = FrameLoop::new(move || {
			frame_target
				.borrow_mut()
				.as_mut()
				.is_some_and(|m| m.view.frame(&m.ctx))
		});
		Self { mounted, frames }
	}

	fn request_frame(&self, schedule: bool) {
		if !schedule {
			return;
		}
		if let Err(err) = self.frames.request() {
			error!("failed to request animation frame: {err}");
		}
	}

	fn with_view<R>(&self, f: impl FnOnce(&mut GraphView) -> R) -> Option<R> {
		self.mounted.borrow_mut().as_mut().map(|m| f(&mut m.view))
	}

	fn mount(
		&self,
		canvas: HtmlCanvasElement,
		payload: &GraphPayload,
		config: GraphConfig,
		height: f64,
		seed: u64,
	) -> Result<()> {
		self.teardown();
		let ctx = canvas::context_2d(&canvas)?;
		let surface = canvas::measure_surface(&canvas, height)?;
		canvas::fit_canvas(&canvas, surface)?;
		let view = GraphView::new(payload, config, surface, seed);
		*self.mounted.borrow_mut() = Some(Mounted { view, ctx, canvas });
		let schedule = self.with_view(|view| view.invalidate()).unwrap_or(false);
		self.request_frame(schedule);
		Ok(())
	}

	fn resize(&self, height: f64) -> Result<()> {
		let schedule = {
			let mut slot = self.mounted.borrow_mut();
			let Some(mounted) = slot.as_mut() else {
				return Ok(());
			};
			let surface = canvas::measure_surface(&mounted.canvas, height)?;
			if surface == mounted.view.surface() {
				return Ok(());
			}
			canvas::fit_canvas(&mounted.canvas, surface)?;
			mounted.view.resize(surface)
		};
		self.request_frame(schedule);
		Ok(())
	}

	fn dispatch(&self, input: PointerInput) -> Vec<Notice> {
		let Some((schedule, notices)) = self.with_view(|view| {
			let update = view.handle_input(input);
			let notices = update
				.events
				.iter()
				.map(|event| match event {
					GraphEvent::NodeSelected(action) => Notice::Selected(action.clone()),
					GraphEvent::SelectionCleared => Notice::Cleared,
					GraphEvent::Hover(info) => Notice::Hover(view.hover_detail(info)),
				})
				.collect::<Vec<_>>();
			(update.schedule, notices)
		}) else {
			return Vec::new();
		};
		self.request_frame(schedule);
		notices
	}

	fn teardown(&self) {
		self.frames.cancel();
		if let Some(mut old) = self.mounted.borrow_mut().take() {
			old.view.dispose();
		}
	}

	fn dispose(&self) {
		self.teardown();
		self.frames.dispose();
	}
}

/// Interactive force-directed canvas for relationship, entity and
/// embedding payloads.
#[component]
pub fn ForceGraphCanvas(
	/// Graph to show; a new payload rebuilds the layout.
	#[prop(into)]
	data: Signal<GraphPayload>,
	/// Canvas height in CSS pixels; the width follows the container.
	#[prop(default = 600.0)]
	height: f64,
	/// Case-insensitive label filter.
	#[prop(into, optional)]
	search: MaybeProp<String>,
	/// Type or cluster colouring.
	#[prop(into, optional)]
	color_mode: MaybeProp<ColorMode>,
	/// Layout seed; a fresh one per mount when absent.
	#[prop(optional)]
	seed: Option<u64>,
	/// Called when a node is clicked or tapped.
	#[prop(into, optional)]
	on_select: Option<Callback<SelectAction>>,
	/// Called when a click on empty canvas clears the selection.
	#[prop(into, optional)]
	on_deselect: Option<Callback<()>>,
	/// Called whenever the hovered node or edge, or the pointer over it, changes.
	#[prop(into, optional)]
	on_hover: Option<Callback<Option<HoverDetail>>>,
	/// Overrides for layout, viewport, interaction and render constants.
	#[prop(optional)]
	config: Option<GraphConfig>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let host = StoredValue::new_local(Host::new());
	let tooltip = RwSignal::new(None::<HoverDetail>);

	Effect::new(move |_| {
		let payload = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let seed = seed.unwrap_or_else(|| js_sys::Date::now() as u64);
		let config = config.clone().unwrap_or_default();
		tooltip.set(None);

		let mounted = host.with_value(|host| {
			host.mount(canvas, &payload, config, height, seed)?;
			let query = search.get_untracked().unwrap_or_default();
			let mode = color_mode.get_untracked().unwrap_or_default();
			let schedule = host
				.with_view(|view| view.set_search(&query) | view.set_color_mode(mode))
				.unwrap_or(false);
			host.request_frame(schedule);
			Ok::<_, GraphError>(())
		});
		match mounted {
			Ok(()) => info!("graph canvas mounted with {} nodes", payload.len()),
			Err(err) => error!("failed to mount graph canvas: {err}"),
		}
	});

	Effect::new(move |_| {
		let query = search.get().unwrap_or_default();
		host.with_value(|host| {
			let schedule = host.with_view(|view| view.set_search(&query)).unwrap_or(false);
			host.request_frame(schedule);
		});
	});

	Effect::new(move |_| {
		let mode = color_mode.get().unwrap_or_default();
		host.with_value(|host| {
			let schedule = host.with_view(|view| view.set_color_mode(mode)).unwrap_or(false);
			host.request_frame(schedule);
		});
	});

	let resize_handle = window_event_listener(ev::resize, move |_| {
		if let Err(err) = host.with_value(|host| host.resize(height)) {
			error!("failed to resize graph canvas: {err}");
		}
	});
	let resize_handle = StoredValue::new_local(Some(resize_handle));

	on_cleanup(move || {
		if let Some(Some(handle)) = resize_handle.try_update_value(Option::take) {
			handle.remove();
		}
		let _ = host.try_with_value(Host::dispose);
		debug!("graph canvas unmounted");
	});

	let notify = move |notices: Vec<Notice>| {
		for notice in notices {
			match notice {
				Notice::Selected(action) => {
					if let Some(on_select) = on_select {
						on_select.run(action);
					}
				}
				Notice::Cleared => {
					if let Some(on_deselect) = on_deselect {
						on_deselect.run(());
					}
				}
				Notice::Hover(detail) => {
					tooltip.set(detail.clone());
					if let Some(on_hover) = on_hover {
						on_hover.run(detail);
					}
				}
			}
		}
	};
	let send = move |input: PointerInput| notify(host.with_value(|host| host.dispatch(input)));
	let point = move |x: i32, y: i32| -> Option<Vec2> {
		let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
		Some(canvas::canvas_point(&canvas, x as f64, y as f64))
	};
	let touch = move |ev: TouchEvent, phase: TouchPhase| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let touches = canvas::touch_points(&canvas, &ev.touches());
		send(PointerInput::Touch(TouchInput { phase, touches }));
	};

	let on_mousedown = move |ev: MouseEvent| {
		if let Some(at) = point(ev.client_x(), ev.client_y()) {
			send(PointerInput::Down(at));
		}
	};
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(at) = point(ev.client_x(), ev.client_y()) {
			send(PointerInput::Move(at));
		}
	};
	let on_mouseup = move |ev: MouseEvent| {
		if let Some(at) = point(ev.client_x(), ev.client_y()) {
			send(PointerInput::Up(at));
		}
	};
	let on_mouseleave = move |_: MouseEvent| send(PointerInput::Leave);
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(at) = point(ev.client_x(), ev.client_y()) {
			send(PointerInput::Wheel {
				at,
				delta_y: ev.delta_y(),
			});
		}
	};

	view! {
		<div class="force-graph" style="position: relative; width: 100%;">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:touchstart=move |ev| touch(ev, TouchPhase::Start)
				on:touchmove=move |ev| touch(ev, TouchPhase::Move)
				on:touchend=move |ev| touch(ev, TouchPhase::End)
				on:touchcancel=move |ev| touch(ev, TouchPhase::Cancel)
				style="display: block; cursor: grab; touch-action: none;"
			/>
			{move || {
				tooltip
					.get()
					.map(|detail| {
						let style = format!(
							"position: absolute; left: {}px; top: {}px; pointer-events: none;",
							detail.x + 12.0,
							detail.y + 12.0,
						);
						view! {
							<div class="force-graph-tooltip" style=style>
								{detail.text}
							</div>
						}
					})
			}}
		</div>
	}
}
