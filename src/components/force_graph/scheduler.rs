/// Coalesces redraw requests into at most one pending animation frame.
///
/// Physics ticks, pointer handlers and host updates all call
/// [`FrameScheduler::request`]; only the idle-to-pending transition asks the
/// caller to register a `requestAnimationFrame` callback.
#[derive(Debug, Default)]
pub struct FrameScheduler {
	pending: bool,
	disposed: bool,
	frames: u64,
}

impl FrameScheduler {
	/// Returns `true` when the caller must schedule a new frame.
	pub fn request(&mut self) -> bool {
		if self.disposed || self.pending {
			return false;
		}
		self.pending = true;
		true
	}

	/// A frame has been requested and not yet begun.
	pub fn is_pending(&self) -> bool {
		self.pending
	}

	/// Called at the top of an animation frame. Returns whether a redraw had
	/// been requested.
	pub fn begin_frame(&mut self) -> bool {
		let requested = std::mem::take(&mut self.pending);
		if requested {
			self.frames += 1;
		}
		requested
	}

	/// Frames drawn so far.
	pub fn frames(&self) -> u64 {
		self.frames
	}

	/// Drops any pending request and refuses all later ones.
	pub fn dispose(&mut self) {
		self.pending = false;
		self.disposed = true;
	}

	/// [`FrameScheduler::dispose`] has been called.
	pub fn is_disposed(&self) -> bool {
		self.disposed
	}
}
