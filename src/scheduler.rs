//! Render scheduling for navigation events.
//!
//! Every navigation event is turned into one of three outcomes:
//!
//! - **Immediate full render** for discrete navigation (step, jump) and for
//!   the end of a slider drag, so the released position is always shown with
//!   its annotations.
//! - **Preview render** while the slider is dragged, rate limited to one per
//!   preview interval. Intermediate indices may be skipped entirely.
//! - **Deferred full render** for option changes and non-drag slider moves.
//!   A single timer slot is re-armed on every such event, so a burst of events
//!   collapses into one render once input has been quiet for the debounce
//!   delay.
//!
//! The scheduler runs on the thread that delivers the events. Timers are not
//! threads: the owner calls [`RenderScheduler::poll`] on each tick and a
//! cancelled timer can therefore never fire.

use std::time::Duration;
use web_time::Instant;

use crate::constants::{DEFAULT_DEBOUNCE_DELAY, DEFAULT_PREVIEW_INTERVAL};

/// How much work a render does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Base image only, no label parsing or overlays.
    Preview,
    /// Base image plus annotation overlays.
    Full,
}

/// Identifies an armed timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// What the owner should do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDecision {
    /// Render now in the given mode.
    Render(RenderMode),
    /// A full render will be returned by `poll` once the timer expires.
    Deferred(TimerHandle),
    /// Nothing to render.
    Skip,
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    deadline: Instant,
}

/// Navigation and drag state plus the single pending-render slot.
#[derive(Debug)]
pub struct RenderScheduler {
    /// Number of images in the active sequence
    len: usize,
    current_index: usize,
    is_dragging: bool,
    /// Time of the last preview render (rate limiter)
    last_preview: Option<Instant>,
    /// At most one deferred render
    pending: Option<PendingTimer>,
    next_handle: u64,
    preview_interval: Duration,
    debounce_delay: Duration,
}

impl RenderScheduler {
    /// Create a scheduler for a sequence of `len` images with default timings.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            current_index: 0,
            is_dragging: false,
            last_preview: None,
            pending: None,
            next_handle: 0,
            preview_interval: DEFAULT_PREVIEW_INTERVAL,
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
        }
    }

    /// Set the minimum time between preview renders while dragging.
    pub fn with_preview_interval(mut self, interval: Duration) -> Self {
        self.preview_interval = interval;
        self
    }

    /// Set the quiet period before a deferred render fires.
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    /// Start over with a new sequence: index 0, no drag, no pending render.
    pub fn reset(&mut self, len: usize) {
        self.cancel_pending();
        self.len = len;
        self.current_index = 0;
        self.is_dragging = false;
        self.last_preview = None;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn preview_interval(&self) -> Duration {
        self.preview_interval
    }

    pub fn debounce_delay(&self) -> Duration {
        self.debounce_delay
    }

    /// Handle of the armed timer, if any.
    pub fn pending(&self) -> Option<TimerHandle> {
        self.pending.map(|p| p.handle)
    }

    /// When the armed timer fires, if any.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Move by `delta` images, clamped to the sequence.
    ///
    /// Renders immediately when the index changes; a step that hits the end of
    /// the sequence does nothing.
    pub fn step(&mut self, delta: isize) -> RenderDecision {
        if self.is_empty() {
            return RenderDecision::Skip;
        }
        let target = self.clamp(self.current_index.saturating_add_signed(delta));
        if target == self.current_index {
            return RenderDecision::Skip;
        }
        self.current_index = target;
        self.immediate_full()
    }

    /// Go to `index` (clamped) and render it immediately.
    pub fn jump(&mut self, index: usize) -> RenderDecision {
        if self.is_empty() {
            return RenderDecision::Skip;
        }
        self.current_index = self.clamp(index);
        self.immediate_full()
    }

    /// The slider was pressed.
    pub fn drag_start(&mut self) -> RenderDecision {
        self.is_dragging = true;
        self.cancel_pending();
        log::trace!("Drag started at index {}", self.current_index);
        RenderDecision::Skip
    }

    /// The slider moved to `index`.
    ///
    /// While dragging this yields a preview at most once per preview interval.
    /// Outside a drag (keyboard or trough click on the slider) it arms a
    /// deferred full render.
    pub fn drag_move(&mut self, index: usize, now: Instant) -> RenderDecision {
        if self.is_empty() {
            return RenderDecision::Skip;
        }
        let target = self.clamp(index);
        if target == self.current_index {
            return RenderDecision::Skip;
        }
        self.current_index = target;

        if !self.is_dragging {
            return RenderDecision::Deferred(self.arm(now));
        }

        let due = self
            .last_preview
            .is_none_or(|last| now.saturating_duration_since(last) >= self.preview_interval);
        if due {
            self.last_preview = Some(now);
            RenderDecision::Render(RenderMode::Preview)
        } else {
            log::trace!("Preview for index {} dropped by rate limit", target);
            RenderDecision::Skip
        }
    }

    /// The slider was released. Always renders the final position in full.
    pub fn drag_end(&mut self) -> RenderDecision {
        self.is_dragging = false;
        if self.is_empty() {
            return RenderDecision::Skip;
        }
        log::trace!("Drag ended at index {}", self.current_index);
        self.immediate_full()
    }

    /// A display option or the label map changed.
    ///
    /// Arms (or re-arms) the deferred full render. During a drag nothing is
    /// scheduled: the render at drag end picks the change up.
    pub fn options_changed(&mut self, now: Instant) -> RenderDecision {
        if self.is_empty() || self.is_dragging {
            return RenderDecision::Skip;
        }
        RenderDecision::Deferred(self.arm(now))
    }

    /// Fire the pending timer if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<RenderMode> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.pending = None;
        log::debug!(
            "Deferred render {:?} fired for index {}",
            pending.handle,
            self.current_index
        );
        Some(RenderMode::Full)
    }

    /// Cancel the pending timer, returning its handle.
    pub fn cancel_pending(&mut self) -> Option<TimerHandle> {
        let cancelled = self.pending.take().map(|p| p.handle);
        if let Some(handle) = cancelled {
            log::trace!("Cancelled deferred render {:?}", handle);
        }
        cancelled
    }

    fn immediate_full(&mut self) -> RenderDecision {
        self.cancel_pending();
        RenderDecision::Render(RenderMode::Full)
    }

    /// Cancel-then-arm: the previous timer, if any, is dropped.
    fn arm(&mut self, now: Instant) -> TimerHandle {
        self.cancel_pending();
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.pending = Some(PendingTimer {
            handle,
            deadline: now + self.debounce_delay,
        });
        handle
    }

    fn clamp(&self, index: usize) -> usize {
        index.min(self.len.saturating_sub(1))
    }
}
