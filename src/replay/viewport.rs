//! Simulated horizontal viewport with linear go-to animations.

use log::trace;

use crate::carousel::SlideGeometry;
use crate::scheduler::Scheduler;
use crate::viewport::{Navigator, ScrollSample, Viewport};

#[derive(Debug, Clone, Copy)]
struct Animation {
    from: f64,
    to: f64,
    start_ms: u64,
    duration_ms: u64,
}

/// What happened to the viewport since the previous frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Offset changed; the host owes the carousel one scroll event.
    pub scrolled: bool,
    /// The last `go_to` animation reached its target.
    pub navigation_finished: bool,
}

#[derive(Debug)]
pub struct SimViewport {
    clock: Scheduler,
    geometry: SlideGeometry,
    x: f64,
    max_x: f64,
    scrolled: bool,
    anim: Option<Animation>,
    nav_done: bool,
}

impl SimViewport {
    pub fn new(clock: Scheduler, geometry: SlideGeometry, initial_slide: usize) -> Self {
        let max_x = geometry.offset_of(geometry.last_index());
        let x = geometry
            .offset_of(initial_slide.min(geometry.last_index()))
            .clamp(0.0, max_x);
        Self {
            clock,
            geometry,
            x,
            max_x,
            scrolled: false,
            anim: None,
            nav_done: false,
        }
    }

    pub fn offset(&self) -> f64 {
        self.x
    }

    pub fn is_animating(&self) -> bool {
        self.anim.is_some()
    }

    fn set_x(&mut self, x: f64) {
        let x = x.clamp(0.0, self.max_x);
        if x != self.x {
            self.x = x;
            self.scrolled = true;
        }
    }

    /// Steps the animation to the current clock time and reports what the frame saw.
    pub fn advance_frame(&mut self) -> FrameOutcome {
        let now = self.clock.now_ms();
        if let Some(a) = self.anim {
            let t = if a.duration_ms == 0 {
                1.0
            } else {
                (now.saturating_sub(a.start_ms) as f64 / a.duration_ms as f64).min(1.0)
            };
            self.set_x(a.from + (a.to - a.from) * t);
            if t >= 1.0 {
                self.anim = None;
                self.nav_done = true;
            }
        }
        FrameOutcome {
            scrolled: std::mem::take(&mut self.scrolled),
            navigation_finished: std::mem::take(&mut self.nav_done),
        }
    }
}

impl Viewport for SimViewport {
    fn scroll_by(&mut self, dx: f64, _dy: f64) {
        // direct manipulation ends a running animation where it stands
        if self.anim.take().is_some() {
            self.nav_done = true;
        }
        self.set_x(self.x + dx);
    }

    fn scroll_offset(&self) -> ScrollSample {
        ScrollSample::new(self.x, 0.0)
    }
}

impl Navigator for SimViewport {
    fn go_to(&mut self, index: usize, duration_s: f64) {
        let to = self.geometry.offset_of(index).clamp(0.0, self.max_x);
        let duration_ms = (duration_s.max(0.0) * 1_000.0).round() as u64;
        trace!("animate {} -> {} over {}ms", self.x, to, duration_ms);
        self.anim = Some(Animation {
            from: self.x,
            to,
            start_ms: self.clock.now_ms(),
            duration_ms,
        });
    }
}
