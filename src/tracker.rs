//! Pointer/touch/wheel gesture tracking.
//!
//! Two trackers share the grab and drag primitives of [`GestureTracker`]:
//! [`FreeScrollTracker`] drags the viewport freely and leaves the settle
//! decision to the snap coordinator, [`SlideSnapTracker`] classifies each
//! mouse release as a swipe to a neighbouring slide or a snap back.

use log::{debug, trace};
use serde::Serialize;
use std::time::Duration;

use crate::scheduler::{Scheduler, TaskHandle, TaskId};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    TouchStart,
    TouchEnd,
    MouseDown { x: f64, y: f64 },
    MouseMove { x: f64, y: f64 },
    MouseUp { x: f64, y: f64 },
    MouseEnter,
    MouseLeave,
    Wheel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GrabFlags {
    /// A pointer press is directly controlling the scroll position.
    pub grabbing: bool,
    /// The latest scroll-affecting input was mouse (wheel or mouse drag), not touch.
    pub mouse_scrolling: bool,
}

/// One mouse drag, from press to release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    pub start_x: f64,
    pub x: f64,
    /// Slide index active when the drag started.
    pub active: usize,
}

impl GestureSession {
    pub fn begin(x: f64, active: usize) -> Self {
        Self {
            start_x: x,
            x,
            active,
        }
    }

    /// Moves the drag to `x`, returning the scroll delta when there is one.
    pub fn drag_to(&mut self, x: f64) -> Option<f64> {
        let delta = self.x - x;
        if delta == 0.0 {
            return None;
        }
        self.x = x;
        Some(delta)
    }

    /// Net displacement for a release at `release_x`; positive when dragged left.
    pub fn displacement(&self, release_x: f64) -> f64 {
        self.start_x - release_x
    }
}

/// Threshold swipe classifier. Returns the slide to navigate to.
///
/// A release further than `threshold` from the press moves `scroll_count`
/// slides in the drag direction, unless that would leave `0..=last_index`;
/// anything else snaps back to `active`.
pub fn classify_swipe(
    start_x: f64,
    release_x: f64,
    active: usize,
    scroll_count: usize,
    last_index: usize,
    threshold: f64,
) -> usize {
    let displacement = start_x - release_x;
    if displacement.abs() <= threshold {
        return active;
    }
    let step = scroll_count as i64;
    let dest = if displacement > 0.0 {
        active as i64 + step
    } else {
        active as i64 - step
    };
    if (0..=last_index as i64).contains(&dest) {
        dest as usize
    } else {
        active
    }
}

/// Grab and drag primitives shared by both tracker variants.
pub trait GestureTracker {
    fn flags(&self) -> GrabFlags;
    fn flags_mut(&mut self) -> &mut GrabFlags;
    fn session_mut(&mut self) -> Option<&mut GestureSession>;

    fn on_touch_start(&mut self) {
        let f = self.flags_mut();
        f.mouse_scrolling = false;
        f.grabbing = true;
        debug!("touch grab");
    }

    fn on_wheel(&mut self) {
        self.flags_mut().mouse_scrolling = true;
    }

    fn on_mouse_move<V: Viewport + ?Sized>(&mut self, x: f64, viewport: &mut V) {
        if !self.flags().grabbing {
            return;
        }
        if let Some(delta) = self.session_mut().and_then(|s| s.drag_to(x)) {
            trace!("drag by {delta}");
            viewport.scroll_by(delta, 0.0);
        }
    }

    /// Timer routed from the host; true when this tracker owned it.
    fn on_timer(&mut self, _id: TaskId) -> bool {
        false
    }
}

/// Continuous variant: mouse drags scroll freely, a press only becomes a grab
/// once it has been held for the drag delay.
#[derive(Debug)]
pub struct FreeScrollTracker {
    flags: GrabFlags,
    session: Option<GestureSession>,
    drag_delay: Duration,
    pending_grab: Option<TaskHandle>,
    scheduler: Scheduler,
}

impl FreeScrollTracker {
    pub fn new(scheduler: Scheduler, drag_delay: Duration) -> Self {
        Self {
            flags: GrabFlags::default(),
            session: None,
            drag_delay,
            pending_grab: None,
            scheduler,
        }
    }

    pub fn on_mouse_down(&mut self, x: f64, active: usize) {
        self.flags.mouse_scrolling = true;
        self.session = Some(GestureSession::begin(x, active));
        self.pending_grab = Some(self.scheduler.set_timeout(self.drag_delay));
    }

    /// Mouse up, leave and enter all end the press; touch end too.
    pub fn on_release(&mut self) {
        if self.flags.grabbing {
            debug!("release grab");
        }
        self.flags.grabbing = false;
        self.pending_grab = None;
        self.session = None;
    }

    pub fn has_pending_grab(&self) -> bool {
        self.pending_grab.is_some()
    }
}

impl GestureTracker for FreeScrollTracker {
    fn flags(&self) -> GrabFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GrabFlags {
        &mut self.flags
    }

    fn session_mut(&mut self) -> Option<&mut GestureSession> {
        self.session.as_mut()
    }

    fn on_timer(&mut self, id: TaskId) -> bool {
        if !self.pending_grab.as_ref().is_some_and(|h| h.is(id)) {
            return false;
        }
        self.pending_grab = None;
        self.flags.grabbing = true;
        debug!("mouse grab after {:?}", self.drag_delay);
        true
    }
}

/// Discrete variant: a mouse release navigates to a whole slide.
#[derive(Debug)]
pub struct SlideSnapTracker {
    flags: GrabFlags,
    session: Option<GestureSession>,
    threshold: f64,
    scroll_count: usize,
    target: Option<usize>,
}

impl SlideSnapTracker {
    pub fn new(threshold: f64, scroll_count: usize) -> Self {
        Self {
            flags: GrabFlags::default(),
            session: None,
            threshold,
            scroll_count,
            target: None,
        }
    }

    /// Last slide chosen by the swipe classifier.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    pub fn on_mouse_down(&mut self, x: f64, active: usize) {
        self.flags.mouse_scrolling = true;
        self.flags.grabbing = true;
        self.session = Some(GestureSession::begin(x, active));
        debug!("slide drag from slide {active}");
    }

    /// Ends a mouse drag and returns the slide to navigate to.
    ///
    /// The navigation is the settle decision for this drag, so `mouse_scrolling`
    /// is cleared and the snap coordinator stays out of it.
    pub fn on_mouse_up(&mut self, release_x: f64, last_index: usize) -> Option<usize> {
        let session = self.session.take()?;
        if !self.flags.grabbing {
            return None;
        }
        self.flags.grabbing = false;
        self.flags.mouse_scrolling = false;

        let dest = classify_swipe(
            session.start_x,
            release_x,
            session.active,
            self.scroll_count,
            last_index,
            self.threshold,
        );
        debug!(
            "swipe {:+} from slide {} -> {}",
            session.displacement(release_x),
            session.active,
            dest
        );
        self.target = Some(dest);
        Some(dest)
    }

    /// Pointer left the viewport mid-drag: classify at the last seen position.
    pub fn on_mouse_leave(&mut self, last_index: usize) -> Option<usize> {
        let x = self.session.as_ref()?.x;
        self.on_mouse_up(x, last_index)
    }

    pub fn on_touch_end(&mut self) {
        self.flags.grabbing = false;
    }
}

impl GestureTracker for SlideSnapTracker {
    fn flags(&self) -> GrabFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GrabFlags {
        &mut self.flags
    }

    fn session_mut(&mut self) -> Option<&mut GestureSession> {
        self.session.as_mut()
    }
}
