//! One mounted carousel: gesture tracking, snap coordination and focus
//! registration for a single scrollable viewport.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::click::{ClickVerdict, DragClickGuard};
use crate::config::{IdleThresholds, Profile};
use crate::focus::{FocusArbiter, FocusHandle, InstanceId};
use crate::idle::{ScrollEndWaiter, Settle};
use crate::scheduler::{Scheduler, TaskId};
use crate::snap::{SnapCoordinator, SnapRoutine, SnapState, SnapTicket};
use crate::tracker::{
    FreeScrollTracker, GestureTracker, GrabFlags, PointerInput, SlideSnapTracker,
};
use crate::viewport::{Navigator, Viewport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Mouse drags scroll freely; the snap coordinator aligns once scrolling pauses.
    #[default]
    FreeScroll,
    /// Mouse releases navigate by whole slides.
    SlideSnap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideGeometry {
    pub slide_width: f64,
    pub slide_count: usize,
    /// Slides in view at once.
    #[serde(default = "one")]
    pub visible: usize,
}

fn one() -> usize {
    1
}

impl SlideGeometry {
    /// Highest slide index the viewport can align to.
    pub fn last_index(&self) -> usize {
        self.slide_count.saturating_sub(self.visible)
    }

    pub fn offset_of(&self, index: usize) -> f64 {
        index as f64 * self.slide_width
    }

    pub fn nearest(&self, x: f64) -> usize {
        if self.slide_width <= 0.0 || !x.is_finite() {
            return 0;
        }
        let idx = (x / self.slide_width).round().max(0.0) as usize;
        idx.min(self.last_index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselOptions {
    pub variant: Variant,
    pub geometry: SlideGeometry,
    /// Slides moved per swipe.
    pub scroll_count: usize,
    pub initial_slide: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavReason {
    Swipe,
    Snap,
}

/// Externally visible decisions, drained by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    FocusClaimed,
    SnapStarted { ticket: SnapTicket },
    ScrollSettled { outcome: Settle },
    Navigate {
        index: usize,
        duration_s: f64,
        reason: NavReason,
    },
    SnapFinished { ticket: SnapTicket, index: usize },
    Click { verdict: ClickVerdict },
}

#[derive(Debug)]
enum Tracker {
    Free(FreeScrollTracker),
    Slides(SlideSnapTracker),
}

impl Tracker {
    fn flags(&self) -> GrabFlags {
        match self {
            Tracker::Free(t) => t.flags(),
            Tracker::Slides(t) => t.flags(),
        }
    }
}

#[derive(Debug)]
enum AlignPhase {
    /// Waiting for the viewport to settle; the waiter starts on the next frame.
    Settling {
        ticket: SnapTicket,
        waiter: Option<ScrollEndWaiter>,
    },
    /// Navigating to the nearest slide.
    Aligning { ticket: SnapTicket },
}

/// Snap routine: wait for scrolling to settle, then align to the nearest slide.
#[derive(Debug)]
struct SettleThenAlign {
    idle: IdleThresholds,
    phase: Option<AlignPhase>,
}

impl SnapRoutine for SettleThenAlign {
    fn begin(&mut self, ticket: SnapTicket) {
        self.phase = Some(AlignPhase::Settling {
            ticket,
            waiter: None,
        });
    }
}

#[derive(Debug)]
pub struct Carousel {
    focus: FocusHandle,
    tracker: Tracker,
    coordinator: SnapCoordinator,
    snap: SettleThenAlign,
    click: DragClickGuard,
    geometry: SlideGeometry,
    current: usize,
    goto_duration_s: f64,
    /// User input arrived while aligning.
    interrupted: bool,
    notices: Vec<Notice>,
}

impl Carousel {
    pub fn new(
        arbiter: &Rc<FocusArbiter>,
        scheduler: &Scheduler,
        profile: &Profile,
        options: CarouselOptions,
    ) -> Self {
        let tracker = match options.variant {
            Variant::FreeScroll => Tracker::Free(FreeScrollTracker::new(
                scheduler.clone(),
                profile.timings.drag_delay(),
            )),
            Variant::SlideSnap => Tracker::Slides(SlideSnapTracker::new(
                profile.swipe.distance_threshold,
                options.scroll_count,
            )),
        };
        let focus = arbiter.register();
        info!(
            "carousel {} mounted ({:?}, {} slides)",
            focus.id(),
            options.variant,
            options.geometry.slide_count
        );
        Self {
            focus,
            tracker,
            coordinator: SnapCoordinator::new(scheduler.clone(), profile.timings.poll_interval()),
            snap: SettleThenAlign {
                idle: profile.idle,
                phase: None,
            },
            click: DragClickGuard::new(profile.swipe.click_tolerance),
            geometry: options.geometry,
            current: options.initial_slide.min(options.geometry.last_index()),
            goto_duration_s: profile.swipe.goto_duration_s,
            interrupted: false,
            notices: Vec::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.focus.id()
    }

    pub fn has_focus(&self) -> bool {
        self.focus.has_focus()
    }

    pub fn flags(&self) -> GrabFlags {
        self.tracker.flags()
    }

    pub fn snap_state(&self) -> SnapState {
        self.coordinator.state()
    }

    pub fn is_snapping(&self) -> bool {
        self.coordinator.is_snapping()
    }

    pub fn current_slide(&self) -> usize {
        self.current
    }

    /// Slide picked by the last swipe release (slide-snap variant only).
    pub fn swipe_target(&self) -> Option<usize> {
        match &self.tracker {
            Tracker::Slides(t) => t.target(),
            Tracker::Free(_) => None,
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn note_input_during_align(&mut self) {
        if matches!(self.snap.phase, Some(AlignPhase::Aligning { .. })) {
            self.interrupted = true;
        }
    }

    fn claim_focus(&mut self) {
        if !self.focus.has_focus() {
            self.focus.claim();
            self.notices.push(Notice::FocusClaimed);
        }
    }

    fn navigate<N: Navigator + ?Sized>(&mut self, index: usize, reason: NavReason, nav: &mut N) {
        self.current = index;
        nav.go_to(index, self.goto_duration_s);
        self.notices.push(Notice::Navigate {
            index,
            duration_s: self.goto_duration_s,
            reason,
        });
    }

    /// Input hit-tested to this carousel's viewport.
    pub fn handle<H>(&mut self, input: PointerInput, host: &mut H)
    where
        H: Viewport + Navigator + ?Sized,
    {
        let last_index = self.geometry.last_index();
        match input {
            PointerInput::TouchStart => {
                self.claim_focus();
                self.note_input_during_align();
                match &mut self.tracker {
                    Tracker::Free(t) => t.on_touch_start(),
                    Tracker::Slides(t) => t.on_touch_start(),
                }
            }
            PointerInput::TouchEnd => match &mut self.tracker {
                Tracker::Free(t) => t.on_release(),
                Tracker::Slides(t) => t.on_touch_end(),
            },
            PointerInput::MouseDown { x, y } => {
                self.claim_focus();
                self.note_input_during_align();
                self.click.on_press(x, y);
                let active = self.current;
                match &mut self.tracker {
                    Tracker::Free(t) => t.on_mouse_down(x, active),
                    Tracker::Slides(t) => t.on_mouse_down(x, active),
                }
            }
            PointerInput::MouseMove { x, .. } => {
                self.claim_focus();
                match &mut self.tracker {
                    Tracker::Free(t) => t.on_mouse_move(x, host),
                    Tracker::Slides(t) => t.on_mouse_move(x, host),
                }
            }
            PointerInput::MouseUp { x, .. } => {
                let dest = match &mut self.tracker {
                    Tracker::Free(t) => {
                        t.on_release();
                        None
                    }
                    Tracker::Slides(t) => t.on_mouse_up(x, last_index),
                };
                if let Some(dest) = dest {
                    self.navigate(dest, NavReason::Swipe, host);
                }
            }
            PointerInput::MouseEnter | PointerInput::MouseLeave => {
                let dest = match &mut self.tracker {
                    Tracker::Free(t) => {
                        t.on_release();
                        None
                    }
                    Tracker::Slides(t) => t.on_mouse_leave(last_index),
                };
                if let Some(dest) = dest {
                    self.navigate(dest, NavReason::Swipe, host);
                }
            }
            PointerInput::Wheel => {
                self.claim_focus();
                self.mark_wheel();
            }
        }
    }

    fn mark_wheel(&mut self) {
        self.note_input_during_align();
        match &mut self.tracker {
            Tracker::Free(t) => t.on_wheel(),
            Tracker::Slides(t) => t.on_wheel(),
        }
    }

    /// Wheel input that hit no carousel. Only the focused carousel takes it.
    pub fn ambient_wheel(&mut self) -> bool {
        if !self.focus.has_focus() {
            return false;
        }
        self.mark_wheel();
        true
    }

    /// Click on a slide; the press was recorded by the preceding mouse down.
    pub fn click_slide(&mut self, x: f64, y: f64) -> ClickVerdict {
        let verdict = self.click.on_click(x, y);
        self.notices.push(Notice::Click { verdict });
        verdict
    }

    /// Scroll event of the viewport.
    pub fn on_scroll(&mut self) {
        let mouse_scrolling = self.flags().mouse_scrolling;
        self.coordinator.on_scroll(mouse_scrolling);
    }

    /// Routes a due task; false when the task belongs to someone else.
    pub fn on_timer(&mut self, id: TaskId) -> bool {
        if let Tracker::Free(t) = &mut self.tracker {
            if t.on_timer(id) {
                return true;
            }
        }
        let grabbing = self.flags().grabbing;
        let was_snapping = self.coordinator.is_snapping();
        if !self.coordinator.on_timer(id, grabbing, &mut self.snap) {
            return false;
        }
        if !was_snapping && self.coordinator.is_snapping() {
            if let Some(AlignPhase::Settling { ticket, .. }) = &self.snap.phase {
                self.notices.push(Notice::SnapStarted { ticket: *ticket });
            }
        }
        true
    }

    /// Animation frame: drives the settle wait of an in-flight snap.
    pub fn on_frame<H>(&mut self, host: &mut H)
    where
        H: Viewport + Navigator + ?Sized,
    {
        let sample = host.scroll_offset();
        let settled = match &mut self.snap.phase {
            Some(AlignPhase::Settling { ticket, waiter }) => match waiter {
                None => {
                    *waiter = Some(ScrollEndWaiter::new(self.snap.idle, sample));
                    None
                }
                Some(w) => w.on_frame(sample).map(|outcome| (*ticket, outcome)),
            },
            _ => None,
        };

        if let Some((ticket, outcome)) = settled {
            let index = self.geometry.nearest(sample.x);
            debug!(
                "carousel {} settled ({outcome:?}), aligning to slide {index}",
                self.focus.id()
            );
            self.notices.push(Notice::ScrollSettled { outcome });
            self.snap.phase = Some(AlignPhase::Aligning { ticket });
            self.navigate(index, NavReason::Snap, host);
        }
    }

    /// Completion signal of the navigator's last `go_to`.
    /// The slide reported is the one last navigated to, which a swipe during
    /// the alignment may have replaced.
    pub fn on_navigation_finished(&mut self) {
        if let Some(AlignPhase::Aligning { ticket }) = self.snap.phase {
            self.snap.phase = None;
            if self.coordinator.finish(ticket) {
                self.notices.push(Notice::SnapFinished {
                    ticket,
                    index: self.current,
                });
            }
            // input that cut the alignment short gets a snap of its own
            if std::mem::take(&mut self.interrupted) {
                debug!("carousel {} alignment interrupted, watching again", self.focus.id());
                self.on_scroll();
            }
        }
    }
}

impl Drop for Carousel {
    fn drop(&mut self) {
        info!("carousel {} unmounted", self.focus.id());
    }
}
