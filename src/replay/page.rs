//! Deterministic page event loop: trace input, due tasks, then animation frames.

use log::{debug, info, trace, warn};
use serde::Serialize;
use std::rc::Rc;

use super::trace::{CarouselSpec, TimedEvent, Trace, TraceEvent};
use super::viewport::SimViewport;
use crate::carousel::{Carousel, Notice};
use crate::config::Profile;
use crate::focus::{ElementPath, FocusArbiter, InstanceId};
use crate::scheduler::{Scheduler, TaskId};
use crate::snap::SnapState;
use crate::tracker::{GrabFlags, PointerInput};
use crate::viewport::Viewport;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageEvent {
    Mounted { id: InstanceId },
    Unmounted { id: InstanceId },
    FocusDropped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogEvent {
    Notice(Notice),
    Page(PageEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub at_ms: u64,
    pub source: String,
    #[serde(flatten)]
    pub event: LogEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarouselReport {
    pub name: String,
    pub id: InstanceId,
    pub offset: f64,
    pub current_slide: usize,
    pub swipe_target: Option<usize>,
    pub flags: GrabFlags,
    pub snap_state: SnapState,
    pub has_focus: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub profile: String,
    pub ended_at_ms: u64,
    pub focused: Option<InstanceId>,
    /// Tasks still scheduled at the end; only mounted carousels may own any.
    pub pending_tasks: usize,
    pub carousels: Vec<CarouselReport>,
    pub log: Vec<LogEntry>,
}

impl Report {
    /// Log entries of one carousel or of the page (`"page"`).
    pub fn entries_for<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.log.iter().filter(move |e| e.source == source)
    }

    pub fn carousel(&self, name: &str) -> Option<&CarouselReport> {
        self.carousels.iter().find(|c| c.name == name)
    }
}

struct Mounted {
    name: String,
    carousel: Carousel,
    viewport: SimViewport,
    path: ElementPath,
}

const PAGE: &str = "page";

pub struct Page {
    scheduler: Scheduler,
    arbiter: Rc<FocusArbiter>,
    profile: Profile,
    mounted: Vec<Mounted>,
    log: Vec<LogEntry>,
    last_frame_ms: u64,
}

impl Page {
    pub fn new(profile: Profile) -> Self {
        Self {
            scheduler: Scheduler::new(),
            arbiter: FocusArbiter::new(),
            profile,
            mounted: Vec::new(),
            log: Vec::new(),
            last_frame_ms: 0,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn arbiter(&self) -> &Rc<FocusArbiter> {
        &self.arbiter
    }

    pub fn mount(&mut self, spec: &CarouselSpec) -> InstanceId {
        let options = spec.options();
        let carousel = Carousel::new(&self.arbiter, &self.scheduler, &self.profile, options);
        let viewport = SimViewport::new(
            self.scheduler.clone(),
            options.geometry,
            carousel.current_slide(),
        );
        let id = carousel.id();
        self.push(PAGE, LogEvent::Page(PageEvent::Mounted { id }));
        self.mounted.push(Mounted {
            name: spec.name.clone(),
            carousel,
            viewport,
            path: ElementPath::carousel(spec.focus_managed),
        });
        id
    }

    fn push(&mut self, source: &str, event: LogEvent) {
        self.log.push(LogEntry {
            at_ms: self.scheduler.now_ms(),
            source: source.to_string(),
            event,
        });
    }

    fn collect_notices(&mut self) {
        let now = self.scheduler.now_ms();
        for m in &mut self.mounted {
            for notice in m.carousel.drain_notices() {
                self.log.push(LogEntry {
                    at_ms: now,
                    source: m.name.clone(),
                    event: LogEvent::Notice(notice),
                });
            }
        }
    }

    fn find(&mut self, name: &str) -> Option<&mut Mounted> {
        self.mounted.iter_mut().find(|m| m.name == name)
    }

    /// Capture-phase focus release, ahead of the target's own handlers.
    fn capture_press(&mut self, path: &ElementPath) {
        if self.arbiter.release_outside(path) {
            self.push(PAGE, LogEvent::Page(PageEvent::FocusDropped));
        }
    }

    pub fn dispatch(&mut self, ev: &TimedEvent) {
        trace!("{}ms {:?} -> {:?}", ev.at, ev.event, ev.target);
        match &ev.event {
            TraceEvent::PagePress { path } => {
                self.capture_press(&ElementPath::new(path.clone()));
            }
            TraceEvent::AmbientWheel { dx } => {
                if let Some(m) = self.mounted.iter_mut().find(|m| m.carousel.has_focus()) {
                    if m.carousel.ambient_wheel() {
                        m.viewport.scroll_by(*dx, 0.0);
                    }
                } else {
                    debug!("ambient wheel with no focused carousel");
                }
            }
            event => {
                let Some(name) = ev.target.as_deref() else {
                    warn!("dropping untargeted {event:?}");
                    return;
                };
                if matches!(event, TraceEvent::Unmount) {
                    self.unmount(name);
                } else if matches!(
                    event,
                    TraceEvent::TouchStart | TraceEvent::MouseDown { .. }
                ) {
                    let path = match self.find(name) {
                        Some(m) => m.path.clone(),
                        None => {
                            debug!("{name} is not mounted; dropping {event:?}");
                            return;
                        }
                    };
                    self.capture_press(&path);
                    self.deliver(name, event);
                } else {
                    self.deliver(name, event);
                }
            }
        }
        self.collect_notices();
    }

    fn deliver(&mut self, name: &str, event: &TraceEvent) {
        let Some(m) = self.find(name) else {
            debug!("{name} is not mounted; dropping {event:?}");
            return;
        };
        let input = match *event {
            TraceEvent::TouchStart => PointerInput::TouchStart,
            TraceEvent::TouchEnd => PointerInput::TouchEnd,
            TraceEvent::MouseDown { x, y } => PointerInput::MouseDown { x, y },
            TraceEvent::MouseMove { x, y } => PointerInput::MouseMove { x, y },
            TraceEvent::MouseUp { x, y } => PointerInput::MouseUp { x, y },
            TraceEvent::MouseEnter => PointerInput::MouseEnter,
            TraceEvent::MouseLeave => PointerInput::MouseLeave,
            TraceEvent::Wheel { dx } => {
                m.carousel.handle(PointerInput::Wheel, &mut m.viewport);
                m.viewport.scroll_by(dx, 0.0);
                return;
            }
            TraceEvent::TouchMove { dx } => {
                m.viewport.scroll_by(dx, 0.0);
                return;
            }
            TraceEvent::Click { x, y } => {
                m.carousel.click_slide(x, y);
                return;
            }
            TraceEvent::AmbientWheel { .. } | TraceEvent::PagePress { .. } | TraceEvent::Unmount => {
                return;
            }
        };
        m.carousel.handle(input, &mut m.viewport);
    }

    pub fn unmount(&mut self, name: &str) {
        let Some(pos) = self.mounted.iter().position(|m| m.name == name) else {
            debug!("{name} already unmounted");
            return;
        };
        let mut gone = self.mounted.remove(pos);
        for notice in gone.carousel.drain_notices() {
            self.push(&gone.name, LogEvent::Notice(notice));
        }
        let id = gone.carousel.id();
        drop(gone);
        self.push(PAGE, LogEvent::Page(PageEvent::Unmounted { id }));
    }

    fn fire(&mut self, id: TaskId) {
        let owned = self.mounted.iter_mut().any(|m| m.carousel.on_timer(id));
        if !owned {
            warn!("{id} fired with no owner");
        }
        self.collect_notices();
    }

    fn frame(&mut self) {
        for m in &mut self.mounted {
            let out = m.viewport.advance_frame();
            if out.scrolled {
                m.carousel.on_scroll();
            }
            m.carousel.on_frame(&mut m.viewport);
            if out.navigation_finished {
                m.carousel.on_navigation_finished();
            }
        }
        self.collect_notices();
    }

    /// Runs the loop until `until_ms`, feeding `events` (sorted by time) as their
    /// instants come up.
    pub fn run(&mut self, events: &[TimedEvent], until_ms: u64) {
        let frame_ms = self.profile.timings.frame_ms.max(1);
        let mut next = events.iter().peekable();
        loop {
            let next_frame = self.last_frame_ms.saturating_add(frame_ms);
            let next_input = next.peek().map(|e| e.at);
            let next_task = self.scheduler.next_due_ms();
            let t = [Some(next_frame), next_input, next_task]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(next_frame);
            if t > until_ms {
                break;
            }
            self.scheduler.advance_to(t);

            if next_input == Some(t) {
                if let Some(ev) = next.next() {
                    self.dispatch(ev);
                }
            } else if next_task == Some(t) {
                if let Some(id) = self.scheduler.pop_due(t) {
                    self.fire(id);
                }
            } else {
                if next_frame == self.last_frame_ms {
                    // clock saturated
                    break;
                }
                self.last_frame_ms = next_frame;
                self.frame();
            }
        }
        self.scheduler.advance_to(until_ms);
    }

    pub fn report(&self) -> Report {
        Report {
            profile: self.profile.display_name().to_string(),
            ended_at_ms: self.scheduler.now_ms(),
            focused: self.arbiter.focused(),
            pending_tasks: self.scheduler.pending(),
            carousels: self
                .mounted
                .iter()
                .map(|m| CarouselReport {
                    name: m.name.clone(),
                    id: m.carousel.id(),
                    offset: m.viewport.offset(),
                    current_slide: m.carousel.current_slide(),
                    swipe_target: m.carousel.swipe_target(),
                    flags: m.carousel.flags(),
                    snap_state: m.carousel.snap_state(),
                    has_focus: m.carousel.has_focus(),
                })
                .collect(),
            log: self.log.clone(),
        }
    }
}

/// Mounts every carousel of `trace`, runs it and reports.
pub fn run_trace(trace: &Trace, profile: &Profile) -> Report {
    let mut page = Page::new(profile.clone());
    for spec in &trace.carousels {
        page.mount(spec);
    }
    let until = trace.end_ms();
    info!(
        "replaying {} events over {}ms with profile '{}'",
        trace.events.len(),
        until,
        profile.display_name()
    );
    page.run(&trace.events, until);
    page.report()
}
