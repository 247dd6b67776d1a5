//! Snap coordination: decide when free scrolling has paused long enough to
//! snap, and keep at most one snap in flight.

use log::{debug, trace, warn};
use serde::Serialize;
use std::time::Duration;

use crate::scheduler::{Scheduler, TaskHandle, TaskId};

/// Identifies one invocation of the snap routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SnapTicket(u64);

/// The externally supplied snap. The implementor must eventually hand the
/// ticket back through [`SnapCoordinator::finish`]; until then no other snap
/// starts.
pub trait SnapRoutine {
    fn begin(&mut self, ticket: SnapTicket);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapState {
    Idle,
    Watching,
    Snapping,
}

#[derive(Debug)]
pub struct SnapCoordinator {
    scheduler: Scheduler,
    poll_interval: Duration,
    poll: Option<TaskHandle>,
    in_flight: Option<SnapTicket>,
    next_ticket: u64,
}

impl SnapCoordinator {
    pub fn new(scheduler: Scheduler, poll_interval: Duration) -> Self {
        Self {
            scheduler,
            poll_interval,
            poll: None,
            in_flight: None,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> SnapState {
        if self.in_flight.is_some() {
            SnapState::Snapping
        } else if self.poll.is_some() {
            SnapState::Watching
        } else {
            SnapState::Idle
        }
    }

    pub fn is_snapping(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Viewport scrolled. Restarts the poll so a snap only follows a full quiet
    /// period; touch-driven motion is left alone.
    pub fn on_scroll(&mut self, mouse_scrolling: bool) {
        self.poll = None;
        if mouse_scrolling {
            trace!("scroll: (re)start watching");
            self.poll = Some(self.scheduler.set_interval(self.poll_interval));
        }
    }

    /// Poll tick routed from the host; true when this coordinator owned it.
    pub fn on_timer<R: SnapRoutine + ?Sized>(
        &mut self,
        id: TaskId,
        grabbing: bool,
        routine: &mut R,
    ) -> bool {
        if !self.poll.as_ref().is_some_and(|h| h.is(id)) {
            return false;
        }
        if grabbing || self.in_flight.is_some() {
            return true;
        }

        self.poll = None;
        self.next_ticket += 1;
        let ticket = SnapTicket(self.next_ticket);
        self.in_flight = Some(ticket);
        debug!("snap {ticket:?} begins");
        routine.begin(ticket);
        true
    }

    /// Completion signal of the snap routine. Stale tickets are ignored.
    pub fn finish(&mut self, ticket: SnapTicket) -> bool {
        if self.in_flight != Some(ticket) {
            warn!("ignoring completion of stale snap {ticket:?}");
            return false;
        }
        self.in_flight = None;
        self.poll = None;
        debug!("snap {ticket:?} finished");
        true
    }
}
