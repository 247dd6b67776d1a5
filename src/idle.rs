//! Frame-sampled scroll settle detection.
//!
//! Momentum scrolling does not reliably emit a scroll event when it comes to
//! rest, so settling is detected by sampling the offset once per animation
//! frame instead of listening for events.

use log::{debug, trace};
use serde::Serialize;

use crate::config::IdleThresholds;
use crate::viewport::ScrollSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Settle {
    /// Offset held still for the whole settle window.
    Settled { frame: u32 },
    /// Frame cap reached while still moving.
    Capped { frame: u32 },
}

impl Settle {
    pub fn frame(self) -> u32 {
        match self {
            Settle::Settled { frame } | Settle::Capped { frame } => frame,
        }
    }
}

/// Pending `waitForScrollEnd`: feed it one sample per frame until it resolves.
#[derive(Debug, Clone)]
pub struct ScrollEndWaiter {
    th: IdleThresholds,
    frame: u32,
    last_changed_frame: u32,
    last: ScrollSample,
    done: Option<Settle>,
}

impl ScrollEndWaiter {
    /// Starts waiting; `start` is the frame-0 baseline.
    pub fn new(th: IdleThresholds, start: ScrollSample) -> Self {
        Self {
            th,
            frame: 0,
            last_changed_frame: 0,
            last: start,
            done: None,
        }
    }

    pub fn outcome(&self) -> Option<Settle> {
        self.done
    }

    /// Samples the next frame. Returns the outcome once resolved; later calls keep
    /// returning it without sampling.
    pub fn on_frame(&mut self, sample: ScrollSample) -> Option<Settle> {
        if self.done.is_some() {
            return self.done;
        }
        self.frame += 1;
        if sample != self.last {
            trace!("scroll moved at frame {}: {:?}", self.frame, sample);
            self.last_changed_frame = self.frame;
            self.last = sample;
        }

        if self.frame - self.last_changed_frame >= self.th.settle_frames {
            debug!("scroll settled at frame {}", self.frame);
            self.done = Some(Settle::Settled { frame: self.frame });
        } else if self.frame >= self.th.max_frames {
            debug!("scroll still moving at frame cap {}", self.frame);
            self.done = Some(Settle::Capped { frame: self.frame });
        }
        self.done
    }
}
