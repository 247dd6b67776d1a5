//! Collaborators owned by the host: the scrollable viewport and the slide navigator.

use serde::Serialize;

/// Scroll offsets of a viewport at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollSample {
    pub x: f64,
    pub y: f64,
}

impl ScrollSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub trait Viewport {
    /// Scrolls by a delta. Scroll events are delivered by the host, not by this call.
    fn scroll_by(&mut self, dx: f64, dy: f64);

    fn scroll_offset(&self) -> ScrollSample;
}

pub trait Navigator {
    /// Animates to a slide. The host reports completion back to the carousel.
    fn go_to(&mut self, index: usize, duration_s: f64);
}
