//! Click-vs-drag disambiguation for clickable slides.

use log::trace;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickVerdict {
    Fire,
    /// The click is the tail of a drag and must be swallowed.
    Suppress,
}

#[derive(Debug, Clone, Copy)]
pub struct DragClickGuard {
    tolerance: f64,
    down: Option<(f64, f64)>,
}

impl DragClickGuard {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            down: None,
        }
    }

    pub fn on_press(&mut self, x: f64, y: f64) {
        self.down = Some((x, y));
    }

    /// Judges a click against the recorded press and consumes the press.
    /// A click with no recorded press fires.
    pub fn on_click(&mut self, x: f64, y: f64) -> ClickVerdict {
        let Some((px, py)) = self.down.take() else {
            return ClickVerdict::Fire;
        };
        let dx = (x - px).abs();
        let dy = (y - py).abs();
        trace!("drag click dx={dx} dy={dy}");
        if dx > self.tolerance || dy > self.tolerance {
            ClickVerdict::Suppress
        } else {
            ClickVerdict::Fire
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_tail_is_suppressed() {
        let mut g = DragClickGuard::new(1.0);
        g.on_press(10.0, 10.0);
        assert_eq!(g.on_click(10.0, 12.0), ClickVerdict::Suppress);
    }

    #[test]
    fn jitter_within_tolerance_fires() {
        let mut g = DragClickGuard::new(1.0);
        g.on_press(10.0, 10.0);
        assert_eq!(g.on_click(10.0, 10.5), ClickVerdict::Fire);
    }

    #[test]
    fn press_is_consumed_by_the_click() {
        let mut g = DragClickGuard::new(1.0);
        g.on_press(0.0, 0.0);
        assert_eq!(g.on_click(50.0, 0.0), ClickVerdict::Suppress);
        assert_eq!(g.on_click(50.0, 0.0), ClickVerdict::Fire);
    }

    #[test]
    fn tolerance_boundary_fires() {
        let mut g = DragClickGuard::new(1.0);
        g.on_press(0.0, 0.0);
        assert_eq!(g.on_click(1.0, -1.0), ClickVerdict::Fire);
    }
}
