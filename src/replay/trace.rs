use serde::Deserialize;
use std::{collections::HashSet, fs, path::Path};

use crate::carousel::{CarouselOptions, SlideGeometry, Variant};
use crate::error::TraceError;

fn one() -> usize {
    1
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarouselSpec {
    pub name: String,
    #[serde(default)]
    pub variant: Variant,
    #[serde(flatten)]
    pub geometry: SlideGeometry,
    #[serde(default = "one")]
    pub scroll_count: usize,
    #[serde(default)]
    pub initial_slide: usize,
    /// Tagged with the focus-managed marker.
    #[serde(default = "yes")]
    pub focus_managed: bool,
}

impl CarouselSpec {
    pub fn options(&self) -> CarouselOptions {
        CarouselOptions {
            variant: self.variant,
            geometry: self.geometry,
            scroll_count: self.scroll_count,
            initial_slide: self.initial_slide,
        }
    }

    fn validate(&self) -> Result<(), TraceError> {
        let fail = |reason: &str| TraceError::Geometry {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        let g = &self.geometry;
        if !g.slide_width.is_finite() || g.slide_width <= 0.0 {
            return Err(fail("slide_width must be positive"));
        }
        if g.slide_count == 0 || g.visible == 0 {
            return Err(fail("slide_count and visible must be at least 1"));
        }
        if self.scroll_count == 0 {
            return Err(fail("scroll_count must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    TouchStart,
    /// Native touch scrolling of the viewport.
    TouchMove {
        dx: f64,
    },
    TouchEnd,
    MouseDown {
        x: f64,
        #[serde(default)]
        y: f64,
    },
    MouseMove {
        x: f64,
        #[serde(default)]
        y: f64,
    },
    MouseUp {
        x: f64,
        #[serde(default)]
        y: f64,
    },
    MouseEnter,
    MouseLeave,
    /// Wheel over the viewport; the viewport scrolls natively by `dx`.
    Wheel {
        dx: f64,
    },
    /// Wheel input that hit no carousel.
    AmbientWheel {
        dx: f64,
    },
    Click {
        x: f64,
        #[serde(default)]
        y: f64,
    },
    /// Pointer-down on the page outside any carousel; `path` is the
    /// ancestor-or-self class chain of the target, innermost first.
    PagePress {
        #[serde(default)]
        path: Vec<Vec<String>>,
    },
    Unmount,
}

impl TraceEvent {
    fn needs_target(&self) -> bool {
        !matches!(
            self,
            TraceEvent::AmbientWheel { .. } | TraceEvent::PagePress { .. }
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimedEvent {
    pub at: u64,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(flatten)]
    pub event: TraceEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    /// Run the clock up to here; defaults to a few seconds past the last event.
    #[serde(default)]
    pub until_ms: Option<u64>,
    pub carousels: Vec<CarouselSpec>,
    #[serde(default)]
    pub events: Vec<TimedEvent>,
}

const DEFAULT_TAIL_MS: u64 = 3_000;

impl Trace {
    pub fn from_json_str(txt: &str) -> Result<Self, TraceError> {
        let mut trace: Trace = serde_json::from_str(txt)?;
        trace.validate()?;
        // stable: same-instant events keep their file order
        trace.events.sort_by_key(|e| e.at);
        Ok(trace)
    }

    pub fn from_path(path: &Path) -> Result<Self, TraceError> {
        let txt = fs::read_to_string(path).map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&txt)
    }

    pub fn end_ms(&self) -> u64 {
        self.until_ms.unwrap_or_else(|| {
            self.events
                .iter()
                .map(|e| e.at)
                .max()
                .unwrap_or(0)
                .saturating_add(DEFAULT_TAIL_MS)
        })
    }

    fn validate(&self) -> Result<(), TraceError> {
        let mut names = HashSet::new();
        for c in &self.carousels {
            if !names.insert(c.name.as_str()) {
                return Err(TraceError::DuplicateCarousel(c.name.clone()));
            }
            c.validate()?;
        }
        for e in &self.events {
            match &e.target {
                Some(name) if !names.contains(name.as_str()) => {
                    return Err(TraceError::UnknownCarousel {
                        name: name.clone(),
                        at: e.at,
                    });
                }
                None if e.event.needs_target() => {
                    return Err(TraceError::MissingTarget { at: e.at });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "carousels": [
            {"name": "hero", "slide_width": 300, "slide_count": 5},
            {"name": "deck", "variant": "slide_snap", "slide_width": 200,
             "slide_count": 8, "visible": 3, "scroll_count": 2, "focus_managed": false}
        ],
        "events": [
            {"at": 40, "target": "hero", "type": "mouse_up", "x": 10},
            {"at": 0, "target": "hero", "type": "mouse_down", "x": 100, "y": 4},
            {"at": 40, "type": "page_press", "path": [["button"], ["body"]]},
            {"at": 90, "target": "deck", "type": "unmount"}
        ]
    }"#;

    #[test]
    fn parses_and_orders_events() {
        let t = Trace::from_json_str(SAMPLE).unwrap();
        assert_eq!(t.carousels[0].variant, Variant::FreeScroll);
        assert_eq!(t.carousels[0].geometry.visible, 1);
        assert!(t.carousels[0].focus_managed);
        assert_eq!(t.carousels[1].variant, Variant::SlideSnap);
        assert_eq!(t.carousels[1].scroll_count, 2);
        assert!(!t.carousels[1].focus_managed);

        let ats: Vec<u64> = t.events.iter().map(|e| e.at).collect();
        assert_eq!(ats, vec![0, 40, 40, 90]);
        assert_eq!(
            t.events[0].event,
            TraceEvent::MouseDown { x: 100.0, y: 4.0 }
        );
        assert_eq!(t.events[1].event, TraceEvent::MouseUp { x: 10.0, y: 0.0 });
        assert_eq!(t.end_ms(), 3_090);
    }

    #[test]
    fn default_end_saturates_at_the_last_instant() {
        let t = Trace::from_json_str(
            r#"{"carousels": [], "events": [{"at": 18446744073709551615, "type": "ambient_wheel", "dx": 1}]}"#,
        )
        .unwrap();
        assert_eq!(t.end_ms(), u64::MAX);
    }

    #[test]
    fn rejects_unknown_target() {
        let err = Trace::from_json_str(
            r#"{"carousels": [], "events": [{"at": 5, "target": "x", "type": "touch_start"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TraceError::UnknownCarousel { at: 5, .. }));
    }

    #[test]
    fn rejects_untargeted_pointer_event() {
        let err = Trace::from_json_str(
            r#"{"carousels": [], "events": [{"at": 5, "type": "touch_start"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TraceError::MissingTarget { at: 5 }));
    }

    #[test]
    fn rejects_duplicate_and_degenerate_carousels() {
        let dup = r#"{"carousels": [
            {"name": "a", "slide_width": 1, "slide_count": 1},
            {"name": "a", "slide_width": 1, "slide_count": 1}]}"#;
        assert!(matches!(
            Trace::from_json_str(dup),
            Err(TraceError::DuplicateCarousel(_))
        ));

        let flat = r#"{"carousels": [{"name": "a", "slide_width": 0, "slide_count": 1}]}"#;
        assert!(matches!(
            Trace::from_json_str(flat),
            Err(TraceError::Geometry { .. })
        ));
    }
}
