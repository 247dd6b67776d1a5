//! Replays recorded input traces against simulated carousels.

pub mod page;
pub mod trace;
pub mod viewport;

pub use page::{LogEntry, LogEvent, Page, PageEvent, Report, run_trace};
pub use trace::{CarouselSpec, TimedEvent, Trace, TraceEvent};
pub use viewport::SimViewport;
