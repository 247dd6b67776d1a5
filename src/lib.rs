//! Gesture-driven scrolling and snapping for carousel widgets.
//!
//! Touch drags, mouse drags and wheel scrolling are reconciled into one
//! scroll position per carousel ([`tracker`]); once input stops, [`snap`]
//! decides whether to align the viewport to a slide, using [`idle`] to wait
//! for momentum to settle. [`focus`] arbitrates which of several carousels on
//! a page owns ambient input. [`replay`] drives all of it from recorded
//! traces on a virtual clock.

pub mod carousel;
pub mod click;
pub mod config;
pub mod error;
pub mod focus;
pub mod idle;
pub mod replay;
pub mod scheduler;
pub mod snap;
pub mod tracker;
pub mod viewport;

pub use carousel::{Carousel, CarouselOptions, Notice, SlideGeometry, Variant};
pub use config::Profile;
pub use focus::{FocusArbiter, InstanceId};
pub use scheduler::Scheduler;
