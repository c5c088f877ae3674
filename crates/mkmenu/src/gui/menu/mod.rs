use std::time::Duration;

pub mod model;
pub mod view;

pub use model::{AnimationStep, Ghost, Measure, Menu, MenuSlot, MenuStyle};
pub use view::{CairoMeasure, draw};

pub const SLOT_COUNT: usize = 8;
pub const FADE_IN: Duration = Duration::from_millis(200);
pub const GHOST_FADE: Duration = Duration::from_millis(400);
/// Animation frame interval.
pub const ANIMATION_TICK: Duration = Duration::from_millis(12);
pub const SHADOW_OFFSET: f64 = 1.0;
